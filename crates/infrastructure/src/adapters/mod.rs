//! Port implementations.

mod navigator;
mod reqwest_client;

pub use navigator::LoggingNavigator;
pub use reqwest_client::{DEFAULT_REQUEST_TIMEOUT, ReqwestHttpClient};
