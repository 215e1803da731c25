//! Tolk - command-line host for the session coordinator.
//!
//! Restores the session from the configured API, logs in when
//! `TOLK_EMAIL` and `TOLK_PASSWORD` are set and no session exists, and
//! reports whether the route given as the first argument may be opened.
//!
//! ```text
//! tolk [PATH]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tolk_application::{Credentials, SessionManager};
use tolk_domain::{AuthorizationDecision, SessionState};
use tolk_infrastructure::{LoggingNavigator, ReqwestHttpClient, load_settings};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings_file = std::env::var_os("TOLK_CONFIG").map(PathBuf::from);
    let settings = load_settings(settings_file.as_deref())?;
    let requested = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());

    tracing::info!(
        api_base_url = %settings.api_base_url,
        "Starting Tolk v{}",
        env!("CARGO_PKG_VERSION")
    );

    let client = Arc::new(ReqwestHttpClient::new(settings.api_base_url.clone())?);
    let navigator = Arc::new(LoggingNavigator::new());
    let manager = SessionManager::new(&settings, client, navigator.clone());

    let mut state = manager.initialize().await;
    if !state.is_logged_in()
        && let (Ok(email), Ok(password)) =
            (std::env::var("TOLK_EMAIL"), std::env::var("TOLK_PASSWORD"))
    {
        manager.login(&Credentials::new(email, password)).await?;
        state = manager.state();
    }

    println!("session: {}", describe(&state));
    match manager.guard().decide(&requested) {
        AuthorizationDecision::Allow => println!("allow {requested}"),
        AuthorizationDecision::RedirectTo(target) => println!("redirect {requested} -> {target}"),
    }
    if let Some(path) = navigator.last_redirect() {
        println!("last redirect: {path}");
    }

    Ok(())
}

fn describe(state: &SessionState) -> String {
    match state.identity() {
        Some(identity) => match identity.role {
            Some(role) => format!("{} ({role})", identity.display_name),
            None => format!("{} (role not assigned)", identity.display_name),
        },
        None => state.label().to_string(),
    }
}
