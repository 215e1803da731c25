//! Navigator port

/// The host's navigation capability.
///
/// The session core never touches the router or the location directly; it
/// asks the navigator to go somewhere and lets the host decide how.
pub trait Navigator: Send + Sync {
    /// Navigates to `path`, replacing the current location.
    fn redirect_to(&self, path: &str);
}
