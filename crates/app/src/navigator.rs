//! Terminal implementation of the navigation port.

use std::sync::atomic::{AtomicBool, Ordering};

use taskdeck_application::{LOGIN_ROUTE, Navigator};
use tracing::debug;

/// Tells the user to log in again when the session could not be refreshed.
///
/// A terminal has no screens to switch, so "navigating" to the login route
/// prints a notice on stderr, once per process.
#[derive(Debug, Default)]
pub struct CliNavigator {
    sent_to_login: AtomicBool,
}

impl CliNavigator {
    /// Creates a navigator that has not redirected yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sent_to_login: AtomicBool::new(false),
        }
    }

    /// Returns true once the user has been sent to the login route.
    #[must_use]
    pub fn sent_to_login(&self) -> bool {
        self.sent_to_login.load(Ordering::SeqCst)
    }
}

impl Navigator for CliNavigator {
    fn navigate(&self, route: &str) {
        if route != LOGIN_ROUTE {
            debug!(route, "ignoring navigation");
            return;
        }
        if !self.sent_to_login.swap(true, Ordering::SeqCst) {
            eprintln!("Your session has ended. Run `taskdeck login` to sign in again.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_login_redirect() {
        let navigator = CliNavigator::new();
        navigator.navigate("/dashboard");
        assert!(!navigator.sent_to_login());

        navigator.navigate(LOGIN_ROUTE);
        navigator.navigate(LOGIN_ROUTE);
        assert!(navigator.sent_to_login());
    }
}
