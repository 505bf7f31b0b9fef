//! Navigation port

/// Route of the login entry point.
pub const LOGIN_ROUTE: &str = "/login";

/// Port through which the client asks the front end to change screens.
///
/// The client only ever navigates to [`LOGIN_ROUTE`], after the session
/// could not be refreshed.
pub trait Navigator: Send + Sync {
    /// Moves the application to `route`.
    fn navigate(&self, route: &str);
}
