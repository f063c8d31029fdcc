//! Authentication hook for connecting players.
//!
//! The server doesn't verify identities itself. Whoever hosts it supplies
//! an [`Authenticator`] that turns the handshake token into a username;
//! the username is what the match roster is keyed on.

use crate::AuthError;

/// Validates a client's token and returns the player's username.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// connection task for the life of the server.
///
/// # Example
///
/// ```rust
/// use gorillas::{AuthError, Authenticator};
///
/// /// Treats the token as the username. Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<String, AuthError> {
///         if token.is_empty() {
///             return Err(AuthError::Rejected("empty token".into()));
///         }
///         Ok(token.to_string())
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Returns the username the token belongs to.
    ///
    /// # Errors
    /// [`AuthError::Rejected`] if the token is invalid or expired.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<String, AuthError>> + Send;
}
