//! Client execution logic.

use crate::error::ClientError;

use super::session::run_session;

/// Run the chat client until the session ends.
///
/// The session ends normally when the user types `quit` (or closes stdin)
/// and the server's side of the stream is observed to end; any transport
/// failure surfaces as a `ClientError`.
pub async fn run_client(url: String, user: String) -> Result<(), ClientError> {
    tracing::info!("Connecting to {} as '{}'", url, user);

    match run_session(&url, &user).await {
        Ok(()) => {
            tracing::info!("Client session ended normally");
            Ok(())
        }
        Err(e) => {
            tracing::warn!("Client session failed: {}", e);
            Err(e)
        }
    }
}
