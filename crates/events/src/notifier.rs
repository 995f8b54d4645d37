use async_trait::async_trait;

use crate::delivery::email::SendError;

/// Sends a single notification message.
///
/// Each call is one best-effort attempt: implementations must not queue or
/// retry. Callers log failures and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_notification(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<(), SendError>;
}
