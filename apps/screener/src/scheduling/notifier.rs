use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Delivers interview invitations.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;

    /// False when messages are only logged and never reach the recipient.
    fn delivers(&self) -> bool {
        true
    }
}

/// Default notifier: records the invitation in the log. Nothing is mailed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        info!(
            recipient,
            subject,
            body_chars = body.chars().count(),
            "Invitation logged, not delivered: no mail transport configured"
        );
        Ok(())
    }

    fn delivers(&self) -> bool {
        false
    }
}
