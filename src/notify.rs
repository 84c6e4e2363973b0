//! Best-effort "it's your turn" signal.

use tracing::info;

use crate::game::GameCode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("notification permission denied")]
    PermissionDenied,
    #[error("notification failed: {0}")]
    Failed(String),
}

pub trait Notifier: Send + Sync {
    /// Asks for permission to show notifications. Returns whether it was granted.
    fn request_permission(&self) -> bool;

    fn notify_my_turn(&self, code: &GameCode, seat: usize) -> Result<(), NotifyError>;
}

/// Writes turn notices to the log. Always granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn request_permission(&self) -> bool {
        true
    }

    fn notify_my_turn(&self, code: &GameCode, seat: usize) -> Result<(), NotifyError> {
        info!(%code, seat, "your turn");
        Ok(())
    }
}
