use crate::domain::notification::Severity;
use crate::domain::ports::Notifier;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Emit a notification through `tracing` at the level matching its severity.
pub fn log_notification(severity: Severity, message: &str) {
    match severity {
        Severity::Info | Severity::Success => info!("[{}] {}", severity, message),
        Severity::Warning => warn!("[{}] {}", severity, message),
        Severity::Critical => error!("[{}] {}", severity, message),
    }
}

/// Used when no messaging channel is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, severity: Severity, message: &str) {
        log_notification(severity, message);
    }
}
