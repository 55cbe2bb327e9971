pub mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;

/// Outbound notification channel. Delivery is best-effort: implementations
/// log failures and never propagate them to the scan loop.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, text: &str);
}
