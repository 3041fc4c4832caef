// hookq Infrastructure - HTTP Adapter
// Implements: WebhookNotifier

mod notifier;

pub use notifier::{HttpWebhookNotifier, NotifierConfig};
