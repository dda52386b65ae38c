pub mod noop;
pub mod webhook;

pub use noop::NoopNotifier;
pub use webhook::WebhookNotifier;
