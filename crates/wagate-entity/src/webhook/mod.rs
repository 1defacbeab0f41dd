//! Webhook subscription entities.

pub mod model;
pub mod option;

pub use model::WebhookConfig;
pub use option::WebhookOption;
