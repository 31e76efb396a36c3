pub mod public;
pub mod webhooks;
