//! Service implementations
//!
//! Production implementations of the trait seams: the HTTP render client,
//! the persistence targets, and the tokio clock.

pub mod file_persistence;
pub mod http_render_client;
pub mod sleeper;
pub mod webhook_persistence;

#[cfg(test)]
mod tests;

pub use file_persistence::JsonFilePersistence;
pub use http_render_client::HttpRenderClient;
pub use sleeper::TokioSleeper;
pub use webhook_persistence::WebhookPersistence;
