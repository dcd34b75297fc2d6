//! Webhook persistence: forwards finished carousels to an HTTP endpoint

use async_trait::async_trait;
use tracing::info;
use url::Url;

use shared::CarouselRun;
use crate::error::PersistenceError;
use crate::traits::CarouselPersistence;

/// POSTs the run as JSON. Any non-2xx answer is a failed save.
pub struct WebhookPersistence {
    client: reqwest::Client,
    url: Url,
}

impl WebhookPersistence {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl CarouselPersistence for WebhookPersistence {
    async fn save(&self, run: &CarouselRun) -> Result<(), PersistenceError> {
        let response = self
            .client
            .post(self.url.clone())
            .header("Content-Type", "application/json")
            .json(run)
            .send()
            .await
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        info!("Forwarded carousel {} to {}", run.run_id, self.url);
        Ok(())
    }
}
