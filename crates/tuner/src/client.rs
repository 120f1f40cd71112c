use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use common::{Error, Result, TunerConfig};

use crate::endpoint::resolve_chat_endpoint;
use crate::prompt::chat_request;
use crate::response::extract_tuning_object;
use crate::TuningOracle;

/// Longest slice of an error body kept in the error message.
const ERROR_BODY_PREVIEW: usize = 200;

/// Text-completion endpoint speaking the chat-completions wire format.
pub struct ChatCompletionOracle {
    endpoint: Url,
    api_key: String,
    model: String,
    http: Client,
}

impl ChatCompletionOracle {
    pub fn new(cfg: &TunerConfig) -> Result<Self> {
        let endpoint = resolve_chat_endpoint(&cfg.base_url)?;
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            endpoint,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            http,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TuningOracle for ChatCompletionOracle {
    async fn suggest(&self, payload: &Value) -> Result<Map<String, Value>> {
        let body = chat_request(&self.model, payload);
        debug!(endpoint = %self.endpoint, model = %self.model, "Requesting parameter tuning");

        let resp = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            let preview: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(Error::Tuner(format!("HTTP {status}: {preview}")));
        }

        extract_tuning_object(&text)
            .ok_or_else(|| Error::Tuner("response carried no JSON object".into()))
    }
}
