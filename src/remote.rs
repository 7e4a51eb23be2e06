//! Remote zero-shot classifier abstraction and implementations.
//!
//! Defines the [`ZeroShotClassifier`] trait and concrete implementations:
//! - **[`DisabledClassifier`]**: always fails with [`ClassifierError::Disabled`];
//!   used when no inference endpoint is configured.
//! - **[`HuggingFaceClassifier`]**: calls a Hugging Face style zero-shot
//!   classification endpoint with a bearer token.
//!
//! A classifier call has three outcomes, kept distinct in the types:
//!
//! | Result | Meaning |
//! |--------|---------|
//! | `Ok(Some(tag))` | the endpoint returned a usable label |
//! | `Ok(None)` | the endpoint answered, but with no usable label |
//! | `Err(_)` | transport, HTTP status, or decoding failure |
//!
//! # Response shapes
//!
//! Inference endpoints answer zero-shot requests in one of two shapes;
//! [`parse_response`] accepts both:
//!
//! ```text
//! {"sequence": "...", "labels": ["Urgent", ...], "scores": [0.91, ...]}
//! [{"label": "Urgent", "score": 0.91}, ...]
//! [[{"label": "Urgent", "score": 0.91}, ...]]
//! ```

use anyhow::bail;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::ClassifierConfig;
use crate::models::Tag;

/// Failure of a remote classification attempt.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("remote classifier is disabled")]
    Disabled,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClassifierError {
    /// True for failures that indicate a deployment problem (bad
    /// credentials, wrong endpoint) rather than a transient one.
    pub fn is_configuration(&self) -> bool {
        match self {
            ClassifierError::Disabled => true,
            ClassifierError::Status { status, .. } => matches!(status, 401 | 403 | 404),
            _ => false,
        }
    }
}

/// A remote classifier that maps text onto one of the [`Tag`] labels.
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    /// Short identifier used in logs (e.g. `"huggingface"`).
    fn name(&self) -> &str;

    /// Classify `text` against the three candidate labels.
    async fn classify(&self, text: &str) -> Result<Option<Tag>, ClassifierError>;
}

// ============ Disabled Classifier ============

/// A classifier that never calls out; every tagging attempt goes to the
/// keyword fallback.
pub struct DisabledClassifier;

#[async_trait]
impl ZeroShotClassifier for DisabledClassifier {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn classify(&self, _text: &str) -> Result<Option<Tag>, ClassifierError> {
        Err(ClassifierError::Disabled)
    }
}

// ============ Hugging Face Classifier ============

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters,
}

#[derive(Serialize)]
struct ZeroShotParameters {
    candidate_labels: [&'static str; 3],
}

/// Zero-shot classifier backed by a Hugging Face inference endpoint.
///
/// Sends one `POST` per call, no retries. The request timeout bounds how
/// long a single tagging attempt can hold a request handler.
pub struct HuggingFaceClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HuggingFaceClassifier {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Create a classifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable named by
    /// `classifier.api_key_env` is unset or empty.
    pub fn from_config(config: &ClassifierConfig) -> anyhow::Result<Self> {
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => bail!("{} environment variable not set", config.api_key_env),
        };

        Ok(Self::new(
            config.endpoint.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )?)
    }
}

#[async_trait]
impl ZeroShotClassifier for HuggingFaceClassifier {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn classify(&self, text: &str) -> Result<Option<Tag>, ClassifierError> {
        let body = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels: Tag::ALL.map(|t| t.as_str()),
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: raw.chars().take(200).collect(),
            });
        }

        let json: serde_json::Value = serde_json::from_str(&raw)?;
        Ok(parse_response(&json))
    }
}

/// Extract the top label from a zero-shot response.
///
/// Returns `None` for any unrecognised shape or for a top label that is
/// not one of the [`Tag`] names.
pub fn parse_response(json: &serde_json::Value) -> Option<Tag> {
    if let Some(labels) = json.as_object().and_then(|o| o.get("labels")) {
        return labels
            .as_array()
            .and_then(|l| l.first())
            .and_then(label_from_str);
    }

    let first = json.as_array()?.first()?;
    let candidate = match first {
        serde_json::Value::Object(_) => first.get("label")?,
        serde_json::Value::Array(inner) => inner.first()?.get("label")?,
        _ => return None,
    };
    label_from_str(candidate)
}

fn label_from_str(value: &serde_json::Value) -> Option<Tag> {
    value.as_str()?.parse().ok()
}

/// Create the appropriate [`ZeroShotClassifier`] based on configuration.
///
/// | Config Value | Classifier |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledClassifier`] |
/// | `"huggingface"` | [`HuggingFaceClassifier`] |
pub fn create_classifier(config: &ClassifierConfig) -> anyhow::Result<Box<dyn ZeroShotClassifier>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledClassifier)),
        "huggingface" => Ok(Box::new(HuggingFaceClassifier::from_config(config)?)),
        other => bail!("Unknown classifier provider: {}", other),
    }
}
