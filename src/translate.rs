//! Translation of user input into English.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, info};

use crate::constants::ENGLISH;

/// Why a translation did not produce text.
#[derive(Debug)]
pub enum TranslationError {
    /// The request could not be sent or the body could not be read.
    Transport(reqwest::Error),
    /// The service did not answer in time.
    Timeout,
    /// The service answered with a non-success status.
    Status(StatusCode),
    /// The body was not the expected JSON shape.
    Parse(String),
    /// The service returned no text.
    Empty,
}

impl std::fmt::Display for TranslationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "Translation request failed: {err}"),
            Self::Timeout => write!(f, "Translation request timed out"),
            Self::Status(status) => write!(f, "Translation service returned {status}"),
            Self::Parse(message) => write!(f, "Unexpected translation response: {message}"),
            Self::Empty => write!(f, "Translation service returned no text"),
        }
    }
}

impl std::error::Error for TranslationError {}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

/// Client for a Google Translate compatible endpoint, always targeting English.
#[derive(Clone, Debug)]
pub struct Translator {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl Translator {
    /// Builds a translator whose requests give up after `timeout`.
    pub fn new(endpoint: url::Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    /// Translates `text` from `source_language` into English.
    ///
    /// English input is returned as-is without contacting the service.
    pub async fn translate(
        &self,
        text: &str,
        source_language: &str,
    ) -> Result<String, TranslationError> {
        if source_language == ENGLISH {
            return Ok(text.to_string());
        }

        info!("Starting translation from {source_language} to English: {text}");
        match self.request(text, source_language).await {
            Ok(translated) => {
                info!("Translation successful: {translated}");
                Ok(translated)
            }
            Err(err) => {
                error!("Translation error: {err}");
                Err(err)
            }
        }
    }

    async fn request(&self, text: &str, source_language: &str) -> Result<String, TranslationError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client", "gtx")
            .append_pair("sl", source_language)
            .append_pair("tl", ENGLISH)
            .append_pair("dt", "t")
            .append_pair("q", text);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status(status));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|err| TranslationError::Parse(err.to_string()))?;
        let translated = parse_translation(&body)?;
        if translated.trim().is_empty() {
            return Err(TranslationError::Empty);
        }
        Ok(translated)
    }
}

/// Joins the translated segments of a `[[["translated", "original", ...], ...], ...]` body.
fn parse_translation(body: &Value) -> Result<String, TranslationError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::Parse("missing segment list".to_string()))?;

    let mut translated = String::new();
    for segment in segments {
        if let Some(text) = segment.get(0).and_then(Value::as_str) {
            translated.push_str(text);
        }
    }
    Ok(translated)
}
