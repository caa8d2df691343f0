//! Client for the hosted text-to-image inference API.

use std::io::Cursor;
use std::time::Duration;

use image::{DynamicImage, ImageFormat};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::constants::{
    GUIDANCE_SCALE, IMAGE_HEIGHT, IMAGE_WIDTH, INFERENCE_TIMEOUT, MODEL_LOADING_RETRY_DELAY,
    NUM_INFERENCE_STEPS,
};

/// Why no image came back from the inference API.
#[derive(Debug)]
pub enum GenerationError {
    /// The request could not be sent or the body could not be read.
    Transport(reqwest::Error),
    /// The service did not answer within the request timeout.
    Timeout,
    /// The final response had a status other than 200.
    Status(StatusCode),
    /// The service answered 200 but the body was not an image.
    Decode(image::ImageError),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "Inference request failed: {err}"),
            Self::Timeout => write!(f, "Inference request timed out"),
            Self::Status(status) => write!(f, "Inference API returned {status}"),
            Self::Decode(err) => write!(f, "Failed to decode image data: {err}"),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

/// Body for the inference endpoint.
#[derive(Serialize, Debug)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize, Debug)]
struct InferenceParameters {
    num_inference_steps: u32,
    guidance_scale: f64,
    width: u32,
    height: u32,
}

impl<'a> InferenceRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            inputs: prompt,
            parameters: InferenceParameters {
                num_inference_steps: NUM_INFERENCE_STEPS,
                guidance_scale: GUIDANCE_SCALE,
                width: IMAGE_WIDTH,
                height: IMAGE_HEIGHT,
            },
        }
    }
}

/// A decoded image returned by the inference API.
#[derive(Clone, Debug)]
pub struct GeneratedImage {
    image: DynamicImage,
    format: Option<ImageFormat>,
}

impl GeneratedImage {
    /// Decodes raw bytes, guessing the format from their contents.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = reader.format();
        let image = reader.decode()?;
        Ok(Self { image, format })
    }

    /// Format the service sent, when it could be identified.
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// Width and height in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Re-encodes the bitmap as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut out = Cursor::new(Vec::new());
        self.image.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

/// Talks to the inference endpoint, retrying once while the model warms up.
#[derive(Clone, Debug)]
pub struct ImageGenerator {
    client: reqwest::Client,
    endpoint: url::Url,
    api_token: String,
    timeout: Duration,
    retry_delay: Duration,
}

impl ImageGenerator {
    /// Builds a client with the 60 second request timeout.
    pub fn new(endpoint: url::Url, api_token: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint,
            api_token: api_token.to_string(),
            timeout: INFERENCE_TIMEOUT,
            retry_delay: MODEL_LOADING_RETRY_DELAY,
        })
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the wait before the model-loading retry.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    async fn send(&self, payload: &InferenceRequest<'_>) -> Result<reqwest::Response, GenerationError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_token)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .inspect_err(|err| {
                if err.is_timeout() {
                    error!("Request timed out");
                } else {
                    error!("Request failed: {err}");
                }
            })?;
        info!("Response status code: {}", response.status());
        info!("Response headers: {:?}", response.headers());
        Ok(response)
    }

    /// Requests an image for `prompt`.
    ///
    /// A 503 (model loading) on the first attempt is followed by exactly one
    /// retry after the retry delay. Every other outcome is final.
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GenerationError> {
        let payload = InferenceRequest::new(prompt);
        info!(
            "Sending request to API with payload: {}",
            serde_json::to_string(&payload).unwrap_or_default()
        );

        let mut response = self.send(&payload).await?;
        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            info!(
                "Model is loading, waiting {}s and retrying...",
                self.retry_delay.as_secs()
            );
            tokio::time::sleep(self.retry_delay).await;
            response = self.send(&payload).await?;
        }

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?;

        if status != StatusCode::OK {
            error!("API request failed with status code: {status}");
            match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(detail) => error!("Error details: {detail}"),
                Err(_) => error!("Raw response content: {}", String::from_utf8_lossy(&bytes)),
            }
            return Err(GenerationError::Status(status));
        }

        debug!("Attempting to process image data");
        match GeneratedImage::decode(&bytes) {
            Ok(image) => {
                let (width, height) = image.dimensions();
                info!(
                    "Image processed successfully: {:?}, {}x{}",
                    image.format(),
                    width,
                    height
                );
                Ok(image)
            }
            Err(err) => {
                error!("Failed to process image data: {err}");
                error!("Response content type: {content_type:?}");
                error!(
                    "First 100 bytes of response: {:?}",
                    &bytes[..bytes.len().min(100)]
                );
                Err(GenerationError::Decode(err))
            }
        }
    }
}
