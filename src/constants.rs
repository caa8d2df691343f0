//! Shared constants/setters for things
//!

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

/// The default place we put generated images
pub static IMAGE_DIR: LazyLock<PathBuf> = LazyLock::new(|| PathBuf::from("./static/images"));

/// URL path generated images are served under.
pub const IMAGE_URL_PREFIX: &str = "/images";

/// Default text log sink, appended to alongside the console.
pub const DEFAULT_LOG_FILE: &str = "app.log";

/// Hosted Stable Diffusion XL endpoint.
pub const DEFAULT_INFERENCE_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0";

/// Google Translate endpoint used by the public web client.
pub const DEFAULT_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Language that needs no translation.
pub const ENGLISH: &str = "en";

/// Inference parameters sent with every generation request.
pub const NUM_INFERENCE_STEPS: u32 = 50;
/// Classifier-free guidance scale.
pub const GUIDANCE_SCALE: f64 = 8.5;
/// Output width in pixels.
pub const IMAGE_WIDTH: u32 = 512;
/// Output height in pixels.
pub const IMAGE_HEIGHT: u32 = 512;

/// Timeout for a single inference request.
pub const INFERENCE_TIMEOUT: Duration = Duration::from_secs(60);

/// How long to wait before the single retry when the model is still loading.
pub const MODEL_LOADING_RETRY_DELAY: Duration = Duration::from_secs(20);

/// Default timeout for the translation call, in seconds.
pub const DEFAULT_TRANSLATE_TIMEOUT_SECONDS: u64 = 30;

/// Number of characters of the raw input kept in a saved filename.
pub const FILENAME_PREFIX_CHARS: usize = 10;

/// Max age (in seconds) for image cache entries.
pub const IMAGE_CACHE_MAX_AGE_SECONDS: u64 = 60 * 60;

/// Shared cache max age (in seconds) for image cache entries.
pub const IMAGE_CACHE_S_MAXAGE_SECONDS: u64 = 60 * 60 * 24;

/// Cache-Control value for image responses.
pub static IMAGE_CACHE_CONTROL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "public, max-age={}, s-maxage={}, immutable",
        IMAGE_CACHE_MAX_AGE_SECONDS, IMAGE_CACHE_S_MAXAGE_SECONDS,
    )
});
