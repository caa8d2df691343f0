//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_INFERENCE_URL, DEFAULT_LOG_FILE, DEFAULT_TRANSLATE_TIMEOUT_SECONDS,
    DEFAULT_TRANSLATE_URL, IMAGE_DIR,
};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "IMAGEGEN_DEBUG")]
    /// Enable debug logging. Env: IMAGEGEN_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "5000", env = "IMAGEGEN_PORT")]
    /// http listener, defaults to `5000`.
    /// Env: IMAGEGEN_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "IMAGEGEN_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: IMAGEGEN_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, short, default_value_os_t = IMAGE_DIR.clone(), env = "IMAGEGEN_IMAGE_DIR")]
    /// Where generated images are written and served from.
    /// Env: IMAGEGEN_IMAGE_DIR
    pub image_dir: PathBuf,

    #[clap(long, default_value = DEFAULT_LOG_FILE, env = "IMAGEGEN_LOG_FILE")]
    /// Text log file, appended to alongside console output.
    /// Env: IMAGEGEN_LOG_FILE
    pub log_file: PathBuf,

    #[clap(long, env = "HF_API_TOKEN", hide_env_values = true)]
    /// Bearer token for the inference API. Env: HF_API_TOKEN
    pub hf_api_token: String,

    #[clap(long, default_value = DEFAULT_INFERENCE_URL, env = "IMAGEGEN_INFERENCE_URL")]
    /// Text-to-image inference endpoint.
    /// Env: IMAGEGEN_INFERENCE_URL
    pub inference_url: url::Url,

    #[clap(long, default_value = DEFAULT_TRANSLATE_URL, env = "IMAGEGEN_TRANSLATE_URL")]
    /// Translation endpoint.
    /// Env: IMAGEGEN_TRANSLATE_URL
    pub translate_url: url::Url,

    #[clap(long, default_value_t = DEFAULT_TRANSLATE_TIMEOUT_SECONDS, env = "IMAGEGEN_TRANSLATE_TIMEOUT")]
    /// Seconds to wait for the translation service.
    /// Env: IMAGEGEN_TRANSLATE_TIMEOUT
    pub translate_timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cli = CliOptions::try_parse_from(["imagegen", "--hf-api-token", "hf_test"])
            .expect("parse args");
        assert_eq!(cli.port.get(), 5000);
        assert_eq!(cli.listen_address, "127.0.0.1");
        assert_eq!(cli.image_dir, *IMAGE_DIR);
        assert_eq!(cli.inference_url.as_str(), DEFAULT_INFERENCE_URL);
        assert_eq!(cli.translate_timeout, DEFAULT_TRANSLATE_TIMEOUT_SECONDS);
    }
}
