//! Run the generation pipeline once from the command line.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use imagegen::config::setup_logging;
use imagegen::constants::{
    DEFAULT_INFERENCE_URL, DEFAULT_TRANSLATE_TIMEOUT_SECONDS, DEFAULT_TRANSLATE_URL, ENGLISH,
    IMAGE_DIR,
};
use imagegen::generator::ImageGenerator;
use imagegen::pipeline::{GenerationRequest, Pipeline};
use imagegen::storage::ImageStore;
use imagegen::translate::Translator;
use std::path::PathBuf;
use std::time::Duration;

/// Turn a text description into an image.
///
/// Minimal UX:
///   generate_image "un zorro en la nieve" --language es
#[derive(Parser, Debug)]
#[command(name = "generate_image")]
struct Args {
    /// What the image should show
    text: String,

    /// Source language of the text
    #[arg(long, short, default_value = ENGLISH)]
    language: String,

    /// Hugging Face API token
    #[arg(required = true, long, env = "HF_API_TOKEN", hide_env_values = true)]
    hf_api_token: String,

    /// Inference endpoint
    #[arg(long, default_value = DEFAULT_INFERENCE_URL)]
    inference_url: url::Url,

    /// Translation endpoint
    #[arg(long, default_value = DEFAULT_TRANSLATE_URL)]
    translate_url: url::Url,

    /// Seconds to wait for the translation service
    #[arg(long, default_value_t = DEFAULT_TRANSLATE_TIMEOUT_SECONDS)]
    translate_timeout: u64,

    /// Output directory
    #[arg(long, default_value_os_t = IMAGE_DIR.clone(), env = "IMAGEGEN_IMAGE_DIR")]
    out_dir: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug, None).map_err(|err| anyhow!("Failed to set up logging: {err}"))?;

    let translator = Translator::new(
        args.translate_url,
        Duration::from_secs(args.translate_timeout),
    )
    .context("Failed to build translation client")?;
    let generator = ImageGenerator::new(args.inference_url, &args.hf_api_token)
        .context("Failed to build inference client")?;
    let pipeline = Pipeline::new(translator, generator, ImageStore::new(args.out_dir));

    let request = GenerationRequest::from_form(Some(args.text), Some(args.language))?;
    let saved = pipeline.run(&request).await?;

    println!("{}", saved.path.display());
    Ok(())
}
