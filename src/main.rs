use std::time::Duration;

use clap::Parser;
use imagegen::config::setup_logging;
use imagegen::generator::ImageGenerator;
use imagegen::pipeline::Pipeline;
use imagegen::storage::ImageStore;
use imagegen::translate::Translator;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = imagegen::cli::CliOptions::parse();

    if setup_logging(cli.debug, Some(cli.log_file.as_path())).is_err() {
        return;
    }

    if let Err(err) = imagegen::languages::init() {
        error!("Failed to load languages: {}", err);
        return;
    }

    let translator = match Translator::new(
        cli.translate_url.clone(),
        Duration::from_secs(cli.translate_timeout),
    ) {
        Ok(translator) => translator,
        Err(err) => {
            error!("Failed to build translation client: {}", err);
            return;
        }
    };
    let generator = match ImageGenerator::new(cli.inference_url.clone(), &cli.hf_api_token) {
        Ok(generator) => generator,
        Err(err) => {
            error!("Failed to build inference client: {}", err);
            return;
        }
    };
    let pipeline = Pipeline::new(translator, generator, ImageStore::new(cli.image_dir.clone()));

    if let Err(err) = imagegen::web::setup_server(&cli.listen_address, cli.port, pipeline).await {
        error!("Application error: {}", err);
    }
}
