//! The generation request pipeline: translate, enhance, generate, save.

use std::fmt;

use axum::http::StatusCode;
use tracing::{debug, error, info};

use crate::constants::ENGLISH;
use crate::generator::ImageGenerator;
use crate::prompt::enhance_prompt;
use crate::storage::{ImageStore, SavedImage};
use crate::translate::Translator;

/// One form submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Text exactly as the user typed it.
    pub text: String,
    /// Source language code of `text`.
    pub language: String,
}

impl GenerationRequest {
    /// Builds a request from optional form fields.
    ///
    /// `text` is required; `language` falls back to English when missing or blank.
    pub fn from_form(text: Option<String>, language: Option<String>) -> Result<Self, PipelineError> {
        let text = text.ok_or(PipelineError::MalformedRequest)?;
        let language = language
            .map(|language| language.trim().to_string())
            .filter(|language| !language.is_empty())
            .unwrap_or_else(|| ENGLISH.to_string());
        Ok(Self { text, language })
    }
}

/// Where a request is in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Form fields extracted.
    Received,
    /// Converting the text to English.
    Translating,
    /// Appending quality tags.
    Enhancing,
    /// Waiting on the inference API.
    Generating,
    /// Writing the image to disk.
    Saving,
    /// Image saved.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Translating => "translating",
            Self::Enhancing => "enhancing",
            Self::Generating => "generating",
            Self::Saving => "saving",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// User-facing failure of a pipeline run. Causes are only logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineError {
    /// The form was missing the text field or could not be parsed.
    MalformedRequest,
    /// The text could not be translated.
    TranslationFailed,
    /// The inference API did not produce an image.
    GenerationFailed,
    /// The image could not be written to disk.
    SaveFailed,
    /// Anything else, such as a panic inside the pipeline.
    Unexpected,
}

impl PipelineError {
    /// Message shown on the form page.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MalformedRequest => "Please enter some text to generate an image.",
            Self::TranslationFailed => "Failed to translate text. Please try again.",
            Self::GenerationFailed => {
                "Failed to generate image. Please try again in a few seconds."
            }
            Self::SaveFailed => "Failed to save generated image. Please try again.",
            Self::Unexpected => "An unexpected error occurred. Please try again.",
        }
    }

    /// Status code the page is rendered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequest => StatusCode::BAD_REQUEST,
            Self::TranslationFailed | Self::GenerationFailed => StatusCode::BAD_GATEWAY,
            Self::SaveFailed | Self::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for PipelineError {}

/// Runs one request at a time through the external services.
#[derive(Clone, Debug)]
pub struct Pipeline {
    translator: Translator,
    generator: ImageGenerator,
    store: ImageStore,
}

impl Pipeline {
    /// Wires the pipeline together.
    pub fn new(translator: Translator, generator: ImageGenerator, store: ImageStore) -> Self {
        Self {
            translator,
            generator,
            store,
        }
    }

    /// Where images end up.
    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    /// Runs every stage in order, stopping at the first failure.
    pub async fn run(&self, request: &GenerationRequest) -> Result<SavedImage, PipelineError> {
        let mut stage = Stage::Received;
        info!(
            "Received generation request - Text: {}, Language: {}",
            request.text, request.language
        );

        stage = advance(stage, Stage::Translating);
        let prompt = self
            .translator
            .translate(&request.text, &request.language)
            .await
            .map_err(|err| {
                error!("Translation failed: {err}");
                PipelineError::TranslationFailed
            })?;
        if prompt.is_empty() {
            error!("Translation failed: nothing to translate");
            return Err(PipelineError::TranslationFailed);
        }
        info!("Using prompt: {prompt}");

        stage = advance(stage, Stage::Enhancing);
        let prompt = enhance_prompt(&prompt);
        info!("Enhanced prompt: {prompt}");

        stage = advance(stage, Stage::Generating);
        let image = self.generator.generate(&prompt).await.map_err(|err| {
            error!("Image generation failed: {err}");
            PipelineError::GenerationFailed
        })?;

        stage = advance(stage, Stage::Saving);
        let saved = self.store.save(&image, &request.text).await.map_err(|err| {
            error!("Failed to save image: {err}");
            PipelineError::SaveFailed
        })?;

        advance(stage, Stage::Done);
        Ok(saved)
    }

    /// Like [`Pipeline::run`], but on its own task so a panic becomes
    /// [`PipelineError::Unexpected`] instead of reaching the caller.
    pub async fn run_guarded(&self, request: GenerationRequest) -> Result<SavedImage, PipelineError> {
        let pipeline = self.clone();
        guarded(async move { pipeline.run(&request).await }).await
    }
}

async fn guarded<F>(work: F) -> Result<SavedImage, PipelineError>
where
    F: Future<Output = Result<SavedImage, PipelineError>> + Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(result) => result,
        Err(err) => {
            error!("Unexpected error in generation pipeline: {err}");
            Err(PipelineError::Unexpected)
        }
    }
}

fn advance(from: Stage, to: Stage) -> Stage {
    debug!("Pipeline stage {from} -> {to}");
    to
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedEndpoint, png_bytes, translation_body};
    use std::time::Duration;

    struct Harness {
        translator: ScriptedEndpoint,
        inference: ScriptedEndpoint,
        pipeline: Pipeline,
        _dir: tempfile::TempDir,
    }

    async fn harness(
        translation: Vec<(StatusCode, Vec<u8>)>,
        inference: Vec<(StatusCode, Vec<u8>)>,
    ) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let image_dir = dir.path().join("images");
        harness_with_dir(translation, inference, dir, image_dir).await
    }

    async fn harness_with_dir(
        translation: Vec<(StatusCode, Vec<u8>)>,
        inference: Vec<(StatusCode, Vec<u8>)>,
        dir: tempfile::TempDir,
        image_dir: std::path::PathBuf,
    ) -> Harness {
        let translator = ScriptedEndpoint::start(translation).await;
        let inference = ScriptedEndpoint::start(inference).await;
        let pipeline = Pipeline::new(
            Translator::new(translator.url.clone(), Duration::from_secs(5)).expect("translator"),
            ImageGenerator::new(inference.url.clone(), "hf_test")
                .expect("generator")
                .with_retry_delay(Duration::from_millis(10)),
            ImageStore::new(image_dir),
        );
        Harness {
            translator,
            inference,
            pipeline,
            _dir: dir,
        }
    }

    fn request(text: &str, language: &str) -> GenerationRequest {
        GenerationRequest::from_form(Some(text.to_string()), Some(language.to_string()))
            .expect("valid request")
    }

    #[test]
    fn missing_text_is_malformed() {
        assert_eq!(
            GenerationRequest::from_form(None, Some("es".to_string())),
            Err(PipelineError::MalformedRequest)
        );
    }

    #[test]
    fn language_defaults_to_english() {
        for language in [None, Some(String::new()), Some("  ".to_string())] {
            let request = GenerationRequest::from_form(Some("hi".to_string()), language)
                .expect("request");
            assert_eq!(request.language, "en");
        }
    }

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(
            PipelineError::MalformedRequest.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PipelineError::GenerationFailed.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            PipelineError::SaveFailed.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn english_request_skips_translation() {
        let h = harness(
            vec![(StatusCode::OK, translation_body("unused", "unused"))],
            vec![(StatusCode::OK, png_bytes(4, 4))],
        )
        .await;

        let saved = h
            .pipeline
            .run(&request("Hello World this is long", "en"))
            .await
            .expect("saved");

        assert!(saved.filename.starts_with("Hello Worl_"));
        assert!(saved.path.exists());
        assert_eq!(h.translator.hits(), 0);

        let body: serde_json::Value =
            serde_json::from_slice(&h.inference.requests()[0].body).expect("json");
        assert_eq!(
            body["inputs"],
            "Hello World this is long, highly detailed, photorealistic, 8k resolution, professional photography, natural lighting"
        );
    }

    #[tokio::test]
    async fn translated_text_is_sent_but_raw_text_names_the_file() {
        let h = harness(
            vec![(StatusCode::OK, translation_body("A cat", "Un gato"))],
            vec![(StatusCode::OK, png_bytes(4, 4))],
        )
        .await;

        let saved = h
            .pipeline
            .run(&request("Un gato", "es"))
            .await
            .expect("saved");

        assert!(saved.filename.starts_with("Un gato_"));
        let body: serde_json::Value =
            serde_json::from_slice(&h.inference.requests()[0].body).expect("json");
        assert!(
            body["inputs"]
                .as_str()
                .expect("inputs")
                .starts_with("A cat, highly detailed")
        );
    }

    #[tokio::test]
    async fn translation_failure_stops_before_generation() {
        let h = harness(
            vec![(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())],
            vec![(StatusCode::OK, png_bytes(4, 4))],
        )
        .await;

        let err = h
            .pipeline
            .run(&request("Bonjour", "fr"))
            .await
            .expect_err("failure");
        assert_eq!(err, PipelineError::TranslationFailed);
        assert_eq!(h.inference.hits(), 0);
    }

    #[tokio::test]
    async fn empty_text_is_a_translation_failure() {
        let h = harness(
            vec![(StatusCode::OK, translation_body("unused", "unused"))],
            vec![(StatusCode::OK, png_bytes(4, 4))],
        )
        .await;

        let err = h.pipeline.run(&request("", "en")).await.expect_err("failure");
        assert_eq!(err, PipelineError::TranslationFailed);
        assert_eq!(h.inference.hits(), 0);
    }

    #[tokio::test]
    async fn two_model_loading_responses_fail_generation() {
        let h = harness(
            vec![(StatusCode::OK, translation_body("unused", "unused"))],
            vec![(StatusCode::SERVICE_UNAVAILABLE, Vec::new())],
        )
        .await;

        let err = h
            .pipeline
            .run(&request("lighthouse", "en"))
            .await
            .expect_err("failure");
        assert_eq!(err, PipelineError::GenerationFailed);
        assert_eq!(h.inference.hits(), 2);
    }

    #[tokio::test]
    async fn non_image_response_fails_generation() {
        let h = harness(
            vec![(StatusCode::OK, translation_body("unused", "unused"))],
            vec![(StatusCode::OK, b"{\"not\":\"an image\"}".to_vec())],
        )
        .await;

        let err = h
            .pipeline
            .run_guarded(request("lighthouse", "en"))
            .await
            .expect_err("failure");
        assert_eq!(err, PipelineError::GenerationFailed);
        assert!(!h.pipeline.store().dir().exists());
    }

    #[tokio::test]
    async fn unwritable_image_dir_is_a_save_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, b"file, not a directory").expect("write blocker");
        let h = harness_with_dir(
            vec![(StatusCode::OK, translation_body("unused", "unused"))],
            vec![(StatusCode::OK, png_bytes(4, 4))],
            dir,
            blocker.join("images"),
        )
        .await;

        let err = h
            .pipeline
            .run(&request("lighthouse", "en"))
            .await
            .expect_err("failure");
        assert_eq!(err, PipelineError::SaveFailed);
        assert_eq!(h.inference.hits(), 1);
    }

    async fn exploding_stage() -> Result<SavedImage, PipelineError> {
        panic!("stage blew up")
    }

    #[tokio::test]
    async fn panicking_work_is_unexpected() {
        let err = guarded(exploding_stage())
            .await
            .expect_err("failure");
        assert_eq!(err, PipelineError::Unexpected);
    }
}
