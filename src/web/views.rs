use super::prelude::*;
use crate::constants::ENGLISH;
use crate::languages;
use crate::pipeline::{GenerationRequest, PipelineError};
use axum::extract::Form;
use axum::extract::rejection::FormRejection;

#[derive(Clone, Debug)]
pub(crate) struct LanguageOption {
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) selected: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    pub(crate) text: String,
    pub(crate) languages: Vec<LanguageOption>,
    pub(crate) language_name: String,
    pub(crate) has_error: bool,
    pub(crate) error: String,
    pub(crate) has_image: bool,
    pub(crate) image_path: String,
}

impl IndexTemplate {
    fn new(text: &str, language: &str) -> Self {
        let languages = match languages::languages() {
            Ok(map) => map
                .iter()
                .map(|(code, name)| LanguageOption {
                    code: code.clone(),
                    name: name.clone(),
                    selected: code == language,
                })
                .collect(),
            Err(err) => {
                warn!("{err}");
                vec![LanguageOption {
                    code: ENGLISH.to_string(),
                    name: "English".to_string(),
                    selected: true,
                }]
            }
        };
        Self {
            text: text.to_string(),
            languages,
            language_name: languages::language_name(language)
                .unwrap_or(language)
                .to_string(),
            has_error: false,
            error: String::new(),
            has_image: false,
            image_path: String::new(),
        }
    }

    fn with_error(mut self, err: PipelineError) -> Self {
        self.has_error = true;
        self.error = err.user_message().to_string();
        self
    }

    fn with_image(mut self, image_path: String) -> Self {
        self.has_image = true;
        self.image_path = image_path;
        self
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct GenerateForm {
    text: Option<String>,
    language: Option<String>,
}

/// handles the / GET
pub(crate) async fn root_handler() -> IndexTemplate {
    IndexTemplate::new("", ENGLISH)
}

/// handles the /generate POST
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    form: Result<Form<GenerateForm>, FormRejection>,
) -> (StatusCode, IndexTemplate) {
    let request = match form {
        Ok(Form(form)) => GenerationRequest::from_form(form.text, form.language),
        Err(rejection) => {
            warn!("Rejected generation form: {rejection}");
            Err(PipelineError::MalformedRequest)
        }
    };

    let request = match request {
        Ok(request) => request,
        Err(err) => {
            error!("Malformed generation request");
            return (err.status_code(), IndexTemplate::new("", ENGLISH).with_error(err));
        }
    };

    let page = IndexTemplate::new(&request.text, &request.language);
    match state.pipeline.run_guarded(request).await {
        Ok(saved) => {
            let image_path = saved.url_path();
            info!("Rendering generated image {image_path}");
            (StatusCode::OK, page.with_image(image_path))
        }
        Err(err) => (err.status_code(), page.with_error(err)),
    }
}
