//! Source languages offered on the form, loaded from a bundled JSON file.

use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Errors returned when loading language metadata.
#[derive(Debug)]
pub enum LanguagesError {
    /// The JSON payload could not be parsed.
    Parse(serde_json::Error),
    /// A language code was empty or contained whitespace.
    InvalidCode(String),
    /// The metadata has not been initialized.
    NotInitialized,
}

impl std::fmt::Display for LanguagesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Failed to parse language JSON: {err}"),
            Self::InvalidCode(code) => write!(f, "Invalid language code in JSON: {code:?}"),
            Self::NotInitialized => write!(f, "Language metadata has not been initialized"),
        }
    }
}

impl std::error::Error for LanguagesError {}

static LANGUAGES: OnceLock<BTreeMap<String, String>> = OnceLock::new();

fn parse(raw: &str) -> Result<BTreeMap<String, String>, LanguagesError> {
    let parsed: BTreeMap<String, String> =
        serde_json::from_str(raw).map_err(LanguagesError::Parse)?;
    if let Some(code) = parsed
        .keys()
        .find(|code| code.is_empty() || code.contains(char::is_whitespace))
    {
        return Err(LanguagesError::InvalidCode(code.clone()));
    }
    Ok(parsed)
}

/// Parse the bundled language list; called during startup.
pub fn init() -> Result<(), LanguagesError> {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/languages.json"));
    let parsed = parse(raw)?;
    let _ = LANGUAGES.set(parsed);
    Ok(())
}

/// Returns the display name for a language code.
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES.get()?.get(code).map(String::as_str)
}

/// Returns every known language, keyed by code.
pub fn languages() -> Result<&'static BTreeMap<String, String>, LanguagesError> {
    LANGUAGES.get().ok_or(LanguagesError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_list_includes_english() {
        init().expect("init languages");
        assert_eq!(language_name("en"), Some("English"));
        assert_eq!(language_name("es"), Some("Spanish"));
        assert!(languages().expect("languages").len() > 10);
        assert_eq!(language_name("xx"), None);
    }

    #[test]
    fn rejects_blank_codes() {
        let err = parse(r#"{"": "Nothing"}"#).expect_err("blank code");
        assert!(matches!(err, LanguagesError::InvalidCode(_)));
        assert!(matches!(parse("[]"), Err(LanguagesError::Parse(_))));
    }
}
