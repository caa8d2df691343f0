//! Prompt enhancement

/// Descriptors appended to every prompt to bias the output towards realism.
pub const QUALITY_TAGS: [&str; 5] = [
    "highly detailed",
    "photorealistic",
    "8k resolution",
    "professional photography",
    "natural lighting",
];

/// Appends the [`QUALITY_TAGS`] to the prompt, comma separated.
pub fn enhance_prompt(prompt: &str) -> String {
    format!("{prompt}, {}", QUALITY_TAGS.join(", "))
}
