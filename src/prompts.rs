//! Instructions sent to the vision model.
//!
//! Callers can override the prompt via [`crate::config::ProcessConfig::prompt`];
//! the constant here is the default.

/// Default instruction sent alongside every extracted image.
pub const IMAGE_DESCRIPTION_PROMPT: &str = "Describe this image in detail in English.
Include all visible text, diagrams, charts, formulas, and visual elements.
If there are any labels, captions, or annotations, include them in your description.
Be thorough and accurate in describing what you see.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_asks_for_visible_text() {
        assert!(IMAGE_DESCRIPTION_PROMPT.starts_with("Describe this image"));
        assert!(IMAGE_DESCRIPTION_PROMPT.contains("visible text"));
    }
}
