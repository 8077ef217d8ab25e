//! Section-based builder for generated system prompts.

/// Assembles a system prompt from a preamble and titled sections.
///
/// Sections are joined with blank lines; a section with empty content is
/// dropped.
///
/// ```
/// use croqli::prompt::SystemPromptBuilder;
///
/// let prompt = SystemPromptBuilder::new("You are a CLI assistant.")
///     .section("System", "linux / bash")
///     .section_opt("History", None::<String>)
///     .build();
///
/// assert!(prompt.contains("## System\n\nlinux / bash"));
/// assert!(!prompt.contains("History"));
/// ```
pub struct SystemPromptBuilder {
    sections: Vec<String>,
}

impl SystemPromptBuilder {
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            sections: vec![preamble.into()],
        }
    }

    pub fn section(mut self, heading: &str, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.trim().is_empty() {
            self.sections.push(format!("## {heading}\n\n{}", content.trim_end()));
        }
        self
    }

    pub fn section_opt(self, heading: &str, content: Option<impl Into<String>>) -> Self {
        match content {
            Some(c) => self.section(heading, c),
            None => self,
        }
    }

    /// Append text with no heading.
    pub fn raw(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.sections.push(text);
        }
        self
    }

    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_in_order_and_blank_ones_skipped() {
        let prompt = SystemPromptBuilder::new("Preamble")
            .section("One", "first")
            .section("Empty", "   ")
            .raw("Trailing note")
            .build();
        assert_eq!(prompt, "Preamble\n\n## One\n\nfirst\n\nTrailing note");
    }
}
