use regex::{Regex, RegexBuilder};

use crate::internal::InternalRule;

/// Case-insensitive literal substring filter
///
/// The pattern is escaped before compilation, so characters such as `(` or
/// `*` only ever match themselves.
#[derive(Clone, Default)]
pub struct TextFilter {
    /// Compiled matcher (None = inactive)
    regex: Option<Regex>,

    /// Trimmed filter text
    pattern: String,
}

impl TextFilter {
    /// Create a new filter from user input. Surrounding whitespace is
    /// ignored and an empty result yields an inactive filter.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let pattern = pattern.trim();
        let regex = if pattern.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&regex::escape(pattern))
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self {
            regex,
            pattern: pattern.to_string(),
        })
    }

    /// A filter that matches everything
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Check if text contains the pattern
    pub fn matches(&self, text: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(text),
            None => true,
        }
    }

    /// Find all match positions in a string (for highlighting)
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.regex {
            Some(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
            None => Vec::new(),
        }
    }

    /// Get the trimmed pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_active(&self) -> bool {
        self.regex.is_some()
    }
}

impl std::fmt::Debug for TextFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextFilter")
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// Everything that decides whether a message is shown
#[derive(Clone, Debug, Default)]
pub struct FilterState {
    pub text: TextFilter,
    pub hide_internal: bool,
}

impl FilterState {
    /// Check whether a message body passes both filters
    pub fn should_display(&self, content: &str, rule: &InternalRule) -> bool {
        if !self.text.matches(content) {
            return false;
        }
        if self.hide_internal && rule.is_internal_request(content) {
            return false;
        }
        true
    }

    /// True when neither filter removes anything
    pub fn is_empty(&self) -> bool {
        !self.text.is_active() && !self.hide_internal
    }
}
