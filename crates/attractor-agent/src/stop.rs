//! Stop-phrase detection.

/// Natural-language phrases that end a conversation early.
///
/// Matching is case-insensitive substring containment; nothing else is
/// inferred about the phrases.
#[derive(Debug, Clone, Default)]
pub struct StopPhrases {
    phrases: Vec<String>,
    lowered: Vec<String>,
}

impl StopPhrases {
    /// Builds the matcher; matching ignores case.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phrases: Vec<String> = phrases.into_iter().map(Into::into).collect();
        let lowered = phrases.iter().map(|p| p.to_lowercase()).collect();
        Self { phrases, lowered }
    }

    /// The configured phrase found in `text`, if any.
    pub fn matching(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.lowered
            .iter()
            .position(|p| text.contains(p.as_str()))
            .map(|i| self.phrases[i].as_str())
    }

    /// `true` when `text` contains any configured phrase.
    pub fn is_stopping(&self, text: &str) -> bool {
        self.matching(text).is_some()
    }

    /// The phrases as configured.
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// `true` when no phrase is configured.
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}
