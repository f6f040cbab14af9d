//! Thematic analysis of finished conversations.
//!
//! A pure, read-only pass over a [`Transcript`]: nothing here touches the
//! driver or the store. Categories and their marker words are supplied by
//! the caller as a [`ThemeCatalog`].

use attractor_session::Transcript;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Category name -> marker substrings.
pub type ThemeCatalog = BTreeMap<String, BTreeSet<String>>;

/// Minimum number of turns before the length trend is reported.
pub const LENGTH_TREND_MIN_TURNS: usize = 10;

/// Average message length in the first and last third of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthTrend {
    /// Mean characters per turn over the opening third.
    pub first_third_avg: f64,
    /// Mean characters per turn over the closing third.
    pub last_third_avg: f64,
}

impl LengthTrend {
    /// Closing average minus opening average.
    pub fn change(&self) -> f64 {
        self.last_third_avg - self.first_third_avg
    }
}

/// Everything [`analyze`] measures about one conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThematicReport {
    /// Number of recorded turns.
    pub turns: usize,
    /// Distinct markers found, per category.
    pub category_counts: BTreeMap<String, usize>,
    /// Characters outside ASCII, mostly emoji and typographic symbols.
    pub non_ascii_chars: usize,
    /// Present once the conversation has [`LENGTH_TREND_MIN_TURNS`] turns.
    pub length_trend: Option<LengthTrend>,
}

fn full_text(transcript: &Transcript) -> String {
    transcript
        .turns()
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// For each category, how many of its markers occur anywhere in the
/// conversation. Matching is case-insensitive substring containment; a
/// marker counts once however often it appears.
pub fn count_markers(transcript: &Transcript, catalog: &ThemeCatalog) -> BTreeMap<String, usize> {
    count_in(&full_text(transcript), catalog)
}

fn count_in(text: &str, catalog: &ThemeCatalog) -> BTreeMap<String, usize> {
    catalog
        .iter()
        .map(|(category, markers)| {
            let hits = markers
                .iter()
                .filter(|m| text.contains(m.to_lowercase().as_str()))
                .count();
            (category.clone(), hits)
        })
        .collect()
}

fn average_chars(texts: &[&str]) -> f64 {
    let total: usize = texts.iter().map(|t| t.chars().count()).sum();
    total as f64 / texts.len() as f64
}

/// Length of the first vs last third of the turns, once there are enough of them.
///
/// The head window rounds down and the tail window rounds up, so with 10
/// turns the first 3 are compared against the last 4.
pub fn length_trend(transcript: &Transcript) -> Option<LengthTrend> {
    let texts: Vec<&str> = transcript.turns().iter().map(|t| t.text.as_str()).collect();
    if texts.len() < LENGTH_TREND_MIN_TURNS {
        return None;
    }
    let head = texts.len() / 3;
    let tail = texts.len().div_ceil(3);
    Some(LengthTrend {
        first_third_avg: average_chars(&texts[..head]),
        last_third_avg: average_chars(&texts[texts.len() - tail..]),
    })
}

/// Runs every measure over `transcript`.
pub fn analyze(transcript: &Transcript, catalog: &ThemeCatalog) -> ThematicReport {
    let text = full_text(transcript);
    ThematicReport {
        turns: transcript.len(),
        category_counts: count_in(&text, catalog),
        non_ascii_chars: text.chars().filter(|c| !c.is_ascii()).count(),
        length_trend: length_trend(transcript),
    }
}

impl fmt::Display for ThematicReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Thematic analysis ({} turns):", self.turns)?;
        for (category, count) in &self.category_counts {
            writeln!(f, "  {category}: {count}")?;
        }
        writeln!(f)?;
        writeln!(f, "Emoji/Unicode usage: {} characters", self.non_ascii_chars)?;
        if let Some(trend) = &self.length_trend {
            writeln!(f)?;
            writeln!(f, "Message length evolution:")?;
            writeln!(f, "  First third average: {:.0} characters", trend.first_third_avg)?;
            writeln!(f, "  Last third average: {:.0} characters", trend.last_third_avg)?;
            writeln!(f, "  Change: {:+.0} characters", trend.change())?;
        }
        Ok(())
    }
}
