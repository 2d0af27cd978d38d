#[cfg(test)]
#[path = "model_hint_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;

/// Inputs longer than this many characters are treated as complex.
pub const LONG_INPUT_CHARS: usize = 200;

const COMPLEX_KEYWORDS: [&str; 22] = [
    "algorithm",
    "analyse",
    "analysis",
    "analyze",
    "architecture",
    "code",
    "compare",
    "comparison",
    "debug",
    "design",
    "difference between",
    "evaluate",
    "explain",
    "function",
    "implement",
    "optimize",
    "pros and cons",
    "refactor",
    "reason",
    "script",
    "step by step",
    "trade-off",
];

// Whole words only, so "decode" or "dysfunction" stay simple.
static COMPLEX_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    let alternatives = COMPLEX_KEYWORDS
        .iter()
        .map(|keyword| return regex::escape(keyword))
        .collect::<Vec<String>>()
        .join("|");

    return Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).ok();
});

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ModelTier {
    Simple,
    Complex,
}

/// Advisory model tier for an input. Only ever changes a suggestion shown
/// to the user, never whether a send is allowed.
pub fn suggest(text: &str, has_attachments: bool) -> ModelTier {
    if has_attachments {
        return ModelTier::Complex;
    }

    if text.chars().count() > LONG_INPUT_CHARS {
        return ModelTier::Complex;
    }

    if let Some(pattern) = COMPLEX_PATTERN.as_ref() {
        if pattern.is_match(text) {
            return ModelTier::Complex;
        }
    }

    return ModelTier::Simple;
}
