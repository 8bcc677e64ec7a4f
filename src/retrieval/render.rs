//! Turns ranked matches into the numbered passage blob handed to callers.

use crate::config::RetrievalConfig;
use crate::index::Match;

/// Returned in place of passages when the index had nothing to offer.
pub const NO_MATCHES: &str = "<nomatches>";

/// Joins consecutive passages. The leading period lands after the previous
/// passage's text.
pub const SEPARATOR: &str = ". \n\n";

/// Labels and fallbacks used when rendering passages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStyle {
    pub label: String,
    pub placeholder: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            label: "Clinical Finding".into(),
            placeholder: "No chunk content".into(),
        }
    }
}

impl From<&RetrievalConfig> for RenderStyle {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            label: config.finding_label.clone(),
            placeholder: config.placeholder.clone(),
        }
    }
}

/// Render matches as `"{label} {k}: \n {chunk}"` entries joined by [`SEPARATOR`].
pub fn render(matches: &[Match], style: &RenderStyle) -> String {
    if matches.is_empty() {
        return NO_MATCHES.to_string();
    }

    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let text = m.chunk().unwrap_or(style.placeholder.as_str());
            format!("{} {}: \n {}", style.label, i + 1, text)
        })
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}
