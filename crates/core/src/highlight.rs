//! Evidence highlight resolution
//!
//! Maps a risk's adversarial highlight back onto its evidence snippet for
//! display. The reasoning service does not guarantee that the highlight is a
//! substring of the evidence, so resolution always has a lossless fallback.

use serde::{Deserialize, Serialize};

use crate::risk::RiskRecord;

/// An ordered piece of evidence text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(rename = "isHighlighted")]
    pub highlighted: bool,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlighted: false,
        }
    }

    pub fn highlight(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlighted: true,
        }
    }
}

/// Split `evidence` around the first occurrence of `phrase`
///
/// Returns `[before, phrase, after]` when the phrase is non-empty and present
/// (`before`/`after` may be empty strings), otherwise a single unhighlighted
/// segment holding the whole evidence. Concatenating the segment texts always
/// reproduces `evidence`.
pub fn resolve(evidence: &str, phrase: &str) -> Vec<Segment> {
    if phrase.is_empty() {
        return vec![Segment::plain(evidence)];
    }

    match evidence.find(phrase) {
        Some(start) => {
            let end = start + phrase.len();
            vec![
                Segment::plain(&evidence[..start]),
                Segment::highlight(&evidence[start..end]),
                Segment::plain(&evidence[end..]),
            ]
        }
        None => vec![Segment::plain(evidence)],
    }
}

/// Evidence segments for a risk under the current highlight mode
///
/// With highlight mode off the evidence is rendered as one plain segment.
pub fn render_evidence(risk: &RiskRecord, highlight_mode: bool) -> Vec<Segment> {
    if !highlight_mode {
        return vec![Segment::plain(risk.evidence_snippet.as_str())];
    }

    if !risk.highlight_in_evidence() {
        tracing::debug!(
            risk_id = %risk.id,
            "Adversarial highlight not found in evidence, rendering unhighlighted"
        );
        return vec![Segment::plain(risk.evidence_snippet.as_str())];
    }

    resolve(&risk.evidence_snippet, &risk.adversarial_highlight)
}
