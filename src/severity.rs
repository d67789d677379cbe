// 🚦 Severity Bands - Rules as Data
//
// Risk score → band → summary text. Band selection is deterministic, the
// phrase within a band is random.
//
//   score < 40        → Likely Noise
//   40 <= score < 80  → Likely Signal
//   score >= 80       → Critical
//
// The same boundaries drive the critical banner and row colouring.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lowest score in the Signal band
pub const SIGNAL_THRESHOLD: u8 = 40;

/// Lowest score in the Critical band
pub const CRITICAL_THRESHOLD: u8 = 80;

const NOISE_PHRASES: [&str; 5] = [
    "Routine activity with no correlated indicators",
    "Matches benign baseline behaviour",
    "Single low-confidence hit from an automated feed",
    "Known false-positive pattern",
    "Insufficient evidence to warrant review",
];

const SIGNAL_PHRASES: [&str; 5] = [
    "Partial match against watchlist attributes",
    "Anomalous pattern worth a second look",
    "Multiple weak indicators in a short window",
    "Behaviour deviates from historical baseline",
    "Linked to previously flagged activity",
];

const CRITICAL_PHRASES: [&str; 5] = [
    "Strong match against an active watchlist entry",
    "Coordinated activity across multiple sources",
    "High-confidence model detection",
    "Indicators consistent with a known threat actor",
    "Immediate analyst review recommended",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Noise,
    Signal,
    Critical,
}

impl Severity {
    pub fn from_score(score: u8) -> Self {
        if score >= CRITICAL_THRESHOLD {
            Severity::Critical
        } else if score >= SIGNAL_THRESHOLD {
            Severity::Signal
        } else {
            Severity::Noise
        }
    }

    /// Summary prefix, without the colon
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Noise => "Likely Noise",
            Severity::Signal => "Likely Signal",
            Severity::Critical => "Critical",
        }
    }

    pub fn phrases(&self) -> &'static [&'static str; 5] {
        match self {
            Severity::Noise => &NOISE_PHRASES,
            Severity::Signal => &SIGNAL_PHRASES,
            Severity::Critical => &CRITICAL_PHRASES,
        }
    }
}

/// Build the summary line for a risk score: "<band label>: <phrase>"
pub fn summary<R: Rng + ?Sized>(risk_score: u8, rng: &mut R) -> String {
    let severity = Severity::from_score(risk_score);
    let phrase = severity
        .phrases()
        .choose(rng)
        .copied()
        .unwrap_or_default();
    format!("{}: {}", severity.label(), phrase)
}
