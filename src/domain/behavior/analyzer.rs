//! Heuristic behavior signal extraction.
//!
//! Every detector is a pure predicate over the filtered user texts. The
//! patterns target Dutch phrasing with a few common English variants.

use once_cell::sync::Lazy;
use regex::Regex;

use super::profile::{BehaviorProfile, ConfidenceLevel, SpeedPreference, Tone};
use crate::domain::conversation::ConversationTurn;

/// Number of most recent turns inspected.
pub const DEFAULT_BEHAVIOR_WINDOW: usize = 10;

/// Clarification phrases needed before a user counts as confused.
const CONFUSION_THRESHOLD: usize = 3;

/// Word count above which a message counts as detailed.
const DETAILED_MESSAGE_WORDS: usize = 20;

/// Character length under which a negative reply counts as terse.
const TERSE_MESSAGE_CHARS: usize = 20;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("behavior pattern must compile")
}

static OVERWHELM_MARKERS: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"(?i)(te veel|teveel|overweldig|door de bomen|weet het (echt )?niet meer|duizelt|\bpff+|\bhelp\b|ingewikkeld|too much|overwhelm)",
    )
});

static TERSE_NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    pattern(r"(?i)^\s*(nee|geen idee|weet ik niet|weet niet|geen flauw idee|pff+|ugh|no)\b")
});

static CLARIFICATION: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"(?i)(wat bedoel je|hoe bedoel je|wat betekent|snap (het|ik) niet|begrijp (het|ik) niet|onduidelijk|kun je dat uitleggen|wat is een|what do you mean)",
    )
});

static IMPATIENCE: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"(?i)(sneller|schiet op|kom ter zake|to the point|geen (lange )?uitleg|kort(er)? (graag|alsjeblieft|aub)|gewoon (het )?antwoord|tl;?dr|haast)",
    )
});

static TECHNICAL_TERMS: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"(?i)\b(warmtepomp|vloerverwarming|isolatie|rc-?waarde|epc|beng|fundering|draagmuur|wtw|ventilatie|zonnepanelen|kwh|triple glas|spouwmuur|constructeur|bestemmingsplan|omgevingsvergunning)\b",
    )
});

static NUMERIC_SPECIFICS: Lazy<Regex> = Lazy::new(|| {
    pattern(r"(?i)(€\s?\d[\d.,]*|\d[\d.,]*\s?(m2|m²|m3|euro|kwh|%|cm|mm|meter|k\b))")
});

static VAGUE_PHRASING: Lazy<Regex> = Lazy::new(|| {
    pattern(r"(?i)(geen idee|weet (ik )?niet|misschien|twijfel|ergens|iets van|zoiets|geen flauw)")
});

static EXPLORATORY: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"(?i)(wat als|welke opties|wat zijn de (mogelijkheden|opties)|voor- en nadelen|vergelijk|alternatieven|wat raad je aan)",
    )
});

/// Extracts a [`BehaviorProfile`] from conversation history.
#[derive(Debug, Clone)]
pub struct BehaviorAnalyzer {
    window: usize,
}

impl BehaviorAnalyzer {
    /// Creates an analyzer inspecting the last `window` turns.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Derives a fully populated profile; empty history yields the default.
    pub fn analyze(&self, history: &[ConversationTurn]) -> BehaviorProfile {
        let start = history.len().saturating_sub(self.window);
        let texts: Vec<&str> = history[start..]
            .iter()
            .filter(|turn| turn.is_user())
            .map(|turn| turn.text.as_str())
            .collect();

        if texts.is_empty() {
            return BehaviorProfile::default();
        }

        let overwhelmed = detect_overwhelmed(&texts);
        let confused = detect_confused(&texts);
        let impatient = detect_impatient(&texts);
        let engaged = detect_engaged(&texts);

        let tone_hint = if overwhelmed || confused {
            Tone::Warm
        } else if impatient {
            Tone::Direct
        } else {
            Tone::Neutral
        };

        let speed_preference = if impatient {
            SpeedPreference::Quick
        } else if detect_exploratory(&texts) {
            SpeedPreference::Thorough
        } else {
            SpeedPreference::Balanced
        };

        let profile = BehaviorProfile {
            overwhelmed,
            confused,
            impatient,
            engaged,
            tone_hint,
            confidence_level: derive_confidence(&texts),
            speed_preference,
            turn_count: texts.len(),
        };

        tracing::debug!(?profile, "Derived behavior profile");
        profile
    }
}

impl Default for BehaviorAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_BEHAVIOR_WINDOW)
    }
}

fn count_matches(re: &Regex, texts: &[&str]) -> usize {
    texts.iter().map(|t| re.find_iter(t).count()).sum()
}

fn detect_overwhelmed(texts: &[&str]) -> bool {
    let explicit = texts.iter().any(|t| OVERWHELM_MARKERS.is_match(t));
    let terse_negative = texts
        .iter()
        .filter(|t| t.chars().count() <= TERSE_MESSAGE_CHARS && TERSE_NEGATIVE.is_match(t))
        .count();
    let confusion = count_matches(&CLARIFICATION, texts);
    explicit || terse_negative >= 2 || (terse_negative >= 1 && confusion >= 1)
}

fn detect_confused(texts: &[&str]) -> bool {
    count_matches(&CLARIFICATION, texts) >= CONFUSION_THRESHOLD
}

fn detect_impatient(texts: &[&str]) -> bool {
    texts.iter().any(|t| IMPATIENCE.is_match(t))
}

fn detect_engaged(texts: &[&str]) -> bool {
    texts
        .iter()
        .filter(|t| t.split_whitespace().count() >= DETAILED_MESSAGE_WORDS)
        .count()
        >= 2
}

fn detect_exploratory(texts: &[&str]) -> bool {
    if texts.iter().any(|t| EXPLORATORY.is_match(t)) {
        return true;
    }
    let questions: usize = texts.iter().map(|t| t.matches('?').count()).sum();
    questions >= 3 && texts.iter().any(|t| t.matches('?').count() >= 2)
}

fn derive_confidence(texts: &[&str]) -> ConfidenceLevel {
    let specific = count_matches(&TECHNICAL_TERMS, texts) + count_matches(&NUMERIC_SPECIFICS, texts);
    let vague = count_matches(&VAGUE_PHRASING, texts);

    if specific >= 2 && specific > vague {
        ConfidenceLevel::High
    } else if vague >= 1 && vague > specific {
        ConfidenceLevel::Low
    } else {
        ConfidenceLevel::Medium
    }
}
