//! Dutch message templates for chapter openings.

use crate::domain::behavior::Tone;
use crate::domain::foundation::Chapter;

/// Opening text for one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterTemplate {
    pub intro: &'static str,
    pub question: &'static str,
}

pub fn template_for_chapter(chapter: Chapter) -> ChapterTemplate {
    match chapter {
        Chapter::Basis => BASIS,
        Chapter::Ruimtes => RUIMTES,
        Chapter::Wensen => WENSEN,
        Chapter::Budget => BUDGET,
        Chapter::Techniek => TECHNIEK,
        Chapter::Duurzaam => DUURZAAM,
        Chapter::Risico => RISICO,
    }
}

/// Short lead-in matching the tone.
pub fn tone_prefix(tone: Tone) -> Option<&'static str> {
    match tone {
        Tone::Warm => Some("Geen zorgen, we nemen het rustig stap voor stap."),
        Tone::Direct | Tone::Neutral => None,
    }
}

pub const CONFLICT_LEAD: &str = "Voordat we verdergaan wil ik eerst iets met je bespreken:";

pub const GUIDANCE_LEAD: &str = "Een vraag die nu belangrijk is:";

// ============================================================================
// Chapter Openings
// ============================================================================

const BASIS: ChapterTemplate = ChapterTemplate {
    intro: "Welkom! In dit hoofdstuk leggen we de basis van je project vast.",
    question: "Wat voor project heb je in gedachten: nieuwbouw, een verbouwing, renovatie of een aanbouw?",
};

const RUIMTES: ChapterTemplate = ChapterTemplate {
    intro: "Laten we kijken welke ruimtes je nodig hebt.",
    question: "Welke ruimtes wil je hebben, en hoe groot ongeveer?",
};

const WENSEN: ChapterTemplate = ChapterTemplate {
    intro: "Nu gaan we je wensen verzamelen, van must-haves tot leuke extra's.",
    question: "Wat moet je nieuwe huis in ieder geval hebben?",
};

const BUDGET: ChapterTemplate = ChapterTemplate {
    intro: "Tijd om over geld te praten, zodat je plannen haalbaar blijven.",
    question: "Welk totaalbudget heb je voor ogen?",
};

const TECHNIEK: ChapterTemplate = ChapterTemplate {
    intro: "In dit hoofdstuk kijken we naar installaties zoals verwarming en ventilatie.",
    question: "Heb je al een voorkeur voor de verwarming, bijvoorbeeld een warmtepomp?",
};

const DUURZAAM: ChapterTemplate = ChapterTemplate {
    intro: "Laten we bespreken hoe duurzaam je wilt bouwen.",
    question: "Welke ambitie heb je op het gebied van energie, bijvoorbeeld energieneutraal?",
};

const RISICO: ChapterTemplate = ChapterTemplate {
    intro: "Tot slot brengen we de risico's van je project in kaart.",
    question: "Zijn er zaken waar je je zorgen over maakt, zoals de fundering of vergunningen?",
};
