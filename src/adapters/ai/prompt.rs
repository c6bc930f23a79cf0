//! System prompt rendering for the wizard dialogue.
//!
//! Everything the model may see comes from the pruned context; nothing is
//! read from the full wizard state here.

use crate::domain::behavior::Tone;
use crate::domain::context::PrunedContext;
use crate::domain::conversation::TurnRole;
use crate::domain::planning::TurnGoal;
use crate::ports::Message;

/// Reply format for data-entry turns.
pub const PATCH_INSTRUCTIONS: &str = "Antwoord uitsluitend met een JSON-object van de vorm \
{\"patches\": [{\"chapter\": \"<hoofdstuk>\", \"delta\": {\"path\": \"<veld>\", \
\"operation\": \"set|add|append\", \"value\": <waarde>}}], \"followUpQuestion\": \"<vraag of null>\"}. \
Gebruik alleen de hoofdstukken basis, ruimtes, wensen, budget, techniek, duurzaam en risico.";

/// Renders the system prompt for one turn.
pub fn render_system_prompt(context: &PrunedContext) -> String {
    let mut sections = vec![
        "Je bent een ervaren bouwadviseur die een opdrachtgever helpt hun programma van eisen \
         in te vullen. Antwoord altijd in het Nederlands, kort en concreet."
            .to_string(),
        format!(
            "Doel van deze beurt: {}. {}",
            context.plan.goal,
            goal_instruction(context.plan.goal)
        ),
        format!("Toon: {}", tone_instruction(context.plan.tone)),
    ];

    if context.behavior.needs_support() {
        sections.push(
            "De gebruiker lijkt het lastig te vinden. Stel maximaal één vraag tegelijk en leg \
             vaktermen uit."
                .to_string(),
        );
    }

    if let Some(chapter) = context.focused_chapter {
        let mut focus = format!("Huidig hoofdstuk: {}", chapter.display_name());
        if let Some(field) = &context.focused_field {
            focus.push_str(&format!(" (veld: {})", field));
        }
        sections.push(focus);
    }

    if !context.chapter_answers.is_empty() {
        let answers = context
            .chapter_answers
            .iter()
            .map(|(chapter, data)| format!("- {}: {}", chapter.key(), data))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Bekende gegevens:\n{}", answers));
    }

    if !context.conflicts.is_empty() {
        let conflicts = context
            .conflicts
            .iter()
            .map(|c| format!("- [{}] {} Oplossing: {}", c.severity, c.description, c.resolution_hint))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Gesignaleerde conflicten:\n{}", conflicts));
    }

    if let Some(guidance) = &context.anticipation {
        sections.push(format!(
            "Vraag om te stellen: {}\nAchtergrond: {}",
            guidance.question, guidance.reasoning
        ));
    }

    if !context.kb_nuggets.is_empty() {
        let nuggets = context
            .kb_nuggets
            .iter()
            .map(|n| format!("- {}: {}", n.title, n.content))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Kennisbank:\n{}", nuggets));
    }

    if !context.customer_examples.is_empty() {
        let examples = context
            .customer_examples
            .iter()
            .map(|e| format!("- {}", e.summary))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Voorbeelden van andere klanten:\n{}", examples));
    }

    sections.join("\n\n")
}

/// History as provider messages, oldest first, followed by the query.
pub fn render_messages(context: &PrunedContext, query: &str) -> Vec<Message> {
    context
        .history
        .iter()
        .map(|turn| match turn.role {
            TurnRole::User => Message::user(turn.text.clone()),
            TurnRole::Assistant => Message::assistant(turn.text.clone()),
        })
        .chain(std::iter::once(Message::user(query)))
        .collect()
}

fn goal_instruction(goal: TurnGoal) -> &'static str {
    match goal {
        TurnGoal::Clarify => "Verhelder wat de gebruiker bedoelt voordat je iets vastlegt.",
        TurnGoal::FillData | TurnGoal::Patch => {
            "Leg de genoemde gegevens vast in het juiste hoofdstuk."
        }
        TurnGoal::AnticipateAndGuide | TurnGoal::Probe => {
            "Stel de voorgestelde vraag op een natuurlijke manier."
        }
        TurnGoal::SurfaceRisks => "Benoem het risico en de mogelijke gevolgen.",
        TurnGoal::OfferAlternatives => "Bied twee of drie haalbare alternatieven aan.",
        TurnGoal::ConflictResolution => {
            "Los eerst het conflict op; ga pas daarna verder met andere onderwerpen."
        }
        TurnGoal::Advies => "Geef een helder advies op de vraag van de gebruiker.",
    }
}

fn tone_instruction(tone: Tone) -> &'static str {
    match tone {
        Tone::Warm => "warm en geruststellend",
        Tone::Direct => "direct en zakelijk",
        Tone::Neutral => "vriendelijk en neutraal",
    }
}
