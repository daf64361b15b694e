//! Activity subject/description rendering
//!
//! Deterministic rendering from a CDR-like structure, tolerant of partial
//! data: optional fields appear on their own line in fixed order only when
//! present. The AI-insights block is self-contained so it can be included at
//! creation or appended to an existing description later, without ever being
//! duplicated.

use crate::models::{CallDetailRecord, CallInsights, Direction, MediaLink, NewActivity};

/// Header line of the insights block; also the duplicate-detection marker
pub const INSIGHTS_HEADER: &str = "--- AI-inzichten ---";

/// Placeholder written while upstream insight processing is still running;
/// stripped before the real block is appended
pub const INSIGHTS_PENDING_LINE: &str = "--- AI-inzichten worden verwerkt... ---";

/// Two-value direction label; unknown direction reads as inbound
pub fn direction_label(direction: Option<Direction>) -> &'static str {
    match direction {
        Some(Direction::Outbound) => "Uitgaand",
        _ => "Inkomend",
    }
}

fn call_type(direction: Option<Direction>) -> &'static str {
    match direction {
        Some(Direction::Outbound) => "Outbound",
        _ => "Inbound",
    }
}

/// Render seconds as `"Xm Ys"`
pub fn format_duration(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Activity subject. A non-answer outcome overrides the phrasing to
/// "Gemist" with the localized reason; an answered call keeps the generic
/// direction label.
pub fn build_subject(cdr: &CallDetailRecord) -> String {
    let outcome = cdr.outcome();
    if outcome.is_answered() {
        format!("Gesprek {} – {}", direction_label(cdr.direction), outcome.label())
    } else {
        format!("Gemist gesprek – {}", outcome.label())
    }
}

fn media_lines(lines: &mut Vec<String>, label: &str, media: &MediaLink) {
    if let Some(url) = &media.play_url {
        let until = media
            .available_until
            .as_deref()
            .map(|ts| ts.chars().take(10).collect::<String>())
            .unwrap_or_else(|| "?".to_string());
        lines.push(String::new());
        lines.push(format!("{} (beschikbaar tot {}):", label, until));
        lines.push(url.clone());
    }
}

/// Multi-line structured description.
///
/// Fixed field order: direction, status, duration, caller number, then the
/// optional reason, callee number, agent, recording and voicemail lines.
/// When `insights_first` is set (activity created directly from a
/// `call-insights` event) the insights block leads instead of trailing.
pub fn build_description(cdr: &CallDetailRecord, insights_first: bool) -> String {
    let outcome = cdr.outcome();
    let caller = cdr
        .external_number
        .as_ref()
        .and_then(|ext| ext.display())
        .unwrap_or("Onbekend");

    let mut lines = vec![
        format!("Richting  : {}", direction_label(cdr.direction)),
        format!("Status    : {}", outcome.label()),
        format!("Duur      : {}", format_duration(cdr.duration)),
        format!("Nummer    : {}", caller),
    ];

    if !outcome.is_answered() {
        lines.push(format!("Reden     : {}", outcome.label()));
    }

    if let Some(callee) = cdr.internal_number.as_ref().and_then(|num| num.display()) {
        lines.push(format!("Gekozen nummer: {}", callee));
    }

    if let Some(agent) = cdr.user.as_ref().and_then(|user| user.full_name.as_deref()) {
        lines.push(format!("Medewerker: {}", agent));
    }

    if let Some(recording) = &cdr.call_recording {
        media_lines(&mut lines, "Opname", recording);
    }
    if let Some(voicemail) = &cdr.voicemail {
        media_lines(&mut lines, "Voicemail", voicemail);
    }

    let detail = lines.join("\n");

    match cdr.insights.as_ref() {
        Some(insights) => match insights_block(insights) {
            Some(block) if insights_first => format!("{}\n\n{}", block, detail),
            Some(block) => format!("{}\n\n{}", detail, block),
            None if insights.status == Some(crate::models::InsightStatus::InProgress) => {
                format!("{}\n\n{}", detail, INSIGHTS_PENDING_LINE)
            }
            None => detail,
        },
        None => detail,
    }
}

/// Self-contained insights text block (summary, sentiment, topics).
/// `None` when insights are absent, not yet available, or empty.
pub fn insights_block(insights: &CallInsights) -> Option<String> {
    if !insights.is_available() {
        return None;
    }

    let mut lines = vec![INSIGHTS_HEADER.to_string()];

    let summary = insights
        .summary
        .as_deref()
        .or(insights.custom_summary.as_deref());
    if let Some(summary) = summary {
        lines.push(format!("Samenvatting:\n{}", summary));
    }

    if let Some(sentiment) = insights.sentiment.as_deref() {
        lines.push(format!("Sentiment: {}", sentiment_label(sentiment)));
    }

    if !insights.topics.is_empty() {
        lines.push(format!("Onderwerpen: {}", insights.topics.join(", ")));
    }

    if lines.len() == 1 {
        return None;
    }

    Some(lines.join("\n"))
}

fn sentiment_label(sentiment: &str) -> &str {
    match sentiment {
        "POSITIVE" => "Positief",
        "NEGATIVE" => "Negatief",
        "NEUTRAL" => "Neutraal",
        other => other,
    }
}

/// Append the insights block to an existing description. The pending
/// placeholder is stripped first; a description already carrying the block
/// header returns `None` (idempotent redelivery).
pub fn append_insights(description: &str, block: &str) -> Option<String> {
    if description.contains(INSIGHTS_HEADER) {
        return None;
    }

    let cleaned = description.replace(INSIGHTS_PENDING_LINE, "");
    Some(format!("{}\n\n{}", cleaned.trim_end(), block))
}

/// Assemble a new activity for one matched order (or none)
pub fn build_activity(
    cdr: &CallDetailRecord,
    call_id: &str,
    order_id: Option<String>,
    insights_first: bool,
) -> NewActivity {
    let insights_logged = cdr
        .insights
        .as_ref()
        .and_then(insights_block)
        .is_some();

    NewActivity {
        subject: build_subject(cdr),
        description: build_description(cdr, insights_first),
        call_id: call_id.to_string(),
        order_id,
        duration_secs: cdr.duration,
        call_type: call_type(cdr.direction).to_string(),
        insights_logged,
    }
}
