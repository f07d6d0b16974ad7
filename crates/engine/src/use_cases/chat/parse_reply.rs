//! LLM reply parser for the creator chat.
//!
//! The model is instructed to answer with a short chat message, the
//! `###JSON_DATA###` delimiter, and the full game JSON (sometimes wrapped
//! in a markdown code fence). This module turns that raw text into a
//! `{narrative, data}` pair; state parsing failures never cost the caller
//! the narrative.
//!
//! See `prompt_templates.rs` for the expected output format.

use regex_lite::Regex;
use std::sync::LazyLock;

use giftwrap_domain::GameData;

use crate::prompt_templates::JSON_DATA_DELIMITER;

/// Parsed components of an LLM chat reply.
#[derive(Debug, Clone, Default)]
pub struct ParsedReply {
    /// The user-visible chat message (everything before the delimiter).
    pub narrative: String,
    /// The replacement game document, when one parsed and validated.
    pub data: Option<GameData>,
}

// Markdown code fences around the JSON segment: ``` or ```json etc.
static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[a-z]*\n?|```").expect("valid regex"));

/// Parse a raw model reply into narrative and optional game document.
///
/// Without the delimiter the whole reply is narrative. With it, the text
/// after the first occurrence is fence-stripped and deserialized; a JSON
/// or invariant failure is logged and yields `data = None`.
pub fn parse_reply(raw: &str) -> ParsedReply {
    let Some((narrative, candidate)) = raw.split_once(JSON_DATA_DELIMITER) else {
        return ParsedReply {
            narrative: raw.trim().to_string(),
            data: None,
        };
    };

    let narrative = narrative.trim().to_string();
    let json_str = CODE_FENCE_RE.replace_all(candidate, "").trim().to_string();

    let data = match serde_json::from_str::<GameData>(&json_str) {
        Ok(data) => match data.validate() {
            Ok(()) => Some(data),
            Err(e) => {
                tracing::warn!(error = %e, "model produced a structurally invalid game document");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse game JSON from model reply");
            None
        }
    };

    ParsedReply { narrative, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftwrap_domain::Step;

    fn valid_json() -> String {
        serde_json::json!({
            "visual_config": {
                "primary_color": "#9333EA",
                "bg_color": "#0F172A",
                "font_family": "Montserrat",
                "theme_icon": "fa-wand-magic-sparkles"
            },
            "title": "The Birthday Heist",
            "steps": [
                {"type": "intro", "title": "Welcome", "subtitle": "Crack the vault"},
                {
                    "type": "level",
                    "level_number": 1,
                    "level_title": "Candles",
                    "question": "How many candles?",
                    "answer": "thirty"
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn reply_without_delimiter_is_all_narrative() {
        let parsed = parse_reply("  Just chatting, no changes yet.  ");
        assert_eq!(parsed.narrative, "Just chatting, no changes yet.");
        assert!(parsed.data.is_none());
    }

    #[test]
    fn reply_with_valid_json_splits_into_both_parts() {
        let raw = format!(
            "Done! Birthday mode engaged.\n\n###JSON_DATA###\n{}",
            valid_json()
        );
        let parsed = parse_reply(&raw);
        assert_eq!(parsed.narrative, "Done! Birthday mode engaged.");
        let data = parsed.data.expect("document");
        assert_eq!(data.title, "The Birthday Heist");
        assert!(matches!(data.steps[0], Step::Intro { .. }));
    }

    #[test]
    fn code_fences_are_stripped_before_parsing() {
        let raw = format!(
            "All set!\n###JSON_DATA###\n```json\n{}\n```",
            valid_json()
        );
        let parsed = parse_reply(&raw);
        assert_eq!(parsed.narrative, "All set!");
        assert!(parsed.data.is_some());
    }

    #[test]
    fn bare_fences_are_stripped_too() {
        let raw = format!("Here you go\n###JSON_DATA###\n```\n{}\n```", valid_json());
        let parsed = parse_reply(&raw);
        assert!(parsed.data.is_some());
    }

    #[test]
    fn truncated_json_keeps_the_narrative() {
        let raw = "Oops half a document\n###JSON_DATA###\n{\"title\": \"Broken";
        let parsed = parse_reply(raw);
        assert_eq!(parsed.narrative, "Oops half a document");
        assert!(parsed.data.is_none());
    }

    #[test]
    fn well_formed_json_violating_invariants_is_rejected() {
        // Parses as JSON but has no intro step.
        let raw = format!(
            "Check this\n###JSON_DATA###\n{}",
            serde_json::json!({
                "visual_config": {
                    "primary_color": "#9333EA",
                    "bg_color": "#0F172A",
                    "font_family": "Montserrat",
                    "theme_icon": "fa-wand-magic-sparkles"
                },
                "title": "No intro",
                "steps": [{
                    "type": "level",
                    "level_number": 1,
                    "level_title": "L1",
                    "question": "q",
                    "answer": "a"
                }]
            })
        );
        let parsed = parse_reply(&raw);
        assert_eq!(parsed.narrative, "Check this");
        assert!(parsed.data.is_none());
    }

    #[test]
    fn splits_at_the_first_delimiter_only() {
        let raw = format!(
            "Intro text\n###JSON_DATA###\n{}\n###JSON_DATA###",
            valid_json()
        );
        let parsed = parse_reply(&raw);
        assert_eq!(parsed.narrative, "Intro text");
        // Trailing delimiter is part of the candidate and breaks the parse;
        // the narrative survives regardless.
        assert!(parsed.data.is_none());
    }

    #[test]
    fn delimiter_with_empty_narrative_is_allowed() {
        let raw = format!("###JSON_DATA###\n{}", valid_json());
        let parsed = parse_reply(&raw);
        assert_eq!(parsed.narrative, "");
        assert!(parsed.data.is_some());
    }
}
