// ABOUTME: Helpers that pull structured payloads out of free-form model replies
// ABOUTME: Handles fenced JSON blocks, bare JSON objects, and RESPONSE/PLAN tagged replies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Models are asked for JSON but routinely wrap it in Markdown fences or
//! surround it with prose. These helpers recover the payload without
//! guessing at anything beyond the fence and brace structure.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Fenced block explicitly tagged as JSON
static JSON_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"```json\s*([\s\S]*?)```").ok());

/// Any fenced block
static PLAIN_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"```\s*([\s\S]*?)```").ok());

/// Outermost brace pair, greedy
static FIRST_OBJECT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").ok());

/// Object following a `PLAN:` tag, optionally inside a code fence
static PLAN_SECTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"PLAN:\s*(?:```(?:json)?\s*)?(\{[\s\S]*\})").ok());

const RESPONSE_TAG: &str = "RESPONSE:";
const PLAN_TAG: &str = "PLAN:";

/// A plan revision reply split into its conversational and structured parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevisionReply {
    /// Text after `RESPONSE:` up to `PLAN:` (or the end), trimmed
    pub message: Option<String>,
    /// Parsed object after `PLAN:` when it is valid JSON
    pub plan: Option<Value>,
}

/// Capture group 1 of `regex` in `text`
fn capture<'a>(regex: &LazyLock<Option<Regex>>, text: &'a str) -> Option<&'a str> {
    regex
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The JSON payload of a reply
///
/// Prefers a ```` ```json ```` block, then any fenced block, then the whole
/// reply.
#[must_use]
pub fn json_payload(text: &str) -> &str {
    capture(&JSON_FENCE, text)
        .or_else(|| capture(&PLAIN_FENCE, text))
        .unwrap_or(text)
        .trim()
}

/// The span from the first `{` to the last `}`
#[must_use]
pub fn first_json_object(text: &str) -> Option<&str> {
    FIRST_OBJECT
        .as_ref()
        .and_then(|re| re.find(text))
        .map(|m| m.as_str())
}

/// Remove Markdown fence markers wherever they appear
#[must_use]
pub fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_owned()
}

/// Split a `RESPONSE: ... PLAN: {...}` reply
#[must_use]
pub fn split_revision_reply(text: &str) -> RevisionReply {
    let message = text.find(RESPONSE_TAG).and_then(|start| {
        let body = &text[start + RESPONSE_TAG.len()..];
        let end = body.find(PLAN_TAG).unwrap_or(body.len());
        let message = body[..end].trim();
        (!message.is_empty()).then(|| message.to_owned())
    });

    let plan = capture(&PLAN_SECTION, text)
        .map(strip_fences)
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
        .filter(Value::is_object);

    RevisionReply { message, plan }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_fence_wins_over_plain_fence() {
        let reply = "Here you go:\n```json\n{\"a\": 1}\n```\nand\n```\n{\"b\": 2}\n```";
        assert_eq!(json_payload(reply), "{\"a\": 1}");
    }

    #[test]
    fn test_plain_fence_and_bare_reply() {
        assert_eq!(json_payload("```\n{\"b\": 2}\n```"), "{\"b\": 2}");
        assert_eq!(json_payload("  {\"c\": 3}  "), "{\"c\": 3}");
    }

    #[test]
    fn test_first_object_spans_nested_braces() {
        let reply = "Analysis follows {\"analysis\": \"ok\", \"links\": [{\"title\": \"x\"}]} thanks";
        let object = first_json_object(reply).unwrap();
        let value: Value = serde_json::from_str(object).unwrap();
        assert_eq!(value["links"][0]["title"], "x");
        assert!(first_json_object("no braces here").is_none());
    }

    #[test]
    fn test_revision_reply_with_fenced_plan() {
        let reply = "RESPONSE: Swapped Tuesday's run for yoga.\nPLAN: ```json\n{\"summary\": \"yoga week\"}\n```";
        let parsed = split_revision_reply(reply);
        assert_eq!(
            parsed.message.as_deref(),
            Some("Swapped Tuesday's run for yoga.")
        );
        assert_eq!(parsed.plan, Some(json!({"summary": "yoga week"})));
    }

    #[test]
    fn test_revision_reply_with_plain_fenced_plan() {
        let reply = "RESPONSE: Lighter week.\nPLAN:\n```\n{\"diet\": {}, \"exercise\": {\"monday\": [\"Walk\"]}}\n```\n";
        let parsed = split_revision_reply(reply);
        assert_eq!(parsed.message.as_deref(), Some("Lighter week."));
        assert_eq!(parsed.plan.unwrap()["exercise"]["monday"][0], "Walk");
    }

    #[test]
    fn test_revision_reply_without_plan_keeps_message() {
        let parsed = split_revision_reply("RESPONSE: That already fits your goals.");
        assert_eq!(
            parsed.message.as_deref(),
            Some("That already fits your goals.")
        );
        assert!(parsed.plan.is_none());
    }

    #[test]
    fn test_revision_reply_with_broken_plan() {
        let parsed = split_revision_reply("RESPONSE: done\nPLAN: {not json}");
        assert_eq!(parsed.message.as_deref(), Some("done"));
        assert!(parsed.plan.is_none());
    }

    #[test]
    fn test_untagged_reply_yields_nothing() {
        assert_eq!(split_revision_reply("just chatting"), RevisionReply::default());
    }
}
