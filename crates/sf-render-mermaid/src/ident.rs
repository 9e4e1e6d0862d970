//! Mermaid-safe node and subgraph identifiers.

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;
use sf_core::{Diagnostic, ProcessDocument};
use tracing::debug;

/// Prefix applied to identifiers that collide with flowchart keywords.
pub const RESERVED_PREFIX: &str = "node_";

/// Flowchart grammar words that cannot stand as bare identifiers, lowercased.
///
/// `end` matters most: a step id of `end` would otherwise close the
/// enclosing subgraph.
pub const RESERVED_WORDS: &[&str] = &[
    "end",
    "start",
    "subgraph",
    "graph",
    "flowchart",
    "direction",
    "tb",
    "td",
    "bt",
    "lr",
    "rl",
    "style",
    "classdef",
    "class",
    "linkstyle",
    "click",
    "call",
    "href",
    "default",
    "interpolate",
];

/// Rewrite `id` into a token Mermaid reads as a plain identifier.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`; a result that equals a
/// reserved word (case-insensitively), or is empty, gets [`RESERVED_PREFIX`].
/// Output only: stored ids are never rewritten.
#[must_use]
pub fn sanitize_id(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || is_reserved(&cleaned) {
        format!("{RESERVED_PREFIX}{cleaned}")
    } else {
        cleaned
    }
}

#[must_use]
pub fn is_reserved(id: &str) -> bool {
    let lowered = id.to_ascii_lowercase();
    RESERVED_WORDS.contains(&lowered.as_str())
}

/// W009: distinct lanes or steps that render as the same Mermaid id.
///
/// Subgraphs and nodes share one namespace, and [`sanitize_id`] can fold two
/// source ids into one token. Only actors that own steps are emitted, so only
/// those are checked. Repeats of the same step id are validation errors and
/// are not reported here.
#[must_use]
pub fn identifier_collisions(doc: &ProcessDocument) -> Vec<Diagnostic> {
    let lanes = doc
        .actors
        .iter()
        .filter(|actor| doc.steps_for_actor(&actor.id).next().is_some())
        .map(|actor| ("actor", actor.id.as_str()));
    let steps = doc.steps.iter().map(|step| ("step", step.id.as_str()));

    let mut owners: FxHashMap<String, (&str, &str)> = FxHashMap::default();
    let mut diagnostics = Vec::new();
    for (kind, id) in lanes.chain(steps) {
        match owners.entry(sanitize_id(id)) {
            Entry::Vacant(slot) => {
                slot.insert((kind, id));
            }
            Entry::Occupied(slot) => {
                let (first_kind, first_id) = *slot.get();
                if first_kind == kind && first_id == id {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::warning(
                        "W009",
                        format!(
                            "{kind} '{id}' and {first_kind} '{first_id}' both render as Mermaid id '{}'",
                            slot.key()
                        ),
                    )
                    .with_subject(id)
                    .with_suggestion("Rename one of them so the ids differ after sanitizing"),
                );
            }
        }
    }

    debug!(collisions = diagnostics.len(), "checked rendered identifiers");
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::{RESERVED_WORDS, identifier_collisions, is_reserved, sanitize_id};
    use proptest::prelude::*;
    use serde_json::json;
    use sf_core::ProcessDocument;

    fn document(value: serde_json::Value) -> ProcessDocument {
        serde_json::from_value(value).expect("deserializes")
    }

    #[test]
    fn plain_ids_pass_through() {
        assert_eq!(sanitize_id("submit_expense-2"), "submit_expense-2");
    }

    #[test]
    fn invalid_characters_become_underscores() {
        assert_eq!(sanitize_id("step 1.a"), "step_1_a");
        assert_eq!(sanitize_id("é"), "_");
        assert_eq!(sanitize_id("a\"b"), "a_b");
    }

    #[test]
    fn reserved_words_are_prefixed_case_insensitively() {
        assert_eq!(sanitize_id("end"), "node_end");
        assert_eq!(sanitize_id("END"), "node_END");
        assert_eq!(sanitize_id("Start"), "node_Start");
        assert_eq!(sanitize_id("subgraph"), "node_subgraph");
        assert_eq!(sanitize_id("classDef"), "node_classDef");
    }

    #[test]
    fn reserved_check_runs_after_character_cleanup() {
        // The trailing space is cleaned first, so the keyword check misses.
        assert_eq!(sanitize_id("end "), "end_");
        assert!(!is_reserved("end_"));
    }

    #[test]
    fn words_containing_keywords_are_left_alone() {
        assert_eq!(sanitize_id("endpoint"), "endpoint");
        assert_eq!(sanitize_id("backend"), "backend");
    }

    #[test]
    fn empty_id_gets_the_prefix() {
        assert_eq!(sanitize_id(""), "node_");
    }

    #[test]
    fn every_reserved_word_is_lowercase() {
        for word in RESERVED_WORDS {
            assert_eq!(*word, word.to_ascii_lowercase());
        }
    }

    #[test]
    fn lane_and_step_sharing_an_id_collide() {
        let doc = document(json!({
            "actors": [{ "id": "finance", "name": "Finance" }],
            "steps": [
                { "id": "s", "type": "start", "label": "S", "actorId": "finance" },
                { "id": "finance", "type": "end", "label": "Paid", "actorId": "finance" }
            ]
        }));
        let found = identifier_collisions(&doc);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "W009");
        assert_eq!(found[0].subject.as_deref(), Some("finance"));
        assert_eq!(
            found[0].message,
            "step 'finance' and actor 'finance' both render as Mermaid id 'finance'"
        );
    }

    #[test]
    fn ids_merged_by_sanitizing_collide() {
        let doc = document(json!({
            "actors": [{ "id": "a", "name": "A" }],
            "steps": [
                { "id": "a b", "type": "start", "label": "S", "actorId": "a" },
                { "id": "a_b", "type": "end", "label": "E", "actorId": "a" }
            ]
        }));
        let found = identifier_collisions(&doc);
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("'a_b'"), "{}", found[0].message);
    }

    #[test]
    fn empty_lanes_and_distinct_ids_are_clean() {
        let doc = document(json!({
            "actors": [
                { "id": "a", "name": "A" },
                { "id": "s", "name": "Unused lane" }
            ],
            "steps": [
                { "id": "s", "type": "start", "label": "S", "actorId": "a" },
                { "id": "end", "type": "end", "label": "E", "actorId": "a" },
                { "id": "node_end2", "type": "action", "label": "X", "actorId": "a" }
            ]
        }));
        assert!(identifier_collisions(&doc).is_empty());
    }

    proptest! {
        #[test]
        fn output_is_always_a_safe_identifier(id in ".{0,40}") {
            let sanitized = sanitize_id(&id);
            prop_assert!(!sanitized.is_empty());
            prop_assert!(sanitized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'));
            prop_assert!(!is_reserved(&sanitized));
        }

        #[test]
        fn sanitizing_is_idempotent(id in ".{0,40}") {
            let once = sanitize_id(&id);
            prop_assert_eq!(sanitize_id(&once), once);
        }
    }
}
