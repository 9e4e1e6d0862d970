#![no_main]

use libfuzzer_sys::fuzz_target;
use sf_core::ProcessDocument;
use sf_render_mermaid::{compile, compile_value, identifier_collisions, is_reserved, swimlane_order};
use sf_schema::{lint, load_value, validate};

/// Ids a compiled statement introduces or references.
fn statement_ids(statement: &str) -> Vec<&str> {
    let head = statement.strip_prefix("subgraph ").unwrap_or(statement);
    let first = head
        .split(['(', '[', '{', ' ', ':'])
        .next()
        .unwrap_or_default();
    let mut ids = vec![first];
    if statement.contains(" -->") {
        ids.push(statement.rsplit_once(' ').map(|(_, to)| to).unwrap_or_default());
    }
    ids
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = load_value(text) else {
        return;
    };

    let _ = validate(&value);
    let _ = compile_value(&value);

    if let Ok(doc) = serde_json::from_value::<ProcessDocument>(value) {
        let _ = lint(&doc);
        let _ = identifier_collisions(&doc);
        let lanes = swimlane_order(&doc);
        assert!(lanes.len() <= doc.actors.len());

        let source = compile(&doc);
        assert!(source.starts_with("flowchart "));
        // Every keyword is prefixed, so no statement opens with a bare one.
        for line in source.lines().skip(1) {
            let statement = line.trim_start();
            if statement == "end" || statement.starts_with("classDef ") {
                continue;
            }
            for id in statement_ids(statement) {
                assert!(!is_reserved(id), "bare keyword {id:?} in {statement:?}");
            }
        }
    }
});
