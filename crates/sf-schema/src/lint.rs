//! Soft checks that never block compilation.
//!
//! Rule codes:
//!
//! | code | finding |
//! |------|---------|
//! | W001 | decision step with fewer than two labeled outgoing flows |
//! | W002 | step references an unknown control |
//! | W003 | step references an unknown risk |
//! | W004 | decision record points at a missing or non-decision step |
//! | W005 | decision outcome points at a missing step |
//! | W006 | step label exceeds the display budget |
//! | W007 | control or risk description exceeds the display budget |
//! | W008 | step unreachable from the start step |
//!
//! W009 (rendered id collisions) is raised by the Mermaid compiler crate,
//! since it depends on how ids are sanitized.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use sf_core::{
    Diagnostic, MAX_ANNOTATION_CHARS, MAX_LABEL_CHARS, ProcessDocument, StepType,
};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

#[must_use]
pub fn lint(doc: &ProcessDocument) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let step_ids: FxHashSet<&str> = doc.steps.iter().map(|step| step.id.as_str()).collect();

    check_decision_branches(doc, &mut diagnostics);
    check_annotation_refs(doc, &mut diagnostics);
    check_decision_records(doc, &step_ids, &mut diagnostics);
    check_display_lengths(doc, &mut diagnostics);
    check_reachability(doc, &mut diagnostics);

    debug!(warnings = diagnostics.len(), "linted process document");
    diagnostics
}

fn check_decision_branches(doc: &ProcessDocument, out: &mut Vec<Diagnostic>) {
    for step in doc
        .steps
        .iter()
        .filter(|step| step.step_type == StepType::Decision)
    {
        let labeled = doc
            .outgoing_flows(&step.id)
            .filter(|flow| flow.branch_label().is_some())
            .count();
        if labeled < 2 {
            out.push(
                Diagnostic::warning(
                    "W001",
                    format!(
                        "Decision step '{}' has {labeled} labeled outgoing flow(s); expected at least 2",
                        step.id
                    ),
                )
                .with_subject(&step.id)
                .with_suggestion("Label each branch with its outcome, for example \"Yes\" and \"No\""),
            );
        }
    }
}

fn check_annotation_refs(doc: &ProcessDocument, out: &mut Vec<Diagnostic>) {
    let control_ids: FxHashSet<&str> = doc.controls.iter().map(|c| c.id.as_str()).collect();
    let risk_ids: FxHashSet<&str> = doc.risks.iter().map(|r| r.id.as_str()).collect();

    for step in &doc.steps {
        for control in step.controls.iter().filter(|id| !control_ids.contains(id.as_str())) {
            out.push(
                Diagnostic::warning(
                    "W002",
                    format!("Step '{}' references unknown control: {control}", step.id),
                )
                .with_subject(&step.id),
            );
        }
        for risk in step.risks.iter().filter(|id| !risk_ids.contains(id.as_str())) {
            out.push(
                Diagnostic::warning(
                    "W003",
                    format!("Step '{}' references unknown risk: {risk}", step.id),
                )
                .with_subject(&step.id),
            );
        }
    }
}

fn check_decision_records(
    doc: &ProcessDocument,
    step_ids: &FxHashSet<&str>,
    out: &mut Vec<Diagnostic>,
) {
    for decision in &doc.decisions {
        match doc.find_step(&decision.step_id) {
            None => out.push(
                Diagnostic::warning(
                    "W004",
                    format!(
                        "Decision '{}' references unknown step: {}",
                        decision.id, decision.step_id
                    ),
                )
                .with_subject(&decision.id),
            ),
            Some(step) if step.step_type != StepType::Decision => out.push(
                Diagnostic::warning(
                    "W004",
                    format!(
                        "Decision '{}' is attached to step '{}' of type {}",
                        decision.id,
                        step.id,
                        step.step_type.as_str()
                    ),
                )
                .with_subject(&decision.id)
                .with_suggestion("Attach decision records to steps typed \"decision\""),
            ),
            Some(_) => {}
        }

        for outcome in &decision.outcomes {
            if !step_ids.contains(outcome.next_step_id.as_str()) {
                out.push(
                    Diagnostic::warning(
                        "W005",
                        format!(
                            "Decision '{}' outcome '{}' leads to unknown step: {}",
                            decision.id, outcome.label, outcome.next_step_id
                        ),
                    )
                    .with_subject(&decision.id),
                );
            }
        }
    }
}

fn check_display_lengths(doc: &ProcessDocument, out: &mut Vec<Diagnostic>) {
    for step in &doc.steps {
        let length = display_length(&step.label);
        if length > MAX_LABEL_CHARS {
            out.push(
                Diagnostic::warning(
                    "W006",
                    format!(
                        "Step '{}' label is {length} characters; keep it under {MAX_LABEL_CHARS}",
                        step.id
                    ),
                )
                .with_subject(&step.id)
                .with_suggestion("Move detail into the step description"),
            );
        }
    }

    let annotations = doc
        .controls
        .iter()
        .map(|control| ("Control", control.id.as_str(), control.description.as_str()))
        .chain(
            doc.risks
                .iter()
                .map(|risk| ("Risk", risk.id.as_str(), risk.description.as_str())),
        );
    for (kind, id, description) in annotations {
        let length = display_length(description);
        if length > MAX_ANNOTATION_CHARS {
            out.push(
                Diagnostic::warning(
                    "W007",
                    format!(
                        "{kind} '{id}' description is {length} characters; keep it under {MAX_ANNOTATION_CHARS}"
                    ),
                )
                .with_subject(id)
                .with_suggestion("Move detail into detailedDescription"),
            );
        }
    }
}

fn check_reachability(doc: &ProcessDocument, out: &mut Vec<Diagnostic>) {
    let Some(start) = doc.start_step() else {
        return;
    };

    let mut successors: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for flow in &doc.flows {
        successors
            .entry(flow.from.as_str())
            .or_default()
            .push(flow.to.as_str());
    }

    let mut reachable = FxHashSet::default();
    let mut queue = VecDeque::new();
    reachable.insert(start.id.as_str());
    queue.push_back(start.id.as_str());
    while let Some(step_id) = queue.pop_front() {
        for next in successors.get(step_id).into_iter().flatten() {
            if reachable.insert(*next) {
                queue.push_back(*next);
            }
        }
    }

    for step in doc
        .steps
        .iter()
        .filter(|step| !reachable.contains(step.id.as_str()))
    {
        out.push(
            Diagnostic::warning(
                "W008",
                format!("Step '{}' is not reachable from the start step", step.id),
            )
            .with_subject(&step.id),
        );
    }
}

fn display_length(text: &str) -> usize {
    text.graphemes(true).count()
}

#[cfg(test)]
mod tests {
    use super::lint;
    use serde_json::json;
    use sf_core::{DiagnosticSeverity, ProcessDocument};

    fn document(value: serde_json::Value) -> ProcessDocument {
        serde_json::from_value(value).expect("test document deserializes")
    }

    fn base() -> serde_json::Value {
        json!({
            "processName": "Review",
            "processId": "p",
            "actors": [{ "id": "a", "name": "Analyst" }],
            "steps": [
                { "id": "s", "type": "start", "label": "Start", "actorId": "a" },
                { "id": "d", "type": "decision", "label": "OK?", "actorId": "a" },
                { "id": "e", "type": "end", "label": "End", "actorId": "a" }
            ],
            "decisions": [{
                "id": "dec1",
                "stepId": "d",
                "criteria": "Looks right",
                "outcomes": [
                    { "label": "Yes", "nextStepId": "e" },
                    { "label": "No", "nextStepId": "s" }
                ]
            }],
            "flows": [
                { "from": "s", "to": "d" },
                { "from": "d", "to": "e", "label": "Yes", "type": "conditional" },
                { "from": "d", "to": "s", "label": "No", "type": "conditional" }
            ]
        })
    }

    fn codes(doc: &ProcessDocument) -> Vec<String> {
        lint(doc).into_iter().map(|d| d.code).collect()
    }

    #[test]
    fn clean_document_has_no_warnings() {
        assert!(lint(&document(base())).is_empty());
    }

    #[test]
    fn decision_with_one_labeled_branch_warns() {
        let mut value = base();
        value["flows"][2]["label"] = json!("");
        let diagnostics = lint(&document(value));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "W001");
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Warning);
        assert_eq!(diagnostics[0].subject.as_deref(), Some("d"));
        assert!(diagnostics[0].message.contains("has 1 labeled"));
    }

    #[test]
    fn unknown_control_and_risk_refs_warn() {
        let mut value = base();
        value["steps"][1]["controls"] = json!(["c-missing"]);
        value["steps"][1]["risks"] = json!(["r-missing"]);
        assert_eq!(codes(&document(value)), vec!["W002", "W003"]);
    }

    #[test]
    fn decision_records_are_cross_checked() {
        let mut value = base();
        value["decisions"][0]["stepId"] = json!("s");
        value["decisions"][0]["outcomes"][1]["nextStepId"] = json!("gone");
        let diagnostics = lint(&document(value));
        assert_eq!(
            diagnostics.iter().map(|d| d.code.as_str()).collect::<Vec<_>>(),
            vec!["W004", "W005"]
        );
        assert!(diagnostics[0].message.contains("of type start"));
    }

    #[test]
    fn long_labels_and_descriptions_warn() {
        let mut value = base();
        value["steps"][0]["label"] = json!("x".repeat(61));
        value["controls"] = json!([{ "id": "c1", "type": "preventive", "description": "y".repeat(51) }]);
        value["risks"] = json!([{ "id": "r1", "severity": "high", "description": "short" }]);
        assert_eq!(codes(&document(value)), vec!["W006", "W007"]);
    }

    #[test]
    fn label_length_counts_graphemes() {
        let mut value = base();
        // 60 flags, each two code points, is exactly at the budget.
        value["steps"][0]["label"] = json!("🇸🇪".repeat(60));
        assert!(lint(&document(value)).is_empty());
    }

    #[test]
    fn unreachable_steps_warn() {
        let mut value = base();
        value["steps"]
            .as_array_mut()
            .expect("steps")
            .push(json!({ "id": "island", "type": "action", "label": "Orphan", "actorId": "a" }));
        let diagnostics = lint(&document(value));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "W008");
        assert_eq!(diagnostics[0].subject.as_deref(), Some("island"));
    }
}
