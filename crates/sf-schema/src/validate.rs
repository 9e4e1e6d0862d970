use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use sf_core::{ProcessDocument, StepType};
use tracing::debug;

/// Check a process document and return every violation found.
///
/// Works on the raw JSON value so that incomplete documents are reported
/// instead of being rejected wholesale by deserialization. An empty result
/// means the document is safe to compile.
#[must_use]
pub fn validate(doc: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(root) = doc.as_object() else {
        errors.push("Process document must be a JSON object".to_string());
        return errors;
    };

    for field in ["processName", "processId"] {
        if non_empty_str(root.get(field)).is_none() {
            errors.push(format!("Missing required field: {field}"));
        }
    }

    let actors = array_field(root, "actors", &mut errors);
    let steps = array_field(root, "steps", &mut errors);
    let flows = array_field(root, "flows", &mut errors);

    let actor_ids = check_actors(actors, &mut errors);
    let step_ids = check_steps(steps, &actor_ids, &mut errors);
    check_flows(flows, &step_ids, &mut errors);
    check_terminals(steps, &mut errors);

    debug!(
        actors = actors.len(),
        steps = steps.len(),
        flows = flows.len(),
        errors = errors.len(),
        "validated process document"
    );
    errors
}

/// Typed entry point; serializes back to JSON and runs [`validate`].
#[must_use]
pub fn validate_document(doc: &ProcessDocument) -> Vec<String> {
    match serde_json::to_value(doc) {
        Ok(value) => validate(&value),
        Err(error) => vec![format!("Process document could not be serialized: {error}")],
    }
}

fn array_field<'a>(
    root: &'a Map<String, Value>,
    field: &str,
    errors: &mut Vec<String>,
) -> &'a [Value] {
    match root.get(field) {
        Some(Value::Array(items)) => items,
        _ => {
            errors.push(format!("Field '{field}' must be an array"));
            &[]
        }
    }
}

fn check_actors<'a>(actors: &'a [Value], errors: &mut Vec<String>) -> FxHashSet<&'a str> {
    let mut actor_ids = FxHashSet::default();
    for (index, actor) in actors.iter().enumerate() {
        match non_empty_str(actor.get("id")) {
            Some(id) => {
                actor_ids.insert(id);
            }
            None => errors.push(format!("Actor at index {index} is missing id")),
        }
        if non_empty_str(actor.get("name")).is_none() {
            errors.push(format!("Actor at index {index} is missing name"));
        }
    }
    actor_ids
}

fn check_steps<'a>(
    steps: &'a [Value],
    actor_ids: &FxHashSet<&str>,
    errors: &mut Vec<String>,
) -> FxHashSet<&'a str> {
    let mut seen = FxHashSet::default();
    for (index, step) in steps.iter().enumerate() {
        match non_empty_str(step.get("id")) {
            Some(id) => {
                if !seen.insert(id) {
                    errors.push(format!("Duplicate step ID: {id}"));
                }
            }
            None => errors.push(format!("Step at index {index} is missing id")),
        }

        match step.get("type") {
            Some(Value::String(kind)) if StepType::parse(kind).is_some() => {}
            Some(other) => errors.push(format!(
                "Step at index {index} has invalid type: {} (expected action, decision, start or end)",
                display_value(other)
            )),
            None => errors.push(format!("Step at index {index} is missing type")),
        }

        if non_empty_str(step.get("label")).is_none() {
            errors.push(format!("Step at index {index} is missing label"));
        }

        match non_empty_str(step.get("actorId")) {
            Some(actor_id) if !actor_ids.contains(actor_id) => errors.push(format!(
                "Step at index {index} references unknown actor: {actor_id}"
            )),
            Some(_) => {}
            None => errors.push(format!("Step at index {index} is missing actorId")),
        }
    }
    seen
}

fn check_flows(flows: &[Value], step_ids: &FxHashSet<&str>, errors: &mut Vec<String>) {
    for (index, flow) in flows.iter().enumerate() {
        for field in ["from", "to"] {
            match non_empty_str(flow.get(field)) {
                Some(step_id) if !step_ids.contains(step_id) => errors.push(format!(
                    "Flow at index {index} references unknown '{field}' step: {step_id}"
                )),
                Some(_) => {}
                None => errors.push(format!("Flow at index {index} is missing '{field}'")),
            }
        }
    }
}

fn check_terminals(steps: &[Value], errors: &mut Vec<String>) {
    let count_of = |kind: StepType| {
        steps
            .iter()
            .filter(|step| step.get("type").and_then(Value::as_str) == Some(kind.as_str()))
            .count()
    };

    match count_of(StepType::Start) {
        0 => errors.push("Process must have exactly one start node".to_string()),
        1 => {}
        _ => errors.push("Process must have exactly one start node (found multiple)".to_string()),
    }

    if count_of(StepType::End) == 0 {
        errors.push("Process must have at least one end node".to_string());
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
