#![forbid(unsafe_code)]

//! Browser bindings for the SwimFlow validator and compiler.

use std::sync::{LazyLock, RwLock};

use serde::{Deserialize, Serialize};
use sf_core::{Diagnostic, SwimflowError};
use sf_render_mermaid::{
    CompileReport, GraphDirection, MermaidRenderConfig, compile_report, identifier_collisions,
};
use sf_schema::{load_document, load_value, validated_document};
use wasm_bindgen::JsValue;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::wasm_bindgen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RuntimeConfig {
    render: MermaidRenderConfig,
    /// Run the validator before compiling and refuse invalid documents.
    validate: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            render: MermaidRenderConfig::default(),
            validate: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RuntimeInitConfig {
    direction: Option<String>,
    indent: Option<usize>,
    validate: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationOutput {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<Diagnostic>,
}

static RUNTIME_CONFIG: LazyLock<RwLock<RuntimeConfig>> =
    LazyLock::new(|| RwLock::new(RuntimeConfig::default()));

fn read_runtime_config() -> RuntimeConfig {
    match RUNTIME_CONFIG.read() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn write_runtime_config(config: RuntimeConfig) {
    match RUNTIME_CONFIG.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => {
            let mut guard = poisoned.into_inner();
            *guard = config;
        }
    }
}

fn js_error(message: impl Into<String>) -> JsValue {
    JsValue::from_str(&message.into())
}

/// Exception text for a library error. Validation failures carry every
/// message so callers can show them without a second round trip.
fn error_message(err: &SwimflowError) -> String {
    match err {
        SwimflowError::Validation { errors } => {
            format!("[{}] {err}: {}", err.code().as_str(), errors.join("; "))
        }
        _ => format!("[{}] {err}", err.code().as_str()),
    }
}

fn parse_js_value_or_default<T>(value: Option<JsValue>) -> Result<T, JsValue>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match value {
        None => Ok(T::default()),
        Some(raw) if raw.is_undefined() || raw.is_null() => Ok(T::default()),
        Some(raw) => {
            #[cfg(target_arch = "wasm32")]
            {
                serde_wasm_bindgen::from_value(raw)
                    .map_err(|err| js_error(format!("invalid config: {err}")))
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = raw;
                Ok(T::default())
            }
        }
    }
}

fn to_js_value<T>(value: &T) -> Result<JsValue, JsValue>
where
    T: Serialize,
{
    #[cfg(target_arch = "wasm32")]
    {
        serde_wasm_bindgen::to_value(value)
            .map_err(|err| js_error(format!("failed to serialize response: {err}")))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        serde_json::to_string(value)
            .map(|json| JsValue::from_str(&json))
            .map_err(|err| js_error(format!("failed to serialize response: {err}")))
    }
}

fn merge_runtime_config(
    base: &RuntimeConfig,
    overrides: &RuntimeInitConfig,
) -> Result<RuntimeConfig, String> {
    let mut merged = *base;

    if let Some(name) = overrides.direction.as_deref() {
        merged.render.direction = name.parse::<GraphDirection>()?;
    }
    if let Some(value) = overrides.indent {
        merged.render = merged.render.with_indent(value)?;
    }
    if let Some(value) = overrides.validate {
        merged.validate = value;
    }

    Ok(merged)
}

/// Validation messages for `input`. Text that does not load yields its load
/// error as the single message.
#[must_use]
pub fn validate_input(input: &str) -> Vec<String> {
    match load_value(input) {
        Ok(value) => sf_schema::validate(&value),
        Err(err) => vec![err.to_string()],
    }
}

pub fn lint_input(input: &str) -> Result<Vec<Diagnostic>, SwimflowError> {
    let doc = load_document(input)?;
    let mut diagnostics = sf_schema::lint(&doc);
    diagnostics.extend(identifier_collisions(&doc));
    Ok(diagnostics)
}

/// Load, optionally validate, and compile `input`.
pub fn compile_input(
    input: &str,
    config: &MermaidRenderConfig,
    validate: bool,
) -> Result<CompileReport, SwimflowError> {
    let doc = if validate {
        validated_document(load_value(input)?)?
    } else {
        load_document(input)?
    };
    Ok(compile_report(&doc, config))
}

/// The process document inside `input`, as pretty-printed JSON.
pub fn extract_input(input: &str) -> Result<String, SwimflowError> {
    let value = load_value(input)?;
    serde_json::to_string_pretty(&value).map_err(|err| SwimflowError::load(err.to_string()))
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn init(config: Option<JsValue>) -> Result<(), JsValue> {
    let overrides: RuntimeInitConfig = parse_js_value_or_default(config)?;
    let next = merge_runtime_config(&read_runtime_config(), &overrides).map_err(js_error)?;
    write_runtime_config(next);
    Ok(())
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = validate))]
pub fn validate_js(input: &str) -> Result<JsValue, JsValue> {
    to_js_value(&validate_input(input))
}

/// Validation errors plus lint warnings in one call, for editor panels.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = check))]
pub fn check_js(input: &str) -> Result<JsValue, JsValue> {
    let errors = validate_input(input);
    let warnings = if errors.is_empty() {
        lint_input(input).map_err(|err| js_error(error_message(&err)))?
    } else {
        Vec::new()
    };
    to_js_value(&ValidationOutput {
        valid: errors.is_empty(),
        errors,
        warnings,
    })
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = lint))]
pub fn lint_js(input: &str) -> Result<JsValue, JsValue> {
    let diagnostics = lint_input(input).map_err(|err| js_error(error_message(&err)))?;
    to_js_value(&diagnostics)
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = compile))]
pub fn compile_js(input: &str, config: Option<JsValue>) -> Result<String, JsValue> {
    compile_report_js_inner(input, config).map(|report| report.source)
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = compileReport))]
pub fn compile_report_js(input: &str, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    to_js_value(&compile_report_js_inner(input, config)?)
}

fn compile_report_js_inner(input: &str, config: Option<JsValue>) -> Result<CompileReport, JsValue> {
    let overrides: RuntimeInitConfig = parse_js_value_or_default(config)?;
    let runtime = merge_runtime_config(&read_runtime_config(), &overrides).map_err(js_error)?;
    compile_input(input, &runtime.render, runtime.validate)
        .map_err(|err| js_error(error_message(&err)))
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = extract))]
pub fn extract_js(input: &str) -> Result<String, JsValue> {
    extract_input(input).map_err(|err| js_error(error_message(&err)))
}

#[cfg(test)]
mod tests {
    use super::{
        RuntimeConfig, RuntimeInitConfig, compile_input, error_message, extract_input,
        lint_input, merge_runtime_config, validate_input,
    };
    use sf_core::SwimflowError;
    use sf_render_mermaid::{GraphDirection, MermaidRenderConfig};

    const VALID: &str = r#"{
        "processName": "Onboarding",
        "processId": "p-1",
        "actors": [{ "id": "hr", "name": "HR" }],
        "steps": [
            { "id": "s", "type": "start", "label": "Offer Signed", "actorId": "hr" },
            { "id": "e", "type": "end", "label": "Day One", "actorId": "hr" }
        ],
        "flows": [{ "from": "s", "to": "e" }]
    }"#;

    #[test]
    fn merge_applies_direction_indent_and_validation() {
        let overrides = RuntimeInitConfig {
            direction: Some("lr".to_string()),
            indent: Some(2),
            validate: Some(false),
        };
        let merged =
            merge_runtime_config(&RuntimeConfig::default(), &overrides).expect("merges");
        assert_eq!(merged.render.direction, GraphDirection::LR);
        assert_eq!(merged.render.indent, 2);
        assert!(!merged.validate);
    }

    #[test]
    fn merge_keeps_base_when_overrides_are_absent() {
        let base = RuntimeConfig::default();
        let merged = merge_runtime_config(&base, &RuntimeInitConfig::default()).expect("merges");
        assert_eq!(merged, base);
    }

    #[test]
    fn merge_rejects_unknown_direction() {
        let overrides = RuntimeInitConfig {
            direction: Some("diagonal".to_string()),
            ..RuntimeInitConfig::default()
        };
        let err = merge_runtime_config(&RuntimeConfig::default(), &overrides)
            .expect_err("unknown direction");
        assert!(err.contains("diagonal"));
    }

    #[test]
    fn merge_rejects_oversized_indent() {
        for indent in [1_000, usize::MAX] {
            let overrides = RuntimeInitConfig {
                indent: Some(indent),
                ..RuntimeInitConfig::default()
            };
            let err = merge_runtime_config(&RuntimeConfig::default(), &overrides)
                .expect_err("indent too wide");
            assert!(err.contains("exceeds the maximum"), "{err}");
        }
    }

    #[test]
    fn validate_reports_load_failures_as_messages() {
        assert!(validate_input(VALID).is_empty());
        assert_eq!(validate_input("   "), vec!["Input is empty".to_string()]);
    }

    #[test]
    fn compile_refuses_invalid_documents_with_every_message() {
        let err = compile_input(
            r#"{ "processName": "p", "actors": [], "steps": [] }"#,
            &MermaidRenderConfig::default(),
            true,
        )
        .expect_err("invalid");
        let message = error_message(&err);
        assert!(message.starts_with("[swimflow/error/validation]"));
        assert!(message.contains("Missing required field: processId"));
        assert!(message.contains("Process must have exactly one start node"));
    }

    #[test]
    fn compile_without_validation_only_needs_collections() {
        let report = compile_input(
            r#"{ "actors": [], "steps": [] }"#,
            &MermaidRenderConfig::default(),
            false,
        )
        .expect("compiles");
        assert!(report.source.starts_with("flowchart TD"));
        assert_eq!(report.lane_count, 0);
    }

    #[test]
    fn compile_returns_source_and_figures() {
        let report =
            compile_input(VALID, &MermaidRenderConfig::default(), true).expect("compiles");
        assert!(report.source.contains("subgraph hr[\"HR\"]"));
        assert_eq!(report.lane_order, vec!["hr"]);
        assert_eq!(report.node_count, 2);
        assert_eq!(report.edge_count, 1);
    }

    #[test]
    fn lint_and_extract_read_fenced_replies() {
        let reply = format!("Here is the process:\n```json\n{VALID}\n```\nLet me know!");
        assert!(lint_input(&reply).expect("loads").is_empty());
        let extracted = extract_input(&reply).expect("extracts");
        assert!(extracted.contains("\"processId\": \"p-1\""));
    }

    #[test]
    fn lint_reports_rendered_id_collisions() {
        let input = VALID.replace(r#""id": "e""#, r#""id": "hr""#);
        let codes: Vec<_> = lint_input(&input)
            .expect("loads")
            .into_iter()
            .map(|diagnostic| diagnostic.code)
            .collect();
        assert!(codes.contains(&"W009".to_string()), "{codes:?}");
    }

    #[test]
    fn load_errors_keep_their_code() {
        let err = extract_input("").expect_err("empty");
        assert!(matches!(err, SwimflowError::Load { .. }));
        assert_eq!(error_message(&err), "[swimflow/error/load] Input is empty");
    }
}
