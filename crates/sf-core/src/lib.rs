#![forbid(unsafe_code)]

//! Process document model shared by the SwimFlow validator and compiler.
//!
//! JSON field names are camelCase to match the documents produced by the
//! conversational front end; Rust field names follow the usual snake_case.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display budget for a step label, in grapheme clusters.
pub const MAX_LABEL_CHARS: usize = 60;

/// Display budget for a control or risk short description.
pub const MAX_ANNOTATION_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    #[default]
    Action,
    Decision,
    Start,
    End,
}

impl StepType {
    pub const ALL: [Self; 4] = [Self::Action, Self::Decision, Self::Start, Self::End];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Decision => "decision",
            Self::Start => "start",
            Self::End => "end",
        }
    }

    /// Exact, case-sensitive match against the wire names.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Start | Self::End)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    #[default]
    Normal,
    Conditional,
}

impl FlowType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Conditional => "conditional",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ControlType {
    #[default]
    Preventive,
    Detective,
    Corrective,
}

impl ControlType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preventive => "preventive",
            Self::Detective => "detective",
            Self::Corrective => "corrective",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskSeverity {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskSeverity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Layout hint carried through from the editor. The compiler ignores it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Actor {
    /// Swimlane title: `name`, or `name - department` when a department is set.
    #[must_use]
    pub fn lane_title(&self) -> String {
        match self.department.as_deref() {
            Some(department) if !department.is_empty() => {
                format!("{} - {department}", self.name)
            }
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    #[serde(rename = "type", default)]
    pub step_type: StepType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub actor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub controls: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Step {
    #[must_use]
    pub fn has_controls(&self) -> bool {
        !self.controls.is_empty()
    }

    #[must_use]
    pub fn has_risks(&self) -> bool {
        !self.risks.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutcome {
    #[serde(alias = "outcome")]
    pub label: String,
    pub next_step_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: String,
    pub step_id: String,
    #[serde(default)]
    pub criteria: String,
    #[serde(default)]
    pub outcomes: Vec<DecisionOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub id: String,
    #[serde(rename = "type", default)]
    pub control_type: ControlType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub detailed_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: RiskSeverity,
    #[serde(default)]
    pub detailed_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub flow_type: FlowType,
}

impl Flow {
    /// Branch text to render, if any. An empty label counts as absent; the
    /// flow `type` plays no part.
    #[must_use]
    pub fn branch_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|label| !label.is_empty())
    }
}

/// Root artifact exchanged between the conversation layer and the compiler.
///
/// `actors` and `steps` are required when deserializing; a document without
/// them is rejected before it reaches the compiler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDocument {
    #[serde(default)]
    pub process_name: String,
    #[serde(default)]
    pub process_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub actors: Vec<Actor>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
    #[serde(default)]
    pub controls: Vec<Control>,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub flows: Vec<Flow>,
}

impl ProcessDocument {
    #[must_use]
    pub fn find_actor(&self, id: &str) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    #[must_use]
    pub fn find_step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// First step typed `start`, in document order.
    #[must_use]
    pub fn start_step(&self) -> Option<&Step> {
        self.steps
            .iter()
            .find(|step| step.step_type == StepType::Start)
    }

    pub fn steps_for_actor<'a>(&'a self, actor_id: &'a str) -> impl Iterator<Item = &'a Step> {
        self.steps.iter().filter(move |step| step.actor_id == actor_id)
    }

    pub fn outgoing_flows<'a>(&'a self, step_id: &'a str) -> impl Iterator<Item = &'a Flow> {
        self.flows.iter().filter(move |flow| flow.from == step_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SwimflowErrorCode {
    #[default]
    Load,
    InvalidDocument,
    Validation,
}

impl SwimflowErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Load => "swimflow/error/load",
            Self::InvalidDocument => "swimflow/error/invalid-document",
            Self::Validation => "swimflow/error/validation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum SwimflowError {
    /// Input text could not be read as a document at all.
    #[error("{message}")]
    Load { message: String },
    /// Compiler precondition breach: the document lacks the collections the
    /// compiler walks.
    #[error("Invalid process document: {message}")]
    InvalidDocument { message: String },
    /// The validator rejected the document.
    #[error("Process document failed validation ({} error(s))", .errors.len())]
    Validation { errors: Vec<String> },
}

impl SwimflowError {
    #[must_use]
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> SwimflowErrorCode {
        match self {
            Self::Load { .. } => SwimflowErrorCode::Load,
            Self::InvalidDocument { .. } => SwimflowErrorCode::InvalidDocument,
            Self::Validation { .. } => SwimflowErrorCode::Validation,
        }
    }
}

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DiagnosticSeverity {
    Hint,
    Info,
    #[default]
    Warning,
    Error,
}

impl DiagnosticSeverity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hint => "hint",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A soft finding about a document. Diagnostics never block compilation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    /// Stable rule code, for example `W001`.
    pub code: String,
    pub message: String,
    /// Id of the step, decision, control or risk the finding is about.
    pub subject: Option<String>,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(
        severity: DiagnosticSeverity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, code, message)
    }

    #[must_use]
    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Info, code, message)
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> ProcessDocument {
        serde_json::from_value(json!({
            "processName": "Expense approval",
            "processId": "proc-1",
            "lastUpdated": "2026-01-05T10:00:00Z",
            "actors": [
                { "id": "emp", "name": "Employee" },
                { "id": "mgr", "name": "Manager", "department": "Sales" }
            ],
            "steps": [
                { "id": "s1", "type": "start", "label": "Start", "actorId": "emp" },
                { "id": "s2", "label": "Submit", "actorId": "emp", "controls": ["c1"] },
                { "id": "s3", "type": "end", "label": "Done", "actorId": "mgr" }
            ],
            "controls": [
                { "id": "c1", "type": "detective", "description": "Receipt check" }
            ],
            "flows": [
                { "from": "s1", "to": "s2" },
                { "from": "s2", "to": "s3", "label": "", "type": "conditional" }
            ]
        }))
        .expect("sample document should deserialize")
    }

    #[test]
    fn step_type_defaults_to_action() {
        let doc = sample_document();
        assert_eq!(doc.steps[1].step_type, StepType::Action);
        assert_eq!(doc.controls[0].control_type, ControlType::Detective);
    }

    #[test]
    fn step_type_parse_is_exact() {
        assert_eq!(StepType::parse("decision"), Some(StepType::Decision));
        assert_eq!(StepType::parse("Decision"), None);
        assert_eq!(StepType::parse("gateway"), None);
        assert!(StepType::End.is_terminal());
        assert!(!StepType::Decision.is_terminal());
    }

    #[test]
    fn lane_title_appends_department() {
        let doc = sample_document();
        assert_eq!(doc.actors[0].lane_title(), "Employee");
        assert_eq!(doc.actors[1].lane_title(), "Manager - Sales");

        let empty_department = Actor {
            id: "a".to_string(),
            name: "Auditor".to_string(),
            department: Some(String::new()),
        };
        assert_eq!(empty_department.lane_title(), "Auditor");
    }

    #[test]
    fn empty_flow_label_is_not_a_branch_label() {
        let doc = sample_document();
        assert_eq!(doc.flows[1].flow_type, FlowType::Conditional);
        assert_eq!(doc.flows[1].branch_label(), None);

        let labeled = Flow {
            from: "a".to_string(),
            to: "b".to_string(),
            label: Some("Yes".to_string()),
            flow_type: FlowType::Normal,
        };
        assert_eq!(labeled.branch_label(), Some("Yes"));
    }

    #[test]
    fn document_lookups() {
        let doc = sample_document();
        assert_eq!(doc.start_step().map(|step| step.id.as_str()), Some("s1"));
        assert_eq!(doc.find_actor("mgr").map(|a| a.name.as_str()), Some("Manager"));
        assert!(doc.find_step("missing").is_none());
        assert_eq!(doc.steps_for_actor("emp").count(), 2);
        assert_eq!(doc.outgoing_flows("s2").count(), 1);
        assert!(doc.steps[1].has_controls());
        assert!(!doc.steps[1].has_risks());
    }

    #[test]
    fn missing_steps_fails_to_deserialize() {
        let result = serde_json::from_value::<ProcessDocument>(json!({
            "processName": "x",
            "actors": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn decision_outcome_accepts_outcome_alias() {
        let decision: Decision = serde_json::from_value(json!({
            "id": "d1",
            "stepId": "s2",
            "criteria": "Amount under limit",
            "outcomes": [{ "outcome": "Approved", "nextStepId": "s3" }]
        }))
        .expect("decision should deserialize");
        assert_eq!(decision.outcomes[0].label, "Approved");
        assert_eq!(decision.outcomes[0].next_step_id, "s3");
    }

    #[test]
    fn document_serializes_with_camel_case_names() {
        let doc = sample_document();
        let value = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(value["processName"], "Expense approval");
        assert_eq!(value["steps"][0]["actorId"], "emp");
        assert_eq!(value["steps"][0]["type"], "start");
        assert_eq!(value["flows"][1]["type"], "conditional");
    }

    #[test]
    fn error_codes_and_messages() {
        let err = SwimflowError::invalid_document("actors and steps are required");
        assert_eq!(err.code().as_str(), "swimflow/error/invalid-document");
        assert_eq!(
            err.to_string(),
            "Invalid process document: actors and steps are required"
        );

        let err = SwimflowError::Validation {
            errors: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.code(), SwimflowErrorCode::Validation);
        assert_eq!(err.to_string(), "Process document failed validation (2 error(s))");
    }

    #[test]
    fn diagnostic_builder_methods_are_chainable() {
        let diagnostic = Diagnostic::warning("W001", "too few branches")
            .with_subject("s2")
            .with_suggestion("label both outcomes");
        assert_eq!(diagnostic.severity, DiagnosticSeverity::Warning);
        assert_eq!(diagnostic.subject.as_deref(), Some("s2"));
        assert_eq!(diagnostic.to_string(), "[W001] too few branches");
        assert!(DiagnosticSeverity::Error > DiagnosticSeverity::Warning);
    }
}
