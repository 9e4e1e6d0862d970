#![forbid(unsafe_code)]

//! Compiles SwimFlow process documents into Mermaid flowchart source.
//!
//! The output is one `subgraph` per actor (a swimlane), ordered by walking the
//! process from its start step, followed by one edge per flow and the two
//! annotation style classes. Output is deterministic for a given document.

mod ident;
mod lanes;
mod source;
mod text;
mod theme;

pub use ident::{
    RESERVED_PREFIX, RESERVED_WORDS, identifier_collisions, is_reserved, sanitize_id,
};
pub use lanes::swimlane_order;
pub use source::MermaidSource;
pub use text::{LINE_BREAK, QUOTE_ENTITY, escape_label};
pub use theme::{CONTROL, RISK, STYLE_CLASSES, StyleClass, classes_for};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sf_core::{Flow, ProcessDocument, Step, StepType, SwimflowError};
use tracing::debug;

/// Flowchart direction written in the header line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum GraphDirection {
    #[serde(alias = "tb")]
    TB,
    #[default]
    #[serde(alias = "td")]
    TD,
    #[serde(alias = "lr")]
    LR,
    #[serde(alias = "rl")]
    RL,
    #[serde(alias = "bt")]
    BT,
}

impl GraphDirection {
    pub const ALL: [Self; 5] = [Self::TB, Self::TD, Self::LR, Self::RL, Self::BT];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TB => "TB",
            Self::TD => "TD",
            Self::LR => "LR",
            Self::RL => "RL",
            Self::BT => "BT",
        }
    }
}

impl fmt::Display for GraphDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|direction| direction.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown flowchart direction: {value} (expected TB, TD, LR, RL or BT)"))
    }
}

/// Widest indent unit, in spaces, that output may use.
pub const MAX_INDENT: usize = 16;

/// Configuration for Mermaid output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct MermaidRenderConfig {
    /// Header direction.
    pub direction: GraphDirection,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for MermaidRenderConfig {
    fn default() -> Self {
        Self {
            direction: GraphDirection::TD,
            indent: 4,
        }
    }
}

impl MermaidRenderConfig {
    /// Replace the indent, rejecting widths above [`MAX_INDENT`].
    pub fn with_indent(mut self, indent: usize) -> Result<Self, String> {
        if indent > MAX_INDENT {
            return Err(format!(
                "indent {indent} exceeds the maximum of {MAX_INDENT} spaces"
            ));
        }
        self.indent = indent;
        Ok(self)
    }
}

/// Node shape for a step type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Rect,
    Circle,
    Diamond,
}

impl NodeShape {
    #[must_use]
    pub const fn for_step(step_type: StepType) -> Self {
        match step_type {
            StepType::Start | StepType::End => Self::Circle,
            StepType::Decision => Self::Diamond,
            StepType::Action => Self::Rect,
        }
    }

    /// Wrap an already escaped label in this shape's delimiters.
    #[must_use]
    pub fn wrap(self, escaped_label: &str) -> String {
        match self {
            Self::Rect => format!("[\"{escaped_label}\"]"),
            Self::Circle => format!("((\"{escaped_label}\"))"),
            Self::Diamond => format!("{{\"{escaped_label}\"}}"),
        }
    }
}

/// Compiled source plus the figures tooling reports next to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompileReport {
    pub source: String,
    /// Actor ids of the emitted swimlanes, in output order.
    pub lane_order: Vec<String>,
    pub lane_count: usize,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Compile a validated document with the default configuration.
#[must_use]
pub fn compile(doc: &ProcessDocument) -> String {
    compile_report(doc, &MermaidRenderConfig::default()).source
}

#[must_use]
pub fn compile_with_config(doc: &ProcessDocument, config: &MermaidRenderConfig) -> String {
    compile_report(doc, config).source
}

/// Compile a document and report what was emitted.
///
/// The document is expected to have passed validation. References that do
/// not resolve are written as-is.
#[must_use]
pub fn compile_report(doc: &ProcessDocument, config: &MermaidRenderConfig) -> CompileReport {
    let mut out = MermaidSource::new(config.indent);
    out.line(0, format!("flowchart {}", config.direction));

    let mut lane_order = Vec::new();
    let mut node_count = 0;
    for actor in swimlane_order(doc) {
        let mut steps = doc.steps_for_actor(&actor.id).peekable();
        if steps.peek().is_none() {
            continue;
        }
        out.line(
            1,
            format!(
                "subgraph {}[\"{}\"]",
                sanitize_id(&actor.id),
                escape_label(&actor.lane_title())
            ),
        );
        for step in steps {
            out.line(2, node_statement(step));
            node_count += 1;
        }
        out.line(1, "end");
        lane_order.push(actor.id.clone());
    }

    for flow in &doc.flows {
        out.line(1, edge_statement(flow));
    }
    for class in &STYLE_CLASSES {
        out.line(1, class.definition());
    }

    let report = CompileReport {
        lane_count: lane_order.len(),
        lane_order,
        node_count,
        edge_count: doc.flows.len(),
        source: out.finish(),
    };
    debug!(
        process = %doc.process_id,
        direction = %config.direction,
        lanes = report.lane_count,
        nodes = report.node_count,
        edges = report.edge_count,
        "compiled process document"
    );
    report
}

/// Compile straight from a JSON value.
///
/// Only checks that `actors` and `steps` are arrays and that the value reads
/// as a document; it does not validate.
pub fn compile_value(doc: &Value) -> Result<String, SwimflowError> {
    let has_collections = ["actors", "steps"]
        .iter()
        .all(|field| doc.get(field).is_some_and(Value::is_array));
    if !has_collections {
        return Err(SwimflowError::invalid_document(
            "actors and steps are required",
        ));
    }
    let document = ProcessDocument::deserialize(doc)
        .map_err(|err| SwimflowError::invalid_document(err.to_string()))?;
    Ok(compile(&document))
}

fn node_statement(step: &Step) -> String {
    let mut statement = sanitize_id(&step.id);
    statement.push_str(&NodeShape::for_step(step.step_type).wrap(&escape_label(&step.label)));
    for class in classes_for(step) {
        statement.push_str(":::");
        statement.push_str(class.name);
    }
    statement
}

fn edge_statement(flow: &Flow) -> String {
    let from = sanitize_id(&flow.from);
    let to = sanitize_id(&flow.to);
    match flow.branch_label() {
        Some(label) => format!("{from} -->|\"{}\"| {to}", escape_label(label)),
        None => format!("{from} --> {to}"),
    }
}
