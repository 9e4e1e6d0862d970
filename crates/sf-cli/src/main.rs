#![forbid(unsafe_code)]

//! SwimFlow CLI - validate process documents and compile them to Mermaid.
//!
//! # Commands
//!
//! - `validate`: Check a process document and report errors and warnings
//! - `compile`: Compile a process document to a Mermaid swimlane flowchart
//! - `extract`: Pull the process document out of a language-model reply
//! - `lanes`: Show the computed swimlane order

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sf_core::{Diagnostic, ProcessDocument, SwimflowError};
use sf_render_mermaid::{
    GraphDirection, MermaidRenderConfig, compile_report, identifier_collisions, swimlane_order,
};
use sf_schema::{lint, load_document, load_value, validate, validated_document};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// SwimFlow CLI - validate process documents and compile them to Mermaid.
#[derive(Debug, Parser)]
#[command(
    name = "swimflow",
    version,
    about = "SwimFlow CLI - validate process documents and compile them to Mermaid",
    long_about = "Turns structured business-process documents into Mermaid swimlane\n\
        flowcharts. Input may be JSON, JSON5, YAML, or a language-model reply\n\
        containing a fenced code block."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a swimflow.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a process document and report diagnostics.
    Validate {
        /// Input file path, "-" for stdin, or inline document text.
        #[arg(default_value = "-")]
        input: String,

        /// Output as JSON (structured diagnostics)
        #[arg(long)]
        json: bool,

        /// Exit with non-zero status on warnings (not just errors)
        #[arg(long)]
        strict: bool,
    },

    /// Compile a process document to a Mermaid flowchart.
    Compile {
        /// Input file path, "-" for stdin, or inline document text.
        #[arg(default_value = "-")]
        input: String,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,

        /// Flowchart direction (TB, TD, LR, RL, BT)
        #[arg(short, long)]
        direction: Option<GraphDirection>,

        /// Print compile metadata (lanes, counts, timing) as JSON on stderr
        #[arg(long)]
        json: bool,

        /// Skip validation and compile the document as-is
        #[arg(long)]
        no_validate: bool,
    },

    /// Extract the process document from free text and print it as JSON.
    Extract {
        /// Input file path, "-" for stdin, or inline text.
        #[arg(default_value = "-")]
        input: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the swimlane order the compiler would use.
    Lanes {
        /// Input file path, "-" for stdin, or inline document text.
        #[arg(default_value = "-")]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Contents of `swimflow.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    render: RenderSection,
    validate: ValidateSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
struct RenderSection {
    direction: Option<GraphDirection>,
    indent: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
struct ValidateSection {
    strict: bool,
}

impl FileConfig {
    /// Render configuration with file values applied, then the CLI override.
    fn render_config(&self, direction: Option<GraphDirection>) -> Result<MermaidRenderConfig> {
        let mut config = MermaidRenderConfig::default();
        if let Some(value) = self.render.direction {
            config.direction = value;
        }
        if let Some(value) = self.render.indent {
            config = config
                .with_indent(value)
                .map_err(|err| anyhow::anyhow!("[render] {err}"))?;
        }
        if let Some(value) = direction {
            config.direction = value;
        }
        Ok(config)
    }
}

/// Result of validating a document.
#[derive(Debug, Serialize)]
struct ValidateResult {
    valid: bool,
    process_id: Option<String>,
    errors: Vec<String>,
    warnings: Vec<Diagnostic>,
}

/// Result of compiling a document.
#[derive(Debug, Serialize)]
struct CompileResult {
    process_id: String,
    direction: GraphDirection,
    lane_order: Vec<String>,
    lane_count: usize,
    node_count: usize,
    edge_count: usize,
    output_bytes: usize,
    load_time_ms: f64,
    compile_time_ms: f64,
    total_time_ms: f64,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LaneEntry {
    id: String,
    title: String,
    step_count: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet, cli.log_json);
    let file_config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Validate {
            input,
            json,
            strict,
        } => cmd_validate(&input, json, strict || file_config.validate.strict),

        Command::Compile {
            input,
            output,
            direction,
            json,
            no_validate,
        } => cmd_compile(
            &input,
            output.as_deref(),
            &file_config.render_config(direction)?,
            json,
            no_validate,
        ),

        Command::Extract { input, pretty } => cmd_extract(&input, pretty),

        Command::Lanes { input, json } => cmd_lanes(&input, json),
    }
}

fn init_tracing(verbose: u8, quiet: bool, json: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time();
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn load_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config = parse_config(&text)
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

fn parse_config(text: &str) -> Result<FileConfig> {
    Ok(toml::from_str(text)?)
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if Path::new(input).exists() {
        std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))
    } else {
        // Treat as inline document text
        Ok(input.to_string())
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).context(format!("Failed to write to: {path}"))?;
            info!("Wrote output to: {path}");
        }
        None => {
            io::stdout()
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

// =============================================================================
// Command: validate
// =============================================================================

/// Lint findings plus Mermaid id collisions.
fn diagnostics_for(doc: &ProcessDocument) -> Vec<Diagnostic> {
    let mut diagnostics = lint(doc);
    diagnostics.extend(identifier_collisions(doc));
    diagnostics
}

fn cmd_validate(input: &str, json_output: bool, strict: bool) -> Result<()> {
    let source = load_input(input)?;
    let value = load_value(&source)?;
    let process_id = value
        .get("processId")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);

    let mut errors = validate(&value);
    let mut warnings = Vec::new();
    if errors.is_empty() {
        match validated_document(value) {
            Ok(doc) => warnings = diagnostics_for(&doc),
            Err(err) => errors.push(err.to_string()),
        }
    }

    let valid = errors.is_empty() && (!strict || warnings.is_empty());
    let result = ValidateResult {
        valid,
        process_id,
        errors,
        warnings,
    };

    if json_output {
        let output = serde_json::to_string_pretty(&result)?;
        println!("{output}");
    } else {
        let name = result.process_id.as_deref().unwrap_or("<unnamed>");
        if result.valid {
            println!("✓ Valid process {name}");
        } else {
            println!("✗ Invalid process {name}");
        }

        if !result.errors.is_empty() {
            println!("\nErrors:");
            for err in &result.errors {
                println!("  {err}");
            }
        }

        if !result.warnings.is_empty() {
            println!("\nWarnings:");
            for warning in &result.warnings {
                println!("  {warning}");
                if let Some(suggestion) = &warning.suggestion {
                    println!("       → {suggestion}");
                }
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}

// =============================================================================
// Command: compile
// =============================================================================

fn cmd_compile(
    input: &str,
    output: Option<&str>,
    config: &MermaidRenderConfig,
    json_output: bool,
    no_validate: bool,
) -> Result<()> {
    let total_start = Instant::now();

    let load_start = Instant::now();
    let source = load_input(input)?;
    let doc = if no_validate {
        load_document(&source)?
    } else {
        gate(load_value(&source)?)?
    };
    let load_time = load_start.elapsed();

    let warnings: Vec<String> = diagnostics_for(&doc)
        .iter()
        .map(ToString::to_string)
        .collect();
    for warning in &warnings {
        warn!("{warning}");
    }

    let compile_start = Instant::now();
    let report = compile_report(&doc, config);
    let compile_time = compile_start.elapsed();

    let mut rendered = report.source;
    rendered.push('\n');
    let total_time = total_start.elapsed();

    if json_output {
        let result = CompileResult {
            process_id: doc.process_id.clone(),
            direction: config.direction,
            lane_order: report.lane_order,
            lane_count: report.lane_count,
            node_count: report.node_count,
            edge_count: report.edge_count,
            output_bytes: rendered.len(),
            load_time_ms: load_time.as_secs_f64() * 1000.0,
            compile_time_ms: compile_time.as_secs_f64() * 1000.0,
            total_time_ms: total_time.as_secs_f64() * 1000.0,
            warnings,
        };
        let json_str = serde_json::to_string_pretty(&result)?;
        eprintln!("{json_str}");
    }

    write_output(output, &rendered)?;

    info!(
        "Compiled {} lanes, {} nodes, {} edges in {:.2}ms",
        report.lane_count,
        report.node_count,
        report.edge_count,
        total_time.as_secs_f64() * 1000.0
    );

    Ok(())
}

/// Validate and deserialize, listing every validation error on stderr.
fn gate(value: serde_json::Value) -> Result<ProcessDocument> {
    match validated_document(value) {
        Ok(doc) => Ok(doc),
        Err(SwimflowError::Validation { errors }) => {
            for err in &errors {
                eprintln!("  {err}");
            }
            bail!("Process document failed validation ({} error(s))", errors.len())
        }
        Err(err) => Err(err.into()),
    }
}

// =============================================================================
// Command: extract
// =============================================================================

fn cmd_extract(input: &str, pretty: bool) -> Result<()> {
    let source = load_input(input)?;
    let value = load_value(&source)?;
    let output = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{output}");
    Ok(())
}

// =============================================================================
// Command: lanes
// =============================================================================

fn cmd_lanes(input: &str, json_output: bool) -> Result<()> {
    let source = load_input(input)?;
    let doc = load_document(&source)?;
    let lanes = lane_entries(&doc);

    if json_output {
        let output = serde_json::to_string_pretty(&lanes)?;
        println!("{output}");
    } else {
        for (index, lane) in lanes.iter().enumerate() {
            println!(
                "{:>2}. {} ({}, {} steps)",
                index + 1,
                lane.title,
                lane.id,
                lane.step_count
            );
        }
    }
    Ok(())
}

fn lane_entries(doc: &ProcessDocument) -> Vec<LaneEntry> {
    swimlane_order(doc)
        .into_iter()
        .map(|actor| LaneEntry {
            id: actor.id.clone(),
            title: actor.lane_title(),
            step_count: doc.steps_for_actor(&actor.id).count(),
        })
        .collect()
}
