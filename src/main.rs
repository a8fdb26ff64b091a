//! wgen CLI - workflow DAG generator

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::json;
use tracing::warn;

use wgen::{
    AppendFile, DagNode, DefinitionsRegistry, FixSuggestion, GeneratorConfig, Generator, Graph,
    Node, Pipeline, RegistryMode, SharedState, WgenError,
};

#[derive(Parser)]
#[command(name = "wgen")]
#[command(about = "wgen - workflow DAG generator for orchestration engines")]
#[command(version)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.config/wgen/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the workflow script for a pipeline file
    Generate {
        /// Path to the pipeline YAML file
        file: PathBuf,

        /// Write the script here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base directory for state logs, worker jars and the definitions file
        #[arg(long)]
        home: Option<Utf8PathBuf>,

        /// Definitions file to append registrations to
        #[arg(long)]
        definitions: Option<Utf8PathBuf>,

        /// Leave the wiring calls out of the script
        #[arg(long)]
        no_assemble: bool,
    },

    /// Validate a pipeline file and list its nodes
    Validate {
        /// Path to the pipeline YAML file
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print the shared state a pipeline's tasks would see
    State {
        /// Parent (pipeline) process id
        #[arg(long)]
        parent: u32,

        #[arg(long)]
        home: Option<Utf8PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config;
    let result = match cli.command {
        Commands::Generate {
            file,
            output,
            home,
            definitions,
            no_assemble,
        } => generate(&file, output, config, home, definitions, no_assemble),
        Commands::Validate { file, format } => validate(&file, format),
        Commands::State { parent, home } => state(parent, config, home),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.downcast_ref::<WgenError>().and_then(|e| e.fix_suggestion()) {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>, home: Option<Utf8PathBuf>) -> Result<GeneratorConfig> {
    let mut config = match path {
        Some(path) => GeneratorConfig::load_from(&path)?,
        None => GeneratorConfig::load()?,
    }
    .with_env();

    if let Some(home) = home {
        config.layout.home = Some(home);
    }
    Ok(config)
}

fn load_pipeline(file: &Path) -> Result<(Pipeline, Graph)> {
    let pipeline = Pipeline::load(file)
        .with_context(|| format!("Failed to load pipeline {}", file.display()))?;
    let graph = pipeline.to_graph()?;
    Ok((pipeline, graph))
}

fn generate(
    file: &Path,
    output_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    home: Option<Utf8PathBuf>,
    definitions: Option<Utf8PathBuf>,
    no_assemble: bool,
) -> Result<()> {
    let (pipeline, graph) = load_pipeline(file)?;
    let config = load_config(config_path, home)?;
    let mut layout = config.layout()?;
    if let Some(definitions) = definitions {
        layout.set_definitions_path(definitions);
    }

    let dag_id = pipeline.dag_id()?;
    let generator = Generator::new(layout, config.dag.clone());
    let definitions_path = generator.layout().definitions_path().to_owned();

    let registry = DefinitionsRegistry::new();
    let (mut output, registrations) = match config.registry.mode {
        RegistryMode::Buffered => {
            let output = generator.build(&dag_id, &graph, &registry)?;
            (output, Some(registry.statements()))
        }
        RegistryMode::Append => {
            let sink = AppendFile::new(definitions_path.clone());
            (generator.build(&dag_id, &graph, &sink)?, None)
        }
    };

    let script = match &registrations {
        Some(registrations) if !no_assemble => generator.assemble(&output, registrations),
        _ => output.script.clone(),
    };

    // Script first: a failed write must not leave registrations behind
    match output_path {
        Some(path) => {
            fs::write(&path, &script)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote '{}' ({} nodes) to {}",
                "✓".green(),
                dag_id,
                output.nodes,
                path.display()
            );
        }
        None => print!("{}", script),
    }

    if registrations.is_some() {
        if let Err(e) = registry.flush(&definitions_path) {
            warn!(path = %definitions_path, error = %e, "failed to write definitions");
            output.dropped_registrations += registry.len();
        }
    }

    if output.dropped_registrations > 0 {
        eprintln!(
            "{} {} definition(s) could not be registered in {}",
            "Warning:".yellow().bold(),
            output.dropped_registrations,
            definitions_path
        );
    }

    Ok(())
}

fn validate(file: &Path, format: Format) -> Result<()> {
    let (pipeline, graph) = load_pipeline(file)?;
    graph.validate()?;
    let dag_id = pipeline.dag_id()?;
    let order = graph.traversal()?;
    let nodes: Vec<&Node> = order.iter().filter_map(|r| graph.get(*r)).collect();

    match format {
        Format::Text => {
            println!("{} Pipeline '{}' is valid", "✓".green(), file.display());
            println!("  DAG: {}", dag_id);
            println!("  Nodes: {}", nodes.len());
            for node in nodes {
                println!("    {} {}", node.kind().to_string().dimmed(), node.ident());
            }
        }
        Format::Json => {
            let name_of = |r: Option<wgen::NodeRef>| {
                r.and_then(|r| graph.get(r)).map(|n| n.ident())
            };
            let nodes: Vec<_> = nodes
                .iter()
                .map(|node| {
                    let task = node.as_task();
                    json!({
                        "id": node.id(),
                        "kind": node.kind(),
                        "name": node.ident(),
                        "successor": name_of(task.and_then(|t| t.successor())),
                        "terminal": name_of(task.and_then(|t| t.terminal())),
                    })
                })
                .collect();
            let report = json!({ "dag_id": dag_id, "valid": true, "nodes": nodes });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn state(parent: u32, config_path: Option<PathBuf>, home: Option<Utf8PathBuf>) -> Result<()> {
    let layout = load_config(config_path, home)?.layout()?;
    let state = SharedState::load(&[layout.job_info_path(parent), layout.driver_info_path()])?;

    if state.is_empty() {
        eprintln!(
            "{} No shared state for process {} under {}",
            "→".cyan(),
            parent,
            layout.state_dir()
        );
    }
    for (key, value) in state.iter() {
        println!("{}::{}", key, value);
    }

    Ok(())
}
