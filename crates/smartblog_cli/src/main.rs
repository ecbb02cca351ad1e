//! Command-line tool for inspecting serialized SmartBlog documents.

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use smartblog_core::{Document, NodeRegistry};
use std::fs;
use std::io::{self, Read};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sbdoc", about = "SmartBlog document tool", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Validate a document and report its node count
    Check {
        /// Document file, or `-` for stdin
        file: String,
    },
    /// Print the document's plain text
    Text {
        /// Document file, or `-` for stdin
        file: String,
    },
    /// Re-serialize a document in canonical form
    Normalize {
        /// Document file, or `-` for stdin
        file: String,
        /// Indent the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn read_input(file: &str) -> anyhow::Result<String> {
    if file == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(file).with_context(|| format!("failed to read {}", file))
}

fn load_document(source: &str, registry: &NodeRegistry) -> anyhow::Result<Document> {
    let document = Document::from_json(source, registry)?;
    debug!(nodes = document.len(), "document parsed");
    Ok(document)
}

fn check_output(document: &Document) -> String {
    let nodes = document.len();
    format!("ok: {} node{}", nodes, if nodes == 1 { "" } else { "s" })
}

fn normalize_output(document: &Document, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        document.to_json_pretty()?
    } else {
        document.to_json()?
    };
    Ok(json)
}

fn run(command: Commands, registry: &NodeRegistry) -> anyhow::Result<String> {
    match command {
        Commands::Completions { .. } => Ok(String::new()),
        Commands::Check { file } => {
            let source = read_input(&file)?;
            let document = load_document(&source, registry)
                .with_context(|| format!("{} is not a valid document", file))?;
            info!(file = %file, nodes = document.len(), "document checked");
            Ok(check_output(&document))
        }
        Commands::Text { file } => {
            let document = load_document(&read_input(&file)?, registry)?;
            Ok(document.text_content())
        }
        Commands::Normalize { file, pretty } => {
            let document = load_document(&read_input(&file)?, registry)?;
            normalize_output(&document, pretty)
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartblog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let Cli { command } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let registry = NodeRegistry::with_defaults();
    let output = run(command, &registry)?;
    println!("{}", output);
    Ok(())
}
