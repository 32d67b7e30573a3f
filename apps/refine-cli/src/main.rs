//! Email refinement CLI
//!
//! Reads documents and requests as JSON, writes results as JSON to stdout.
//! Logs go to stderr so the output can be piped.

mod offline;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use email_model::{BlockDocument, EmailDocument};
use email_render::render_email;
use offline::OfflineCompletion;
use refine_engine::{EditRouter, RefineConfig, RefineRequest, SourceTree};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "refine-cli")]
#[command(version, about = "Render and refine email documents")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a block document to subject, HTML and plain text
    Render {
        /// Document JSON file, or `-` for stdin
        input: PathBuf,

        /// Subject used when the blocks do not suggest one
        #[arg(long, default_value = "Your latest update")]
        subject: String,

        /// Print only the HTML body
        #[arg(long)]
        html: bool,
    },

    /// Run a refinement request and print the outcome
    Refine {
        /// Request JSON file, or `-` for stdin
        input: PathBuf,
    },

    /// List the addressable elements of a template source file
    Boundaries {
        /// Template source file, or `-` for stdin
        input: PathBuf,

        /// Attribute carrying element identity
        #[arg(long, default_value = "data-id")]
        id_attribute: String,
    },
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Accepts a tagged [`EmailDocument`] or a bare [`BlockDocument`]
fn parse_block_document(text: &str) -> Result<BlockDocument> {
    if let Ok(document) = serde_json::from_str::<EmailDocument>(text) {
        return match document {
            EmailDocument::Blocks(doc) => Ok(doc),
            EmailDocument::Source(_) => bail!("Only block documents can be rendered"),
        };
    }
    serde_json::from_str(text).context("Input is not a block document")
}

async fn run(command: Command) -> Result<bool> {
    match command {
        Command::Render {
            input,
            subject,
            html,
        } => {
            let document = parse_block_document(&read_input(&input)?)?;
            let rendered = render_email(&document, &subject);
            if html {
                println!("{}", rendered.html);
            } else {
                println!("{}", serde_json::to_string_pretty(&rendered)?);
            }
            Ok(true)
        }
        Command::Refine { input } => {
            let request: RefineRequest = serde_json::from_str(&read_input(&input)?)
                .context("Input is not a refinement request")?;
            let config = RefineConfig::from_env();
            let router = EditRouter::new(Arc::new(OfflineCompletion), config);
            let outcome = router.refine(request).await;
            tracing::info!(
                kind = ?outcome.kind,
                strategy = ?outcome.strategy,
                changed = outcome.changed,
                "Refinement finished"
            );
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(outcome.success)
        }
        Command::Boundaries {
            input,
            id_attribute,
        } => {
            let tree = SourceTree::parse(&read_input(&input)?, &id_attribute)?;
            println!("{}", serde_json::to_string_pretty(&tree.boundaries())?);
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the JSON result, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if !run(args.command).await? {
        std::process::exit(1);
    }
    Ok(())
}
