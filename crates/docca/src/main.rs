//! docca: render Doxygen XML through a template.
//!
//! Reads a Doxygen `index.xml`, loads every compound it lists from the data
//! directory, and writes the rendered template.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docca::{collect_compound_refs, environment, render, Config, Corpus, TemplateLoader};

#[derive(Parser)]
#[command(
    name = "docca",
    version,
    about = "Generate API reference markup from Doxygen XML"
)]
struct Cli {
    /// Doxygen index file; reads stdin when omitted
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output file; writes stdout when omitted
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// JSON configuration file; later files override earlier ones
    #[arg(short = 'c', long = "config")]
    config: Vec<PathBuf>,

    /// Jinja template to render
    #[arg(short = 'T', long)]
    template: Option<PathBuf>,

    /// Additional template search directory
    #[arg(short = 'I', long = "include")]
    include: Vec<PathBuf>,

    /// Directory holding the per-compound XML files; defaults to the
    /// directory of the index file
    #[arg(short = 'D', long)]
    directory: Option<PathBuf>,
}

fn initialize_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_index(cli: &Cli) -> Result<String> {
    match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn data_directory(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.directory {
        return Ok(dir.clone());
    }
    match cli.input.as_deref().and_then(|input| input.parent()) {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => std::env::current_dir().context("failed to determine the current directory"),
    }
}

/// Template directory and name to load; the built-in template by default.
fn template_source(cli: &Cli) -> Result<(Option<PathBuf>, String)> {
    let Some(template) = &cli.template else {
        return Ok((None, docca::DEFAULT_TEMPLATE.to_string()));
    };
    let name = template
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid template path {}", template.display()))?
        .to_string();
    let dir = template
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), |parent| parent.to_path_buf());
    Ok((Some(dir), name))
}

fn main() -> Result<()> {
    initialize_tracing();
    let cli = Cli::parse();

    let config = Config::load(&cli.config).context("failed to load configuration")?;
    let index = read_index(&cli)?;
    let refs = collect_compound_refs(&index).context("failed to parse the index")?;
    let dir = data_directory(&cli)?;
    info!(compounds = refs.len(), dir = %dir.display(), "Loading corpus");

    let corpus = Corpus::load(&dir, &refs).context("failed to build the entity graph")?;

    let (template_dir, template) = template_source(&cli)?;
    let env = environment(&config, TemplateLoader::new(template_dir, cli.include.clone()));
    let output = render(&env, &template, Arc::new(corpus))
        .with_context(|| format!("failed to render {template}"))?;

    match &cli.output {
        Some(path) => fs::write(path, output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout()
            .write_all(output.as_bytes())
            .context("failed to write stdout")?,
    }
    Ok(())
}
