//! Event Schema CLI
//!
//! Derives event schemas from type descriptor files and writes them as JSON.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use event_schemas::{Checksum, EventSchema, OutputFormat, SchemaConfig, SchemaJsonWriter, TypeDescriptor};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "event-schema")]
#[command(about = "Derive event schemas from type descriptors")]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the schema of one descriptor
    Derive {
        /// Descriptor file (JSON or TOML)
        descriptor: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force compact output
        #[arg(long)]
        compact: bool,
    },

    /// Derive every descriptor under a directory
    Export {
        /// Directory containing descriptors
        source: PathBuf,

        /// Output directory (defaults to export.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        /// Save it to this file instead
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SchemaConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Derive {
            descriptor,
            output,
            compact,
        } => {
            let format = if compact {
                OutputFormat::Compact
            } else {
                config.writer.output_format
            };
            derive(&descriptor, output.as_deref(), format)
        }
        Commands::Export { source, output } => {
            let output = output.unwrap_or_else(|| config.export.output_dir.clone());
            export(&config, &source, &output)
        }
        Commands::Config { save } => match save {
            Some(path) => {
                config.save(&path)?;
                eprintln!("💾 Saved configuration to {}", path.display());
                Ok(())
            }
            None => {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
        },
    }
}

fn load_schema(path: &Path) -> anyhow::Result<EventSchema> {
    let descriptor = TypeDescriptor::from_path(path)
        .with_context(|| format!("reading descriptor {}", path.display()))?;
    EventSchema::derive(&descriptor)
        .with_context(|| format!("deriving schema of {}", descriptor.name))
}

fn derive(descriptor: &Path, output: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
    let schema = load_schema(descriptor)?;
    let writer = SchemaJsonWriter::new(format);

    match output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            writer.write_to(&mut file, &schema)?;
            eprintln!("📄 {} -> {}", schema.key(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            writer.write_to(&mut lock, &schema)?;
            writeln!(lock)?;
        }
    }

    eprintln!("🔒 {}", schema.fingerprint()?);
    Ok(())
}

/// `<event type>/<version>.json`, or `None` when the event type would not
/// stay a single directory under the output root
fn export_path(schema: &EventSchema) -> Option<String> {
    let event_type = schema.event_type();
    if event_type.contains(['/', '\\']) {
        return None;
    }
    let mut components = Path::new(event_type).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Some(format!("{}/{}.json", event_type, schema.version())),
        _ => None,
    }
}

fn export(config: &SchemaConfig, source: &Path, output: &Path) -> anyhow::Result<()> {
    if !source.is_dir() {
        bail!("{} is not a directory", source.display());
    }

    let writer = SchemaJsonWriter::new(config.writer.output_format);
    let mut checksums = Vec::new();

    for entry in WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || !config.export.is_descriptor(path) {
            continue;
        }

        let schema = match load_schema(path) {
            Ok(schema) => schema,
            Err(e) => {
                warn!("skipping {}: {:#}", path.display(), e);
                continue;
            }
        };

        let Some(relative) = export_path(&schema) else {
            warn!(
                "skipping {}: event type {:?} is not a plain directory name",
                path.display(),
                schema.event_type()
            );
            continue;
        };
        let target = output.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let document = writer.to_string(&schema)?;
        fs::write(&target, &document)?;
        checksums.push(Checksum::from_str(&document).to_line(&relative));
        info!(schema = %schema.key(), "exported {}", target.display());
    }

    if checksums.is_empty() {
        bail!("no descriptors found under {}", source.display());
    }

    if config.export.include_checksums {
        fs::create_dir_all(output)?;
        let mut manifest = checksums.join("\n");
        manifest.push('\n');
        fs::write(output.join("checksums.sha256"), manifest)?;
    }

    println!("✅ Exported {} schemas to {}", checksums.len(), output.display());
    Ok(())
}
