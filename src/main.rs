use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use analysis_exporter_lib::services::{MetadataExtractor, NoopSearchIndex, SearchIndex};
use analysis_exporter_lib::{
    init_logging, Collaborators, Config, Db, ExportOptions, ExportSummary, FsObjectStore,
    OutputExporter,
};

#[derive(Parser, Debug)]
#[command(name = "analysis-exporter")]
#[command(version, about = "Persist document analysis results as JSON, text and CSV artifacts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export one analysis result
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Analysis result JSON (single response or array of responses)
    input: PathBuf,

    /// Target bucket for the artifacts
    #[arg(short, long)]
    bucket: String,

    /// Name of the source object the result was produced from
    #[arg(short, long)]
    object_name: String,

    /// Document id (default: random UUID)
    #[arg(short, long)]
    document_id: Option<String>,

    /// Write page-N-forms.csv
    #[arg(long)]
    forms: bool,

    /// Write page-N-tables.csv
    #[arg(long)]
    tables: bool,

    /// Skip search indexing even if an endpoint is configured
    #[arg(long)]
    no_index: bool,

    /// Finish a page's writes before reporting an indexing failure
    #[arg(long)]
    defer_index_errors: bool,
}

impl ExportArgs {
    fn options(&self) -> ExportOptions {
        ExportOptions {
            forms: self.forms,
            tables: self.tables,
            defer_index_errors: self.defer_index_errors,
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export(args) => {
            let config = Config::from_env().context("Invalid configuration")?;
            let summary = export(args, &config)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

fn export(args: ExportArgs, config: &Config) -> Result<ExportSummary> {
    let input = &args.input;
    if !input.is_file() {
        anyhow::bail!("Input is not a file: {}", input.display());
    }
    let raw = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let response: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid JSON in {}", input.display()))?;

    let store = FsObjectStore::new(config.storage_root.clone());
    let registry = Db::new(config.registry_db.clone()).context("Failed to open registry")?;
    let search: Box<dyn SearchIndex> = if args.no_index {
        Box::new(NoopSearchIndex)
    } else {
        config.search_index()?
    };
    let metadata: Box<dyn MetadataExtractor> = config.metadata_extractor()?;

    let options = args.options();
    let document_id = args
        .document_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let exporter = OutputExporter::new(
        document_id.clone(),
        response,
        args.bucket,
        args.object_name,
        options,
        Collaborators {
            store: &store,
            registry: &registry,
            search: search.as_ref(),
            metadata: metadata.as_ref(),
        },
    )
    .with_context(|| format!("Failed to parse {}", input.display()))?
    .with_index_name(config.search_index.clone())
    .with_storage_url_base(config.storage_url_base.clone());

    exporter
        .run()
        .map_err(|err| {
            tracing::error!(code = err.code(), page = ?err.page(), "{}", err);
            err
        })
        .with_context(|| format!("Export failed for document {}", document_id))
}
