//! Print the registered artifacts of a document as JSON.

use anyhow::{Context, Result};
use clap::Parser;

use analysis_exporter_lib::{init_logging, ArtifactRecord, Config, Db};

#[derive(Parser, Debug)]
#[command(name = "dump_registry", about = "List the artifacts recorded for a document")]
struct Args {
    document_id: String,

    /// Registry database (default: EXPORTER_REGISTRY_DB or the data dir)
    #[arg(long)]
    db: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let db_path = match args.db {
        Some(path) => path,
        None => Config::from_env().context("Invalid configuration")?.registry_db,
    };
    let records = records_for(&db_path, &args.document_id)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn records_for(db_path: &std::path::Path, document_id: &str) -> Result<Vec<ArtifactRecord>> {
    let db = Db::new(db_path.to_path_buf())
        .with_context(|| format!("Failed to open registry {}", db_path.display()))?;
    let records = db.list_for_document(document_id)?;
    if records.is_empty() {
        tracing::warn!(document_id, "no artifacts recorded");
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_exporter_lib::Registry;

    #[test]
    fn db_flag_is_optional() {
        let args = Args::try_parse_from(["dump_registry", "D1", "--db", "/tmp/r.db"]).unwrap();
        assert_eq!(args.document_id, "D1");
        assert_eq!(args.db.as_deref(), Some(std::path::Path::new("/tmp/r.db")));
        assert!(Args::try_parse_from(["dump_registry", "D1"]).unwrap().db.is_none());
        assert!(Args::try_parse_from(["dump_registry"]).is_err());
    }

    #[test]
    fn lists_records_of_one_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.db");
        {
            let db = Db::new(path.clone()).unwrap();
            db.put(&ArtifactRecord::new("D1", "Response", "a/response.json")).unwrap();
            db.put(&ArtifactRecord::new("D2", "Response", "b/response.json")).unwrap();
        }
        let records = records_for(&path, "D1").unwrap();
        assert_eq!(records, vec![ArtifactRecord::new("D1", "Response", "a/response.json")]);
        assert!(records_for(&path, "D3").unwrap().is_empty());
    }
}
