// file: src/dataset/writer.rs
// description: JSONL writer for generated vector datasets
// reference: https://docs.rs/tempfile

use crate::error::{Result, WarehouseError};
use crate::models::VectorRecord;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Write one JSON object per line. The file is assembled next to the target and
/// renamed into place, so an existing dataset is either fully replaced or untouched.
pub fn write_jsonl(records: &[VectorRecord], path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(WarehouseError::OutputExists {
            path: path.to_path_buf(),
        });
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let staging = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(staging.as_file());
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }

    staging.persist(path).map_err(|e| WarehouseError::Io(e.error))?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::loader::read_vector_items;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample(item_id: u32) -> VectorRecord {
        VectorRecord {
            item_id,
            category: "electronics".to_string(),
            text: Some("headphones".to_string()),
            model: Some("BAAI/bge-base-en-v1.5".to_string()),
            vector: vec![0.25, -0.5],
        }
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/data/vector_items.jsonl");

        write_jsonl(&[sample(1), sample(2)], &path, false).unwrap();

        let back = read_vector_items(&path).unwrap();
        assert_eq!(back, vec![sample(1), sample(2)]);
    }

    #[test]
    fn test_existing_file_untouched_without_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vector_items.jsonl");
        fs::write(&path, "original\n").unwrap();

        let err = write_jsonl(&[sample(1)], &path, false).unwrap_err();
        assert!(matches!(err, WarehouseError::OutputExists { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original\n");
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vector_items.jsonl");
        fs::write(&path, "stale line one\nstale line two\nstale line three\n").unwrap();

        write_jsonl(&[sample(7)], &path, true).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(!content.contains("stale"));
        assert_eq!(read_vector_items(&path).unwrap(), vec![sample(7)]);
    }
}
