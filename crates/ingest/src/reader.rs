use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use crate::record::PatentRecord;

pub struct FileReader;

#[derive(Deserialize)]
#[serde(untagged)]
enum IdEntry {
    Plain(String),
    Object { patent_id: String },
}

impl FileReader {
    pub async fn read_record(path: &Path) -> Result<PatentRecord> {
        let content = fs::read_to_string(path)
            .await
            .context(format!("Failed to read patent file: {:?}", path))?;

        let mut record: PatentRecord = serde_json::from_str(&content)
            .context(format!("Failed to parse patent file: {:?}", path))?;

        // Fall back to the file stem when the record carries no id
        if record.patent_id.is_empty() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                record.patent_id = stem.to_string();
            }
        }

        Ok(record)
    }

    /// List `*.json` files directly under `dir` whose name ends with `suffix`,
    /// sorted by path. Files ending with one of `exclude` are skipped.
    pub fn list_json_files(dir: &Path, suffix: &str, exclude: &[&str]) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            anyhow::bail!("Not a directory: {:?}", dir);
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.context(format!("Failed to walk directory: {:?}", dir))?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };

            if name.ends_with(suffix) && !exclude.iter().any(|e| name.ends_with(e)) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Read every patent record in a directory.
    /// Each file is parsed independently; a broken file does not hide the others.
    pub async fn read_directory(dir: &Path) -> Result<Vec<(PathBuf, Result<PatentRecord>)>> {
        let files = Self::list_json_files(dir, ".json", &["_rfsl.json"])?;
        let mut records = Vec::with_capacity(files.len());

        for path in files {
            let record = Self::read_record(&path).await;
            records.push((path, record));
        }

        Ok(records)
    }

    /// Read a list of patent ids.
    ///
    /// Accepts a JSON array of strings, a JSON array of objects with a
    /// `patent_id` field, or plain text with one id per line.
    pub async fn read_id_list(path: &Path) -> Result<Vec<String>> {
        let content = fs::read_to_string(path)
            .await
            .context(format!("Failed to read id list: {:?}", path))?;

        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");

        let ids: Vec<String> = if is_json {
            let entries: Vec<IdEntry> = serde_json::from_str(&content)
                .context(format!("Failed to parse id list: {:?}", path))?;
            entries
                .into_iter()
                .map(|e| match e {
                    IdEntry::Plain(id) => id,
                    IdEntry::Object { patent_id } => patent_id,
                })
                .collect()
        } else {
            content.lines().map(|l| l.to_string()).collect()
        };

        Ok(ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && !id.starts_with('#'))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_record_uses_file_stem_as_fallback_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("US8025476B2.json");
        std::fs::write(&path, r#"{"title": "Wind turbine blade"}"#).unwrap();

        let record = FileReader::read_record(&path).await.unwrap();
        assert_eq!(record.patent_id, "US8025476B2");
        assert_eq!(record.title, "Wind turbine blade");
    }

    #[tokio::test]
    async fn test_read_directory_keeps_going_after_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"patent_id": "A"}"#).unwrap();
        std::fs::write(dir.path().join("b.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("A_rfsl.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let records = FileReader::read_directory(dir.path()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert!(records[0].1.is_ok());
        assert!(records[1].1.is_err());
    }

    #[tokio::test]
    async fn test_read_id_list_formats() {
        let dir = tempfile::tempdir().unwrap();

        let json = dir.path().join("ids.json");
        std::fs::write(&json, r#"["US1", {"patent_id": " US2 "}]"#).unwrap();
        assert_eq!(
            FileReader::read_id_list(&json).await.unwrap(),
            vec!["US1".to_string(), "US2".to_string()]
        );

        let txt = dir.path().join("ids.txt");
        std::fs::write(&txt, "US3\n\n# comment\nUS4\n").unwrap();
        assert_eq!(
            FileReader::read_id_list(&txt).await.unwrap(),
            vec!["US3".to_string(), "US4".to_string()]
        );
    }
}
