use anyhow::{Result, bail};
use std::future::Future;
use std::path::PathBuf;

use crate::reader::FileReader;
use crate::record::{PatentRecord, is_safe_file_stem};

/// Provider of patent records by identifier.
///
/// Implementations may hit the network or a cache; callers only see the
/// record or `None` when the patent is unknown.
pub trait PatentSource {
    fn fetch(&self, patent_id: &str) -> impl Future<Output = Result<Option<PatentRecord>>> + Send;
}

/// Serves previously downloaded records stored as `{dir}/{patent_id}.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PatentSource for DirectorySource {
    async fn fetch(&self, patent_id: &str) -> Result<Option<PatentRecord>> {
        if !is_safe_file_stem(patent_id) {
            bail!("Invalid patent id for directory lookup: {:?}", patent_id);
        }

        let path = self.dir.join(format!("{}.json", patent_id));

        if !path.is_file() {
            tracing::debug!(patent_id, "Patent not found in directory source");
            return Ok(None);
        }

        let mut record = FileReader::read_record(&path).await?;
        if record.patent_id.is_empty() {
            record.patent_id = patent_id.to_string();
        }

        Ok(Some(record))
    }
}
