use serde::{Deserialize, Deserializer, Serialize};

/// Default prefix of the description that takes part in extraction.
pub const DEFAULT_DESCRIPTION_LIMIT: usize = 10_000;

/// A patent as handed over by the download/scraping collaborator.
///
/// Every field is optional on the wire; missing or `null` values
/// deserialize as empty strings or empty lists so downstream stages never
/// branch on absence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatentRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub patent_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "abstract", default, deserialize_with = "null_as_default")]
    pub abstract_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub claims: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ipc_codes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cpc_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whether `patent_id` can be used as a file stem inside a data directory.
///
/// Rejects empty ids, path separators and parent references.
pub fn is_safe_file_stem(patent_id: &str) -> bool {
    !patent_id.is_empty()
        && patent_id != "."
        && !patent_id.contains("..")
        && !patent_id.contains(['/', '\\', '\0'])
}

impl PatentRecord {
    pub fn new(patent_id: impl Into<String>) -> Self {
        Self {
            patent_id: patent_id.into(),
            ..Self::default()
        }
    }

    /// Claims joined with single spaces
    pub fn claims_text(&self) -> String {
        self.claims.join(" ")
    }

    /// First `limit` characters of the description (char-aware)
    pub fn description_prefix(&self, limit: usize) -> &str {
        match self.description.char_indices().nth(limit) {
            Some((byte_idx, _)) => &self.description[..byte_idx],
            None => &self.description,
        }
    }

    /// IPC codes followed by CPC codes, in record order
    pub fn all_codes(&self) -> Vec<String> {
        self.ipc_codes
            .iter()
            .chain(self.cpc_codes.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let record: PatentRecord = serde_json::from_str(r#"{"patent_id": "US1"}"#).unwrap();

        assert_eq!(record.patent_id, "US1");
        assert!(record.title.is_empty());
        assert!(record.abstract_text.is_empty());
        assert!(record.claims.is_empty());
        assert!(record.assignee.is_none());
    }

    #[test]
    fn test_null_fields_default_to_empty() {
        let record: PatentRecord = serde_json::from_str(
            r#"{"patent_id": "X", "title": null, "abstract": null, "claims": null,
                "description": null, "ipc_codes": null, "cpc_codes": null, "assignee": null}"#,
        )
        .unwrap();

        assert_eq!(record.patent_id, "X");
        assert!(record.title.is_empty());
        assert!(record.abstract_text.is_empty());
        assert!(record.description.is_empty());
        assert!(record.claims.is_empty());
        assert!(record.all_codes().is_empty());
        assert!(record.assignee.is_none());
    }

    #[test]
    fn test_safe_file_stem() {
        assert!(is_safe_file_stem("US1234567B2"));
        assert!(is_safe_file_stem("EP-1.2"));
        assert!(!is_safe_file_stem(""));
        assert!(!is_safe_file_stem("."));
        assert!(!is_safe_file_stem("../US1"));
        assert!(!is_safe_file_stem("a/b"));
        assert!(!is_safe_file_stem("a\\b"));
    }

    #[test]
    fn test_abstract_field_name() {
        let record: PatentRecord =
            serde_json::from_str(r#"{"abstract": "A rotor blade."}"#).unwrap();
        assert_eq!(record.abstract_text, "A rotor blade.");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["abstract"], "A rotor blade.");
    }

    #[test]
    fn test_description_prefix_is_char_aware() {
        let mut record = PatentRecord::new("ES1");
        record.description = "núcleo de espuma".to_string();

        assert_eq!(record.description_prefix(6), "núcleo");
        assert_eq!(record.description_prefix(1000), "núcleo de espuma");
    }
}
