//! Input and output documents.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use emend_core::{LiveParagraph, MemoryStore, Paragraph};

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentFile {
    Records(Vec<Paragraph>),
    Wrapped { paragraphs: Vec<Paragraph> },
}

/// Reads paragraph records from a JSON file, sorted by `paragraph_number`.
pub fn load(path: &Path) -> Result<Vec<Paragraph>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: DocumentFile =
        serde_json::from_str(&raw).with_context(|| format!("decoding {}", path.display()))?;
    let mut records = match file {
        DocumentFile::Records(records) | DocumentFile::Wrapped { paragraphs: records } => records,
    };
    records.sort_by_key(|r| r.paragraph_number);
    Ok(records)
}

/// A live document holding each record's original text under its native id.
pub fn seed_store(records: &[Paragraph]) -> MemoryStore {
    MemoryStore::new(
        records
            .iter()
            .map(|r| LiveParagraph::new(r.native_paragraph_id.as_str(), r.original_text.as_str()))
            .collect(),
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputParagraph {
    pub native_paragraph_id: String,
    pub text: String,
}

impl From<LiveParagraph> for OutputParagraph {
    fn from(p: LiveParagraph) -> Self {
        Self {
            native_paragraph_id: p.id,
            text: p.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_array_and_wrapped_object() {
        let dir = tempfile::tempdir().unwrap();
        let record = r#"{"paragraphNumber": 2, "nativeParagraphId": "b", "originalText": "x", "editedText": "y"}"#;
        let first = r#"{"paragraphNumber": 1, "nativeParagraphId": "a", "originalText": "u", "editedText": "v"}"#;

        let bare = dir.path().join("bare.json");
        std::fs::write(&bare, format!("[{record}, {first}]")).unwrap();
        let records = load(&bare).unwrap();
        assert_eq!(records[0].native_paragraph_id, "a");

        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(&wrapped, format!(r#"{{"paragraphs": [{record}]}}"#)).unwrap();
        assert_eq!(load(&wrapped).unwrap().len(), 1);

        let store = seed_store(&records);
        assert_eq!(store.text("b"), Some("x"));
    }

    #[test]
    fn malformed_input_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }
}
