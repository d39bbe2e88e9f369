//! Documents stored by the index

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{base::DocId, error::DocumentError};

/// Free-form document metadata (title, URL, ...)
pub type Metadata = Map<String, Value>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(id: DocId, text: impl Into<String>) -> Self {
        Self::with_metadata(id, text, Metadata::new())
    }

    pub fn with_metadata(id: DocId, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id,
            text: text.into(),
            metadata,
        }
    }

    /// Builds a document from a JSON record with a (non-negative) integer
    /// `doc_id` (or `id`), a string `text` and an optional `metadata` object
    pub fn try_from_json(value: &Value) -> Result<Self, DocumentError> {
        let record = value.as_object().ok_or(DocumentError::NotAnObject)?;

        let id = match record.get("doc_id").or_else(|| record.get("id")) {
            Some(id) => id
                .as_u64()
                .ok_or_else(|| DocumentError::InvalidId(id.to_string()))?,
            None => return Err(DocumentError::InvalidId("null".to_string())),
        };

        let text = match record.get("text") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => return Err(DocumentError::InvalidText(other.to_string())),
            None => return Err(DocumentError::InvalidText("null".to_string())),
        };

        let metadata = match record.get("metadata") {
            None | Some(Value::Null) => Metadata::new(),
            Some(Value::Object(metadata)) => metadata.clone(),
            Some(other) => return Err(DocumentError::InvalidMetadata(other.to_string())),
        };

        Ok(Self::with_metadata(id, text, metadata))
    }
}

impl TryFrom<(i64, String)> for Document {
    type Error = DocumentError;

    fn try_from((id, text): (i64, String)) -> Result<Self, Self::Error> {
        let id = DocId::try_from(id).map_err(|_| DocumentError::InvalidId(id.to_string()))?;
        Ok(Self::new(id, text))
    }
}

impl TryFrom<&Value> for Document {
    type Error = DocumentError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::try_from_json(value)
    }
}
