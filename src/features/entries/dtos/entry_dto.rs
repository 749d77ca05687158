use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::entries::models::Entry;

/// Request DTO for creating a title-only entry
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTitleDto {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,
}

/// Form schema for the multipart upload endpoint (documentation only; the
/// handler reads the fields itself)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadPdfsForm {
    /// PDF files, repeatable
    #[schema(format = Binary, content_media_type = "application/pdf")]
    pub pdfs: String,
    /// Entry titles, repeatable; one title over many files gets numbered
    /// suffixes
    pub title: Option<String>,
}

/// Entry as returned to clients
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponseDto {
    pub id: String,
    pub title: String,
    pub filename: Option<String>,
    pub original_name: Option<String>,
    pub size: i64,
    pub box_id: String,
    pub upload_date: DateTime<Utc>,
    /// Whether a stored file backs this entry
    pub has_file: bool,
}

impl From<Entry> for EntryResponseDto {
    fn from(e: Entry) -> Self {
        // Legacy title-only rows used empty strings where NULL was intended
        let normalize = |v: Option<String>| v.filter(|s| !s.is_empty());
        let filename = normalize(e.filename);
        let original_name = normalize(e.original_name);
        let path = normalize(e.path);
        let has_file = path.is_some();

        Self {
            id: e.id,
            title: e.title,
            filename,
            original_name,
            size: e.size,
            box_id: e.box_id,
            upload_date: e.upload_date,
            has_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(filename: Option<&str>, path: Option<&str>) -> Entry {
        Entry {
            id: "e1".to_string(),
            title: "Title".to_string(),
            filename: filename.map(String::from),
            original_name: filename.map(String::from),
            path: path.map(String::from),
            size: 0,
            box_id: "b1".to_string(),
            upload_date: Utc::now(),
        }
    }

    #[test]
    fn test_file_backed_entry_has_file() {
        let dto = EntryResponseDto::from(entry(Some("stored.pdf"), Some("stored.pdf")));
        assert!(dto.has_file);
        assert_eq!(dto.filename.as_deref(), Some("stored.pdf"));
    }

    #[test]
    fn test_null_file_fields_mean_title_only() {
        let dto = EntryResponseDto::from(entry(None, None));
        assert!(!dto.has_file);
        assert_eq!(dto.filename, None);
    }

    #[test]
    fn test_legacy_empty_strings_normalized() {
        let dto = EntryResponseDto::from(entry(Some(""), Some("")));
        assert!(!dto.has_file);
        assert_eq!(dto.filename, None);
        assert_eq!(dto.original_name, None);
    }
}
