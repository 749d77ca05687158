use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::boxes::models::{BoxRecord, BoxWithCount};
use crate::features::entries::dtos::EntryResponseDto;

/// Box lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BoxStatus {
    Owned,
    Restricted,
    Borrowed,
    Active,
}

impl BoxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoxStatus::Owned => "owned",
            BoxStatus::Restricted => "restricted",
            BoxStatus::Borrowed => "borrowed",
            BoxStatus::Active => "active",
        }
    }
}

/// Request DTO for creating a box
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoxDto {
    #[validate(length(min = 1, max = 200, message = "Box name must be 1-200 characters"))]
    pub name: String,

    pub retention_date: Option<String>,

    pub status: Option<BoxStatus>,
}

/// Request DTO for updating a box. Mutable fields are replaced as a whole.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoxDto {
    #[validate(length(min = 1, max = 200, message = "Box name must be 1-200 characters"))]
    pub name: String,

    pub retention_date: Option<String>,

    pub status: Option<BoxStatus>,
}

/// Box as seen by its owner in list views
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoxResponseDto {
    pub id: String,
    pub name: String,
    pub retention_date: Option<String>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub pdf_count: i64,
}

impl From<BoxWithCount> for BoxResponseDto {
    fn from(b: BoxWithCount) -> Self {
        Self {
            id: b.id,
            name: b.name,
            retention_date: b.retention_date,
            status: b.status,
            created_at: b.created_at,
            pdf_count: b.pdf_count,
        }
    }
}

/// Box detail as seen by its owner, entries included
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoxDetailDto {
    pub id: String,
    pub name: String,
    pub retention_date: Option<String>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub pdfs: Vec<EntryResponseDto>,
}

impl BoxDetailDto {
    pub fn from_parts(record: BoxRecord, pdfs: Vec<EntryResponseDto>) -> Self {
        Self {
            id: record.id,
            name: record.name,
            retention_date: record.retention_date,
            status: record.status,
            created_at: record.created_at,
            pdfs,
        }
    }
}

/// Response DTO for the QR code of a box's public view
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponseDto {
    /// SVG rendering of the code as a base64 data URL
    pub qr_code: String,
    /// The public URL the code points at
    pub url: String,
}
