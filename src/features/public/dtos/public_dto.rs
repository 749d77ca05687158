use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::entries::dtos::EntryResponseDto;

/// Public projection of a box. Deliberately narrower than the owner view:
/// no retention date, no status, no owner id.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicBoxDto {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub owner_name: String,
    pub pdf_count: i64,
    pub pdfs: Vec<EntryResponseDto>,
}

/// Aggregate stats for a public box view, computed at read time
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoxStatsDto {
    pub box_id: String,
    pub total_entries: i64,
    pub total_size: i64,
    pub first_upload: Option<DateTime<Utc>>,
    pub last_upload: Option<DateTime<Utc>>,
}
