use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error response body. Every rejected operation yields one of these with a
/// short category in `error` and a human-readable `message`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Plain confirmation body for operations that return no resource.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
