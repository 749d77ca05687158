/// The only MIME type accepted by the upload pipeline.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Title used when an upload pair has neither its own title nor a first
/// title to fall back to (1-indexed suffix appended).
pub const UNTITLED_PREFIX: &str = "Untitled";
