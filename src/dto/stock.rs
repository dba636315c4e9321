use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IngestResult {
    pub added: usize,
    pub duplicates: usize,
}

/// Multipart form accepted by the stock upload endpoint.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct StockUploadForm {
    #[schema(value_type = String, format = Uuid)]
    pub product_id: String,
    /// One credential per line.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
