use serde::{Deserialize, Serialize};

/// Body returned for any request that could not be turned into streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
