use serde::{Deserialize, Serialize};

pub const MISSING_QUERY: &str = "Missing query parameter `q`";
pub const SEARCH_FAILED: &str = "Failed to fetch from NZBgeek";
pub const MISSING_DOWNLOAD_URL: &str = "No download URL provided";
pub const ENQUEUE_FAILED: &str = "Failed to execute SABnzbd command";
pub const ENQUEUED: &str = "NZB added to SABnzbd successfully";

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(rename = "downloadUrl", default)]
    pub download_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        MessageResponse {
            message: message.to_string(),
        }
    }
}
