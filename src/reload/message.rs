//! HMR Message Protocol
//!
//! Payloads pushed to connected clients over the dev server's socket. Only
//! custom events are produced here; module updates are the host's job.
//!
//! ```json
//! { "type": "custom", "event": "valaxy:pageData", "data": { "path": "/post", "pageData": {} } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Event name for page data pushes.
pub const PAGE_DATA_EVENT: &str = "valaxy:pageData";

/// HMR message sent over the dev server socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HmrEvent {
    /// Named event handled by client code.
    Custom { event: String, data: Json },
}

impl HmrEvent {
    pub fn custom(event: impl Into<String>, data: Json) -> Self {
        Self::Custom {
            event: event.into(),
            data,
        }
    }

    /// `valaxy:pageData` push for one page.
    pub fn page_data(payload: &PageDataPayload) -> Self {
        Self::custom(
            PAGE_DATA_EVENT,
            serde_json::to_value(payload).unwrap_or(Json::Null),
        )
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Fresh metadata for a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDataPayload {
    /// Route of the page, e.g. `/posts/hello`.
    pub path: String,
    pub page_data: Json,
}
