//! Feed request and response types

use serde::Serialize;
use uuid::Uuid;

use super::ContentItem;

#[derive(Debug, Clone)]
pub struct HomeFeedRequest {
    pub session_id: Uuid,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
    pub max_consecutive: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ChannelFeedRequest {
    pub session_id: Uuid,
    pub channel_id: String,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

/// One page of the infinite feed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBatch {
    pub items: Vec<ContentItem>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<u32>,
}

impl ContentBatch {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
            cycle_count: None,
        }
    }

    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.item_id.as_str()).collect()
    }
}
