// ============================================================================
// Feed Core - Content Item Entity
// File: crates/feed-core/src/domain/content_item.rs
// ============================================================================

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use feed_shared::constants::UNKNOWN_CHANNEL;

/// Publish-time ordering key, epoch milliseconds.
pub type Watermark = i64;

/// Aggregated feed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub item_id: String,
    pub channels: Vec<String>,
    #[serde(rename = "pubTimestamp")]
    pub watermark: Watermark,
    pub title: Option<String>,
    pub content: Option<String>,
    pub link: Option<String>,
    /// Translation map maintained by the translation pipeline, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translations: Option<serde_json::Value>,
}

impl ContentItem {
    pub fn new(item_id: impl Into<String>, channels: Vec<String>, watermark: Watermark) -> Self {
        Self {
            item_id: item_id.into(),
            channels,
            watermark,
            title: None,
            content: None,
            link: None,
            translations: None,
        }
    }

    /// Channel the balancer groups this item under: the first tag, in the order
    /// the item was tagged. Both content stores serve tags in that order.
    pub fn primary_channel(&self) -> &str {
        self.channels
            .first()
            .map(String::as_str)
            .unwrap_or(UNKNOWN_CHANNEL)
    }

    pub fn in_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    /// Feed order: newest first, item id descending on ties.
    pub fn feed_order(a: &ContentItem, b: &ContentItem) -> Ordering {
        b.watermark
            .cmp(&a.watermark)
            .then_with(|| b.item_id.cmp(&a.item_id))
    }
}

/// Where the next page starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPosition {
    /// Strict upper bound on the next page.
    pub before: Watermark,
    /// Inclusive lower bound, set while serving the second pass of a channel.
    pub floor: Option<Watermark>,
}

/// Which part of the catalogue a query reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    Global,
    Channel(String),
}

impl FeedScope {
    pub fn channel(&self) -> Option<&str> {
        match self {
            FeedScope::Global => None,
            FeedScope::Channel(c) => Some(c.as_str()),
        }
    }
}

/// Candidate fetch issued against the content store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub scope: FeedScope,
    /// Strict upper bound on the watermark.
    pub before: Option<Watermark>,
    /// Inclusive lower bound on the watermark.
    pub floor: Option<Watermark>,
    pub exclude: HashSet<String>,
    pub limit: usize,
}

impl ContentQuery {
    pub fn new(scope: FeedScope, limit: usize) -> Self {
        Self {
            scope,
            before: None,
            floor: None,
            exclude: HashSet::new(),
            limit,
        }
    }

    pub fn before(mut self, before: Option<Watermark>) -> Self {
        self.before = before;
        self
    }

    pub fn at_position(mut self, position: Option<FeedPosition>) -> Self {
        self.before = position.map(|p| p.before);
        self.floor = position.and_then(|p| p.floor);
        self
    }

    pub fn excluding(mut self, exclude: HashSet<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Whether `item` passes this query's filters (ignores the limit).
    pub fn matches(&self, item: &ContentItem) -> bool {
        if let Some(channel) = self.scope.channel() {
            if !item.in_channel(channel) {
                return false;
            }
        }
        if let Some(before) = self.before {
            if item.watermark >= before {
                return false;
            }
        }
        if let Some(floor) = self.floor {
            if item.watermark < floor {
                return false;
            }
        }
        !self.exclude.contains(&item.item_id)
    }
}
