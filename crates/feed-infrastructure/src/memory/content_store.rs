// ============================================================================
// Feed Infrastructure - In-Memory Content Store
// File: crates/feed-infrastructure/src/memory/content_store.rs
// ============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use feed_core::domain::{ContentItem, ContentQuery};
use feed_core::error::DomainError;
use feed_core::repositories::ContentRepository;

#[derive(Debug, Clone)]
struct StoredItem {
    item: ContentItem,
    hidden_channels: HashSet<String>,
}

impl StoredItem {
    /// The item as served: hidden channel links removed, `None` when nothing is visible.
    fn visible(&self) -> Option<ContentItem> {
        let channels: Vec<String> = self
            .item
            .channels
            .iter()
            .filter(|c| !self.hidden_channels.contains(*c))
            .cloned()
            .collect();
        if channels.is_empty() {
            return None;
        }
        Some(ContentItem {
            channels,
            ..self.item.clone()
        })
    }
}

/// Content catalogue held in memory, ordered on read.
#[derive(Clone, Default)]
pub struct InMemoryContentStore {
    items: Arc<RwLock<HashMap<String, StoredItem>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = ContentItem>) -> Self {
        let store = Self::new();
        for item in items {
            store.upsert(item);
        }
        store
    }

    /// Insert or replace by item id. Replacing clears hidden channel flags.
    pub fn upsert(&self, item: ContentItem) {
        self.items.write().insert(
            item.item_id.clone(),
            StoredItem {
                item,
                hidden_channels: HashSet::new(),
            },
        );
    }

    pub fn remove(&self, item_id: &str) -> Option<ContentItem> {
        self.items.write().remove(item_id).map(|stored| stored.item)
    }

    /// Toggle one item-channel link. Returns false when the item does not carry that channel.
    pub fn set_channel_visibility(&self, item_id: &str, channel: &str, visible: bool) -> bool {
        let mut items = self.items.write();
        let Some(stored) = items.get_mut(item_id) else {
            return false;
        };
        if !stored.item.in_channel(channel) {
            return false;
        }
        if visible {
            stored.hidden_channels.remove(channel);
        } else {
            stored.hidden_channels.insert(channel.to_string());
        }
        true
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentStore {
    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<ContentItem>, DomainError> {
        let mut matched: Vec<ContentItem> = self
            .items
            .read()
            .values()
            .filter_map(StoredItem::visible)
            .filter(|item| query.matches(item))
            .collect();

        matched.sort_by(ContentItem::feed_order);
        matched.truncate(query.limit);
        Ok(matched)
    }

    async fn count_in_channel(
        &self,
        channel: &str,
        exclude: &HashSet<String>,
    ) -> Result<u64, DomainError> {
        let count = self
            .items
            .read()
            .values()
            .filter_map(StoredItem::visible)
            .filter(|item| item.in_channel(channel) && !exclude.contains(&item.item_id))
            .count();
        Ok(count as u64)
    }
}
