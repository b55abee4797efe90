// ============================================================================
// Feed Core - Channel Balancer
// File: crates/feed-core/src/services/balancer.rs
// Description: Bounded-run round robin over per-channel queues
// ============================================================================

use std::collections::{HashMap, VecDeque};

use feed_shared::constants::{MAX_MAX_CONSECUTIVE, MIN_MAX_CONSECUTIVE};

use crate::domain::ContentItem;

/// Reorders a batch so no channel runs longer than `max_consecutive` while
/// another channel still has items. Nothing is dropped and each channel keeps
/// its input order.
#[derive(Debug, Clone, Copy)]
pub struct ChannelBalancer {
    max_consecutive: usize,
}

impl ChannelBalancer {
    pub fn new(max_consecutive: usize) -> Self {
        Self {
            max_consecutive: max_consecutive.clamp(MIN_MAX_CONSECUTIVE, MAX_MAX_CONSECUTIVE),
        }
    }

    pub fn max_consecutive(&self) -> usize {
        self.max_consecutive
    }

    pub fn balance(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        if items.len() < 2 {
            return items;
        }
        let total = items.len();

        // Queues in first-seen channel order
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut queues: Vec<VecDeque<ContentItem>> = Vec::new();
        for item in items {
            let key = item.primary_channel().to_string();
            let slot = *index.entry(key).or_insert_with(|| {
                queues.push(VecDeque::new());
                queues.len() - 1
            });
            queues[slot].push_back(item);
        }

        let channels = queues.len();
        let mut out = Vec::with_capacity(total);
        let mut current = 0;
        let mut run = 0;

        while out.len() < total {
            if queues[current].is_empty() || run >= self.max_consecutive {
                // Next non-empty queue after `current`, wrapping back to it last.
                let Some(next) = (1..=channels)
                    .map(|step| (current + step) % channels)
                    .find(|&i| !queues[i].is_empty())
                else {
                    break;
                };
                if next != current {
                    run = 0;
                }
                current = next;
            }

            if let Some(item) = queues[current].pop_front() {
                out.push(item);
                run += 1;
            }
        }

        out
    }
}

impl Default for ChannelBalancer {
    fn default() -> Self {
        Self::new(feed_shared::constants::DEFAULT_MAX_CONSECUTIVE)
    }
}
