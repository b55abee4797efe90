//! Opaque feed cursor: the decimal watermark of the last item delivered.
//!
//! Once a channel has wrapped around, the cursor also carries the floor of the
//! second pass as `"{before}:{floor}"`.

use crate::domain::{ContentItem, FeedPosition, Watermark};
use crate::error::DomainError;

pub struct FeedCursor;

impl FeedCursor {
    pub fn encode(item: &ContentItem, floor: Option<Watermark>) -> String {
        match floor {
            Some(floor) => format!("{}:{}", item.watermark, floor),
            None => item.watermark.to_string(),
        }
    }

    /// Absent or blank cursor means "start from the newest item".
    pub fn decode(cursor: Option<&str>) -> Result<Option<FeedPosition>, DomainError> {
        let Some(raw) = cursor.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        let invalid = || DomainError::InvalidCursor(raw.to_string());

        let (before, floor) = match raw.split_once(':') {
            Some((before, floor)) => (before, Some(floor)),
            None => (raw, None),
        };
        let before = parse_watermark(before).ok_or_else(invalid)?;
        let floor = match floor {
            Some(floor) => Some(parse_watermark(floor).ok_or_else(invalid)?),
            None => None,
        };

        Ok(Some(FeedPosition { before, floor }))
    }
}

fn parse_watermark(raw: &str) -> Option<Watermark> {
    raw.trim()
        .parse::<Watermark>()
        .ok()
        .filter(|watermark| *watermark >= 0)
}
