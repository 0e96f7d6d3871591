use chrono::{DateTime, Utc};

use crate::{Geometry, StreamState};

/// Continuous scrubber position derived from on-screen geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrubberPosition {
    /// 0-based fractional index of the item at the top of the viewport.
    pub index: f64,
    /// Sum of the on-screen fraction of every visible item.
    pub visible_posts: f64,
    /// Timestamp of the last dated item scanned.
    pub period: Option<DateTime<Utc>>,
}

/// Tracks the scrubber position from viewport geometry.
pub struct PositionTracker;

impl PositionTracker {
    /// Computes the scrubber position.
    ///
    /// The viewport is the area below the fixed header. Items without geometry are skipped.
    pub fn compute(geometry: &impl Geometry) -> ScrubberPosition {
        let viewport = geometry.viewport();
        let viewport_top = viewport.content_top();
        let viewport_height = viewport.content_height();
        let viewport_bottom = viewport_top + viewport_height;

        let items = geometry.items();
        let mut index = items.first().map_or(0.0, |t| t.index as f64);
        let mut visible_posts = 0.0;
        let mut period = None;

        for tag in items {
            let Some(rect) = geometry.item_rect(tag.index) else {
                continue;
            };
            if rect.bottom() < viewport_top {
                continue;
            }
            if rect.top > viewport_bottom {
                break;
            }
            if rect.height <= 0.0 {
                continue;
            }

            let visible_top = (viewport_top - rect.top).max(0.0);
            let visible_bottom = rect.height.min(viewport_bottom - rect.top);
            let visible = (visible_bottom - visible_top).max(0.0);

            if rect.top <= viewport_top {
                index = tag.index as f64 + visible_top / rect.height;
            }
            if visible > 0.0 {
                visible_posts += visible / rect.height;
            }
            if let Some(time) = tag.time {
                period = Some(time);
            }
        }

        ScrubberPosition {
            index,
            visible_posts,
            period,
        }
    }

    /// Computes the position and writes it into the stream's scrubber (1-based).
    pub fn update(stream: &mut StreamState, geometry: &impl Geometry) -> ScrubberPosition {
        let position = Self::compute(geometry);
        ptrace!(
            index = position.index,
            visible_posts = position.visible_posts,
            "scrubber updated"
        );
        stream.write_scrubber(position.index + 1.0, position.visible_posts, position.period);
        position
    }
}
