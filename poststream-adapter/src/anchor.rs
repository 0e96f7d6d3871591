use poststream::Geometry;

use crate::StreamHost;

/// Keeps an item visually fixed while content above it changes.
///
/// Used when a backward page is prepended: without it every inserted post would push the reader's
/// post down the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollAnchor {
    pub index: usize,
    /// Distance from the viewport's scroll offset to the item's top.
    pub offset_in_viewport: f64,
}

impl ScrollAnchor {
    /// Captures an anchor for the item at `index`, if it is laid out.
    pub fn capture(geometry: &impl Geometry, index: usize) -> Option<Self> {
        let rect = geometry.item_rect(index)?;
        Some(Self {
            index,
            offset_in_viewport: rect.top - geometry.viewport().scroll_top,
        })
    }

    /// Scrolls so the anchored item is back where it was.
    ///
    /// Returns `true` when the item is still laid out.
    pub fn apply(&self, host: &mut impl StreamHost) -> bool {
        let Some(rect) = host.item_rect(self.index) else {
            return false;
        };
        host.set_scroll_top((rect.top - self.offset_in_viewport).max(0.0));
        true
    }
}
