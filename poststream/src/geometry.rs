use chrono::{DateTime, Utc};

use crate::PostNumber;

/// Vertical extent of a laid-out item, in the same coordinate space as [`Viewport::scroll_top`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemRect {
    pub top: f64,
    pub height: f64,
}

impl ItemRect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// The ambient scroll viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
    /// Height of the fixed header overlapping the top of the viewport.
    pub header_margin: f64,
}

impl Viewport {
    pub fn new(scroll_top: f64, height: f64, header_margin: f64) -> Self {
        Self {
            scroll_top,
            height,
            header_margin,
        }
    }

    /// Top edge of the area not covered by the header.
    pub fn content_top(&self) -> f64 {
        self.scroll_top + self.header_margin
    }

    /// Height of the area not covered by the header.
    pub fn content_height(&self) -> f64 {
        (self.height - self.header_margin).max(0.0)
    }

    pub fn bottom(&self) -> f64 {
        self.scroll_top + self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    Post,
    Placeholder,
    Reply,
}

/// The data attributes a rendered stream item carries.
///
/// These are the only fields geometry consumers rely on; the load-more affordance is not a stream
/// item and has no tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemTag {
    pub index: usize,
    pub kind: ItemKind,
    pub number: Option<PostNumber>,
    pub time: Option<DateTime<Utc>>,
}

/// Read access to what is currently laid out on screen.
///
/// This is the seam between the engine and a real rendering surface (DOM, TUI buffer, ...).
pub trait Geometry {
    fn viewport(&self) -> Viewport;

    /// Tags of the rendered stream items, in index order.
    fn items(&self) -> &[ItemTag];

    /// Geometry of the item at a window index, or `None` when it has not been laid out.
    fn item_rect(&self, index: usize) -> Option<ItemRect>;
}
