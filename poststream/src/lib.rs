//! Headless windowing for a numbered stream of discussion posts.
//!
//! For adapter-level workflows (scroll monitoring, jump-to-post), see the `poststream-adapter`
//! crate.
//!
//! This crate holds the model and the math:
//! - the materialized window and its paged loading contract ([`StreamState`], [`PostLoader`])
//! - window → render items, with time-gap markers and trailing affordances ([`WindowRenderer`])
//! - geometry → fractional scrubber position ([`PositionTracker`])
//! - geometry → first/last visible post numbers ([`RangeCalculator`])
//!
//! It is UI-agnostic. A rendering layer is expected to provide item geometry and the viewport
//! through [`Geometry`], and to answer [`LoadRequest`]s.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod geometry;
mod options;
mod position;
mod range;
mod registry;
mod render;
mod state;
mod time;
mod types;

#[cfg(test)]
mod tests;

pub use error::StreamError;
pub use geometry::{Geometry, ItemKind, ItemRect, ItemTag, Viewport};
pub use options::{DEFAULT_PAGE_SIZE, DEFAULT_TIME_GAP_MS, StreamOptions};
pub use position::{PositionTracker, ScrubberPosition};
pub use range::{PositionObserver, RangeCalculator, VisibleRange};
pub use registry::{ContentRegistry, PostRenderer};
pub use render::{RenderItem, RenderItemKind, TimeGap, WindowRenderer, item_tags};
pub use state::{LoadFailure, LoadKind, LoadRequest, LoadTicket, PostLoader, StreamState};
pub use time::{humanize_duration, period_label};
pub use types::{Navigation, Post, PostNumber, Scrubber, Target, Viewer, Window};
