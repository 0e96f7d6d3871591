use alloc::string::String;

use chrono::{DateTime, Utc};

/// The 1-based number a post carries within its discussion.
///
/// Numbers are not contiguous: deleted posts leave holes, so a number is never used as an index.
pub type PostNumber = u64;

/// A loaded post, as far as the stream needs to know about it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Post {
    pub id: u64,
    pub number: PostNumber,
    pub created_at: DateTime<Utc>,
    /// Content type key used to pick a renderer (e.g. `"comment"`, `"discussionRenamed"`).
    pub content_type: String,
}

impl Post {
    pub fn new(
        id: u64,
        number: PostNumber,
        created_at: DateTime<Utc>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            number,
            created_at,
            content_type: content_type.into(),
        }
    }
}

/// The signed-in user looking at the stream.
///
/// An anonymous visitor is modelled as `Option::<Viewer>::None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewer {
    pub can_reply: bool,
}

/// Where a programmatic navigation should land.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    Number(PostNumber),
    Index {
        index: usize,
        /// Land on the reply affordance instead of a post.
        reply: bool,
    },
}

/// A pending "scroll to" instruction, consumed once by the scroll coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Navigation {
    pub target: Target,
    pub animate: bool,
}

/// Scrubber outputs written by the position tracker.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scrubber {
    /// 1-based fractional position, always within `[0, count]`.
    pub index: f64,
    /// Fraction of the whole discussion on screen, always within `[0, 1]`.
    pub visible: f64,
    /// Sum of per-item on-screen fractions (e.g. `2.5` when two and a half posts are visible).
    pub visible_posts: f64,
    /// Month-year label of the period on screen.
    pub description: String,
}

/// Half-open index range `[start, end)` of the materialized window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub start: usize,
    pub end: usize, // exclusive
}

impl Window {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}
