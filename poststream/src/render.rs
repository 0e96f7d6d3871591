use alloc::string::String;
use alloc::vec::Vec;

use chrono::{DateTime, TimeDelta, Utc};

use crate::time::humanize_duration;
use crate::{ItemKind, ItemTag, Post, PostNumber, StreamState, Viewer};

/// A marker shown before a post that follows the previous one after a long pause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeGap {
    pub elapsed: TimeDelta,
    /// Relative, suffix-less label such as `"5 days"`.
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderItemKind<'a> {
    Post {
        post: &'a Post,
        gap: Option<TimeGap>,
    },
    Placeholder,
    /// "Load more" button after the last loaded slot.
    LoadMore,
    /// Reply affordance after the last post of the stream.
    Reply,
}

/// One rendered entry of the stream.
///
/// Posts and placeholders carry their window index. The reply affordance carries `count`
/// (one past the last post) and the load-more affordance carries the window end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderItem<'a> {
    pub index: usize,
    pub kind: RenderItemKind<'a>,
}

impl<'a> RenderItem<'a> {
    pub fn post(&self) -> Option<&'a Post> {
        match self.kind {
            RenderItemKind::Post { post, .. } => Some(post),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<PostNumber> {
        self.post().map(|p| p.number)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.post().map(|p| p.created_at)
    }

    pub fn content_type(&self) -> Option<&'a str> {
        self.post().map(|p| p.content_type.as_str())
    }

    pub fn time_gap(&self) -> Option<&TimeGap> {
        match &self.kind {
            RenderItemKind::Post { gap, .. } => gap.as_ref(),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, RenderItemKind::Placeholder)
    }

    /// The geometry tag for this item, or `None` for the load-more affordance.
    pub fn tag(&self) -> Option<ItemTag> {
        let kind = match self.kind {
            RenderItemKind::Post { .. } => ItemKind::Post,
            RenderItemKind::Placeholder => ItemKind::Placeholder,
            RenderItemKind::Reply => ItemKind::Reply,
            RenderItemKind::LoadMore => return None,
        };
        Some(ItemTag {
            index: self.index,
            kind,
            number: self.number(),
            time: self.time(),
        })
    }
}

/// Tags of every stream item in `items`, in order.
pub fn item_tags(items: &[RenderItem<'_>]) -> Vec<ItemTag> {
    items.iter().filter_map(RenderItem::tag).collect()
}

/// Turns the stream window into an ordered list of render items.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowRenderer {
    viewer: Option<Viewer>,
}

impl WindowRenderer {
    pub fn new(viewer: Option<Viewer>) -> Self {
        Self { viewer }
    }

    pub fn viewer(&self) -> Option<Viewer> {
        self.viewer
    }

    pub fn set_viewer(&mut self, viewer: Option<Viewer>) {
        self.viewer = viewer;
    }

    fn can_show_reply(&self) -> bool {
        self.viewer.is_none_or(|v| v.can_reply)
    }

    pub fn render<'a>(&self, stream: &'a StreamState) -> Vec<RenderItem<'a>> {
        let mut out = Vec::with_capacity(stream.posts().len() + 1);
        self.render_into(stream, &mut out);
        out
    }

    /// Renders into `out` (cleared first), so adapters can reuse a buffer across frames.
    pub fn render_into<'a>(&self, stream: &'a StreamState, out: &mut Vec<RenderItem<'a>>) {
        out.clear();
        let window = stream.window();
        let gap_ms = stream.options().time_gap_ms;
        let mut last_time: Option<DateTime<Utc>> = None;

        for (index, slot) in (window.start..).zip(stream.posts()) {
            let kind = match slot {
                Some(post) => {
                    let gap = last_time.and_then(|prev| {
                        let elapsed = post.created_at.signed_duration_since(prev);
                        (elapsed.num_milliseconds() > gap_ms).then(|| TimeGap {
                            label: humanize_duration(elapsed),
                            elapsed,
                        })
                    });
                    last_time = Some(post.created_at);
                    RenderItemKind::Post { post, gap }
                }
                None => RenderItemKind::Placeholder,
            };
            out.push(RenderItem { index, kind });
        }

        if stream.viewing_end() {
            if self.can_show_reply() {
                out.push(RenderItem {
                    index: stream.count(),
                    kind: RenderItemKind::Reply,
                });
            }
        } else if stream.posts().last().is_some_and(Option::is_some) {
            out.push(RenderItem {
                index: window.end,
                kind: RenderItemKind::LoadMore,
            });
        }
    }
}
