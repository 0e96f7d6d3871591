use crate::{Geometry, PostNumber};

/// First and last post numbers considered on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleRange {
    pub start: PostNumber,
    pub end: PostNumber,
}

/// Receives settled visible ranges, e.g. to update the URL or read-tracking.
pub trait PositionObserver {
    /// `current` is the number the view should be considered "at" (the start number).
    fn position_changed(&mut self, start: PostNumber, end: PostNumber, current: PostNumber);
}

impl<F: FnMut(PostNumber, PostNumber, PostNumber)> PositionObserver for F {
    fn position_changed(&mut self, start: PostNumber, end: PostNumber, current: PostNumber) {
        self(start, end, current)
    }
}

/// Computes the discrete visible post range.
pub struct RangeCalculator;

impl RangeCalculator {
    /// Scans items in index order against the raw viewport (header included).
    ///
    /// The start is the first numbered item with less than 75% of its height above the viewport
    /// top or covering more than 25% of the viewport. The end is the last numbered item that
    /// starts above the viewport bottom. Returns `None` when no numbered item is on screen.
    pub fn compute(geometry: &impl Geometry) -> Option<VisibleRange> {
        let viewport = geometry.viewport();
        let scroll_top = viewport.scroll_top;
        let viewport_height = viewport.height;
        let viewport_bottom = viewport.bottom();

        let mut start: Option<PostNumber> = None;
        let mut end: Option<PostNumber> = None;

        for tag in geometry.items() {
            let Some(rect) = geometry.item_rect(tag.index) else {
                continue;
            };
            if rect.bottom() < scroll_top {
                continue;
            }
            if rect.top >= viewport_bottom {
                break;
            }
            let Some(number) = tag.number else {
                continue;
            };
            if rect.height <= 0.0 {
                continue;
            }

            let visible_top = (scroll_top - rect.top).max(0.0);
            let visible_bottom = rect.height.min(viewport_bottom - rect.top);
            let visible = (visible_bottom - visible_top).max(0.0);

            if start.is_none()
                && (visible_top / rect.height < 0.75
                    || (viewport_height > 0.0 && visible / viewport_height > 0.25))
            {
                start = Some(number);
            }
            end = Some(number);
        }

        let start = start?;
        Some(VisibleRange {
            start,
            end: end.unwrap_or(start),
        })
    }

    /// Computes the range and reports it to `observer` when it resolves.
    pub fn calculate(
        geometry: &impl Geometry,
        observer: &mut impl PositionObserver,
    ) -> Option<VisibleRange> {
        let range = Self::compute(geometry)?;
        ptrace!(start = range.start, end = range.end, "visible range");
        observer.position_changed(range.start, range.end, range.start);
        Some(range)
    }
}
