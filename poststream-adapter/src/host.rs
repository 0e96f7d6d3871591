use poststream::{Geometry, StreamState};

/// The rendering surface the adapter drives.
///
/// On top of read-only [`Geometry`], the adapter needs to move the scroll offset and to force a
/// synchronous redraw so freshly loaded posts are laid out before it measures them.
pub trait StreamHost: Geometry {
    fn set_scroll_top(&mut self, top: f64);

    /// Re-renders the current window and updates geometry before returning.
    fn redraw(&mut self, stream: &StreamState);

    /// Height of the composer docked at the bottom of the viewport.
    fn composer_height(&self) -> f64 {
        0.0
    }
}
