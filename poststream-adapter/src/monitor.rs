use poststream::{
    Geometry, ItemRect, ItemTag, LoadKind, LoadTicket, PositionObserver, PositionTracker,
    PostLoader, RangeCalculator, StreamState, Viewport, VisibleRange,
};

use crate::{ScrollAnchor, StreamHost};

/// Configuration for [`ScrollMonitor`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonitorOptions {
    /// Minimum time between two delivered scroll events (one frame by default).
    pub throttle_ms: u64,
    /// Distance from a window edge, in pixels, at which the next page is requested.
    pub load_ahead_distance: f64,
    /// Quiet period before the visible range is reported.
    pub range_debounce_ms: u64,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            throttle_ms: 16,
            load_ahead_distance: 300.0,
            range_debounce_ms: 100,
        }
    }
}

impl MonitorOptions {
    pub fn with_throttle_ms(mut self, throttle_ms: u64) -> Self {
        self.throttle_ms = throttle_ms;
        self
    }

    pub fn with_load_ahead_distance(mut self, distance: f64) -> Self {
        self.load_ahead_distance = distance;
        self
    }

    pub fn with_range_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.range_debounce_ms = debounce_ms;
        self
    }
}

/// What a [`ScrollMonitor::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MonitorTick {
    /// A throttled scroll event was handled.
    pub delivered: bool,
    pub previous: Option<LoadTicket>,
    pub next: Option<LoadTicket>,
    /// The debounced visible range fired.
    pub range: Option<VisibleRange>,
}

/// Geometry seen at a given scroll offset.
struct AtScrollTop<'a, G> {
    inner: &'a G,
    scroll_top: f64,
}

impl<G: Geometry> Geometry for AtScrollTop<'_, G> {
    fn viewport(&self) -> Viewport {
        Viewport {
            scroll_top: self.scroll_top,
            ..self.inner.viewport()
        }
    }

    fn items(&self) -> &[ItemTag] {
        self.inner.items()
    }

    fn item_rect(&self, index: usize) -> Option<ItemRect> {
        self.inner.item_rect(index)
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingAnchor {
    anchor: ScrollAnchor,
    generation: u64,
}

/// Throttled scroll subscription driving pagination, the range report and the scrubber.
///
/// The adapter forwards raw scroll events with [`Self::on_scroll`] and calls [`Self::tick`] on
/// every frame. Call [`Self::teardown`] when the view goes away; a torn-down monitor ignores
/// everything.
#[derive(Clone, Debug)]
pub struct ScrollMonitor {
    options: MonitorOptions,
    attached: bool,

    pending_top: Option<f64>,
    last_delivered_ms: Option<u64>,

    range_deadline: Option<u64>,

    anchor: Option<PendingAnchor>,
    was_paused: bool,
}

impl ScrollMonitor {
    pub fn new(options: MonitorOptions) -> Self {
        Self {
            options,
            attached: true,
            pending_top: None,
            last_delivered_ms: None,
            range_deadline: None,
            anchor: None,
            was_paused: false,
        }
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// `true` while a range report is scheduled.
    pub fn has_pending_range(&self) -> bool {
        self.range_deadline.is_some()
    }

    /// Records a raw scroll event. Only the latest offset per throttle window is delivered.
    pub fn on_scroll(&mut self, top: f64) {
        if !self.attached {
            return;
        }
        self.pending_top = Some(top);
    }

    /// Releases the debounce timer and the subscription.
    pub fn teardown(&mut self) {
        adebug!("ScrollMonitor::teardown");
        self.attached = false;
        self.pending_top = None;
        self.range_deadline = None;
        self.anchor = None;
    }

    /// Advances timers and delivers at most one throttled scroll event.
    pub fn tick<H: StreamHost>(
        &mut self,
        now_ms: u64,
        stream: &mut StreamState,
        host: &mut H,
        loader: &mut impl PostLoader,
        observer: &mut impl PositionObserver,
    ) -> MonitorTick {
        let mut out = MonitorTick::default();
        if !self.attached {
            return out;
        }

        self.reapply_anchor(stream, host);

        // A navigation just settled: the landing spot may be next to a window edge.
        let paused = stream.is_paused();
        if self.was_paused && !paused {
            let top = host.viewport().scroll_top;
            self.load_if_needed(top, stream, &*host, loader, &mut out);
        }
        self.was_paused = paused;

        let throttled = self
            .last_delivered_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < self.options.throttle_ms);
        if !throttled {
            if let Some(top) = self.pending_top.take() {
                self.last_delivered_ms = Some(now_ms);
                self.deliver(top, now_ms, stream, &*host, loader, &mut out);
            }
        }

        if stream.take_scrubber_update() && !out.delivered {
            PositionTracker::update(stream, &*host);
        }

        if let Some(deadline) = self.range_deadline {
            if now_ms >= deadline {
                self.range_deadline = None;
                if !stream.is_paused() {
                    out.range = RangeCalculator::calculate(&*host, observer);
                }
            }
        }

        out
    }

    fn deliver<G: Geometry>(
        &mut self,
        top: f64,
        now_ms: u64,
        stream: &mut StreamState,
        host: &G,
        loader: &mut impl PostLoader,
        out: &mut MonitorTick,
    ) {
        atrace!(top, now_ms, "scroll delivered");
        out.delivered = true;

        if !stream.is_paused() {
            self.load_if_needed(top, stream, host, loader, out);
            self.range_deadline = Some(now_ms.saturating_add(self.options.range_debounce_ms));
        }

        let at = AtScrollTop {
            inner: host,
            scroll_top: top,
        };
        PositionTracker::update(stream, &at);
    }

    /// Requests the previous/next page when a window edge is within the load-ahead distance.
    fn load_if_needed<G: Geometry>(
        &mut self,
        top: f64,
        stream: &mut StreamState,
        host: &G,
        loader: &mut impl PostLoader,
        out: &mut MonitorTick,
    ) {
        let at = AtScrollTop {
            inner: host,
            scroll_top: top,
        };
        let viewport = at.viewport();
        let viewport_top = viewport.content_top();
        let viewport_bottom = viewport_top + viewport.content_height();
        let distance = self.options.load_ahead_distance;

        let window = stream.window();
        if window.start > 0 {
            if let Some(rect) = at.item_rect(window.start) {
                if rect.top > viewport_top - distance {
                    let anchor = ScrollAnchor::capture(&at, window.start);
                    let generation = stream.generation();
                    out.previous = stream.load_previous(loader);
                    if let (Some(_), Some(anchor)) = (out.previous, anchor) {
                        atrace!(index = anchor.index, "anchoring before backward load");
                        self.anchor = Some(PendingAnchor { anchor, generation });
                    }
                }
            }
        }

        let window = stream.window();
        if window.end < stream.count() && !window.is_empty() {
            if let Some(rect) = at.item_rect(window.end - 1) {
                if rect.bottom() < viewport_bottom + distance {
                    out.next = stream.load_next(loader);
                }
            }
        }
    }

    /// Keeps the anchored item in place while the backward load it guards is in flight.
    fn reapply_anchor<H: StreamHost>(&mut self, stream: &StreamState, host: &mut H) {
        let Some(pending) = self.anchor.as_mut() else {
            return;
        };
        if stream.generation() != pending.generation {
            host.redraw(stream);
            if !pending.anchor.apply(host) {
                awarn!(index = pending.anchor.index, "anchor item is no longer laid out");
            }
            pending.generation = stream.generation();
        }
        let loading_previous = stream
            .pending_loads()
            .iter()
            .any(|r| matches!(r.kind, LoadKind::Previous { .. }));
        if !loading_previous {
            self.anchor = None;
        }
    }
}

impl Default for ScrollMonitor {
    fn default() -> Self {
        Self::new(MonitorOptions::default())
    }
}
