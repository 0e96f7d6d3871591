use alloc::string::{String, ToString};

use poststream::{
    Geometry, ItemRect, Navigation, PositionObserver, PositionTracker, RangeCalculator,
    StreamState, Target, Viewport,
};

use crate::{Easing, StreamHost, Tween};

/// Configuration for [`ScrollCoordinator`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinatorOptions {
    pub scroll_duration_ms: u64,
    pub easing: Easing,
    /// Name of the entrance animation whose end clears a flash.
    pub flash_animation: String,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            scroll_duration_ms: 200,
            easing: Easing::SmoothStep,
            flash_animation: "fadeIn".to_string(),
        }
    }
}

impl CoordinatorOptions {
    pub fn with_scroll_duration_ms(mut self, scroll_duration_ms: u64) -> Self {
        self.scroll_duration_ms = scroll_duration_ms;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_flash_animation(mut self, flash_animation: impl Into<String>) -> Self {
        self.flash_animation = flash_animation.into();
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    #[default]
    Idle,
    Scrolling,
    AwaitingLoad,
    Settling,
}

/// A transient highlight on a navigated-to item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flash {
    pub index: usize,
    pub animation: String,
}

#[derive(Clone, Copy, Debug)]
struct ActiveScroll {
    target: Target,
    tween: Option<Tween>,
    /// Scrubber index held until the navigation settles.
    scrubber_index: Option<usize>,
    /// Re-align once loading settles. Off when the item was already fully in view.
    correct: bool,
}

#[derive(Clone, Copy, Debug)]
struct Resolved {
    index: usize,
    rect: ItemRect,
    is_first: bool,
    reply: bool,
}

impl Resolved {
    /// Top of page for the first item, composer alignment for the reply affordance, item top
    /// below the header otherwise.
    fn destination(&self, viewport: Viewport, composer_height: f64) -> f64 {
        let top = if self.reply {
            self.rect.bottom() - viewport.height + composer_height
        } else if self.is_first {
            0.0
        } else {
            self.rect.top - viewport.header_margin
        };
        top.max(0.0)
    }

    fn fully_visible(&self, viewport: Viewport) -> bool {
        let item_top = self.rect.top - viewport.header_margin;
        item_top >= viewport.scroll_top && self.rect.bottom() <= viewport.bottom()
    }
}

fn resolve(geometry: &impl Geometry, target: Target) -> Option<Resolved> {
    let items = geometry.items();
    let (tag, reply) = match target {
        Target::Number(number) => (items.iter().find(|t| t.number == Some(number))?, false),
        Target::Index { reply: true, .. } => (items.last()?, true),
        Target::Index { index, .. } => (items.iter().find(|t| t.index == index)?, false),
    };
    let rect = geometry.item_rect(tag.index)?;
    Some(Resolved {
        index: tag.index,
        rect,
        is_first: items.first().is_some_and(|first| first.index == tag.index),
        reply,
    })
}

fn target_index(target: Target, resolved: Option<&Resolved>) -> Option<usize> {
    match target {
        Target::Index { index, reply: false } => Some(index),
        _ => resolved.map(|r| r.index),
    }
}

/// Programmatic "scroll to post" as an explicit state machine:
/// `Idle -> Scrolling -> AwaitingLoad -> Settling -> Idle`.
///
/// Navigations are queued on the stream with `StreamState::go_to_*`, which also pauses automatic
/// scroll handling. Drive the coordinator with [`Self::tick`] every frame. It resumes automatic
/// handling once the target has settled.
#[derive(Clone, Debug, Default)]
pub struct ScrollCoordinator {
    options: CoordinatorOptions,
    phase: Phase,
    active: Option<ActiveScroll>,
    flash: Option<Flash>,
}

impl ScrollCoordinator {
    pub fn new(options: CoordinatorOptions) -> Self {
        Self {
            options,
            phase: Phase::Idle,
            active: None,
            flash: None,
        }
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some_and(|a| a.tween.is_some())
    }

    /// The item currently highlighted, if any.
    pub fn flash(&self) -> Option<&Flash> {
        self.flash.as_ref()
    }

    /// Reports that an animation ended on item `index`.
    ///
    /// Only the flash entrance animation on the flashed item clears the highlight. Returns `true`
    /// when it did.
    pub fn on_animation_end(&mut self, index: usize, animation: &str) -> bool {
        let matches = self
            .flash
            .as_ref()
            .is_some_and(|f| f.index == index && f.animation == animation);
        if matches {
            atrace!(index, "flash cleared");
            self.flash = None;
        }
        matches
    }

    /// Abandons the current navigation (e.g. on teardown) and resumes automatic handling.
    pub fn cancel(&mut self, stream: &mut StreamState) {
        if self.active.take().is_some() {
            adebug!("navigation cancelled");
            stream.finish_navigation();
        }
        self.phase = Phase::Idle;
    }

    /// Starts queued navigations, advances scroll animations and settles finished ones.
    ///
    /// Call it after [`crate::ScrollMonitor::tick`] in the same frame: while a navigation is in
    /// flight the target's scrubber index replaces whatever the monitor derived from the
    /// intermediate scroll offsets.
    ///
    /// Returns the phase after this tick.
    pub fn tick<H: StreamHost>(
        &mut self,
        now_ms: u64,
        stream: &mut StreamState,
        host: &mut H,
        observer: &mut impl PositionObserver,
    ) -> Phase {
        // A newer navigation replaces whatever is in flight.
        if let Some(navigation) = stream.take_navigation() {
            self.begin(navigation, now_ms, stream, host);
        }

        if self.phase == Phase::AwaitingLoad {
            let Some(active) = self.active.as_mut() else {
                self.phase = Phase::Idle;
                return self.phase;
            };
            let animating = match active.tween {
                Some(tween) => {
                    host.set_scroll_top(tween.sample(now_ms));
                    if tween.is_done(now_ms) {
                        active.tween = None;
                        false
                    } else {
                        true
                    }
                }
                None => false,
            };
            if let Some(index) = active.scrubber_index {
                stream.set_scrubber_index(index as f64 + 1.0);
            }
            if !animating && stream.load_settled() {
                self.settle(stream, host, observer);
            }
        }

        self.phase
    }

    fn begin<H: StreamHost>(
        &mut self,
        navigation: Navigation,
        now_ms: u64,
        stream: &mut StreamState,
        host: &mut H,
    ) {
        let Navigation { target, animate } = navigation;
        self.set_phase(Phase::Scrolling);
        self.flash = None;

        let force = matches!(target, Target::Index { .. });
        let viewport = host.viewport();
        let resolved = resolve(&*host, target);
        let destination = resolved
            .filter(|r| force || !r.fully_visible(viewport))
            .map(|r| r.destination(viewport, host.composer_height()));

        // Show the target's index right away instead of animating the scrubber from where the
        // viewport currently is.
        PositionTracker::update(stream, &*host);
        let scrubber_index = target_index(target, resolved.as_ref());
        if let Some(index) = scrubber_index {
            stream.set_scrubber_index(index as f64 + 1.0);
        }

        let mut tween = None;
        if let Some(to) = destination {
            adebug!(to, animate, "scrolling to target");
            if !animate {
                host.set_scroll_top(to);
            } else if to != viewport.scroll_top {
                tween = Some(Tween::new(
                    viewport.scroll_top,
                    to,
                    now_ms,
                    self.options.scroll_duration_ms,
                    self.options.easing,
                ));
            }
        } else if resolved.is_none() {
            adebug!(nav = ?target, "target not laid out yet");
        }

        self.active = Some(ActiveScroll {
            target,
            tween,
            scrubber_index,
            correct: destination.is_some() || resolved.is_none(),
        });
        self.set_phase(Phase::AwaitingLoad);
    }

    fn settle<H: StreamHost>(
        &mut self,
        stream: &mut StreamState,
        host: &mut H,
        observer: &mut impl PositionObserver,
    ) {
        self.set_phase(Phase::Settling);
        let Some(active) = self.active.take() else {
            self.set_phase(Phase::Idle);
            return;
        };

        host.redraw(stream);

        // The item may only exist now that its page is laid out.
        let resolved = resolve(&*host, active.target);
        match resolved {
            Some(r) if active.correct => {
                let to = r.destination(host.viewport(), host.composer_height());
                host.set_scroll_top(to);
            }
            Some(_) => {}
            None => {
                awarn!(nav = ?active.target, "target still outside the window");
            }
        }

        PositionTracker::update(stream, &*host);
        RangeCalculator::calculate(&*host, observer);
        stream.finish_navigation();

        if let Some(r) = resolved.filter(|r| !r.reply) {
            self.flash = Some(Flash {
                index: r.index,
                animation: self.options.flash_animation.clone(),
            });
        }
        self.set_phase(Phase::Idle);
    }

    fn set_phase(&mut self, phase: Phase) {
        atrace!(from = ?self.phase, to = ?phase, "coordinator phase");
        self.phase = phase;
    }
}
