use alloc::vec::Vec;
use core::iter;

use chrono::{DateTime, Utc};

use crate::time::period_label;
use crate::{Navigation, Post, PostNumber, Scrubber, StreamError, StreamOptions, Target, Window};

/// Identifies one outstanding loader request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadTicket(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadKind {
    /// Extend the window forward over `[start, end)`.
    Next { start: usize, end: usize },
    /// Extend the window backward over `[start, end)`.
    Previous { start: usize, end: usize },
    /// Replace the window with `[start, end)`.
    NearIndex { start: usize, end: usize },
    /// Replace the window with a page around a post number. The loader resolves the index.
    NearNumber { number: PostNumber },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub kind: LoadKind,
}

/// The paged data source.
///
/// A request must eventually be answered with [`StreamState::complete_load`] or
/// [`StreamState::fail_load`]. The stream never issues two overlapping requests in the same
/// direction, so implementations need no deduplication of their own.
pub trait PostLoader {
    fn request(&mut self, request: LoadRequest);
}

impl<F: FnMut(LoadRequest)> PostLoader for F {
    fn request(&mut self, request: LoadRequest) {
        self(request)
    }
}

/// The last request that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadFailure {
    pub ticket: LoadTicket,
    pub kind: LoadKind,
}

/// The mutable model of a post stream: the materialized window, the pause flag, the pending
/// navigation and the scrubber outputs.
///
/// Invariants:
/// - `0 <= window().start <= window().end <= count()`
/// - `posts().len() == window().len()`
/// - `scrubber().index` is within `[0, count]`, `scrubber().visible` within `[0, 1]`
#[derive(Clone, Debug)]
pub struct StreamState {
    options: StreamOptions,
    count: usize,
    visible_start: usize,
    posts: Vec<Option<Post>>,

    paused: bool,
    animate_scroll: bool,
    navigation: Option<Navigation>,

    scrubber: Scrubber,
    force_update_scrubber: bool,

    pending: Vec<LoadRequest>,
    next_ticket: u64,
    last_load_error: Option<LoadFailure>,

    generation: u64,
}

impl StreamState {
    /// Creates a stream over `count` posts with an empty window at the start.
    pub fn new(count: usize, options: StreamOptions) -> Self {
        pdebug!(count, page_size = options.page_size, "StreamState::new");
        Self {
            options,
            count,
            visible_start: 0,
            posts: Vec::new(),
            paused: false,
            animate_scroll: false,
            navigation: None,
            scrubber: Scrubber::default(),
            force_update_scrubber: false,
            pending: Vec::new(),
            next_ticket: 0,
            last_load_error: None,
            generation: 0,
        }
    }

    /// Builder form of [`Self::set_window`].
    pub fn with_window(
        mut self,
        start: usize,
        posts: Vec<Option<Post>>,
    ) -> Result<Self, StreamError> {
        self.set_window(start, posts)?;
        Ok(self)
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Grows the total post count. The count never shrinks; smaller values are ignored.
    pub fn set_count(&mut self, count: usize) {
        if count < self.count {
            pwarn!(count, current = self.count, "set_count: ignoring shrinking count");
            return;
        }
        if count != self.count {
            self.count = count;
            self.generation = self.generation.wrapping_add(1);
            self.force_update_scrubber = true;
        }
    }

    pub fn window(&self) -> Window {
        Window {
            start: self.visible_start,
            end: self.visible_start + self.posts.len(),
        }
    }

    /// Replaces the window wholesale (e.g. from server-rendered initial data).
    pub fn set_window(
        &mut self,
        start: usize,
        posts: Vec<Option<Post>>,
    ) -> Result<(), StreamError> {
        let end = start.saturating_add(posts.len());
        if end > self.count {
            return Err(StreamError::WindowOutOfRange {
                start,
                end,
                count: self.count,
            });
        }
        ptrace!(start, end, "set_window");
        self.visible_start = start;
        self.posts = posts;
        self.generation = self.generation.wrapping_add(1);
        self.force_update_scrubber = true;
        Ok(())
    }

    /// Loaded content of the window, one slot per index. `None` is a placeholder.
    pub fn posts(&self) -> &[Option<Post>] {
        &self.posts
    }

    pub fn post_at(&self, index: usize) -> Option<&Post> {
        let offset = index.checked_sub(self.visible_start)?;
        self.posts.get(offset)?.as_ref()
    }

    /// Window index of a loaded post by number.
    pub fn index_of_number(&self, number: PostNumber) -> Option<usize> {
        self.posts
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|p| p.number == number))
            .map(|offset| self.visible_start + offset)
    }

    /// `true` when no further forward pagination is possible.
    pub fn viewing_end(&self) -> bool {
        self.window().end == self.count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn animate_scroll(&self) -> bool {
        self.animate_scroll
    }

    /// Bumped on every change to the window, its slots, or the count.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn sanitize_index(&self, index: usize) -> usize {
        index.min(self.count)
    }

    fn issue(&mut self, kind: LoadKind, loader: &mut impl PostLoader) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        let request = LoadRequest { ticket, kind };
        debug_assert!(self.window().end <= self.count, "window past count");
        pdebug!(ticket = ticket.0, kind = ?kind, "load requested");
        self.pending.push(request);
        self.generation = self.generation.wrapping_add(1);
        loader.request(request);
        ticket
    }

    fn has_pending(&self, f: impl Fn(&LoadKind) -> bool) -> bool {
        self.pending.iter().any(|r| f(&r.kind))
    }

    /// Extends the window forward by one page of placeholders and requests their content.
    ///
    /// Posts more than two pages behind the new page are unloaded. No-op while a forward load is
    /// pending or at the end of the stream.
    pub fn load_next(&mut self, loader: &mut impl PostLoader) -> Option<LoadTicket> {
        if self.has_pending(|k| matches!(k, LoadKind::Next { .. })) {
            ptrace!("load_next: already loading");
            return None;
        }
        let page = self.options.page_size;
        let start = self.window().end;
        let end = self.sanitize_index(start.saturating_add(page));
        if start >= end {
            return None;
        }
        self.posts.extend(iter::repeat_n(None, end - start));

        if let Some(two_pages_away) = start.checked_sub(page.saturating_mul(2)) {
            if two_pages_away > self.visible_start {
                self.posts.drain(..two_pages_away - self.visible_start);
                self.visible_start = two_pages_away;
            }
        }

        Some(self.issue(LoadKind::Next { start, end }, loader))
    }

    /// Extends the window backward by one page of placeholders and requests their content.
    ///
    /// Posts more than two pages ahead of the new page are unloaded. No-op while a backward load
    /// is pending or at the start of the stream.
    pub fn load_previous(&mut self, loader: &mut impl PostLoader) -> Option<LoadTicket> {
        if self.has_pending(|k| matches!(k, LoadKind::Previous { .. })) {
            ptrace!("load_previous: already loading");
            return None;
        }
        let page = self.options.page_size;
        let end = self.visible_start;
        let start = end.saturating_sub(page);
        if start >= end {
            return None;
        }
        self.posts.splice(0..0, iter::repeat_n(None, end - start));
        self.visible_start = start;

        let two_pages_away = end.saturating_add(page.saturating_mul(2));
        if two_pages_away < self.window().end {
            self.posts.truncate(two_pages_away - start);
        }

        Some(self.issue(LoadKind::Previous { start, end }, loader))
    }

    /// Makes sure `index` is inside the window, resetting the window to a page around it if not.
    pub fn load_near_index(
        &mut self,
        index: usize,
        loader: &mut impl PostLoader,
    ) -> Option<LoadTicket> {
        if self.count == 0 {
            return None;
        }
        let index = index.min(self.count - 1);
        if self.window().contains(index) {
            return None;
        }
        let page = self.options.page_size;
        let end = self.sanitize_index(index.saturating_sub(page / 2).saturating_add(page));
        let start = end.saturating_sub(page);

        // Whatever was in flight targeted the old window.
        self.pending.clear();
        self.visible_start = start;
        self.posts = iter::repeat_n(None, end - start).collect();
        Some(self.issue(LoadKind::NearIndex { start, end }, loader))
    }

    /// Makes sure post `number` is loaded, asking the loader for a page around it if not.
    ///
    /// The window is replaced once the response arrives.
    pub fn load_near_number(
        &mut self,
        number: PostNumber,
        loader: &mut impl PostLoader,
    ) -> Option<LoadTicket> {
        if self.index_of_number(number).is_some() {
            return None;
        }
        self.drop_jump_loads();
        Some(self.issue(LoadKind::NearNumber { number }, loader))
    }

    /// Applies a loader response.
    ///
    /// `start` is the index of `posts[0]`. Range requests must be answered with exactly the
    /// requested page; a malformed response is treated as a failed load and reported.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        start: usize,
        posts: Vec<Post>,
    ) -> Result<(), StreamError> {
        let pos = self
            .pending
            .iter()
            .position(|r| r.ticket == ticket)
            .ok_or(StreamError::UnknownTicket(ticket))?;
        let kind = self.pending[pos].kind;

        let checked = match kind {
            LoadKind::Next { start: s, end: e }
            | LoadKind::Previous { start: s, end: e }
            | LoadKind::NearIndex { start: s, end: e } => {
                if start != s {
                    Err(StreamError::PageStartMismatch {
                        ticket,
                        expected: s,
                        actual: start,
                    })
                } else if posts.len() != e - s {
                    Err(StreamError::PageLengthMismatch {
                        ticket,
                        expected: e - s,
                        actual: posts.len(),
                    })
                } else {
                    Ok(())
                }
            }
            LoadKind::NearNumber { .. } => {
                let end = start.saturating_add(posts.len());
                if end > self.count {
                    Err(StreamError::WindowOutOfRange {
                        start,
                        end,
                        count: self.count,
                    })
                } else {
                    Ok(())
                }
            }
        };
        if let Err(err) = checked {
            pwarn!(ticket = ticket.0, error = %err, "complete_load: rejecting response");
            self.fail_pending(pos);
            return Err(err);
        }

        self.pending.remove(pos);
        match kind {
            LoadKind::NearNumber { .. } => {
                self.visible_start = start;
                self.posts = posts.into_iter().map(Some).collect();
            }
            _ => {
                let window = self.window();
                for (i, post) in (start..).zip(posts) {
                    if window.contains(i) {
                        self.posts[i - window.start] = Some(post);
                    }
                }
            }
        }
        debug_assert!(self.window().end <= self.count, "window past count");
        pdebug!(ticket = ticket.0, "load completed");
        self.last_load_error = None;
        self.generation = self.generation.wrapping_add(1);
        self.force_update_scrubber = true;
        Ok(())
    }

    /// Marks a request as failed.
    ///
    /// The placeholders it added at the window edge are removed so a later edge check asks again.
    /// A failed load counts as settled.
    pub fn fail_load(&mut self, ticket: LoadTicket) -> Result<(), StreamError> {
        let pos = self
            .pending
            .iter()
            .position(|r| r.ticket == ticket)
            .ok_or(StreamError::UnknownTicket(ticket))?;
        self.fail_pending(pos);
        Ok(())
    }

    fn fail_pending(&mut self, pos: usize) {
        let LoadRequest { ticket, kind } = self.pending.remove(pos);
        pwarn!(ticket = ticket.0, kind = ?kind, "load failed");
        match kind {
            LoadKind::Next { start, .. } => {
                while self.window().end > start.max(self.visible_start)
                    && self.posts.last().is_some_and(Option::is_none)
                {
                    self.posts.pop();
                }
            }
            LoadKind::Previous { end, .. } => {
                let leading = self
                    .posts
                    .iter()
                    .take(end.saturating_sub(self.visible_start))
                    .take_while(|slot| slot.is_none())
                    .count();
                self.posts.drain(..leading);
                self.visible_start += leading;
            }
            LoadKind::NearIndex { start, .. } => {
                self.visible_start = start;
                self.posts.clear();
            }
            LoadKind::NearNumber { .. } => {}
        }
        self.last_load_error = Some(LoadFailure { ticket, kind });
        self.generation = self.generation.wrapping_add(1);
        self.force_update_scrubber = true;
    }

    /// Drops outstanding jump loads. Edge loads stay pending.
    ///
    /// A dropped `NearIndex` load leaves nothing but its placeholders behind, so the window is
    /// emptied with it.
    fn drop_jump_loads(&mut self) {
        let mut stale_window = false;
        self.pending.retain(|r| match r.kind {
            LoadKind::NearIndex { .. } => {
                stale_window = true;
                false
            }
            LoadKind::NearNumber { .. } => false,
            LoadKind::Next { .. } | LoadKind::Previous { .. } => true,
        });
        if stale_window {
            ptrace!("dropping placeholders of a superseded jump load");
            self.posts.clear();
            self.generation = self.generation.wrapping_add(1);
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    /// `true` once every outstanding request has completed or failed.
    pub fn load_settled(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_loads(&self) -> &[LoadRequest] {
        &self.pending
    }

    pub fn last_load_error(&self) -> Option<LoadFailure> {
        self.last_load_error
    }

    fn navigate(&mut self, target: Target, animate: bool) {
        pdebug!(nav = ?target, animate, "navigation requested");
        // A jump load for an earlier navigation would replace the window under this one.
        self.drop_jump_loads();
        self.paused = true;
        self.animate_scroll = animate;
        self.navigation = Some(Navigation { target, animate });
    }

    /// Pauses automatic scroll handling, loads around post `number` if needed and queues a
    /// scroll to it.
    pub fn go_to_number(
        &mut self,
        number: PostNumber,
        animate: bool,
        loader: &mut impl PostLoader,
    ) {
        self.navigate(Target::Number(number), animate);
        self.load_near_number(number, loader);
    }

    /// Pauses automatic scroll handling, loads around `index` if needed and queues a scroll to it.
    pub fn go_to_index(
        &mut self,
        index: usize,
        animate: bool,
        reply: bool,
        loader: &mut impl PostLoader,
    ) {
        self.navigate(Target::Index { index, reply }, animate);
        self.load_near_index(index, loader);
    }

    pub fn go_to_first(&mut self, loader: &mut impl PostLoader) {
        self.go_to_index(0, true, false, loader);
    }

    /// Jumps to the end of the stream, aligning the reply affordance with the composer.
    pub fn go_to_last(&mut self, loader: &mut impl PostLoader) {
        let last = self.count.saturating_sub(1);
        self.go_to_index(last, false, true, loader);
    }

    /// Consumes the pending navigation, if any.
    pub fn take_navigation(&mut self) -> Option<Navigation> {
        self.navigation.take()
    }

    pub fn has_pending_navigation(&self) -> bool {
        self.navigation.is_some()
    }

    /// Ends a navigation started with one of the `go_to_*` methods and resumes automatic scroll
    /// handling.
    pub fn finish_navigation(&mut self) {
        ptrace!("finish_navigation");
        self.paused = false;
    }

    pub fn scrubber(&self) -> &Scrubber {
        &self.scrubber
    }

    /// Writes tracked scrubber outputs.
    ///
    /// `index` is 1-based. `visible_posts` is the sum of per-item visible fractions. The
    /// description only changes when a period is given.
    pub fn write_scrubber(
        &mut self,
        index: f64,
        visible_posts: f64,
        period: Option<DateTime<Utc>>,
    ) {
        self.set_scrubber_index(index);
        let visible_posts = visible_posts.max(0.0);
        self.scrubber.visible_posts = visible_posts;
        self.scrubber.visible = if self.count == 0 {
            0.0
        } else {
            (visible_posts / self.count as f64).clamp(0.0, 1.0)
        };
        if let Some(period) = period {
            self.scrubber.description = period_label(period);
        }
    }

    /// Overrides the 1-based scrubber index, clamped to `[0, count]`.
    pub fn set_scrubber_index(&mut self, index: f64) {
        self.scrubber.index = index.clamp(0.0, self.count as f64);
    }

    /// Asks for the scrubber to be recomputed even if updates are otherwise throttled.
    pub fn request_scrubber_update(&mut self) {
        self.force_update_scrubber = true;
    }

    pub fn take_scrubber_update(&mut self) -> bool {
        core::mem::take(&mut self.force_update_scrubber)
    }
}
