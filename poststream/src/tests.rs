use crate::*;

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rstest::rstest;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn post(number: PostNumber, at: DateTime<Utc>) -> Post {
    Post::new(1000 + number, number, at, "comment")
}

fn minutes(n: i64) -> TimeDelta {
    TimeDelta::minutes(n)
}

/// A stream of `count` posts, one minute apart, with `[start, end)` loaded.
fn loaded_stream(count: usize, start: usize, end: usize, page_size: usize) -> StreamState {
    let posts = (start..end)
        .map(|i| Some(post(i as u64 + 1, t0() + minutes(i as i64))))
        .collect();
    StreamState::new(count, StreamOptions::new().with_page_size(page_size))
        .with_window(start, posts)
        .unwrap()
}

fn page(start: usize, end: usize) -> Vec<Post> {
    (start..end)
        .map(|i| post(i as u64 + 1, t0() + minutes(i as i64)))
        .collect()
}

#[derive(Default)]
struct Recorder {
    requests: Vec<LoadRequest>,
}

impl PostLoader for Recorder {
    fn request(&mut self, request: LoadRequest) {
        self.requests.push(request);
    }
}

/// Items stacked top to bottom with fixed heights.
struct Layout {
    viewport: Viewport,
    tags: Vec<ItemTag>,
    rects: Vec<(usize, ItemRect)>,
}

impl Layout {
    fn stack(items: &[RenderItem<'_>], origin: f64, height: f64, viewport: Viewport) -> Self {
        let mut top = origin;
        let mut rects = Vec::new();
        for item in items {
            if item.tag().is_some() {
                rects.push((item.index, ItemRect::new(top, height)));
            }
            top += height;
        }
        Self {
            viewport,
            tags: item_tags(items),
            rects,
        }
    }

    fn without_rect(mut self, index: usize) -> Self {
        self.rects.retain(|(i, _)| *i != index);
        self
    }
}

impl Geometry for Layout {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn items(&self) -> &[ItemTag] {
        &self.tags
    }

    fn item_rect(&self, index: usize) -> Option<ItemRect> {
        self.rects
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, r)| *r)
    }
}

#[test]
fn full_short_stream_renders_posts_and_reply() {
    let stream = loaded_stream(5, 0, 5, 20);
    assert!(stream.viewing_end());

    let items = WindowRenderer::new(None).render(&stream);
    assert_eq!(items.len(), 6);
    assert!(items[..5].iter().all(|it| it.post().is_some()));
    assert!(items.iter().all(|it| it.time_gap().is_none()));
    assert_eq!(items[5].kind, RenderItemKind::Reply);
    assert_eq!(items[5].index, 5);
    assert!(!items.iter().any(|it| it.kind == RenderItemKind::LoadMore));
}

#[test]
fn long_pause_inserts_gap_marker_before_post() {
    let posts = vec![
        Some(post(1, t0())),
        Some(post(2, t0() + TimeDelta::days(5))),
        Some(post(3, t0() + TimeDelta::days(5) + minutes(3))),
    ];
    let stream = StreamState::new(10, StreamOptions::default())
        .with_window(0, posts)
        .unwrap();

    let items = WindowRenderer::new(None).render(&stream);
    assert!(items[0].time_gap().is_none());
    let gap = items[1].time_gap().expect("gap before second post");
    assert_eq!(gap.elapsed, TimeDelta::days(5));
    assert_eq!(gap.label, "5 days");
    assert!(items[2].time_gap().is_none());
}

#[rstest]
#[case(TimeDelta::days(4), false)]
#[case(TimeDelta::days(4) - TimeDelta::milliseconds(1), false)]
#[case(TimeDelta::days(4) + TimeDelta::milliseconds(1), true)]
#[case(TimeDelta::days(30), true)]
fn gap_marker_threshold_is_strictly_greater_than_four_days(
    #[case] elapsed: TimeDelta,
    #[case] expect_gap: bool,
) {
    assert_eq!(TimeDelta::days(4).num_milliseconds(), 345_600_000);
    let posts = vec![Some(post(1, t0())), Some(post(2, t0() + elapsed))];
    let stream = StreamState::new(2, StreamOptions::default())
        .with_window(0, posts)
        .unwrap();
    let items = WindowRenderer::new(None).render(&stream);
    assert_eq!(items[1].time_gap().is_some(), expect_gap);
}

#[test]
fn placeholders_do_not_reset_gap_tracking() {
    let posts = vec![
        Some(post(1, t0())),
        None,
        Some(post(3, t0() + TimeDelta::days(6))),
    ];
    let stream = StreamState::new(10, StreamOptions::default())
        .with_window(0, posts)
        .unwrap();
    let items = WindowRenderer::new(None).render(&stream);

    assert!(items[1].is_placeholder());
    assert_eq!(items[1].index, 1);
    assert!(items[2].time_gap().is_some());
}

#[test]
fn load_more_requires_loaded_boundary_and_unfinished_stream() {
    let stream = loaded_stream(50, 0, 20, 20);
    let items = WindowRenderer::new(None).render(&stream);
    let last = items.last().unwrap();
    assert_eq!(last.kind, RenderItemKind::LoadMore);
    assert_eq!(last.index, 20);
    assert!(last.tag().is_none());

    let mut posts: Vec<Option<Post>> = page(0, 19).into_iter().map(Some).collect();
    posts.push(None);
    let stream = StreamState::new(50, StreamOptions::default())
        .with_window(0, posts)
        .unwrap();
    let items = WindowRenderer::new(None).render(&stream);
    assert!(items.last().unwrap().is_placeholder());
    assert!(!items.iter().any(|it| it.kind == RenderItemKind::LoadMore));
}

#[rstest]
#[case(None, true)]
#[case(Some(Viewer { can_reply: true }), true)]
#[case(Some(Viewer { can_reply: false }), false)]
fn reply_affordance_depends_on_viewer(#[case] viewer: Option<Viewer>, #[case] shown: bool) {
    let stream = loaded_stream(3, 0, 3, 20);
    let items = WindowRenderer::new(viewer).render(&stream);
    assert_eq!(
        items.iter().any(|it| it.kind == RenderItemKind::Reply),
        shown
    );
}

#[test]
fn reply_affordance_hidden_before_end() {
    let stream = loaded_stream(30, 0, 20, 20);
    let items = WindowRenderer::new(None).render(&stream);
    assert!(!items.iter().any(|it| it.kind == RenderItemKind::Reply));
}

#[test]
fn render_items_match_window_indexes() {
    let stream = loaded_stream(100, 40, 60, 20);
    let items = WindowRenderer::new(None).render(&stream);
    let window = stream.window();
    let posts: Vec<_> = items
        .iter()
        .filter(|it| it.post().is_some() || it.is_placeholder())
        .collect();
    assert_eq!(posts.len(), window.len());
    for (it, expected) in posts.iter().zip(window.start..window.end) {
        assert_eq!(it.index, expected);
    }
}

#[test]
fn render_into_reuses_buffer() {
    let stream = loaded_stream(5, 0, 5, 20);
    let renderer = WindowRenderer::new(None);
    let mut out = Vec::new();
    renderer.render_into(&stream, &mut out);
    renderer.render_into(&stream, &mut out);
    assert_eq!(out.len(), 6);
}

#[test]
fn load_next_extends_with_placeholders_and_is_idempotent() {
    let mut stream = loaded_stream(100, 0, 20, 20);
    let mut loader = Recorder::default();

    let ticket = stream.load_next(&mut loader).unwrap();
    assert_eq!(stream.window(), Window { start: 0, end: 40 });
    assert_eq!(stream.posts().len(), 40);
    assert!(stream.posts()[20..].iter().all(Option::is_none));
    assert!(stream.is_loading());

    assert_eq!(stream.load_next(&mut loader), None);
    assert_eq!(loader.requests.len(), 1);
    assert_eq!(
        loader.requests[0],
        LoadRequest {
            ticket,
            kind: LoadKind::Next { start: 20, end: 40 }
        }
    );

    stream.complete_load(ticket, 20, page(20, 40)).unwrap();
    assert!(stream.load_settled());
    assert!(stream.posts().iter().all(Option::is_some));
    assert_eq!(stream.post_at(39).unwrap().number, 40);
}

#[test]
fn load_next_unloads_posts_two_pages_behind() {
    let mut stream = loaded_stream(200, 0, 60, 20);
    let mut loader = Recorder::default();

    stream.load_next(&mut loader).unwrap();
    // New page is [60, 80); two pages back from 60 is 20.
    assert_eq!(stream.window(), Window { start: 20, end: 80 });
    assert_eq!(stream.posts().len(), 60);
    assert_eq!(stream.post_at(20).unwrap().number, 21);
}

#[test]
fn load_next_stops_at_count() {
    let mut stream = loaded_stream(25, 0, 20, 20);
    let mut loader = Recorder::default();
    stream.load_next(&mut loader).unwrap();
    assert_eq!(stream.window().end, 25);
    assert!(stream.viewing_end());

    let ticket = loader.requests[0].ticket;
    stream.complete_load(ticket, 20, page(20, 25)).unwrap();
    assert_eq!(stream.load_next(&mut loader), None);
}

#[test]
fn load_previous_prepends_and_unloads_far_end() {
    let mut stream = loaded_stream(200, 100, 160, 20);
    let mut loader = Recorder::default();

    let ticket = stream.load_previous(&mut loader).unwrap();
    // New page is [80, 100); two pages ahead of 100 is 140.
    assert_eq!(stream.window(), Window { start: 80, end: 140 });
    assert!(stream.posts()[..20].iter().all(Option::is_none));
    assert_eq!(stream.post_at(100).unwrap().number, 101);
    assert_eq!(stream.load_previous(&mut loader), None);

    stream.complete_load(ticket, 80, page(80, 100)).unwrap();
    assert_eq!(stream.post_at(80).unwrap().number, 81);
}

#[test]
fn next_and_previous_may_be_in_flight_together() {
    let mut stream = loaded_stream(200, 100, 120, 20);
    let mut loader = Recorder::default();
    let next = stream.load_next(&mut loader).unwrap();
    let prev = stream.load_previous(&mut loader).unwrap();
    assert_eq!(stream.pending_loads().len(), 2);

    stream.complete_load(prev, 80, page(80, 100)).unwrap();
    assert!(stream.is_loading());
    stream.complete_load(next, 120, page(120, 140)).unwrap();
    assert!(stream.load_settled());
    assert_eq!(stream.window(), Window { start: 80, end: 140 });
    assert!(stream.posts().iter().all(Option::is_some));
}

#[test]
fn mismatched_page_is_rejected_and_reverted() {
    let mut stream = loaded_stream(100, 0, 20, 20);
    let mut loader = Recorder::default();
    let ticket = stream.load_next(&mut loader).unwrap();

    let err = stream.complete_load(ticket, 20, page(20, 30)).unwrap_err();
    assert_eq!(
        err,
        StreamError::PageLengthMismatch {
            ticket,
            expected: 20,
            actual: 10
        }
    );
    assert_eq!(stream.window(), Window { start: 0, end: 20 });
    assert!(stream.load_settled());
    assert_eq!(stream.last_load_error().unwrap().ticket, ticket);
    assert_eq!(
        stream.complete_load(ticket, 20, page(20, 40)),
        Err(StreamError::UnknownTicket(ticket))
    );
}

#[test]
fn failed_load_removes_placeholders_and_allows_retry() {
    let mut stream = loaded_stream(100, 40, 60, 20);
    let mut loader = Recorder::default();
    let prev = stream.load_previous(&mut loader).unwrap();
    let next = stream.load_next(&mut loader).unwrap();

    stream.fail_load(prev).unwrap();
    stream.fail_load(next).unwrap();
    assert_eq!(stream.window(), Window { start: 40, end: 60 });
    assert_eq!(stream.posts().len(), 20);
    assert!(stream.load_settled());
    assert_eq!(
        stream.last_load_error().unwrap().kind,
        LoadKind::Next { start: 60, end: 80 }
    );

    assert!(stream.load_next(&mut loader).is_some());
    assert_eq!(loader.requests.len(), 3);
}

#[test]
fn load_near_index_resets_window_only_when_outside() {
    let mut stream = loaded_stream(500, 0, 20, 20);
    let mut loader = Recorder::default();
    assert_eq!(stream.load_near_index(5, &mut loader), None);

    let ticket = stream.load_near_index(300, &mut loader).unwrap();
    assert_eq!(stream.window(), Window { start: 290, end: 310 });
    assert!(stream.posts().iter().all(Option::is_none));
    stream.complete_load(ticket, 290, page(290, 310)).unwrap();
    assert_eq!(stream.post_at(300).unwrap().number, 301);

    stream.load_near_index(499, &mut loader).unwrap();
    assert_eq!(stream.window(), Window { start: 480, end: 500 });
    assert!(stream.viewing_end());
}

#[test]
fn load_near_number_replaces_window_on_response() {
    let mut stream = loaded_stream(500, 0, 20, 20);
    let mut loader = Recorder::default();
    assert_eq!(stream.load_near_number(7, &mut loader), None);

    let ticket = stream.load_near_number(420, &mut loader).unwrap();
    assert_eq!(stream.window(), Window { start: 0, end: 20 });
    stream.complete_load(ticket, 410, page(410, 430)).unwrap();
    assert_eq!(stream.window(), Window { start: 410, end: 430 });
    assert_eq!(stream.index_of_number(420), Some(419));
}

#[test]
fn window_outside_count_is_rejected() {
    let err = StreamState::new(3, StreamOptions::default())
        .with_window(2, vec![None, None])
        .unwrap_err();
    assert_eq!(
        err,
        StreamError::WindowOutOfRange {
            start: 2,
            end: 4,
            count: 3
        }
    );
}

#[test]
fn count_never_shrinks() {
    let mut stream = loaded_stream(10, 0, 10, 20);
    stream.set_count(12);
    assert_eq!(stream.count(), 12);
    assert!(!stream.viewing_end());
    stream.set_count(4);
    assert_eq!(stream.count(), 12);
}

#[test]
fn navigation_is_consumed_once_and_pauses_until_finished() {
    let mut stream = loaded_stream(500, 0, 20, 20);
    let mut loader = Recorder::default();

    stream.go_to_number(42, false, &mut loader);
    assert!(stream.is_paused());
    assert!(!stream.animate_scroll());
    assert_eq!(loader.requests.len(), 1);
    assert_eq!(
        stream.take_navigation(),
        Some(Navigation {
            target: Target::Number(42),
            animate: false
        })
    );
    assert_eq!(stream.take_navigation(), None);
    assert!(stream.is_paused());

    stream.finish_navigation();
    assert!(!stream.is_paused());
}

#[test]
fn newer_navigation_drops_stale_jump_load() {
    let mut stream = loaded_stream(500, 0, 20, 20);
    let mut loader = Recorder::default();

    stream.go_to_number(42, false, &mut loader);
    let stale = loader.requests[0].ticket;
    stream.go_to_index(3, false, false, &mut loader);

    assert!(stream.load_settled());
    assert_eq!(
        stream.complete_load(stale, 31, page(31, 51)),
        Err(StreamError::UnknownTicket(stale))
    );
    assert_eq!(stream.window(), Window { start: 0, end: 20 });
}

#[test]
fn jump_by_number_keeps_pending_edge_loads() {
    let mut stream = loaded_stream(100, 0, 20, 20);
    let mut loader = Recorder::default();

    let next = stream.load_next(&mut loader).unwrap();
    stream.go_to_number(70, false, &mut loader);
    assert_eq!(stream.pending_loads().len(), 2);

    let near = loader.requests[1].ticket;
    stream.fail_load(near).unwrap();
    stream.complete_load(next, 20, page(20, 40)).unwrap();

    assert_eq!(stream.window(), Window { start: 0, end: 40 });
    assert!(stream.posts().iter().all(Option::is_some));
    assert!(stream.load_settled());
}

#[test]
fn superseded_index_jump_drops_its_placeholders() {
    let mut stream = loaded_stream(100, 0, 20, 20);
    let mut loader = Recorder::default();

    stream.go_to_index(60, false, false, &mut loader);
    assert_eq!(stream.window(), Window { start: 50, end: 70 });
    stream.go_to_number(10, false, &mut loader);
    assert!(stream.window().is_empty());

    let near = loader.requests[1].ticket;
    assert_eq!(
        stream.pending_loads(),
        &[LoadRequest {
            ticket: near,
            kind: LoadKind::NearNumber { number: 10 }
        }]
    );
    stream.fail_load(near).unwrap();
    assert!(stream.window().is_empty());
    assert!(stream.load_settled());
}

#[test]
fn window_changes_request_a_scrubber_update() {
    let mut stream = loaded_stream(100, 0, 20, 20);
    let mut loader = Recorder::default();
    assert!(stream.take_scrubber_update());
    assert!(!stream.take_scrubber_update());

    let ticket = stream.load_next(&mut loader).unwrap();
    assert!(!stream.take_scrubber_update());
    stream.complete_load(ticket, 20, page(20, 40)).unwrap();
    assert!(stream.take_scrubber_update());

    stream.set_count(100);
    assert!(!stream.take_scrubber_update());
    stream.set_count(120);
    assert!(stream.take_scrubber_update());

    let ticket = stream.load_next(&mut loader).unwrap();
    stream.fail_load(ticket).unwrap();
    assert!(stream.take_scrubber_update());
}

#[test]
fn go_to_last_targets_reply_without_animation() {
    let mut stream = loaded_stream(50, 0, 20, 20);
    let mut loader = Recorder::default();
    stream.go_to_last(&mut loader);
    assert_eq!(
        stream.take_navigation(),
        Some(Navigation {
            target: Target::Index {
                index: 49,
                reply: true
            },
            animate: false
        })
    );
    assert_eq!(stream.window(), Window { start: 30, end: 50 });
}

#[test]
fn position_tracker_computes_fractional_index_and_visible_share() {
    let mut stream = loaded_stream(10, 0, 10, 20);
    let items = WindowRenderer::new(None).render(&stream);
    let layout = Layout::stack(&items, 0.0, 100.0, Viewport::new(150.0, 200.0, 0.0));
    drop(items);

    let pos = PositionTracker::update(&mut stream, &layout);
    assert_eq!(pos.index, 1.5);
    // Half of item 1, all of item 2, half of item 3.
    assert_eq!(pos.visible_posts, 2.0);
    assert_eq!(pos.period, Some(t0() + minutes(3)));

    let scrubber = stream.scrubber();
    assert_eq!(scrubber.index, 2.5);
    assert_eq!(scrubber.visible, 0.2);
    assert_eq!(scrubber.description, "March 2024");
}

#[test]
fn position_tracker_accounts_for_header_margin() {
    let stream = loaded_stream(10, 0, 10, 20);
    let items = WindowRenderer::new(None).render(&stream);
    let layout = Layout::stack(&items, 0.0, 100.0, Viewport::new(150.0, 250.0, 50.0));
    let pos = PositionTracker::compute(&layout);
    assert_eq!(pos.index, 2.0);
    assert_eq!(pos.visible_posts, 2.0);
}

#[test]
fn position_tracker_skips_unmeasured_items() {
    let stream = loaded_stream(10, 0, 10, 20);
    let items = WindowRenderer::new(None).render(&stream);
    let layout =
        Layout::stack(&items, 0.0, 100.0, Viewport::new(150.0, 200.0, 0.0)).without_rect(2);
    let pos = PositionTracker::compute(&layout);
    assert_eq!(pos.index, 1.5);
    assert_eq!(pos.visible_posts, 1.0);
}

#[test]
fn position_tracker_without_items_keeps_description() {
    let mut stream = loaded_stream(10, 0, 10, 20);
    stream.write_scrubber(3.0, 1.0, Some(t0()));
    let empty = Layout {
        viewport: Viewport::new(0.0, 500.0, 0.0),
        tags: Vec::new(),
        rects: Vec::new(),
    };
    PositionTracker::update(&mut stream, &empty);
    assert_eq!(stream.scrubber().index, 1.0);
    assert_eq!(stream.scrubber().visible, 0.0);
    assert_eq!(stream.scrubber().description, "March 2024");
}

#[test]
fn scrubber_outputs_stay_in_bounds() {
    let mut stream = loaded_stream(3, 0, 3, 20);
    let items = WindowRenderer::new(None).render(&stream);
    // Viewport taller than the whole stream, scrolled onto the reply item.
    let layout = Layout::stack(&items, 0.0, 100.0, Viewport::new(350.0, 2000.0, 0.0));
    drop(items);
    PositionTracker::update(&mut stream, &layout);
    let scrubber = stream.scrubber();
    assert!(scrubber.index >= 0.0 && scrubber.index <= 3.0);
    assert!(scrubber.visible >= 0.0 && scrubber.visible <= 1.0);

    stream.set_scrubber_index(99.0);
    assert_eq!(stream.scrubber().index, 3.0);
    stream.set_scrubber_index(-4.0);
    assert_eq!(stream.scrubber().index, 0.0);
}

#[test]
fn range_calculator_reports_start_and_end_numbers() {
    let stream = loaded_stream(10, 0, 10, 20);
    let items = WindowRenderer::new(None).render(&stream);
    // Index 1 is 80% above the top, so the range starts at index 2.
    let layout = Layout::stack(&items, 0.0, 100.0, Viewport::new(180.0, 250.0, 0.0));

    let mut seen = Vec::new();
    let range =
        RangeCalculator::calculate(&layout, &mut |s: PostNumber, e: PostNumber, c: PostNumber| {
            seen.push((s, e, c))
        })
        .unwrap();
    assert_eq!(range, VisibleRange { start: 3, end: 5 });
    assert_eq!(seen, vec![(3, 5, 3)]);
}

#[test]
fn range_calculator_counts_tall_items_covering_the_viewport() {
    let stream = loaded_stream(10, 0, 10, 20);
    let items = WindowRenderer::new(None).render(&stream);
    // 1000px items: item 0 is 90% above the top but still covers the whole viewport.
    let layout = Layout::stack(&items, 0.0, 1000.0, Viewport::new(900.0, 100.0, 0.0));
    let range = RangeCalculator::compute(&layout).unwrap();
    assert_eq!(range, VisibleRange { start: 1, end: 1 });
}

#[test]
fn range_calculator_is_silent_for_placeholders() {
    let stream = StreamState::new(10, StreamOptions::default())
        .with_window(0, vec![None, None, None])
        .unwrap();
    let items = WindowRenderer::new(None).render(&stream);
    let layout = Layout::stack(&items, 0.0, 100.0, Viewport::new(0.0, 500.0, 0.0));

    let mut calls = 0;
    let mut count_calls = |_: PostNumber, _: PostNumber, _: PostNumber| calls += 1;
    let range = RangeCalculator::calculate(&layout, &mut count_calls);
    assert_eq!(range, None);
    assert_eq!(calls, 0);
}

#[test]
fn content_registry_falls_back_to_empty_output() {
    let registry = ContentRegistry::<String>::new()
        .with("comment", |p: &Post| alloc::format!("#{}", p.number));
    assert!(registry.contains("comment"));
    assert_eq!(registry.render(&post(7, t0())), "#7");

    let renamed = Post::new(1, 8, t0(), "discussionRenamed");
    assert_eq!(registry.render(&renamed), "");
}

#[rstest]
#[case(TimeDelta::seconds(10), "a few seconds")]
#[case(TimeDelta::seconds(60), "a minute")]
#[case(TimeDelta::minutes(20), "20 minutes")]
#[case(TimeDelta::minutes(60), "an hour")]
#[case(TimeDelta::hours(5), "5 hours")]
#[case(TimeDelta::hours(30), "a day")]
#[case(TimeDelta::days(5), "5 days")]
#[case(TimeDelta::days(40), "a month")]
#[case(TimeDelta::days(120), "4 months")]
#[case(TimeDelta::days(400), "a year")]
#[case(TimeDelta::days(1100), "3 years")]
fn humanized_durations(#[case] delta: TimeDelta, #[case] expected: &str) {
    assert_eq!(humanize_duration(delta), expected);
    assert_eq!(humanize_duration(-delta), expected);
}

#[test]
fn period_label_is_month_and_year() {
    assert_eq!(period_label(t0()), "March 2024");
    assert_eq!(
        period_label(Utc.with_ymd_and_hms(2019, 12, 31, 23, 0, 0).unwrap()),
        "December 2019".to_string()
    );
}
