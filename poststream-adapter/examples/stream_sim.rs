use chrono::{TimeDelta, TimeZone, Utc};
use poststream::{
    Geometry, ItemRect, ItemTag, LoadKind, LoadRequest, Post, PostNumber, StreamOptions,
    StreamState, Viewport, WindowRenderer, item_tags,
};
use poststream_adapter::{ScrollCoordinator, ScrollMonitor, StreamHost};

const COUNT: usize = 500;
const ITEM_HEIGHT: f64 = 120.0;

/// Every item laid out at a fixed height, like a terminal list.
struct Screen {
    tags: Vec<ItemTag>,
    scroll_top: f64,
}

impl Geometry for Screen {
    fn viewport(&self) -> Viewport {
        Viewport::new(self.scroll_top, 800.0, 56.0)
    }

    fn items(&self) -> &[ItemTag] {
        &self.tags
    }

    fn item_rect(&self, index: usize) -> Option<ItemRect> {
        let pos = self.tags.iter().position(|t| t.index == index)?;
        Some(ItemRect::new(pos as f64 * ITEM_HEIGHT, ITEM_HEIGHT))
    }
}

impl StreamHost for Screen {
    fn set_scroll_top(&mut self, top: f64) {
        self.scroll_top = top;
    }

    fn redraw(&mut self, stream: &StreamState) {
        self.tags = item_tags(&WindowRenderer::default().render(stream));
    }
}

fn posts(start: usize, end: usize) -> Vec<Post> {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    (start..end)
        .map(|i| {
            let number = i as PostNumber + 1;
            // A long pause every 50 posts, so time gaps show up.
            let at = t0 + TimeDelta::hours(i as i64) + TimeDelta::days((i / 50) as i64 * 5);
            Post::new(number, number, at, "comment")
        })
        .collect()
}

/// Answers a request right away, as a local cache would.
fn serve(stream: &mut StreamState, request: LoadRequest) {
    let (start, end) = match request.kind {
        LoadKind::Next { start, end }
        | LoadKind::Previous { start, end }
        | LoadKind::NearIndex { start, end } => (start, end),
        LoadKind::NearNumber { number } => {
            let start = (number as usize - 1).saturating_sub(10);
            (start, (start + 20).min(COUNT))
        }
    };
    stream
        .complete_load(request.ticket, start, posts(start, end))
        .expect("response matches the request");
}

fn main() {
    // Example: scroll down a stream, then jump to a post far away.
    //
    // The adapter owns the frame loop; it forwards scroll events to the monitor, calls both
    // `tick`s every frame and answers loader requests when data arrives.
    let initial = posts(0, 20).into_iter().map(Some).collect();
    let mut stream = StreamState::new(COUNT, StreamOptions::default())
        .with_window(0, initial)
        .expect("initial window fits");
    let mut screen = Screen {
        tags: Vec::new(),
        scroll_top: 0.0,
    };
    screen.redraw(&stream);

    let mut monitor = ScrollMonitor::default();
    let mut coordinator = ScrollCoordinator::default();
    let mut inbox: Vec<LoadRequest> = Vec::new();
    let mut report = |start: PostNumber, end: PostNumber, _current: PostNumber| {
        println!("  visible posts {start}..={end}");
    };

    let mut now_ms = 0u64;
    for frame in 0..240u64 {
        if frame == 120 {
            println!("jump to post 420");
            stream.go_to_number(420, true, &mut |r: LoadRequest| inbox.push(r));
        }
        if frame < 100 {
            screen.scroll_top += 40.0;
            monitor.on_scroll(screen.scroll_top);
        }

        let tick = monitor.tick(
            now_ms,
            &mut stream,
            &mut screen,
            &mut |r: LoadRequest| inbox.push(r),
            &mut report,
        );
        if tick.next.is_some() || tick.previous.is_some() {
            println!("frame {frame}: requested page, window={:?}", stream.window());
        }
        coordinator.tick(now_ms, &mut stream, &mut screen, &mut report);

        for request in inbox.drain(..) {
            serve(&mut stream, request);
            screen.redraw(&stream);
        }
        now_ms += 16;
    }

    let scrubber = stream.scrubber();
    println!(
        "done: window={:?} scrubber index={:.2} visible={:.3} ({})",
        stream.window(),
        scrubber.index,
        scrubber.visible,
        scrubber.description
    );
    if let Some(flash) = coordinator.flash() {
        println!("flashing item {}", flash.index);
    }
}
