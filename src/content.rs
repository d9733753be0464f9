//! What the sanctuary shows when it opens: a greeting, a quote, and the
//! rotating verses and footer lines.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    connectivity::GateHooks,
    quotes::{Quote, QuoteService},
    view::{self, ViewEmitter},
};

pub const CONTENT_EVENT: &str = "sanctuary-content";
pub const VERSE_EVENT: &str = "verse-changed";
pub const FOOTER_EVENT: &str = "footer-changed";

pub const GREETINGS: [&str; 5] = ["Welcome.", "Peace.", "Clarity.", "Stillness.", "Breathe."];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Verse {
    pub main: &'static str,
    /// Empty when the verse has no gloss.
    pub sub: &'static str,
}

pub static VERSES: [Verse; 4] = [
    Verse {
        main: "यदा यदा हि धर्मस्य ग्लानिर्भवति भारत",
        sub: "Whenever dharma declines",
    },
    Verse {
        main: "In silence we find truth",
        sub: "",
    },
    Verse {
        main: "योगश्चित्तवृत्तिनिरोधः",
        sub: "Yoga stills the mind",
    },
    Verse {
        main: "Peace",
        sub: "शान्तिः शान्तिः शान्तिः",
    },
];

pub static FOOTER_LINES: [&str; 5] = [
    "May peace be with you",
    "Om Shanti Shanti Shanti",
    "Find stillness within",
    "Embrace the silence",
    "Peace begins here",
];

pub const VERSE_PERIOD: Duration = Duration::from_millis(5000);
pub const FOOTER_PERIOD: Duration = Duration::from_millis(4500);

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SanctuaryContent {
    pub greeting: String,
    pub quote: Quote,
}

pub fn compose<R: Rng + ?Sized>(rng: &mut R, quote: Quote) -> SanctuaryContent {
    let greeting = GREETINGS.choose(rng).copied().unwrap_or(GREETINGS[0]);
    SanctuaryContent {
        greeting: greeting.to_string(),
        quote,
    }
}

#[derive(Serialize)]
struct FooterPayload {
    text: &'static str,
}

/// Cycles through `items` in order, wrapping at the end. The first call to
/// `advance` yields the second item; the first is already on screen.
#[derive(Debug, Clone)]
pub struct Rotation<T: 'static> {
    items: &'static [T],
    index: usize,
}

impl<T: 'static> Rotation<T> {
    pub fn new(items: &'static [T]) -> Self {
        Self { items, index: 0 }
    }

    pub fn advance(&mut self) -> Option<&'static T> {
        if self.items.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.items.len();
        self.items.get(self.index)
    }
}

struct RotationTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs the verse and footer rotation while the sanctuary is visible.
pub struct VerseRotator {
    emitter: Arc<dyn ViewEmitter>,
    task: Mutex<Option<RotationTask>>,
}

impl VerseRotator {
    pub fn new(emitter: Arc<dyn ViewEmitter>) -> Self {
        Self {
            emitter,
            task: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Restarts from the first verse if already running.
    pub fn start(&self) {
        let mut guard = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = guard.take() {
            previous.cancel.cancel();
            previous.handle.abort();
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_rotation(self.emitter.clone(), cancel.clone()));
        *guard = Some(RotationTask { cancel, handle });
    }

    pub fn stop(&self) {
        let mut guard = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(task) = guard.take() {
            task.cancel.cancel();
            task.handle.abort();
        }
    }
}

async fn run_rotation(emitter: Arc<dyn ViewEmitter>, cancel: CancellationToken) {
    let start = time::Instant::now();
    let mut verse_tick = time::interval_at(start + VERSE_PERIOD, VERSE_PERIOD);
    let mut footer_tick = time::interval_at(start + FOOTER_PERIOD, FOOTER_PERIOD);
    let mut verses = Rotation::new(&VERSES);
    let mut footers = Rotation::new(&FOOTER_LINES);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = verse_tick.tick() => {
                if let Some(verse) = verses.advance() {
                    view::emit(emitter.as_ref(), VERSE_EVENT, verse);
                }
            }
            _ = footer_tick.tick() => {
                if let Some(text) = footers.advance() {
                    view::emit(emitter.as_ref(), FOOTER_EVENT, &FooterPayload { text });
                }
            }
        }
    }
}

/// Side effects of the connectivity gate on the sanctuary's content.
pub struct ContentHooks {
    quotes: Arc<QuoteService>,
    rotator: Arc<VerseRotator>,
    emitter: Arc<dyn ViewEmitter>,
}

impl ContentHooks {
    pub fn new(
        quotes: Arc<QuoteService>,
        rotator: Arc<VerseRotator>,
        emitter: Arc<dyn ViewEmitter>,
    ) -> Self {
        Self {
            quotes,
            rotator,
            emitter,
        }
    }
}

#[async_trait]
impl GateHooks for ContentHooks {
    async fn entered_sanctuary(&self) {
        let content = compose(&mut rand::thread_rng(), self.quotes.random_quote());
        view::emit(self.emitter.as_ref(), CONTENT_EVENT, &content);
        self.rotator.start();
    }

    async fn entered_prompt(&self) {
        self.rotator.stop();
        // Use the online window to refresh quotes for the next offline visit.
        let quotes = self.quotes.clone();
        tokio::spawn(async move {
            if !quotes.refresh().await {
                info!("Quote refresh skipped; cache unchanged");
            }
        });
    }
}
