pub mod commands;
pub mod source;

use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::db::Database;

pub use source::{HttpQuoteSource, QuoteSource};

/// Storage key of the serialized quote list.
pub const CACHE_KEY: &str = "cachedQuotes";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    /// Some sources call this field `content`.
    #[serde(alias = "content")]
    pub text: String,
    pub author: String,
}

/// Built-in pool used while nothing has been cached yet.
pub const WISDOM_QUOTES: [(&str, &str); 11] = [
    ("The quieter you become, the more you can hear.", "Ram Dass"),
    ("The mind is everything. What you think, you become.", "Buddha"),
    ("Yoga is the journey of the self, through the self, to the self.", "The Bhagavad Gita"),
    ("When meditation is mastered, the mind is unwavering.", "The Bhagavad Gita"),
    ("In chaos, keep stillness inside of you.", "Deepak Chopra"),
    ("Quiet the mind, and the soul will speak.", "Ma Jaya Sati Bhagavati"),
    ("Peace comes from within.", "Buddha"),
    ("Silence is the absence of self.", "Anonymous"),
    ("Be present in all things and thankful for all things.", "Maya Angelou"),
    ("The present moment is all you ever have.", "Eckhart Tolle"),
    ("Meditation is not evasion; it is a serene encounter with reality.", "Thich Nhat Hanh"),
];

fn wisdom_quote((text, author): (&str, &str)) -> Quote {
    Quote {
        text: text.into(),
        author: author.into(),
    }
}

pub fn fallback_quote() -> Quote {
    wisdom_quote(WISDOM_QUOTES[0])
}

pub fn pooled_quote<R: rand::Rng + ?Sized>(rng: &mut R) -> Quote {
    WISDOM_QUOTES
        .choose(rng)
        .copied()
        .map(wisdom_quote)
        .unwrap_or_else(fallback_quote)
}

/// Quote list cached in SQLite and refreshed opportunistically while online.
/// Every failure on this path is logged and swallowed; the previous cache
/// stays in place.
pub struct QuoteService {
    db: Database,
    source: Arc<dyn QuoteSource>,
    quotes: RwLock<Vec<Quote>>,
}

impl QuoteService {
    pub fn new(db: Database, source: Arc<dyn QuoteSource>) -> Self {
        Self {
            db,
            source,
            quotes: RwLock::new(Vec::new()),
        }
    }

    /// Read the cached list. A first run with nothing cached fetches instead.
    pub async fn load(&self) -> usize {
        match self.read_cache().await {
            Ok(Some(quotes)) => {
                info!("Loaded {} quotes from cache", quotes.len());
                let count = quotes.len();
                self.replace(quotes);
                count
            }
            Ok(None) => {
                self.refresh().await;
                self.len()
            }
            Err(err) => {
                warn!("Quote cache unreadable: {err:#}");
                self.refresh().await;
                self.len()
            }
        }
    }

    async fn read_cache(&self) -> Result<Option<Vec<Quote>>> {
        let Some(entry) = self.db.get_cache_entry(CACHE_KEY).await? else {
            return Ok(None);
        };
        let quotes = serde_json::from_str(&entry.value).context("cached quotes are not valid JSON")?;
        Ok(Some(quotes))
    }

    /// Returns true when the cache was replaced.
    pub async fn refresh(&self) -> bool {
        info!("Fetching new quotes");
        let quotes = match self.source.fetch().await {
            Ok(quotes) if quotes.is_empty() => {
                warn!("Quote source returned no quotes; keeping cache");
                return false;
            }
            Ok(quotes) => quotes,
            Err(err) => {
                warn!("Error fetching new quotes: {err:#}");
                return false;
            }
        };

        if let Err(err) = self.write_cache(&quotes).await {
            warn!("Failed to persist quotes: {err:#}");
        }
        info!("Fetched and cached {} quotes", quotes.len());
        self.replace(quotes);
        true
    }

    async fn write_cache(&self, quotes: &[Quote]) -> Result<()> {
        let serialized = serde_json::to_string(quotes)?;
        self.db
            .put_cache_entry(CACHE_KEY, serialized, Utc::now())
            .await
    }

    fn replace(&self, quotes: Vec<Quote>) {
        let mut guard = self
            .quotes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = quotes;
    }

    pub fn len(&self) -> usize {
        self.quotes
            .read()
            .map(|guard| guard.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn random_quote(&self) -> Quote {
        let guard = self
            .quotes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut rng = rand::thread_rng();
        match guard.choose(&mut rng) {
            Some(quote) => quote.clone(),
            None => pooled_quote(&mut rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct StubSource {
        responses: Mutex<Vec<Result<Vec<Quote>>>>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(responses: Vec<Result<Vec<Quote>>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteSource for StubSource {
        async fn fetch(&self) -> Result<Vec<Quote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(anyhow!("offline"));
            }
            responses.remove(0)
        }
    }

    fn quote(text: &str) -> Quote {
        Quote {
            text: text.into(),
            author: "Anon".into(),
        }
    }

    fn database(dir: &TempDir) -> Database {
        Database::new(dir.path().join("sanctuary.sqlite3")).unwrap()
    }

    #[tokio::test]
    async fn first_load_fetches_and_persists() {
        let dir = TempDir::new().unwrap();
        let source = StubSource::new(vec![Ok(vec![quote("a"), quote("b")])]);
        let service = QuoteService::new(database(&dir), source.clone());

        assert_eq!(service.load().await, 2);
        assert_eq!(source.calls(), 1);

        let entry = service.db.get_cache_entry(CACHE_KEY).await.unwrap().unwrap();
        let stored: Vec<Quote> = serde_json::from_str(&entry.value).unwrap();
        assert_eq!(stored, vec![quote("a"), quote("b")]);
    }

    #[tokio::test]
    async fn later_load_reads_cache_without_fetching() {
        let dir = TempDir::new().unwrap();
        let db = database(&dir);
        db.put_cache_entry(CACHE_KEY, serde_json::to_string(&vec![quote("cached")]).unwrap(), Utc::now())
            .await
            .unwrap();
        let source = StubSource::new(vec![]);
        let service = QuoteService::new(db, source.clone());

        assert_eq!(service.load().await, 1);
        assert_eq!(source.calls(), 0);
        assert_eq!(service.random_quote(), quote("cached"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_cache() {
        let dir = TempDir::new().unwrap();
        let source = StubSource::new(vec![Ok(vec![quote("kept")]), Err(anyhow!("timeout"))]);
        let service = QuoteService::new(database(&dir), source);

        assert!(service.refresh().await);
        assert!(!service.refresh().await);

        assert_eq!(service.random_quote(), quote("kept"));
        let entry = service.db.get_cache_entry(CACHE_KEY).await.unwrap().unwrap();
        assert!(entry.value.contains("kept"));
    }

    #[tokio::test]
    async fn empty_response_does_not_wipe_cache() {
        let dir = TempDir::new().unwrap();
        let source = StubSource::new(vec![Ok(vec![quote("kept")]), Ok(vec![])]);
        let service = QuoteService::new(database(&dir), source);

        service.refresh().await;
        assert!(!service.refresh().await);
        assert_eq!(service.len(), 1);
    }

    #[tokio::test]
    async fn empty_cache_draws_from_the_builtin_pool() {
        let dir = TempDir::new().unwrap();
        let service = QuoteService::new(database(&dir), StubSource::new(vec![]));

        assert_eq!(service.load().await, 0);
        assert!(service.is_empty());

        let texts: std::collections::HashSet<String> =
            (0..50).map(|_| service.random_quote().text).collect();
        assert!(texts.len() > 1);
        for text in &texts {
            assert!(WISDOM_QUOTES.iter().any(|(pooled, _)| pooled == text));
        }
    }

    #[tokio::test]
    async fn corrupt_cache_triggers_refetch() {
        let dir = TempDir::new().unwrap();
        let db = database(&dir);
        db.put_cache_entry(CACHE_KEY, "not json".into(), Utc::now())
            .await
            .unwrap();
        let source = StubSource::new(vec![Ok(vec![quote("fresh")])]);
        let service = QuoteService::new(db, source.clone());

        assert_eq!(service.load().await, 1);
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn accepts_content_field_from_remote_records() {
        let parsed: Vec<Quote> =
            serde_json::from_str(r#"[{"content": "Be here now.", "author": "Ram Dass", "_id": "x"}]"#)
                .unwrap();
        assert_eq!(parsed[0].text, "Be here now.");
    }
}
