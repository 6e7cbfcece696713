//! Pagination aggregator: one network result set, its continuation cursor and
//! the load-more / load-all control flow.
//!
//! State lives behind a short-lived mutex that is never held across an await,
//! so observers can take snapshots while `all` is walking pages. Each `start`
//! bumps a generation counter; pages fetched for an older generation are
//! dropped instead of merged.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::adapters::{ContentProvider, Page};
use crate::domain::{ContinuationState, ResultSet, SearchIntent, SearchMode, SourceKind, Video};

use super::error::SearchError;
use super::resolver::is_video_id;

/// Default delay between pages during `all`
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(300);

/// Default upper bound on pages fetched by one `all` walk
pub const DEFAULT_MAX_PAGES: usize = 500;

/// Tunables for page walking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSettings {
    pub page_delay: Duration,
    pub max_pages: usize,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            page_delay: DEFAULT_PAGE_DELAY,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Copy of the aggregator state at one point in time
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub videos: Vec<Video>,
    pub continuation: Option<ContinuationState>,
}

impl Snapshot {
    pub fn has_more(&self) -> bool {
        self.continuation.as_ref().is_some_and(|c| c.has_more())
    }
}

/// Outcome of a single `more` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Nothing to do: no token, or a fetch is already in flight
    Skipped,

    /// A newer `start` replaced the search while the page was in flight
    Superseded,

    /// The page was merged
    Merged { added: usize, exhausted: bool },
}

/// Totals for one `all` walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages: usize,
    pub added: usize,
    pub exhausted: bool,
}

#[derive(Debug, Default)]
struct AggregatorState {
    results: ResultSet,
    continuation: Option<ContinuationState>,
    generation: u64,
}

/// Clears the in-flight flag on drop
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Aggregates paginated provider results into one deduplicated list
pub struct Aggregator<P: ContentProvider + ?Sized> {
    provider: Arc<P>,
    has_credential: bool,
    settings: PaginationSettings,
    state: Mutex<AggregatorState>,
    busy: AtomicBool,
}

impl<P: ContentProvider + ?Sized> Aggregator<P> {
    /// Create an aggregator. `has_credential` enables the credentialed
    /// channel listing.
    pub fn new(provider: Arc<P>, has_credential: bool) -> Self {
        Self {
            provider,
            has_credential,
            settings: PaginationSettings::default(),
            state: Mutex::new(AggregatorState::default()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_settings(mut self, settings: PaginationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> PaginationSettings {
        self.settings
    }

    fn lock(&self) -> MutexGuard<'_, AggregatorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current results and cursor
    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            videos: state.results.videos().to_vec(),
            continuation: state.continuation.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().results.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.lock()
            .continuation
            .as_ref()
            .is_some_and(|c| c.has_more())
    }

    /// Whether a `more` or `all` is in flight
    pub fn is_loading(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start a new top-level search, replacing results and cursor.
    ///
    /// Any failure leaves the result set empty.
    #[instrument(skip(self), fields(mode = %intent.mode, target = %intent.target_id))]
    pub async fn start(&self, intent: &SearchIntent) -> Result<Snapshot, SearchError> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.results.clear();
            state.continuation = None;
            state.generation
        };

        let (videos, continuation) = self.first_page(intent).await?;

        let mut state = self.lock();
        if state.generation != generation {
            debug!("Search superseded before its first page arrived");
            return Ok(Snapshot {
                videos: state.results.videos().to_vec(),
                continuation: state.continuation.clone(),
            });
        }

        let added = state.results.merge(videos);
        state.continuation = continuation;
        info!(
            added,
            has_more = state.continuation.as_ref().is_some_and(|c| c.has_more()),
            "Search started"
        );

        Ok(Snapshot {
            videos: state.results.videos().to_vec(),
            continuation: state.continuation.clone(),
        })
    }

    async fn first_page(
        &self,
        intent: &SearchIntent,
    ) -> Result<(Vec<Video>, Option<ContinuationState>), SearchError> {
        let target = intent.target_id.as_str();

        match intent.mode {
            SearchMode::Video => {
                if !is_video_id(target) {
                    return Err(SearchError::InvalidVideoId(target.to_string()));
                }
                let video = self.provider.fetch_video_info(target).await?;
                Ok((vec![video], None))
            }

            SearchMode::Playlist => {
                let page = self.provider.fetch_page(target, true, None).await?;
                let cursor = ContinuationState::new(target, SourceKind::Playlist, page.continuation);
                Ok((page.videos, Some(cursor)))
            }

            SearchMode::Search => {
                let page = self.provider.search_free_text(target).await?;
                Ok((page.videos, Some(ContinuationState::new(target, SourceKind::Search, None))))
            }

            SearchMode::Channel if self.has_credential => {
                let page = self
                    .provider
                    .fetch_channel_page_v3(target, None)
                    .await?;
                let cursor =
                    ContinuationState::new(target, SourceKind::Channel, page.continuation).version3();
                Ok((page.videos, Some(cursor)))
            }

            SearchMode::Channel if intent.forced => {
                let channel = self
                    .provider
                    .resolve_channel(target)
                    .await?;
                debug!(channel_id = %channel.channel_id, name = %channel.channel_name, "Resolved channel");
                let page = self
                    .provider
                    .fetch_page(&channel.channel_id, false, None)
                    .await?;
                let cursor =
                    ContinuationState::new(channel.channel_id, SourceKind::Channel, page.continuation);
                Ok((page.videos, Some(cursor)))
            }

            SearchMode::Channel => Err(SearchError::CapabilityRequired("channel")),
        }
    }

    /// Fetch and merge the next page, if there is one and nothing is in flight.
    ///
    /// On failure the merged results and the token are left as they were.
    #[instrument(skip(self))]
    pub async fn more(&self) -> Result<Advance, SearchError> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            debug!("Fetch already in flight");
            return Ok(Advance::Skipped);
        };
        self.advance().await
    }

    /// Walk every remaining page with the configured delay between pages.
    ///
    /// Returns `None` when another fetch is already in flight. A failure stops
    /// the walk; pages merged before it are kept.
    #[instrument(skip(self))]
    pub async fn all(&self) -> Result<Option<WalkSummary>, SearchError> {
        let Some(mut walk) = self.walk() else {
            debug!("Fetch already in flight");
            return Ok(None);
        };

        while walk.next_page().await?.is_some() {}

        let summary = walk.summary();
        info!(
            pages = summary.pages,
            added = summary.added,
            exhausted = summary.exhausted,
            "Load all finished"
        );
        Ok(Some(summary))
    }

    /// Begin a page walk. Holds the in-flight flag until dropped.
    pub fn walk(&self) -> Option<PageWalk<'_, P>> {
        let guard = BusyGuard::acquire(&self.busy)?;
        Some(PageWalk {
            aggregator: self,
            _guard: guard,
            summary: WalkSummary::default(),
        })
    }

    /// One page by token. Caller holds the busy guard.
    async fn advance(&self) -> Result<Advance, SearchError> {
        let (generation, cursor) = {
            let state = self.lock();
            match state.continuation.as_ref() {
                Some(cursor) if cursor.has_more() => (state.generation, cursor.clone()),
                _ => return Ok(Advance::Skipped),
            }
        };

        let page = match self.fetch_next(&cursor).await {
            Ok(page) => page,
            Err(e) => {
                warn!(source = %cursor.source_id, error = %e, "Failed to fetch next page");
                return Err(e);
            }
        };

        let mut state = self.lock();
        if state.generation != generation {
            debug!("Dropping page from a superseded search");
            return Ok(Advance::Superseded);
        }

        let added = state.results.merge(page.videos);
        let exhausted = page.continuation.is_none();
        if let Some(current) = state.continuation.as_mut() {
            current.token = page.continuation;
        }
        debug!(added, total = state.results.len(), exhausted, "Merged page");

        Ok(Advance::Merged { added, exhausted })
    }

    async fn fetch_next(&self, cursor: &ContinuationState) -> Result<Page, SearchError> {
        let token = cursor.token.as_deref();
        let id = cursor.source_id.as_str();

        let page = if cursor.is_version3_channel {
            self.provider
                .fetch_channel_page_v3(id, token)
                .await?
        } else {
            match cursor.source_kind {
                SourceKind::Playlist => self.provider.fetch_page(id, true, token).await?,
                SourceKind::Channel => self.provider.fetch_page(id, false, token).await?,
                // Free-text search is single-page
                SourceKind::Search => Page::default(),
            }
        };
        Ok(page)
    }
}

/// Restartable walk over the remaining pages.
///
/// Each `next_page` after the first waits for the configured page delay.
/// Dropping the walk releases the in-flight flag; a later walk resumes from
/// the stored token.
pub struct PageWalk<'a, P: ContentProvider + ?Sized> {
    aggregator: &'a Aggregator<P>,
    _guard: BusyGuard<'a>,
    summary: WalkSummary,
}

impl<P: ContentProvider + ?Sized> PageWalk<'_, P> {
    /// Fetch and merge one more page.
    ///
    /// Returns the number of new videos, or `None` once the source is
    /// exhausted, the page cap is reached or the search was superseded.
    pub async fn next_page(&mut self) -> Result<Option<usize>, SearchError> {
        let settings = self.aggregator.settings;

        if self.summary.exhausted {
            return Ok(None);
        }
        if self.summary.pages >= settings.max_pages {
            warn!(max_pages = settings.max_pages, "Page cap reached, stopping walk");
            return Ok(None);
        }
        if !self.aggregator.has_more() {
            self.summary.exhausted = true;
            return Ok(None);
        }

        if self.summary.pages > 0 && !settings.page_delay.is_zero() {
            tokio::time::sleep(settings.page_delay).await;
        }

        match self.aggregator.advance().await? {
            Advance::Merged { added, exhausted } => {
                self.summary.pages += 1;
                self.summary.added += added;
                self.summary.exhausted = exhausted;
                Ok(Some(added))
            }
            Advance::Skipped => {
                self.summary.exhausted = true;
                Ok(None)
            }
            Advance::Superseded => Ok(None),
        }
    }

    pub fn summary(&self) -> WalkSummary {
        self.summary
    }
}
