//! Shared crawl state: visited set, budgets, pagination frontier and the
//! profile accumulator
//!
//! All of it lives behind a single mutex so that every admission decision
//! and every merge of a page's links is one atomic step. Workers never hold
//! the lock across an await point.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::models::{CrawlJob, PageKind, PageUrl, WalkState};

/// URLs already dispatched, first writer wins
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    urls: HashSet<PageUrl>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a URL; returns `false` if it was already present
    pub fn insert(&mut self, url: &PageUrl) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.clone())
    }

    pub fn contains(&self, url: &PageUrl) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Outcome of asking whether a job may be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Marked visited and counted; fetch it
    Dispatch,
    /// Another job already owns this URL
    AlreadyVisited,
    /// The page or link budget is spent
    OverBudget,
}

/// What one directory page contributed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Absorbed {
    pub profiles_added: usize,
    pub profiles_dropped: usize,
    pub pagination_enqueued: usize,
}

/// Point-in-time counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierSnapshot {
    pub directory_pages_visited: usize,
    pub profile_links_found: usize,
    pub profiles_dispatched: usize,
    pub pending_pages: usize,
    pub walk_state: WalkState,
}

#[derive(Debug)]
struct FrontierState {
    visited: VisitedSet,
    pending: VecDeque<CrawlJob>,
    enqueued: HashSet<PageUrl>,
    profiles: Vec<CrawlJob>,
    profile_urls: HashSet<PageUrl>,
    pages_visited: usize,
    profiles_dispatched: usize,
    walk_state: WalkState,
    budget_cut: bool,
}

/// Thread-safe frontier shared by the pagination walker and the fetch
/// scheduler's workers
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    max_pages: usize,
    max_links: usize,
}

impl Frontier {
    pub fn new(max_pages: usize, max_links: usize) -> Self {
        Self {
            state: Mutex::new(FrontierState {
                visited: VisitedSet::new(),
                pending: VecDeque::new(),
                enqueued: HashSet::new(),
                profiles: Vec::new(),
                profile_urls: HashSet::new(),
                pages_visited: 0,
                profiles_dispatched: 0,
                walk_state: WalkState::Start,
                budget_cut: false,
            }),
            max_pages,
            max_links,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        // No critical section can leave the state half-updated
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start -> Walking: enqueue the seed directory page
    pub fn start(&self, seed: CrawlJob) {
        let mut state = self.lock();
        state.enqueued.insert(seed.url.clone());
        state.pending.push_back(seed);
        state.walk_state = WalkState::Walking;
    }

    /// Take every queued directory/pagination job
    pub fn take_pending(&self) -> Vec<CrawlJob> {
        self.lock().pending.drain(..).collect()
    }

    /// Decide atomically whether `job` may be fetched, and claim it if so
    ///
    /// Listing pages count toward the page budget here, before the fetch, so
    /// a page that later fails still counts as visited. Profile pages count
    /// toward the link budget.
    pub fn admit(&self, job: &CrawlJob) -> Admission {
        let mut state = self.lock();

        if state.visited.contains(&job.url) {
            return Admission::AlreadyVisited;
        }

        if job.kind.is_listing() {
            if state.pages_visited >= self.max_pages {
                state.budget_cut = true;
                return Admission::OverBudget;
            }
            state.visited.insert(&job.url);
            state.pages_visited += 1;
        } else {
            if state.profiles_dispatched >= self.max_links {
                return Admission::OverBudget;
            }
            state.visited.insert(&job.url);
            state.profiles_dispatched += 1;
        }

        Admission::Dispatch
    }

    /// Merge one directory page's classified links
    ///
    /// Profile links are deduplicated against the visited set and the
    /// accumulator and capped at `max_links`, keeping earlier links. New
    /// pagination links are queued unless already visited or queued; when
    /// the page budget is already spent they are dropped and the walk is
    /// marked as budget-limited. Directory and unrelated links are not
    /// followed.
    pub fn absorb(&self, from: &CrawlJob, links: &[(PageUrl, PageKind)]) -> Absorbed {
        let mut state = self.lock();
        let mut absorbed = Absorbed::default();

        for (url, kind) in links {
            match kind {
                PageKind::Profile => {
                    if state.visited.contains(url) || state.profile_urls.contains(url) {
                        continue;
                    }
                    if state.profiles.len() >= self.max_links {
                        absorbed.profiles_dropped += 1;
                        continue;
                    }
                    state.profile_urls.insert(url.clone());
                    state
                        .profiles
                        .push(CrawlJob::discovered(url.clone(), PageKind::Profile, from));
                    absorbed.profiles_added += 1;
                }
                PageKind::Pagination => {
                    if state.visited.contains(url) || state.enqueued.contains(url) {
                        continue;
                    }
                    let queued = state.pending.len();
                    if state.pages_visited + queued >= self.max_pages {
                        state.budget_cut = true;
                        continue;
                    }
                    state.enqueued.insert(url.clone());
                    state
                        .pending
                        .push_back(CrawlJob::discovered(url.clone(), PageKind::Pagination, from));
                    absorbed.pagination_enqueued += 1;
                }
                PageKind::Directory | PageKind::Unrelated => {}
            }
        }

        absorbed
    }

    /// Profile jobs accumulated so far, in discovery order
    pub fn profile_jobs(&self) -> Vec<CrawlJob> {
        self.lock().profiles.clone()
    }

    /// Settle the walk state once no more directory pages will be fetched
    ///
    /// A cancelled walk stays in `Walking`.
    pub fn finish_walk(&self, cancelled: bool) -> WalkState {
        let mut state = self.lock();
        if state.walk_state == WalkState::Walking && !cancelled {
            state.walk_state = if state.budget_cut {
                WalkState::BudgetReached
            } else {
                WalkState::Exhausted
            };
        }
        state.walk_state
    }

    pub fn is_visited(&self, url: &PageUrl) -> bool {
        self.lock().visited.contains(url)
    }

    pub fn snapshot(&self) -> FrontierSnapshot {
        let state = self.lock();
        FrontierSnapshot {
            directory_pages_visited: state.pages_visited,
            profile_links_found: state.profiles.len(),
            profiles_dispatched: state.profiles_dispatched,
            pending_pages: state.pending.len(),
            walk_state: state.walk_state,
        }
    }
}
