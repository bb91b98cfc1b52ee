use crate::api::{ApiClient, Transport};
use crate::models::{Review, SearchResults, User};
use failure::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use threadpool::ThreadPool;
use tracing::{debug, warn};

pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub delay: Duration,
    pub min_chars: usize,
    pub threads: usize,
}

impl Default for SearchOptions {
    fn default() -> SearchOptions {
        SearchOptions {
            delay: DEBOUNCE_DELAY,
            min_chars: MIN_QUERY_CHARS,
            threads: 2,
        }
    }
}

/// Holds back the latest input until it has been left alone for `delay`.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Debounce {
        Debounce { delay, pending: None }
    }

    /// Replaces any pending input and restarts the wait.
    pub fn input(&mut self, query: String, now: Instant) {
        self.pending = Some((query, now + self.delay));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline() {
            Some(at) if at <= now => self.pending.take().map(|(query, _)| query),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Plan {
    Search(String),
    Clear,
}

pub fn plan(query: &str, min_chars: usize) -> Plan {
    let query = query.trim();
    if query.chars().count() >= min_chars {
        Plan::Search(query.to_string())
    } else {
        Plan::Clear
    }
}

/// Hands out tickets for requests; only the newest ticket is current.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: AtomicU64,
}

impl Sequencer {
    pub fn new() -> Sequencer {
        Sequencer::default()
    }

    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Makes every outstanding ticket stale.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

#[derive(Debug)]
pub enum SearchEvent {
    Started { ticket: u64, query: String },
    Results { ticket: u64, query: String, results: SearchResults },
    Failed { ticket: u64, query: String, error: Error },
    Cleared,
}

enum Command {
    Query(String),
    Shutdown,
}

/// Background search-as-you-type.
///
/// Queries go in through `type_query`; whatever comes out lands on the
/// event channel given to `spawn`. Responses to superseded requests are
/// dropped, so events always describe the latest query.
pub struct SearchBox {
    tx: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl SearchBox {
    pub fn spawn<T>(api: Arc<ApiClient<T>>, options: SearchOptions, events: Sender<SearchEvent>) -> SearchBox
    where
        T: Transport + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || runner(api, options, rx, events));
        SearchBox { tx, worker: Some(worker) }
    }

    pub fn type_query(&self, query: &str) {
        // the worker only goes away on shutdown
        let _ = self.tx.send(Command::Query(query.to_string()));
    }
}

impl Drop for SearchBox {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn runner<T>(api: Arc<ApiClient<T>>, options: SearchOptions, rx: Receiver<Command>, events: Sender<SearchEvent>)
where
    T: Transport + 'static,
{
    let pool = ThreadPool::new(options.threads.max(1));
    let sequencer = Arc::new(Sequencer::new());
    let mut debounce = Debounce::new(options.delay);
    loop {
        let received = match debounce.deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(wait) {
                    Ok(cmd) => Some(cmd),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => break,
            },
        };
        match received {
            Some(Command::Query(query)) => debounce.input(query, Instant::now()),
            Some(Command::Shutdown) => break,
            None => {
                if let Some(query) = debounce.poll(Instant::now()) {
                    dispatch(&api, &pool, &sequencer, &events, &query, options.min_chars);
                }
            }
        }
    }
    pool.join();
}

fn dispatch<T>(
    api: &Arc<ApiClient<T>>,
    pool: &ThreadPool,
    sequencer: &Arc<Sequencer>,
    events: &Sender<SearchEvent>,
    query: &str,
    min_chars: usize,
) where
    T: Transport + 'static,
{
    let query = match plan(query, min_chars) {
        Plan::Search(query) => query,
        Plan::Clear => {
            sequencer.invalidate();
            let _ = events.send(SearchEvent::Cleared);
            return;
        }
    };
    let ticket = sequencer.issue();
    let _ = events.send(SearchEvent::Started { ticket, query: query.clone() });

    let api = api.clone();
    let sequencer = sequencer.clone();
    let events = events.clone();
    pool.execute(move || {
        let outcome = api.search(&query);
        if !sequencer.is_current(ticket) {
            debug!(ticket, query = %query, "dropping stale search response");
            return;
        }
        let event = match outcome {
            Ok(results) => SearchEvent::Results { ticket, query, results },
            Err(error) => {
                warn!(error = %error, "search failed");
                SearchEvent::Failed { ticket, query, error }
            }
        };
        let _ = events.send(event);
    });
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Review(String),
    Profile(String),
}

/// One entry of the result panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Hit<'a> {
    Review(&'a Review),
    User(&'a User),
}

impl<'a> Hit<'a> {
    pub fn route(&self) -> Route {
        match self {
            Hit::Review(review) => Route::Review(review.id.clone()),
            Hit::User(user) => Route::Profile(user.id.clone()),
        }
    }
}

/// State behind the search field and its drop-down.
#[derive(Debug, Default)]
pub struct SearchPanel {
    query: String,
    results: SearchResults,
    open: bool,
    loading: bool,
    min_chars: usize,
    // ticket of the newest `Started`; anything else is stale
    current: Option<u64>,
}

impl SearchPanel {
    pub fn new(min_chars: usize) -> SearchPanel {
        SearchPanel { min_chars, ..SearchPanel::default() }
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    fn qualifies(&self) -> bool {
        plan(&self.query, self.min_chars) != Plan::Clear
    }

    /// True for the ticket of the last `Started` that no `Cleared` retired.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.current == Some(ticket)
    }

    /// Folds a worker event into the panel. Results and failures only count
    /// for the ticket of the last `Started`; a `Cleared` retires that ticket.
    pub fn apply(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::Started { ticket, .. } => {
                self.current = Some(ticket);
                self.loading = true;
            }
            SearchEvent::Results { ticket, results, .. } if self.is_current(ticket) => {
                self.results = results;
                self.open = true;
                self.loading = false;
            }
            SearchEvent::Failed { ticket, .. } if self.is_current(ticket) => self.loading = false,
            SearchEvent::Results { ticket, query, .. } | SearchEvent::Failed { ticket, query, .. } => {
                debug!(ticket, query = %query, "panel ignores stale search event");
            }
            SearchEvent::Cleared => {
                self.current = None;
                self.results = SearchResults::default();
                self.open = false;
                self.loading = false;
            }
        }
    }

    pub fn focus(&mut self) {
        if self.qualifies() {
            self.open = true;
        }
    }

    /// Closes the drop-down without touching the query.
    pub fn dismiss(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The panel shows "no results" only once a finished search came back empty.
    pub fn shows_empty_notice(&self) -> bool {
        self.open && self.results.is_empty() && self.qualifies() && !self.loading
    }

    pub fn results(&self) -> &SearchResults {
        &self.results
    }

    /// Reviews first, then users, as they are listed.
    pub fn hits(&self) -> Vec<Hit<'_>> {
        let reviews = self.results.reviews.iter().map(Hit::Review);
        let users = self.results.users.iter().map(Hit::User);
        reviews.chain(users).collect()
    }

    /// Same as `select`, numbered from 1 the way results are printed.
    pub fn select_numbered(&mut self, number: usize) -> Option<Route> {
        match number {
            0 => None,
            n => self.select(n - 1),
        }
    }

    /// Picks the `index`th hit, resets the field and says where to go.
    pub fn select(&mut self, index: usize) -> Option<Route> {
        let route = self.hits().get(index).map(Hit::route)?;
        self.query.clear();
        self.open = false;
        Some(route)
    }
}
