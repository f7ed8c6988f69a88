use crate::client::{Client, ClientConfig};
use crate::error::{Result, ScanError};
use crate::frontier::{Frontier, FrontierItem, VisitedSet};
use crate::parser::Parser;
use crate::result::{ContentKind, CrawlResult};
use reqwest::header::CONTENT_TYPE;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Options for a single crawl run
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: String,
    pub max_depth: usize,
    pub workers: usize,
    /// Frontier size. Discovered URLs are dropped while it is full.
    pub queue_capacity: usize,
    pub result_buffer: usize,
    /// Overall time budget for the run; cancels everything when it elapses.
    pub deadline: Option<Duration>,
    pub client: ClientConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            max_depth: 3,
            workers: 10,
            queue_capacity: 1000,
            result_buffer: 1000,
            deadline: None,
            client: ClientConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// State shared by every worker of one run.
struct Shared {
    client: Client,
    parser: Parser,
    frontier: Frontier,
    visited: VisitedSet,
    max_depth: usize,
    cancel: CancellationToken,
}

/// Breadth-first crawler over a single host.
///
/// A fixed pool of workers pulls from one bounded frontier. Each URL is
/// fetched at most once per run and every fetched URL yields exactly one
/// [`CrawlResult`] on the stream returned by [`Crawler::start`].
pub struct Crawler {
    shared: Arc<Shared>,
    workers: usize,
    result_buffer: usize,
    deadline: Option<Duration>,
    state: Mutex<CrawlState>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let CrawlConfig {
            base_url,
            max_depth,
            workers,
            queue_capacity,
            result_buffer,
            deadline,
            client: mut client_config,
        } = config;

        client_config.base_url = base_url;
        let client = Client::new(client_config)?;
        let parser = Parser::with_base(client.base_url().clone());

        Ok(Self {
            shared: Arc::new(Shared {
                client,
                parser,
                frontier: Frontier::new(queue_capacity),
                visited: VisitedSet::new(),
                max_depth,
                cancel: CancellationToken::new(),
            }),
            workers: workers.max(1),
            result_buffer: result_buffer.max(1),
            deadline,
            state: Mutex::new(CrawlState::Idle),
            handles: Mutex::new(Vec::new()),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, CrawlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CrawlState {
        *self.lock_state()
    }

    pub fn base_url(&self) -> &url::Url {
        self.shared.client.base_url()
    }

    pub fn visited_count(&self) -> usize {
        self.shared.visited.len()
    }

    /// Seed the frontier with the base URL, spawn the worker pool and hand
    /// back the live result stream.
    ///
    /// The stream closes once every worker has exited: when the frontier
    /// drains, the deadline passes, or [`Crawler::stop`] is called.
    pub fn start(&self) -> Result<mpsc::Receiver<CrawlResult>> {
        {
            let mut state = self.lock_state();
            if *state != CrawlState::Idle {
                return Err(ScanError::AlreadyStarted);
            }
            *state = CrawlState::Running;
        }

        let seed = self.base_url().to_string();
        info!(
            "Starting crawl of {} with {} workers (max depth {})",
            seed, self.workers, self.shared.max_depth
        );

        if let Some(deadline) = self.deadline {
            let cancel = self.shared.cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(deadline) => {
                        info!("Crawl deadline of {:?} reached, cancelling", deadline);
                        cancel.cancel();
                    }
                    _ = cancel.cancelled() => {}
                }
            });
        }

        let (tx, rx) = mpsc::channel(self.result_buffer);

        if !self.shared.frontier.offer(FrontierItem::new(seed, 0)) {
            self.shared.frontier.close();
        }

        let mut handles = self.lock_handles();
        for worker_id in 0..self.workers {
            let shared = self.shared.clone();
            let results = tx.clone();
            handles.push(tokio::spawn(run_worker(worker_id, shared, results)));
        }

        Ok(rx)
    }

    /// Cancel in-flight work and wait for every worker to unwind.
    ///
    /// Safe to call more than once and on a crawler that never started.
    pub async fn stop(&self) {
        {
            let mut state = self.lock_state();
            match *state {
                CrawlState::Idle => {
                    *state = CrawlState::Stopped;
                    drop(state);
                    self.shared.cancel.cancel();
                    self.shared.frontier.close();
                    return;
                }
                CrawlState::Stopping | CrawlState::Stopped => return,
                CrawlState::Running => *state = CrawlState::Stopping,
            }
        }

        info!("Stopping crawl");
        self.shared.cancel.cancel();
        self.shared.frontier.close();
        self.join_workers().await;

        *self.lock_state() = CrawlState::Stopped;
        info!(
            "Crawl stopped. Visited {} URLs",
            self.shared.visited.len()
        );
    }

    /// Wait for the run to finish on its own. The result stream must be
    /// drained concurrently or workers block on a full buffer.
    pub async fn wait(&self) {
        if self.state() != CrawlState::Running {
            return;
        }

        self.join_workers().await;
        // Releases the deadline timer, if any.
        self.shared.cancel.cancel();

        let mut state = self.lock_state();
        if *state == CrawlState::Running {
            *state = CrawlState::Stopped;
        }
        info!("Crawl complete. Visited {} URLs", self.shared.visited.len());
    }

    fn lock_handles(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn join_workers(&self) {
        let handles = std::mem::take(&mut *self.lock_handles());
        for joined in futures::future::join_all(handles).await {
            if let Err(e) = joined {
                warn!("Worker task failed: {}", e);
            }
        }
    }
}

impl Drop for Crawler {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

async fn run_worker(worker_id: usize, shared: Arc<Shared>, results: mpsc::Sender<CrawlResult>) {
    debug!("Worker {} started", worker_id);

    while let Some(item) = shared.frontier.take(&shared.cancel).await {
        shared.process(item, &results).await;
        shared.frontier.complete();
    }

    debug!("Worker {} finished", worker_id);
}

impl Shared {
    /// Admission protocol plus fetch and link extraction for one item.
    /// Every early return abandons the item silently.
    async fn process(&self, item: FrontierItem, results: &mpsc::Sender<CrawlResult>) {
        let FrontierItem { url, depth } = item;

        let url = self.parser.normalize(&url);
        if url.is_empty() {
            return;
        }

        if !self.visited.insert_if_absent(&url) {
            return;
        }

        if depth > self.max_depth {
            debug!("Skipping {} (depth {} > {})", url, depth, self.max_depth);
            return;
        }

        if !self.client.is_in_scope(&url) {
            debug!("Skipping {} (out of scope)", url);
            return;
        }

        let response = match self.client.get(&self.cancel, &url).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Fetch failed for {}: {}", url, e);
                return;
            }
        };

        let status = response.status().as_u16();
        let kind = ContentKind::from_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default(),
        );
        let page_url = response.url().clone();

        let result = CrawlResult::new(url, depth, status, kind);
        debug!("[{}] {} {} (depth {})", status, kind, result.url, depth);

        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = results.send(result) => sent.is_ok(),
        };
        if !sent || status != 200 || !kind.is_parseable() {
            return;
        }

        let body = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            body = response.text() => match body {
                Ok(body) => body,
                Err(e) => {
                    debug!("Failed to read body of {}: {}", page_url, e);
                    return;
                }
            },
        };

        // Relative links resolve against the document they appear in.
        let page_parser = Parser::with_base(page_url);
        let mut queued = 0;
        let mut dropped = 0;
        for raw in page_parser.extract(kind, &body) {
            let next = page_parser.normalize(&raw);
            if next.is_empty() {
                continue;
            }
            if self.frontier.offer(FrontierItem::new(next, depth + 1)) {
                queued += 1;
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            debug!(
                "Frontier full: queued {} and dropped {} links from {}",
                queued,
                dropped,
                page_parser.base_url()
            );
        }
    }
}
