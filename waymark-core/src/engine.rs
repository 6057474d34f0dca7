//! Background worker that serialises every search for one engine.
//!
//! Searches are queued on a bounded channel and executed one at a time on a
//! dedicated thread that owns the [`SearchCascade`] and therefore every
//! region handle and provider. Callers receive a [`SearchTicket`], which can
//! be awaited from any async executor or waited on from synchronous code.

use std::{
    future::Future,
    io,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
    thread::{self, JoinHandle},
};

use geo::Coord;
use thiserror::Error;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot::{self, error::TryRecvError},
};

use crate::{
    AddressRecord, Category, NearbyQuery, PointOfInterestRecord, QueryContext, QueryOutcome,
    RegionId, SearchCascade, SearchError, SearchHit,
};

/// Pending searches accepted before callers see [`SearchError::QueueFull`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

const WORKER_NAME: &str = "waymark-search";

type Job = Box<dyn FnOnce(&mut SearchCascade) + Send>;

/// Errors raised while starting or stopping the worker.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The operating system refused to start the worker thread.
    #[error("failed to start the search worker: {0}")]
    Spawn(#[source] io::Error),
    /// The worker thread panicked.
    #[error("the search worker panicked")]
    WorkerPanicked,
}

/// Handle to a search worker.
///
/// Dropping the engine stops the worker after queued searches finish.
///
/// # Examples
///
/// ```
/// use waymark_core::{CascadeConfig, SearchCascade, SearchEngine, SearchError};
///
/// let engine = SearchEngine::start(SearchCascade::new(CascadeConfig::default()))?;
/// let ticket = engine.search("x");
/// assert!(matches!(ticket.wait(), Err(SearchError::InvalidQuery(_))));
/// engine.shutdown()?;
/// # Ok::<(), waymark_core::EngineError>(())
/// ```
#[derive(Debug)]
pub struct SearchEngine {
    sender: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl SearchEngine {
    /// Start a worker for `cascade` with the default queue capacity.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`] when the thread cannot be created.
    pub fn start(cascade: SearchCascade) -> Result<Self, EngineError> {
        Self::with_capacity(cascade, DEFAULT_QUEUE_CAPACITY)
    }

    /// Start a worker accepting up to `capacity` pending searches.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`] when the thread cannot be created.
    pub fn with_capacity(cascade: SearchCascade, capacity: usize) -> Result<Self, EngineError> {
        let (sender, mut receiver) = mpsc::channel::<Job>(capacity.max(1));
        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_owned())
            .spawn(move || {
                let mut cascade = cascade;
                while let Some(job) = receiver.blocking_recv() {
                    job(&mut cascade);
                }
                cascade.close();
                log::debug!("search worker stopped");
            })
            .map_err(EngineError::Spawn)?;
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queue a free-text address search.
    pub fn search(&self, query: impl Into<String>) -> SearchTicket<Vec<AddressRecord>> {
        let query = query.into();
        self.submit(move |cascade| cascade.search(&query))
    }

    /// Queue a radius and category search.
    pub fn search_nearby(&self, query: NearbyQuery) -> SearchTicket<Vec<PointOfInterestRecord>> {
        self.submit(move |cascade| cascade.search_nearby(&query))
    }

    /// Queue an interpreted query.
    pub fn search_query(
        &self,
        query: impl Into<String>,
        context: QueryContext,
    ) -> SearchTicket<QueryOutcome> {
        let query = query.into();
        self.submit(move |cascade| cascade.search_query(&query, &context))
    }

    /// Queue a region-wide category search.
    pub fn search_category_in_region(
        &self,
        region: RegionId,
        categories: Vec<Category>,
    ) -> SearchTicket<Vec<PointOfInterestRecord>> {
        self.submit(move |cascade| cascade.search_category_in_region(&region, &categories))
    }

    /// Queue a by-name search inside a region.
    pub fn search_by_name_in_region(
        &self,
        region: RegionId,
        name: impl Into<String>,
    ) -> SearchTicket<Vec<SearchHit>> {
        let name = name.into();
        self.submit(move |cascade| cascade.search_by_name_in_region(&region, &name))
    }

    /// Queue a reverse geocoding request.
    pub fn reverse(&self, location: Coord<f64>) -> SearchTicket<Option<String>> {
        self.submit(move |cascade| cascade.reverse(location))
    }

    /// Queue a listing of installed regions.
    pub fn available_regions(&self) -> SearchTicket<Vec<RegionId>> {
        self.submit(|cascade| Ok(cascade.available_regions()))
    }

    /// Stop accepting searches, drain the queue and join the worker.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WorkerPanicked`] when the worker died.
    pub fn shutdown(mut self) -> Result<(), EngineError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        drop(self.sender.take());
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| EngineError::WorkerPanicked),
            None => Ok(()),
        }
    }

    fn submit<T, F>(&self, job: F) -> SearchTicket<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SearchCascade) -> Result<T, SearchError> + Send + 'static,
    {
        let Some(sender) = self.sender.as_ref() else {
            return SearchTicket::ready(Err(SearchError::WorkerStopped));
        };
        let (reply, receiver) = oneshot::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let task: Job = Box::new(move |cascade| {
            let outcome = if flag.load(Ordering::Acquire) {
                Err(SearchError::Cancelled)
            } else {
                job(cascade)
            };
            if reply.send(outcome).is_err() {
                log::debug!("search finished after its ticket was dropped");
            }
        });
        match sender.try_send(task) {
            Ok(()) => SearchTicket {
                state: TicketState::Pending(receiver),
                cancelled,
            },
            Err(TrySendError::Full(_)) => SearchTicket::ready(Err(SearchError::QueueFull)),
            Err(TrySendError::Closed(_)) => SearchTicket::ready(Err(SearchError::WorkerStopped)),
        }
    }
}

impl Drop for SearchEngine {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::warn!("{err}");
        }
    }
}

#[derive(Debug)]
enum TicketState<T> {
    Pending(oneshot::Receiver<Result<T, SearchError>>),
    Ready(Option<Result<T, SearchError>>),
}

/// Completion handle for one queued search.
///
/// Await the ticket, call [`SearchTicket::wait`] from synchronous code, or
/// poll it with [`SearchTicket::try_result`]. Cancelling is cooperative: a
/// search that has not started answers [`SearchError::Cancelled`], while a
/// running one completes normally.
#[derive(Debug)]
pub struct SearchTicket<T> {
    state: TicketState<T>,
    cancelled: Arc<AtomicBool>,
}

impl<T> Unpin for SearchTicket<T> {}

impl<T> SearchTicket<T> {
    fn ready(outcome: Result<T, SearchError>) -> Self {
        Self {
            state: TicketState::Ready(Some(outcome)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask the worker to skip this search if it has not started yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether [`Self::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Block until the search completes.
    ///
    /// # Errors
    ///
    /// Returns the search's own error, or [`SearchError::WorkerStopped`] when
    /// the worker exited without answering.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context;
    /// `.await` the ticket there instead.
    pub fn wait(self) -> Result<T, SearchError> {
        match self.state {
            TicketState::Pending(receiver) => receiver
                .blocking_recv()
                .unwrap_or(Err(SearchError::WorkerStopped)),
            TicketState::Ready(outcome) => outcome.unwrap_or(Err(SearchError::WorkerStopped)),
        }
    }

    /// The outcome if the search has completed, without blocking.
    ///
    /// Returns `None` while the search is pending. The outcome is handed out
    /// once; later calls report [`SearchError::WorkerStopped`].
    pub fn try_result(&mut self) -> Option<Result<T, SearchError>> {
        match &mut self.state {
            TicketState::Pending(receiver) => match receiver.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Closed) => Some(Err(SearchError::WorkerStopped)),
            },
            TicketState::Ready(outcome) => {
                Some(outcome.take().unwrap_or(Err(SearchError::WorkerStopped)))
            }
        }
    }
}

impl<T> Future for SearchTicket<T> {
    type Output = Result<T, SearchError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            TicketState::Pending(receiver) => Pin::new(receiver)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(SearchError::WorkerStopped))),
            TicketState::Ready(outcome) => {
                Poll::Ready(outcome.take().unwrap_or(Err(SearchError::WorkerStopped)))
            }
        }
    }
}
