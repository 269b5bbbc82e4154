//! Mutation and load dispatch.
//!
//! The [`Dispatcher`] owns the [`Store`] and is driven from a single owner
//! thread. Every request runs on its own worker thread; completions come
//! back over a channel and are only applied to the store when the owner
//! calls [`Dispatcher::poll`] or [`Dispatcher::wait`].
//!
//! Failure handling is uniform: no patch is applied, the request's
//! optimistic layer (if any) is dropped, a [`Notice`](crate::notice::Notice)
//! is raised and the failure is logged.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::HubError;
use crate::load::{self, fetch_snapshot};
use crate::mutation::Mutation;
use crate::notice::Notices;
use crate::patch::{Patch, PatchOutcome};
use crate::snapshot::{Snapshot, SnapshotCounts};
use crate::store::{RequestId, Store};
use crate::transport::{Transport, execute_data};

const WAIT_TICK: Duration = Duration::from_millis(25);

/// A request that has finished and been applied to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Loaded {
        request: RequestId,
        result: Result<SnapshotCounts, HubError>,
    },
    Mutated {
        request: RequestId,
        mutation: Mutation,
        result: Result<(Patch, PatchOutcome), HubError>,
    },
}

impl Settled {
    #[must_use]
    pub const fn request(&self) -> RequestId {
        match self {
            Self::Loaded { request, .. } | Self::Mutated { request, .. } => *request,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&HubError> {
        match self {
            Self::Loaded { result: Err(e), .. } | Self::Mutated { result: Err(e), .. } => Some(e),
            _ => None,
        }
    }
}

enum Work {
    Load,
    Mutation(Mutation),
}

enum Completion {
    Loaded(Result<Snapshot, HubError>),
    Mutated(Result<Patch, HubError>),
}

struct InFlight {
    work: Work,
    handle: JoinHandle<()>,
}

pub struct Dispatcher {
    store: Store,
    transport: Arc<dyn Transport>,
    notices: Notices,
    next_request: u64,
    in_flight: BTreeMap<RequestId, InFlight>,
    /// Settled while waiting for a different request; handed out by `poll`.
    unclaimed: VecDeque<Settled>,
    tx: Sender<(RequestId, Completion)>,
    rx: Receiver<(RequestId, Completion)>,
}

impl Dispatcher {
    /// A dispatcher with an empty store, waiting for its first load.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_store(transport, Store::new())
    }

    #[must_use]
    pub fn with_store(transport: Arc<dyn Transport>, store: Store) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            store,
            transport,
            notices: Notices::default(),
            next_request: 1,
            in_flight: BTreeMap::new(),
            unclaimed: VecDeque::new(),
            tx,
            rx,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// The tree to render.
    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        self.store.snapshot()
    }

    #[must_use]
    pub const fn notices(&self) -> &Notices {
        &self.notices
    }

    pub const fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Number of requests not yet settled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.values().any(|f| matches!(f.work, Work::Load))
    }

    /// Start a full-tree load in the background. A load already in flight
    /// is superseded: its result is discarded when it arrives.
    pub fn begin_load(&mut self) -> RequestId {
        self.store.begin_load(RequestId(self.next_request));
        self.spawn(Work::Load)
    }

    /// Dispatch a mutation in the background.
    ///
    /// An optimistic patch, if the mutation has one, is applied to the view
    /// before the request leaves this thread.
    pub fn submit(&mut self, mutation: Mutation) -> RequestId {
        let request = RequestId(self.next_request);
        if let Some(patch) = mutation.optimistic_patch() {
            let outcome = self.store.apply_optimistic(request, patch);
            tracing::debug!(%request, ?outcome, "optimistic patch applied");
        }
        tracing::debug!(%request, operation = mutation.name(), "mutation dispatched");
        self.spawn(Work::Mutation(mutation))
    }

    /// Apply every completion that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<Settled> {
        let finished: Vec<RequestId> = self
            .in_flight
            .iter()
            .filter(|(_, f)| f.handle.is_finished())
            .map(|(id, _)| *id)
            .collect();

        let mut settled: Vec<Settled> = self.unclaimed.drain(..).collect();
        while let Ok((request, completion)) = self.rx.try_recv() {
            settled.extend(self.settle(request, completion));
        }
        settled.extend(self.reap(&finished));
        settled
    }

    /// Block until `request` settles. Other completions that arrive first
    /// are applied too and returned by the next [`poll`](Self::poll).
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if `request` was never dispatched or
    /// has already been handed out.
    pub fn wait(&mut self, request: RequestId) -> Result<Settled, HubError> {
        if let Some(pos) = self.unclaimed.iter().position(|s| s.request() == request) {
            if let Some(done) = self.unclaimed.remove(pos) {
                return Ok(done);
            }
        }
        if !self.in_flight.contains_key(&request) {
            return Err(HubError::NotFound {
                kind: "request",
                id: request.to_string(),
            });
        }

        loop {
            let finished = self
                .in_flight
                .get(&request)
                .is_some_and(|f| f.handle.is_finished());

            match self.rx.recv_timeout(WAIT_TICK) {
                Ok((id, completion)) => match self.settle(id, completion) {
                    Some(done) if done.request() == request => return Ok(done),
                    Some(other) => self.unclaimed.push_back(other),
                    None => {}
                },
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    if finished {
                        if let Some(done) = self.reap(&[request]).pop() {
                            return Ok(done);
                        }
                    }
                }
            }
        }
    }

    /// Block until nothing is in flight, returning everything settled.
    pub fn wait_all(&mut self) -> Vec<Settled> {
        while let Some(request) = self.in_flight.keys().next().copied() {
            match self.wait(request) {
                Ok(done) => self.unclaimed.push_back(done),
                Err(_) => break,
            }
        }
        self.unclaimed.drain(..).collect()
    }

    /// Load the tree and wait for it.
    ///
    /// # Errors
    ///
    /// Returns the load failure; the store's load state records it too.
    pub fn load_blocking(&mut self) -> Result<SnapshotCounts, HubError> {
        let request = self.begin_load();
        match self.wait(request)? {
            Settled::Loaded { result, .. } => result,
            Settled::Mutated { .. } => Err(HubError::Disconnected),
        }
    }

    /// Submit a mutation and wait for it.
    ///
    /// # Errors
    ///
    /// Returns the mutation failure after it has been rolled back.
    pub fn submit_blocking(&mut self, mutation: Mutation) -> Result<(Patch, PatchOutcome), HubError> {
        let request = self.submit(mutation);
        match self.wait(request)? {
            Settled::Mutated { result, .. } => result,
            Settled::Loaded { .. } => Err(HubError::Disconnected),
        }
    }

    fn spawn(&mut self, work: Work) -> RequestId {
        let request = RequestId(self.next_request);
        self.next_request += 1;

        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        let job = match &work {
            Work::Load => None,
            Work::Mutation(m) => Some(m.clone()),
        };

        let handle = thread::spawn(move || {
            let completion = match job {
                None => Completion::Loaded(fetch_snapshot(transport.as_ref())),
                Some(mutation) => Completion::Mutated(
                    execute_data(transport.as_ref(), &mutation.request())
                        .and_then(|data| mutation.reconcile(&data)),
                ),
            };
            // The owner may already be gone; nothing left to do then.
            let _ = tx.send((request, completion));
        });

        self.in_flight.insert(request, InFlight { work, handle });
        request
    }

    fn settle(&mut self, request: RequestId, completion: Completion) -> Option<Settled> {
        let Some(flight) = self.in_flight.remove(&request) else {
            tracing::warn!(%request, "completion for unknown request ignored");
            return None;
        };
        let _ = flight.handle.join();

        Some(match (flight.work, completion) {
            (Work::Load, Completion::Loaded(result)) => self.settle_load(request, result),
            (Work::Mutation(mutation), Completion::Mutated(result)) => {
                self.settle_mutation(request, mutation, result)
            }
            (Work::Load, Completion::Mutated(_)) => {
                self.settle_load(request, Err(HubError::Disconnected))
            }
            (Work::Mutation(mutation), Completion::Loaded(_)) => {
                self.settle_mutation(request, mutation, Err(HubError::Disconnected))
            }
        })
    }

    /// Settle requests whose worker exited without reporting back.
    fn reap(&mut self, finished: &[RequestId]) -> Vec<Settled> {
        let orphans: Vec<RequestId> = finished
            .iter()
            .copied()
            .filter(|id| self.in_flight.contains_key(id))
            .collect();

        orphans
            .into_iter()
            .filter_map(|request| {
                let flight = self.in_flight.remove(&request)?;
                let _ = flight.handle.join();
                tracing::error!(%request, "request worker exited without a result");
                Some(match flight.work {
                    Work::Load => self.settle_load(request, Err(HubError::Disconnected)),
                    Work::Mutation(mutation) => {
                        self.settle_mutation(request, mutation, Err(HubError::Disconnected))
                    }
                })
            })
            .collect()
    }

    fn settle_load(&mut self, request: RequestId, result: Result<Snapshot, HubError>) -> Settled {
        let result = match result {
            Ok(snapshot) => {
                let counts = snapshot.counts();
                if !self.store.finish_load(request, Ok(snapshot)) {
                    tracing::debug!(%request, "superseded load discarded");
                }
                Ok(counts)
            }
            Err(err) => {
                if self.store.finish_load(request, Err(err.to_string())) {
                    tracing::warn!(
                        %request,
                        operation = load::OPERATION,
                        code = %err.code(),
                        error = %err,
                        "load failed"
                    );
                } else {
                    tracing::debug!(%request, error = %err, "superseded load failed");
                }
                Err(err)
            }
        };
        Settled::Loaded { request, result }
    }

    fn settle_mutation(
        &mut self,
        request: RequestId,
        mutation: Mutation,
        result: Result<Patch, HubError>,
    ) -> Settled {
        let result = match result {
            Ok(patch) => {
                let outcome = self
                    .store
                    .confirm(request, Some(&patch))
                    .unwrap_or(PatchOutcome::Unchanged);
                if let Mutation::DeleteComment { comment_id } = &mutation {
                    tracing::info!(%request, comment_id = %comment_id, ?outcome, "comment deleted");
                } else {
                    tracing::debug!(
                        %request,
                        operation = mutation.name(),
                        patch = patch.name(),
                        ?outcome,
                        "mutation confirmed"
                    );
                }
                Ok((patch, outcome))
            }
            Err(err) => {
                let rolled_back = self.store.rollback(request);
                tracing::warn!(
                    %request,
                    operation = mutation.name(),
                    code = %err.code(),
                    error = %err,
                    rolled_back,
                    "mutation failed"
                );
                self.notices.raise(
                    Some(request),
                    err.code(),
                    format!("Could not {}: {err}", mutation.summary()),
                );
                Err(err)
            }
        };
        Settled::Mutated {
            request,
            mutation,
            result,
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if !self.in_flight.is_empty() {
            tracing::debug!(
                pending = self.in_flight.len(),
                "dispatcher dropped with requests in flight"
            );
        }
    }
}
