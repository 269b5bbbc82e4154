//! Injectable snapshot store with optimistic layers.
//!
//! The store keeps two trees:
//!
//! - the **confirmed** snapshot, changed only by a successful load or by the
//!   patch for a successful mutation;
//! - the **view**, which is the confirmed snapshot with every pending
//!   optimistic layer replayed on top, in submission order.
//!
//! An optimistic layer is keyed by the [`RequestId`] of the mutation that
//! produced it. When the mutation settles the layer is removed: on success
//! the authoritative patch is applied to the confirmed tree, on failure
//! nothing is, which rolls the view back without disturbing other pending
//! layers.
//!
//! Only the most recently started load may replace the confirmed tree. Its
//! response can predate mutations confirmed while it was in flight, so those
//! patches are kept and replayed over the fresh tree when it lands.

use serde::Serialize;
use std::fmt;

use crate::patch::{Patch, PatchOutcome};
use crate::snapshot::Snapshot;

/// Identity of one dispatched request, unique per dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// State of the initial (or manual re-) load of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadState {
    /// Nothing fetched yet, or a load is in flight.
    Pending,
    /// The last load attempt failed; the message is shown verbatim.
    Failed(String),
    /// The snapshot reflects a successful load.
    Ready,
}

#[derive(Debug, Clone)]
struct OptimisticLayer {
    request: RequestId,
    patch: Patch,
}

#[derive(Debug, Clone)]
pub struct Store {
    confirmed: Snapshot,
    view: Snapshot,
    layers: Vec<OptimisticLayer>,
    load: LoadState,
    /// The load whose result is still wanted.
    current_load: Option<RequestId>,
    /// Patches confirmed since `current_load` was started.
    since_load: Vec<Patch>,
    revision: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// An empty store waiting for its first load.
    #[must_use]
    pub fn new() -> Self {
        Self {
            confirmed: Snapshot::default(),
            view: Snapshot::default(),
            layers: Vec::new(),
            load: LoadState::Pending,
            current_load: None,
            since_load: Vec::new(),
            revision: 0,
        }
    }

    /// A store already holding a loaded snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            view: snapshot.clone(),
            confirmed: snapshot,
            layers: Vec::new(),
            load: LoadState::Ready,
            current_load: None,
            since_load: Vec::new(),
            revision: 1,
        }
    }

    /// The tree to render: confirmed data plus pending optimistic layers.
    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.view
    }

    /// Server-confirmed data only.
    #[must_use]
    pub const fn confirmed(&self) -> &Snapshot {
        &self.confirmed
    }

    #[must_use]
    pub const fn load_state(&self) -> &LoadState {
        &self.load
    }

    /// Bumped every time the view may have changed.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of optimistic layers waiting for their request to settle.
    #[must_use]
    pub fn pending_layers(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn has_layer(&self, request: RequestId) -> bool {
        self.layers.iter().any(|l| l.request == request)
    }

    /// Mark `request` as the load in flight. Any earlier load still running
    /// is superseded.
    pub fn begin_load(&mut self, request: RequestId) {
        self.current_load = Some(request);
        self.since_load.clear();
        self.load = LoadState::Pending;
        self.revision += 1;
    }

    /// Record the result of load `request`. Returns false, changing nothing,
    /// when a later load has superseded it.
    ///
    /// A successful load replaces the confirmed tree; patches confirmed since
    /// the load began and layers for requests still in flight are replayed
    /// over it. A failed load leaves any previously confirmed data untouched.
    pub fn finish_load(&mut self, request: RequestId, result: Result<Snapshot, String>) -> bool {
        if self.current_load != Some(request) {
            return false;
        }
        self.current_load = None;
        let replay = std::mem::take(&mut self.since_load);
        match result {
            Ok(mut snapshot) => {
                for patch in &replay {
                    patch.apply(&mut snapshot);
                }
                self.confirmed = snapshot;
                self.load = LoadState::Ready;
                self.rebuild_view();
            }
            Err(message) => {
                self.load = LoadState::Failed(message);
                self.revision += 1;
            }
        }
        true
    }

    /// Apply a confirmed patch.
    pub fn apply(&mut self, patch: &Patch) -> PatchOutcome {
        let outcome = patch.apply(&mut self.confirmed);
        self.remember(patch);
        if self.layers.is_empty() {
            patch.apply(&mut self.view);
            self.revision += 1;
        } else {
            self.rebuild_view();
        }
        outcome
    }

    /// Apply a speculative patch on behalf of `request`.
    ///
    /// The confirmed tree is not touched. The returned outcome describes the
    /// effect on the view.
    pub fn apply_optimistic(&mut self, request: RequestId, patch: Patch) -> PatchOutcome {
        let outcome = patch.apply(&mut self.view);
        self.layers.push(OptimisticLayer { request, patch });
        self.revision += 1;
        outcome
    }

    /// Settle `request` successfully: drop its layer (if any) and apply the
    /// authoritative patch (if any) to the confirmed tree.
    pub fn confirm(&mut self, request: RequestId, patch: Option<&Patch>) -> Option<PatchOutcome> {
        self.layers.retain(|l| l.request != request);
        let outcome = patch.map(|p| {
            self.remember(p);
            p.apply(&mut self.confirmed)
        });
        self.rebuild_view();
        outcome
    }

    /// Settle `request` as failed: drop its layer without touching the
    /// confirmed tree. Returns true if a layer was removed.
    pub fn rollback(&mut self, request: RequestId) -> bool {
        let before = self.layers.len();
        self.layers.retain(|l| l.request != request);
        let removed = self.layers.len() != before;
        if removed {
            self.rebuild_view();
        }
        removed
    }

    fn remember(&mut self, patch: &Patch) {
        if self.current_load.is_some() {
            self.since_load.push(patch.clone());
        }
    }

    fn rebuild_view(&mut self) {
        let mut view = self.confirmed.clone();
        for layer in &self.layers {
            layer.patch.apply(&mut view);
        }
        self.view = view;
        self.revision += 1;
    }
}
