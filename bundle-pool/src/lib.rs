//! A size-bounded, weighted cache of atomic transaction bundles keyed by
//! block number (spec.md §4.3).
//!
//! Implemented as an arena of slots with two index maps holding slot ids,
//! rather than owning references duplicated across indices, per the
//! re-architecture note in spec.md §9.

use alloy_primitives::B256;
use parking_lot::RwLock;
use selector_core::{Bundle, PendingTransaction};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;

type SlotId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Admitted,
    Replaced,
}

struct Inner {
    slots: Vec<Option<Arc<Bundle>>>,
    free: Vec<SlotId>,
    by_id: HashMap<B256, SlotId>,
    by_uuid: HashMap<Uuid, SlotId>,
    by_block: HashMap<u64, Vec<SlotId>>,
    /// Oldest-admitted first; drives weighted eviction (spec.md §4.3, §9:
    /// tie-breaks beyond insertion order are left to the implementer).
    admission_order: VecDeque<SlotId>,
    total_weight: usize,
}

impl Inner {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            by_id: HashMap::new(),
            by_uuid: HashMap::new(),
            by_block: HashMap::new(),
            admission_order: VecDeque::new(),
            total_weight: 0,
        }
    }

    fn insert_slot(&mut self, bundle: Arc<Bundle>) -> SlotId {
        let slot = if let Some(slot) = self.free.pop() {
            self.slots[slot] = Some(bundle.clone());
            slot
        } else {
            self.slots.push(Some(bundle.clone()));
            self.slots.len() - 1
        };
        self.by_id.insert(bundle.bundle_id, slot);
        if let Some(uuid) = bundle.replacement_uuid {
            self.by_uuid.insert(uuid, slot);
        }
        self.by_block.entry(bundle.block_number).or_default().push(slot);
        self.admission_order.push_back(slot);
        self.total_weight += bundle.weight();
        slot
    }

    fn unlink_slot(&mut self, slot: SlotId) -> Option<Arc<Bundle>> {
        let bundle = self.slots[slot].take()?;
        self.by_id.remove(&bundle.bundle_id);
        if let Some(uuid) = bundle.replacement_uuid {
            self.by_uuid.remove(&uuid);
        }
        if let Some(list) = self.by_block.get_mut(&bundle.block_number) {
            list.retain(|&s| s != slot);
            if list.is_empty() {
                self.by_block.remove(&bundle.block_number);
            }
        }
        self.admission_order.retain(|&s| s != slot);
        self.total_weight -= bundle.weight();
        self.free.push(slot);
        Some(bundle)
    }

    fn evict_to_fit(&mut self, incoming_weight: usize, capacity_bytes: usize) -> Vec<Arc<Bundle>> {
        let mut evicted = Vec::new();
        while self.total_weight + incoming_weight > capacity_bytes {
            let Some(&oldest) = self.admission_order.front() else { break };
            if let Some(bundle) = self.unlink_slot(oldest) {
                evicted.push(bundle);
            }
        }
        evicted
    }
}

/// Thread-safe, weighted bundle cache. All operations are safe to call
/// concurrently; admission/eviction forms a critical section and
/// subscriber notification is dispatched only after the lock is released
/// (spec.md §4.3, §5).
pub struct BundlePool {
    capacity_bytes: usize,
    inner: RwLock<Inner>,
    subscribers: RwLock<Vec<mpsc::Sender<Arc<Bundle>>>>,
}

impl BundlePool {
    pub fn new(capacity_bytes: usize) -> Self {
        Self { capacity_bytes, inner: RwLock::new(Inner::new()), subscribers: RwLock::new(Vec::new()) }
    }

    pub fn get_by_id(&self, hash: &B256) -> Option<Arc<Bundle>> {
        let inner = self.inner.read();
        inner.by_id.get(hash).and_then(|&slot| inner.slots[slot].clone())
    }

    pub fn get_by_uuid(&self, uuid: &Uuid) -> Option<Arc<Bundle>> {
        let inner = self.inner.read();
        inner.by_uuid.get(uuid).and_then(|&slot| inner.slots[slot].clone())
    }

    /// Bundles registered for the given block number, insertion order
    /// preserved.
    pub fn bundles_for_block(&self, block_number: u64) -> Vec<Arc<Bundle>> {
        let inner = self.inner.read();
        inner
            .by_block
            .get(&block_number)
            .map(|slots| slots.iter().filter_map(|&s| inner.slots[s].clone()).collect())
            .unwrap_or_default()
    }

    pub fn find_for_tx(&self, block_number: u64, pending_tx: &PendingTransaction) -> Option<Arc<Bundle>> {
        self.bundles_for_block(block_number)
            .into_iter()
            .find(|bundle| bundle.pending_txs.iter().any(|tx| tx.hash() == pending_tx.hash()))
    }

    /// Registers a listener that will be sent every newly admitted bundle.
    /// Modeled as a bounded channel a subscriber pulls from, rather than an
    /// arbitrary synchronous callback, to avoid reentrancy into the pool's
    /// lock (spec.md §9).
    pub fn subscribe(&self) -> mpsc::Receiver<Arc<Bundle>> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        self.subscribers.write().push(tx);
        rx
    }

    fn notify(&self, bundle: &Arc<Bundle>) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| match tx.try_send(bundle.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(bundle_id = %bundle.bundle_id, "subscriber lagging, dropping admission notice");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// Admits `bundle`, replacing any existing entry that shares its
    /// identity (its `bundle_id`, which for a `replacement_uuid`-bearing
    /// bundle is derived from the UUID rather than content -- spec.md §3,
    /// §4.3). Evicts the oldest-admitted entries first if needed to stay
    /// within the byte cap.
    pub fn put_or_replace(&self, bundle: Bundle) -> PutOutcome {
        let bundle = Arc::new(bundle);
        let outcome = {
            let mut inner = self.inner.write();
            let existing_slot = inner.by_id.get(&bundle.bundle_id).copied();
            if let Some(slot) = existing_slot {
                inner.unlink_slot(slot);
            }
            let evicted = inner.evict_to_fit(bundle.weight(), self.capacity_bytes);
            for ev in &evicted {
                trace!(bundle_id = %ev.bundle_id, "evicted bundle to respect pool capacity");
            }
            inner.insert_slot(bundle.clone());
            if existing_slot.is_some() { PutOutcome::Replaced } else { PutOutcome::Admitted }
        };
        self.notify(&bundle);
        outcome
    }

    pub fn remove(&self, hash: &B256) -> bool {
        let mut inner = self.inner.write();
        if let Some(&slot) = inner.by_id.get(hash) {
            inner.unlink_slot(slot);
            true
        } else {
            false
        }
    }

    pub fn remove_for_block(&self, block_number: u64) -> usize {
        let mut inner = self.inner.write();
        let slots = inner.by_block.get(&block_number).cloned().unwrap_or_default();
        for slot in &slots {
            inner.unlink_slot(*slot);
        }
        slots.len()
    }

    pub fn total_weight(&self) -> usize {
        self.inner.read().total_weight
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }
}
