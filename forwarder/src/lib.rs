use alloy_primitives::B256;
use parking_lot::Mutex;
use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    sync::{atomic::{AtomicU64, Ordering as AtomicOrdering}, Arc},
    time::Duration,
};
use tokio::{sync::Notify, task::JoinHandle};
use tracing::{info, warn};

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// A bundle admitted to the pool, queued for delivery to one external
/// block-builder endpoint (spec.md §4.6).
#[derive(Debug, Clone)]
pub struct ForwardJob {
    pub block_number: u64,
    pub bundle_id: B256,
    pub payload: serde_json::Value,
}

/// Priority-queue entry. Ordering is `(block_number + retry_count,
/// retry_count, sequence)` ascending -- the job closest to its target block,
/// least retried, and earliest enqueued is delivered first. `BinaryHeap` is
/// a max-heap, so [`Ord`] is implemented inverted.
#[derive(Debug, Clone)]
struct QueueEntry {
    priority: u64,
    retry_count: u32,
    sequence: u64,
    job: ForwardJob,
}

impl QueueEntry {
    fn key(&self) -> (u64, u32, u64) {
        (self.priority, self.retry_count, self.sequence)
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

struct EndpointQueue {
    heap: Mutex<BinaryHeap<QueueEntry>>,
    notify: Notify,
}

impl EndpointQueue {
    fn push(&self, entry: QueueEntry) {
        self.heap.lock().push(entry);
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<QueueEntry> {
        self.heap.lock().pop()
    }
}

struct EndpointWorker {
    url: url::Url,
    client: reqwest::Client,
    queue: Arc<EndpointQueue>,
}

impl EndpointWorker {
    /// Single-threaded consumption loop: at most one in-flight request per
    /// endpoint, so a slow builder never starves the others.
    async fn run(self) {
        loop {
            let entry = match self.queue.pop() {
                Some(entry) => entry,
                None => {
                    self.queue.notify.notified().await;
                    continue
                }
            };
            match self.submit(&entry.job).await {
                Ok(()) => {
                    info!(bundle_id = %entry.job.bundle_id, url = %self.url, "bundle forwarded");
                }
                Err(source) => {
                    warn!(bundle_id = %entry.job.bundle_id, url = %self.url, %source, "bundle forward failed, re-queueing");
                    let retry_count = entry.retry_count + 1;
                    self.queue.push(QueueEntry {
                        priority: entry.job.block_number + retry_count as u64,
                        retry_count,
                        sequence: entry.sequence,
                        job: entry.job,
                    });
                }
            }
        }
    }

    async fn submit(&self, job: &ForwardJob) -> Result<(), reqwest::Error> {
        self.client.post(self.url.clone()).json(&job.payload).send().await?.error_for_status()?;
        Ok(())
    }
}

/// Fans an admitted bundle out to every configured block-builder endpoint,
/// one independent priority queue and worker task per URL, so a stalled
/// endpoint never blocks delivery to the others (spec.md §4.6).
pub struct BundleForwarder {
    queues: Vec<Arc<EndpointQueue>>,
    sequence: AtomicU64,
    _workers: Vec<JoinHandle<()>>,
}

impl BundleForwarder {
    pub fn new(urls: Vec<url::Url>) -> Self {
        let client =
            reqwest::Client::builder().timeout(HTTP_TIMEOUT).build().expect("static reqwest config is valid");
        let mut queues = Vec::with_capacity(urls.len());
        let mut workers = Vec::with_capacity(urls.len());
        for url in urls {
            let queue = Arc::new(EndpointQueue { heap: Mutex::new(BinaryHeap::new()), notify: Notify::new() });
            let worker = EndpointWorker { url, client: client.clone(), queue: queue.clone() };
            workers.push(tokio::spawn(worker.run()));
            queues.push(queue);
        }
        Self { queues, sequence: AtomicU64::new(0), _workers: workers }
    }

    /// Enqueues `job` on every configured endpoint's queue.
    pub fn forward(&self, job: ForwardJob) {
        let sequence = self.sequence.fetch_add(1, AtomicOrdering::Relaxed);
        for queue in &self.queues {
            queue.push(QueueEntry { priority: job.block_number, retry_count: 0, sequence, job: job.clone() });
        }
    }

    pub fn endpoint_count(&self) -> usize {
        self.queues.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(priority: u64, retry_count: u32, sequence: u64) -> QueueEntry {
        QueueEntry {
            priority,
            retry_count,
            sequence,
            job: ForwardJob { block_number: priority, bundle_id: B256::ZERO, payload: serde_json::Value::Null },
        }
    }

    #[test]
    fn heap_pops_lowest_priority_first() {
        let mut heap = BinaryHeap::new();
        heap.push(entry(10, 0, 2));
        heap.push(entry(5, 0, 1));
        heap.push(entry(5, 1, 0));
        assert_eq!(heap.pop().unwrap().key(), (5, 0, 1));
        assert_eq!(heap.pop().unwrap().key(), (5, 1, 0));
        assert_eq!(heap.pop().unwrap().key(), (10, 0, 2));
    }

    #[tokio::test]
    async fn forward_fans_out_to_every_endpoint_queue() {
        let forwarder = BundleForwarder::new(Vec::new());
        // With zero endpoints, forward() is a no-op; just exercise it.
        forwarder.forward(ForwardJob {
            block_number: 1,
            bundle_id: B256::ZERO,
            payload: serde_json::json!({"ok": true}),
        });
        assert_eq!(forwarder.endpoint_count(), 0);
    }
}
