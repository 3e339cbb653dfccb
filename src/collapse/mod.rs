//! Request collapsing.
//!
//! # Data Flow
//! ```text
//! run(key, work):
//!     in-flight table entry(key)
//!         vacant   → claim (watch channel), run work, release, publish → shared=false
//!         occupied → clone receiver, wait for the published value     → shared=true
//!
//! Leader dropped before publishing (client went away):
//!     release guard removes the claim → waiters see a closed channel
//!     → waiters re-enter the claim loop, one becomes the new leader
//! ```
//!
//! # Design Decisions
//! - No memoization: once work completes the key is unclaimed again
//! - Waiters receive a clone of the exact outcome, errors included
//! - The claim is released before publishing, so a caller arriving after
//!   completion starts a fresh fetch instead of reading a stale outcome

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Outcome of [`CollapsingFetcher::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct Collapsed<R> {
    pub value: R,
    /// True when this caller joined a fetch another caller started.
    pub shared: bool,
}

struct InFlight<R> {
    generation: u64,
    rx: watch::Receiver<Option<R>>,
}

enum Claim<R> {
    Lead(watch::Sender<Option<R>>, u64),
    Wait(watch::Receiver<Option<R>>),
}

/// Deduplicates concurrent work sharing a key.
pub struct CollapsingFetcher<R> {
    calls: DashMap<String, InFlight<R>>,
    generation: AtomicU64,
}

impl<R: Clone> CollapsingFetcher<R> {
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Run `work` for `key` unless a run for `key` is already in progress,
    /// in which case wait for it and return its outcome.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Collapsed<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        loop {
            match self.claim(key) {
                Claim::Lead(tx, generation) => {
                    let release = Release {
                        calls: &self.calls,
                        key,
                        generation,
                    };
                    let value = work().await;
                    drop(release);
                    // Waiters hold their own receivers; nobody listening is fine.
                    let _ = tx.send(Some(value.clone()));
                    return Collapsed {
                        value,
                        shared: false,
                    };
                }
                Claim::Wait(mut rx) => {
                    let published = rx
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|value| value.clone());
                    if let Some(value) = published {
                        return Collapsed {
                            value,
                            shared: true,
                        };
                    }
                    tracing::debug!(key = %key, "Collapsed fetch abandoned by its leader, retrying");
                }
            }
        }
    }

    fn claim(&self, key: &str) -> Claim<R> {
        match self.calls.entry(key.to_string()) {
            Entry::Occupied(entry) => Claim::Wait(entry.get().rx.clone()),
            Entry::Vacant(entry) => {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let (tx, rx) = watch::channel(None);
                entry.insert(InFlight { generation, rx });
                Claim::Lead(tx, generation)
            }
        }
    }

    /// Number of keys with a fetch currently in progress.
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }
}

impl<R: Clone> Default for CollapsingFetcher<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the leader's claim on drop, whether the work finished or was cancelled.
struct Release<'a, R> {
    calls: &'a DashMap<String, InFlight<R>>,
    key: &'a str,
    generation: u64,
}

impl<R> Drop for Release<'_, R> {
    fn drop(&mut self) {
        self.calls
            .remove_if(self.key, |_, flight| flight.generation == self.generation);
    }
}
