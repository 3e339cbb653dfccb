//! Credential pool with per-credential token buckets and fair rotation.
//!
//! # Responsibilities
//! - Own every upstream credential for the lifetime of the process
//! - Hand out a credential that still has rate-limit capacity
//! - Rotate the starting point so load spreads across credentials

use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use crate::config::CredentialsConfig;
use crate::credentials::bucket::TokenBucket;

/// An upstream credential value. Redacted in `Debug` and `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Arc<str>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::from(value.into()))
    }

    /// The raw credential, for building the outbound request only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// A credential granted by [`CredentialPool::acquire`].
///
/// One unit of the credential's capacity has already been consumed.
#[derive(Debug, Clone)]
pub struct CredentialLease {
    /// Position of the credential in the pool.
    pub index: usize,
    pub secret: Secret,
}

#[derive(Debug)]
struct Credential {
    secret: Secret,
    bucket: TokenBucket,
}

#[derive(Debug)]
struct PoolState {
    credentials: Vec<Credential>,
    /// Index the next scan starts from. Always `< credentials.len()` when non-empty.
    cursor: usize,
}

/// A fixed set of rate-limited credentials.
#[derive(Debug)]
pub struct CredentialPool {
    state: Mutex<PoolState>,
    len: usize,
}

impl CredentialPool {
    /// Create a pool where every credential gets its own bucket of
    /// `burst` tokens refilled at `rate` tokens per second.
    pub fn new<I, S>(secrets: I, rate: f64, burst: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials: Vec<Credential> = secrets
            .into_iter()
            .map(|s| Credential {
                secret: Secret::new(s),
                bucket: TokenBucket::new(rate, burst),
            })
            .collect();
        let len = credentials.len();

        Self {
            state: Mutex::new(PoolState {
                credentials,
                cursor: 0,
            }),
            len,
        }
    }

    pub fn from_config(config: &CredentialsConfig) -> Self {
        Self::new(
            config.keys.iter().cloned(),
            config.requests_per_second,
            config.burst_size,
        )
    }

    /// Grant a credential with available capacity, or `None` when every
    /// credential is exhausted.
    ///
    /// The scan starts right after the last granted credential and the whole
    /// scan runs under one lock, so concurrent callers never race for the
    /// same token. Never blocks on I/O.
    pub fn acquire(&self) -> Option<CredentialLease> {
        let mut guard = self.state.lock().expect("credential pool mutex poisoned");
        let state = &mut *guard;

        let n = state.credentials.len();
        if n == 0 {
            return None;
        }

        let now = Instant::now();
        for offset in 0..n {
            let index = (state.cursor + offset) % n;
            let credential = &mut state.credentials[index];
            if credential.bucket.try_acquire_at(now) {
                state.cursor = (index + 1) % n;
                tracing::trace!(credential = index, "Credential granted");
                return Some(CredentialLease {
                    index,
                    secret: credential.secret.clone(),
                });
            }
        }

        None
    }

    /// Number of credentials in the pool.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
