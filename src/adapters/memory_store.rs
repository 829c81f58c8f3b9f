//! In-process time-series store.
//!
//! Implements the store ports against a shared in-memory table.  The host
//! binary uses it when no network store is reachable, and tests use its
//! fault-injection knobs to exercise the uploader's reconnect path.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::app::ports::{BucketSettings, QuotaType, StoreBucket, StoreClient, StoreConnector};
use crate::error::StoreError;

/// Bytes charged against the quota per record besides its payload.
const RECORD_OVERHEAD: usize = 16;

/// One appended record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: i64,
    pub payload: Vec<u8>,
    pub timestamp_us: i64,
}

#[derive(Debug, Default)]
struct Table {
    buckets: HashMap<String, (BucketSettings, Vec<Record>)>,
    connects: u32,
}

/// Cloneable handle; every clone sees the same table.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    table: Arc<Mutex<Table>>,
    required_token: Option<Arc<str>>,
    fail_connects: Arc<AtomicU32>,
    fail_writes: Arc<AtomicU32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject sessions that do not present `token`.
    pub fn with_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.into());
        self
    }

    /// Fail the next `n` connection attempts.
    pub fn fail_next_connects(&self, n: u32) {
        self.fail_connects.store(n, Ordering::Release);
    }

    /// Fail the next `n` record writes.
    pub fn fail_next_writes(&self, n: u32) {
        self.fail_writes.store(n, Ordering::Release);
    }

    /// Snapshot of a bucket's records.
    pub fn records(&self, bucket: &str) -> Vec<Record> {
        self.table
            .lock()
            .buckets
            .get(bucket)
            .map(|(_, r)| r.clone())
            .unwrap_or_default()
    }

    pub fn settings(&self, bucket: &str) -> Option<BucketSettings> {
        self.table.lock().buckets.get(bucket).map(|(s, _)| *s)
    }

    /// Successful connections so far.
    pub fn connects(&self) -> u32 {
        self.table.lock().connects
    }
}

/// Decrement a fault counter; `true` if this call should fail.
fn take_fault(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        .is_ok()
}

impl StoreConnector for MemoryStore {
    type Client = MemoryClient;

    async fn connect(
        &mut self,
        _url: &str,
        api_token: Option<&str>,
    ) -> Result<MemoryClient, StoreError> {
        if take_fault(&self.fail_connects) {
            return Err(StoreError::ConnectFailed);
        }
        if let Some(required) = &self.required_token {
            if api_token != Some(required.as_ref()) {
                return Err(StoreError::Unauthorized);
            }
        }
        self.table.lock().connects += 1;
        Ok(MemoryClient {
            store: self.clone(),
        })
    }
}

pub struct MemoryClient {
    store: MemoryStore,
}

impl StoreClient for MemoryClient {
    type Bucket = MemoryBucket;

    async fn get_or_create_bucket(
        &mut self,
        name: &str,
        settings: &BucketSettings,
    ) -> Result<MemoryBucket, StoreError> {
        self.store
            .table
            .lock()
            .buckets
            .entry(name.to_owned())
            .or_insert_with(|| (*settings, Vec::new()));
        Ok(MemoryBucket {
            store: self.store.clone(),
            name: name.to_owned(),
        })
    }
}

pub struct MemoryBucket {
    store: MemoryStore,
    name: String,
}

impl StoreBucket for MemoryBucket {
    async fn write(
        &mut self,
        key: i64,
        payload: &[u8],
        timestamp_us: i64,
    ) -> Result<(), StoreError> {
        if take_fault(&self.store.fail_writes) {
            return Err(StoreError::WriteFailed);
        }
        let mut table = self.store.table.lock();
        let (settings, records) = table
            .buckets
            .get_mut(&self.name)
            .ok_or(StoreError::BucketUnavailable)?;
        let quota = settings.quota_size as usize;
        let cost = |r: &Record| r.payload.len() + RECORD_OVERHEAD;
        let mut used: usize = records.iter().map(cost).sum();
        if settings.quota_type == QuotaType::Hard && used + payload.len() + RECORD_OVERHEAD > quota {
            return Err(StoreError::WriteFailed);
        }
        records.push(Record {
            key,
            payload: payload.to_vec(),
            timestamp_us,
        });
        used += payload.len() + RECORD_OVERHEAD;
        // FIFO: drop oldest until back under the byte budget.
        while used > quota && !records.is_empty() {
            used -= cost(&records[0]);
            records.remove(0);
        }
        Ok(())
    }
}
