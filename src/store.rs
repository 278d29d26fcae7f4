//! Persistent settlement records stored in RocksDB.
//!
//! Finalized results and settled slips are append-only records; a
//! newest-first index with hex cursors supports paginated queries without
//! scanning the whole column.

use crate::types::{Amount, GameId, GameResult, SlipId, Timestamp};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

const RESULT_PREFIX: &str = "result:game:";
const SETTLED_PREFIX: &str = "slip:settled:";
const RECENT_INDEX_PREFIX: &[u8] = b"slip:index:recent:";

/// Storage layer errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database open failed: {0}")]
    OpenFailed(String),

    #[error("Corrupted record: {0}")]
    CorruptedData(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Backend error: {0}")]
    Backend(#[from] rocksdb::Error),
}

/// How a slip left the book
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SettlementKind {
    Claimed,
    Refunded,
}

/// Terminal record written when a slip is claimed or refunded
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettledSlip {
    pub slip_id: SlipId,
    pub game_id: GameId,
    pub stake: Amount,
    pub paid: Amount,
    pub kind: SettlementKind,
    pub settled_at: Timestamp,
}

/// RocksDB-backed record store
#[derive(Clone)]
pub struct RecordStore {
    db: Arc<DB>,
}

impl RecordStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(32 * 1024 * 1024);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.db.get(key).ok().flatten()
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        Ok(self.db.put(key, value)?)
    }

    pub fn batch_write<K, V>(&self, items: &[(K, V)]) -> Result<(), StoreError>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut batch = WriteBatch::default();
        for (key, value) in items {
            batch.put(key, value);
        }
        Ok(self.db.write(batch)?)
    }

    /// Scan keys under a prefix, starting after `cursor` when given
    pub fn scan_prefix(
        &self,
        prefix: &[u8],
        cursor: Option<&[u8]>,
        limit: usize,
    ) -> Vec<(Vec<u8>, Vec<u8>)> {
        let start: Vec<u8> = cursor.unwrap_or(prefix).to_vec();
        let mut rows = Vec::with_capacity(limit);

        for item in self
            .db
            .iterator(IteratorMode::From(&start, Direction::Forward))
        {
            let Ok((key, value)) = item else { break };
            if !key.starts_with(prefix) {
                break;
            }
            // The cursor names the last key already served.
            if cursor == Some(key.as_ref()) {
                continue;
            }
            rows.push((key.to_vec(), value.to_vec()));
            if rows.len() >= limit {
                break;
            }
        }

        rows
    }
}

fn result_key(game_id: GameId) -> Vec<u8> {
    format!("{}{}", RESULT_PREFIX, game_id).into_bytes()
}

fn settled_key(slip_id: SlipId) -> Vec<u8> {
    format!("{}{}", SETTLED_PREFIX, slip_id).into_bytes()
}

fn recent_index_key(settled_at: Timestamp, slip_id: SlipId) -> Vec<u8> {
    // Sort newest-first by using an inverted timestamp as the primary sort
    // key. Key layout: prefix | inv_ts(be) | slip_id(be)
    let inv_ts = u64::MAX - settled_at.max(0) as u64;
    let mut key = Vec::with_capacity(RECENT_INDEX_PREFIX.len() + 24);
    key.extend_from_slice(RECENT_INDEX_PREFIX);
    key.extend_from_slice(&inv_ts.to_be_bytes());
    key.extend_from_slice(&slip_id.to_be_bytes());
    key
}

/// Persist a finalized game result
pub fn store_result(store: &RecordStore, result: &GameResult) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(result).map_err(|e| {
        StoreError::Encoding(format!(
            "Failed to encode result for game {}: {}",
            result.sheet.game_id, e
        ))
    })?;
    store.put(&result_key(result.sheet.game_id), &bytes)?;
    tracing::debug!(game_id = result.sheet.game_id, "finalized result persisted");
    Ok(())
}

/// Load a finalized game result, if one was persisted
pub fn load_result(store: &RecordStore, game_id: GameId) -> Result<Option<GameResult>, StoreError> {
    let Some(bytes) = store.get(&result_key(game_id)) else {
        return Ok(None);
    };
    let result = serde_json::from_slice(&bytes).map_err(|e| {
        StoreError::CorruptedData(format!("Failed to decode result for game {}: {}", game_id, e))
    })?;
    Ok(Some(result))
}

/// Persist a settled slip together with its recent-settlements index entry
pub fn store_settled_slip(store: &RecordStore, record: &SettledSlip) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(record).map_err(|e| {
        StoreError::Encoding(format!(
            "Failed to encode settled slip {}: {}",
            record.slip_id, e
        ))
    })?;

    let items: Vec<(Vec<u8>, Vec<u8>)> = vec![
        (settled_key(record.slip_id), bytes),
        (recent_index_key(record.settled_at, record.slip_id), Vec::new()),
    ];
    store.batch_write(&items)?;
    tracing::debug!(
        slip_id = record.slip_id,
        kind = ?record.kind,
        paid = record.paid,
        "settled slip persisted"
    );
    Ok(())
}

pub fn load_settled_slip(
    store: &RecordStore,
    slip_id: SlipId,
) -> Result<Option<SettledSlip>, StoreError> {
    let Some(bytes) = store.get(&settled_key(slip_id)) else {
        return Ok(None);
    };
    let record = serde_json::from_slice(&bytes).map_err(|e| {
        StoreError::CorruptedData(format!("Failed to decode settled slip {}: {}", slip_id, e))
    })?;
    Ok(Some(record))
}

/// Page through settled slips, newest first. Returns the records and a
/// cursor for the next page when more may remain.
pub fn load_recent_settlements(
    store: &RecordStore,
    cursor_hex: Option<&str>,
    limit: usize,
) -> Result<(Vec<SettledSlip>, Option<String>), StoreError> {
    let cursor_bytes = match cursor_hex {
        Some(cursor) => Some(
            hex::decode(cursor)
                .map_err(|e| StoreError::CorruptedData(format!("Invalid cursor hex: {}", e)))?,
        ),
        None => None,
    };

    let rows = store.scan_prefix(RECENT_INDEX_PREFIX, cursor_bytes.as_deref(), limit.max(1));

    let mut records = Vec::with_capacity(rows.len());
    let mut next_cursor = None;
    for (key, _value) in rows {
        if key.len() < RECENT_INDEX_PREFIX.len() + 24 {
            continue;
        }
        let slip_id_off = key.len() - 16;
        let slip_id_bytes: [u8; 16] = key[slip_id_off..].try_into().unwrap_or([0u8; 16]);
        let slip_id = u128::from_be_bytes(slip_id_bytes);

        if let Some(record) = load_settled_slip(store, slip_id)? {
            records.push(record);
        } else {
            tracing::warn!(slip_id, "settlement index entry without a record");
        }
        next_cursor = Some(hex::encode(&key));
    }

    let final_cursor = if records.len() >= limit {
        next_cursor
    } else {
        None
    };
    Ok((records, final_cursor))
}
