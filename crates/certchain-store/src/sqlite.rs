//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for Certchain. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use certchain_core::{
    canonical_certificate_bytes, decode_block, decode_certificate, Block, Certificate, Digest,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{PutResult, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Decode a stored block and check it sits at the index it was read from.
fn decode_stored_block(index: u64, bytes: &[u8]) -> Result<Block> {
    let block = decode_block(bytes)?;
    if block.index != index {
        return Err(StoreError::InvalidData(format!(
            "row {} holds block with index {}",
            index, block.index
        )));
    }
    Ok(block)
}

/// Write canonical block bytes at `index` within an open transaction.
fn upsert_block(conn: &Connection, index: u64, hash: &str, canonical: &[u8]) -> Result<PutResult> {
    let existing: Option<(Vec<u8>, String)> = conn
        .query_row(
            "SELECT canonical_bytes, hash FROM blocks WHERE block_index = ?1",
            params![index as i64],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let result = match existing {
        Some((bytes, _)) if bytes == canonical => PutResult::Unchanged,
        Some((_, old_hash)) => {
            let previous = Digest::from_hex(&old_hash).map_err(|e| {
                StoreError::InvalidData(format!("stored hash of block {}: {}", index, e))
            })?;

            conn.execute(
                "UPDATE blocks SET hash = ?2, canonical_bytes = ?3 WHERE block_index = ?1",
                params![index as i64, hash, canonical],
            )?;
            PutResult::Replaced { previous }
        }
        None => {
            conn.execute(
                "INSERT INTO blocks (block_index, hash, canonical_bytes) VALUES (?1, ?2, ?3)",
                params![index as i64, hash, canonical],
            )?;
            PutResult::Inserted
        }
    };

    tracing::debug!(index, ?result, "stored block");
    Ok(result)
}

/// Replace every pending row within an open transaction.
fn rewrite_pending(conn: &Connection, rows: &[(String, Vec<u8>)]) -> Result<()> {
    conn.execute("DELETE FROM pending", [])?;

    let mut stmt = conn
        .prepare("INSERT INTO pending (position, cert_id, canonical_bytes) VALUES (?1, ?2, ?3)")?;
    for (position, (cert_id, bytes)) in rows.iter().enumerate() {
        stmt.execute(params![position as i64, cert_id, bytes])?;
    }

    Ok(())
}

fn pending_rows(pending: &[Certificate]) -> Vec<(String, Vec<u8>)> {
    pending
        .iter()
        .map(|c| (c.cert_id.to_hex(), canonical_certificate_bytes(c)))
        .collect()
}

#[async_trait]
impl Store for SqliteStore {
    async fn put_block(&self, block: &Block, canonical: &[u8]) -> Result<PutResult> {
        let index = block.index;
        let hash = block.hash.to_hex();
        let canonical = canonical.to_vec();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let result = upsert_block(&tx, index, &hash, &canonical)?;
            tx.commit()?;
            Ok(result)
        })
        .await
    }

    async fn get_block(&self, index: u64) -> Result<Option<Block>> {
        let bytes = self.get_canonical_bytes(index).await?;
        bytes
            .map(|bytes| decode_stored_block(index, &bytes))
            .transpose()
    }

    async fn get_canonical_bytes(&self, index: u64) -> Result<Option<Vec<u8>>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT canonical_bytes FROM blocks WHERE block_index = ?1",
                params![index as i64],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn load_chain(&self) -> Result<Vec<Block>> {
        let rows: Vec<(i64, Vec<u8>)> = self
            .with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT block_index, canonical_bytes FROM blocks ORDER BY block_index",
                )?;

                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(rows)
            })
            .await?;

        rows.iter()
            .map(|(index, bytes)| decode_stored_block(*index as u64, bytes))
            .collect()
    }

    async fn block_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn replace_pending(&self, pending: &[Certificate]) -> Result<()> {
        let rows = pending_rows(pending);

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            rewrite_pending(&tx, &rows)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn load_pending(&self) -> Result<Vec<Certificate>> {
        let rows: Vec<Vec<u8>> = self
            .with_conn(|conn| {
                let mut stmt =
                    conn.prepare("SELECT canonical_bytes FROM pending ORDER BY position")?;

                let rows = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(rows)
            })
            .await?;

        rows.iter()
            .map(|bytes| decode_certificate(bytes).map_err(StoreError::from))
            .collect()
    }

    async fn commit_seal(
        &self,
        block: &Block,
        canonical: &[u8],
        pending: &[Certificate],
    ) -> Result<PutResult> {
        let index = block.index;
        let hash = block.hash.to_hex();
        let canonical = canonical.to_vec();
        let rows = pending_rows(pending);

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let result = upsert_block(&tx, index, &hash, &canonical)?;
            rewrite_pending(&tx, &rows)?;
            tx.commit()?;
            Ok(result)
        })
        .await
    }
}
