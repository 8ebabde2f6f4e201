//! Persistent artifact cache
//!
//! The cache lives under a cache root (by default the platform cache dir,
//! overridable with `cache_dir` in the config):
//!
//! ```text
//! <root>/
//! ├── .lock                       # exclusive writer lock
//! ├── index.db                    # SQLite index: key -> object, digest, size
//! └── objects/
//!     └── 3f/
//!         └── 3f9a…c2/
//!             └── mappings.zip    # cached file, original name kept
//! ```
//!
//! A hit is only returned when the object still exists and still hashes to
//! the recorded digest. Anything else is evicted and reported as a miss.
//! The cache is single-writer: opening takes an exclusive lock on `.lock`.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::ChecksumAlgorithm;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache at {0} is locked by another process")]
    Locked(PathBuf),

    #[error("Cannot cache {0}: not a regular file")]
    NotAFile(PathBuf),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Digest used to verify cached objects
const VERIFY_ALGORITHM: ChecksumAlgorithm = ChecksumAlgorithm::Sha256;

/// Key identifying one computation
///
/// Built from the ordered parts that determine the computation's output
/// (planner, module, version, inputs). Parts are separated before hashing so
/// `["ab", "c"]` and `["a", "bc"]` never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            let part = part.as_ref().as_bytes();
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A verified cache hit (or a freshly stored object)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub key: CacheKey,
    pub path: PathBuf,
    pub sha256: String,
    pub size: u64,
}

/// Index row, for listing
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub key: String,
    pub path: PathBuf,
    pub sha256: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Aggregate numbers for `cache status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
}

/// SQLite-indexed store of computed files
pub struct Cache {
    root: PathBuf,
    conn: Connection,

    /// Held for the lifetime of the cache; released on drop
    _lock: File,
}

impl Cache {
    /// Schema version - bump when schema changes to force rebuild
    const SCHEMA_VERSION: i32 = 1;

    /// Opens (creating if needed) the cache rooted at `root`
    pub fn open(root: &Path) -> Result<Self, CacheError> {
        fs::create_dir_all(root.join("objects"))?;

        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(root.join(".lock"))?;
        lock.try_lock_exclusive()
            .map_err(|_| CacheError::Locked(root.to_path_buf()))?;

        let conn = Connection::open(root.join("index.db"))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let mut cache = Self {
            root: root.to_path_buf(),
            conn,
            _lock: lock,
        };
        cache.ensure_schema()?;

        debug!(root = %cache.root.display(), "opened artifact cache");
        Ok(cache)
    }

    /// Ensures the schema is up to date
    fn ensure_schema(&mut self) -> Result<(), CacheError> {
        let current: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?
            .unwrap_or(0);

        if current != Self::SCHEMA_VERSION {
            self.create_schema()?;
        }
        Ok(())
    }

    /// Creates the schema from scratch, dropping any stale objects
    fn create_schema(&mut self) -> Result<(), CacheError> {
        self.conn.execute_batch(
            "
            DROP TABLE IF EXISTS entries;

            CREATE TABLE entries (
                key TEXT PRIMARY KEY,
                path TEXT NOT NULL,
                sha256 TEXT NOT NULL,
                size INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            ",
        )?;

        let objects = self.objects_dir();
        if objects.exists() {
            fs::remove_dir_all(&objects)?;
        }
        fs::create_dir_all(&objects)?;

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;
        Ok(())
    }

    /// Returns the cache root
    pub fn path(&self) -> &Path {
        &self.root
    }

    fn objects_dir(&self) -> PathBuf {
        self.root.join("objects")
    }

    fn object_dir(&self, key: &CacheKey) -> PathBuf {
        self.objects_dir().join(&key.as_str()[..2]).join(key.as_str())
    }

    /// Looks up a verified cached file for `key`
    pub fn get(&self, key: &CacheKey) -> Result<Option<CachedFile>, CacheError> {
        let row = self
            .conn
            .query_row(
                "SELECT path, sha256, size FROM entries WHERE key = ?1",
                params![key.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((path, sha256, size)) = row else {
            return Ok(None);
        };

        let path = PathBuf::from(path);
        if !Self::is_intact(&path, &sha256) {
            warn!(key = %key, path = %path.display(), "evicting corrupt cache entry");
            self.remove(key)?;
            return Ok(None);
        }

        Ok(Some(CachedFile {
            key: key.clone(),
            path,
            sha256,
            size: size as u64,
        }))
    }

    fn is_intact(path: &Path, sha256: &str) -> bool {
        path.is_file()
            && VERIFY_ALGORITHM
                .hash_file(path)
                .is_ok_and(|actual| actual == sha256)
    }

    /// Stores a copy of `file` under `key`, replacing any previous entry
    pub fn put(&self, key: &CacheKey, file: &Path) -> Result<CachedFile, CacheError> {
        if !file.is_file() {
            return Err(CacheError::NotAFile(file.to_path_buf()));
        }

        let file_name = file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "artifact".into());

        // Copy next to the object dir first so `file` may live inside it
        let dir = self.object_dir(key);
        let shard = dir.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&shard)?;
        let temp_path = shard.join(format!("{}.tmp", key));
        fs::copy(file, &temp_path)?;

        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        let dest = dir.join(file_name);
        fs::rename(&temp_path, &dest)?;

        let sha256 = VERIFY_ALGORITHM.hash_file(&dest)?;
        let size = fs::metadata(&dest)?.len();

        self.conn.execute(
            "INSERT OR REPLACE INTO entries (key, path, sha256, size, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key.as_str(),
                dest.to_string_lossy().into_owned(),
                sha256,
                size as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!(key = %key, path = %dest.display(), size, "stored cache entry");
        Ok(CachedFile {
            key: key.clone(),
            path: dest,
            sha256,
            size,
        })
    }

    /// Removes an entry and its object; returns whether it existed
    pub fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let removed = self
            .conn
            .execute("DELETE FROM entries WHERE key = ?1", params![key.as_str()])?;

        let dir = self.object_dir(key);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(removed > 0)
    }

    /// Lists all index rows, oldest first
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let mut stmt = self.conn.prepare(
            "SELECT key, path, sha256, size, created_at FROM entries ORDER BY created_at, key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (key, path, sha256, size, created_at) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_default();
            entries.push(CacheEntry {
                key,
                path: PathBuf::from(path),
                sha256,
                size: size as u64,
                created_at,
            });
        }
        Ok(entries)
    }

    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let (entries, total): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM entries",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(CacheStats {
            entries: entries as usize,
            total_bytes: total as u64,
        })
    }

    /// Re-hashes every object, evicting the ones that changed or vanished
    pub fn verify(&self) -> Result<usize, CacheError> {
        let mut evicted = 0;
        for entry in self.entries()? {
            if !Self::is_intact(&entry.path, &entry.sha256) {
                warn!(key = %entry.key, "evicting corrupt cache entry");
                self.remove(&CacheKey(entry.key))?;
                evicted += 1;
            }
        }
        Ok(evicted)
    }

    /// Drops every entry; returns how many were removed
    pub fn clear(&self) -> Result<usize, CacheError> {
        let removed = self.conn.execute("DELETE FROM entries", [])?;
        let objects = self.objects_dir();
        if objects.exists() {
            fs::remove_dir_all(&objects)?;
        }
        fs::create_dir_all(&objects)?;
        Ok(removed)
    }
}
