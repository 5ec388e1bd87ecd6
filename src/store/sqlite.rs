use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::app::{HeadlinerError, Result};
use crate::store::{Notifier, Store};

/// How often a file-backed store checks for writes made by other connections.
pub const WATCH_INTERVAL: Duration = Duration::from_millis(250);

/// Last known `updated_at` per subscribed key.
type Stamps = Arc<Mutex<HashMap<String, Option<String>>>>;

/// SQLite-backed key-value store.
///
/// Writes through this store notify subscribers directly. For a file-backed
/// store, subscribing also starts a watcher that picks up writes committed by
/// other connections, including other processes.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    notifier: Arc<Notifier>,
    stamps: Stamps,
    watching: AtomicBool,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn, Some(path.as_ref().to_path_buf()))
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            path,
            notifier: Arc::new(Notifier::default()),
            stamps: Arc::new(Mutex::new(HashMap::new())),
            watching: AtomicBool::new(false),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| HeadlinerError::Other(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| HeadlinerError::Other(format!("Store lock poisoned: {}", e)))
    }

    /// Keys currently present, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Track `key` for foreign writes, starting the watcher on first use.
    fn watch(&self, key: &str) {
        let Some(path) = self.path.clone() else {
            return;
        };

        let stamp = match self.lock().and_then(|conn| Ok(updated_at(&conn, key)?)) {
            Ok(stamp) => stamp,
            Err(e) => {
                tracing::warn!("Failed to read {} before watching it: {}", key, e);
                None
            }
        };
        lock_stamps(&self.stamps)
            .entry(key.to_string())
            .or_insert(stamp);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime, writes from other connections go unnoticed");
            return;
        };
        if self.watching.swap(true, Ordering::SeqCst) {
            return;
        }

        let notifier = Arc::downgrade(&self.notifier);
        let stamps = self.stamps.clone();
        runtime.spawn(watch_foreign_writes(path, notifier, stamps));
    }
}

impl Store for SqliteStore {
    fn get_raw(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.lock()?;

        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn set_raw(&self, key: &str, value: Value) -> Result<()> {
        let text = serde_json::to_string(&value)?;
        let stamp = Utc::now().to_rfc3339();

        // Recorded before the commit so the watcher never reports our own write
        let previous = {
            let mut stamps = lock_stamps(&self.stamps);
            stamps
                .get_mut(key)
                .map(|known| std::mem::replace(known, Some(stamp.clone())))
        };

        let written = self.lock().and_then(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, text, stamp],
            )?;
            Ok(())
        });

        if let Err(e) = written {
            if let Some(previous) = previous {
                lock_stamps(&self.stamps).insert(key.to_string(), previous);
            }
            return Err(e);
        }

        self.notifier.notify(key, value);
        Ok(())
    }

    fn subscribe(&self, key: &str) -> broadcast::Receiver<Value> {
        let rx = self.notifier.subscribe(key);
        self.watch(key);
        rx
    }
}

fn lock_stamps(stamps: &Stamps) -> MutexGuard<'_, HashMap<String, Option<String>>> {
    stamps.lock().unwrap_or_else(|e| e.into_inner())
}

fn updated_at(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT updated_at FROM kv WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

/// Poll the database file until the owning store is dropped.
async fn watch_foreign_writes(path: PathBuf, notifier: Weak<Notifier>, stamps: Stamps) {
    let conn = match Connection::open(&path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Store watcher could not open {}: {}", path.display(), e);
            return;
        }
    };

    let mut ticker = tokio::time::interval(WATCH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut data_version = None;

    loop {
        ticker.tick().await;
        let Some(notifier) = notifier.upgrade() else {
            break;
        };
        if let Err(e) = notify_foreign_writes(&conn, &stamps, &notifier, &mut data_version) {
            tracing::warn!("Store watcher query failed: {}", e);
        }
    }

    tracing::debug!("Store watcher for {} stopped", path.display());
}

fn notify_foreign_writes(
    conn: &Connection,
    stamps: &Stamps,
    notifier: &Notifier,
    data_version: &mut Option<i64>,
) -> Result<()> {
    // Changes only when some other connection commits
    let version: i64 = conn.query_row("PRAGMA data_version", [], |row| row.get(0))?;
    if *data_version == Some(version) {
        return Ok(());
    }
    *data_version = Some(version);

    let watched: Vec<String> = lock_stamps(stamps).keys().cloned().collect();
    for key in watched {
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT value, updated_at FROM kv WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((text, stamp)) = row else {
            continue;
        };

        {
            let mut stamps = lock_stamps(stamps);
            if stamps.get(&key).and_then(|known| known.as_deref()) == Some(stamp.as_str()) {
                continue;
            }
            stamps.insert(key.clone(), Some(stamp));
        }

        match serde_json::from_str(&text) {
            Ok(value) => {
                tracing::debug!("{} changed outside this process", key);
                notifier.notify(&key, value);
            }
            Err(e) => tracing::warn!("Ignoring unreadable value for {}: {}", key, e),
        }
    }

    Ok(())
}
