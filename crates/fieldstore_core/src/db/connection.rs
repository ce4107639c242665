//! Connection lifecycle and transaction batching.
//!
//! # Responsibility
//! - Create and open marker-bearing database files.
//! - Batch all writes in one long-lived transaction committed on flush.
//! - Offer a periodic auto-flush and a best-effort recovery flush.
//!
//! # Invariants
//! - While `Open`, exactly one transaction is active on the handle.
//! - One mutex guards the handle and its transaction. Flush, auto-flush,
//!   backup, recovery and close all go through it.
//! - The scheduler thread only raises a flag and never touches the handle.

use super::config::ConnectionConfig;
use super::open::{open_handle, OpenMode};
use super::scheduler::{FlushScheduler, FlushSignal};
use super::schema::{table_exists, DomainTable, InfoTable};
use super::{DbError, DbResult, MEMORY_PATH};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection as SqliteHandle, DatabaseName};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Upper bound the recovery path waits for the handle before giving up.
const RECOVERY_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Opening,
    Open,
}

/// What happens after the pending transaction is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// Begin a fresh transaction immediately.
    #[default]
    Renew,
    /// Leave the handle in autocommit mode.
    CommitOnly,
}

struct Inner {
    state: ConnectionState,
    path: Option<PathBuf>,
    handle: Option<SqliteHandle>,
}

/// Owner of one SQLite file and its batching transaction.
///
/// `Connection` is `Sync`: share it behind an `Arc` between the thread doing
/// writes and the host loop calling [`Connection::execute_auto_flush`].
pub struct Connection {
    config: ConnectionConfig,
    inner: Mutex<Inner>,
    signal: FlushSignal,
    scheduler: Mutex<Option<FlushScheduler>>,
    auto_flush: AtomicBool,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new(ConnectionConfig::default())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("path", &self.path())
            .field("flush_pending", &self.signal.is_pending())
            .finish()
    }
}

impl Connection {
    pub fn new(config: ConnectionConfig) -> Self {
        let auto_flush = AtomicBool::new(config.auto_flush);
        Self {
            config,
            inner: Mutex::new(Inner {
                state: ConnectionState::Closed,
                path: None,
                handle: None,
            }),
            signal: FlushSignal::default(),
            scheduler: Mutex::new(None),
            auto_flush,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Path of the open file, `None` while closed.
    pub fn path(&self) -> Option<PathBuf> {
        self.inner.lock().path.clone()
    }

    /// Creates a new database at `path` and opens it.
    ///
    /// The marker table is created first, then every configured domain
    /// table, all in one transaction.
    ///
    /// # Errors
    /// - `AlreadyOpen` when this connection is open.
    /// - `FileExists` when `path` already exists. The file is untouched.
    /// - Any table creation failure. The partially written file is removed.
    pub fn create(&self, path: impl AsRef<Path>) -> DbResult<()> {
        let path = path.as_ref();
        let started_at = Instant::now();
        let mut inner = self.inner.lock();
        ensure_closed(&inner)?;
        if path.exists() {
            return Err(DbError::FileExists(path.to_path_buf()));
        }

        inner.state = ConnectionState::Opening;
        if let Err(err) = self.load_schema(path) {
            inner.state = ConnectionState::Closed;
            if let Err(remove_err) = fs::remove_file(path) {
                warn!(
                    "event=db_create module=db status=cleanup_failed error={}",
                    remove_err
                );
            }
            error!(
                "event=db_create module=db status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        self.open_locked(&mut inner, path)?;
        info!(
            "event=db_create module=db status=ok tables={} duration_ms={}",
            self.config.tables.len() + 1,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Opens an existing database and begins its batching transaction.
    ///
    /// # Errors
    /// - `AlreadyOpen` when this connection is open.
    /// - `FileNotFound` when `path` does not exist.
    /// - `FormatNotRecognized` when the file lacks the marker table. The
    ///   connection stays closed.
    pub fn open(&self, path: impl AsRef<Path>) -> DbResult<()> {
        let mut inner = self.inner.lock();
        ensure_closed(&inner)?;
        inner.state = ConnectionState::Opening;
        self.open_locked(&mut inner, path.as_ref())
    }

    /// Commits pending work and begins a new transaction.
    pub fn flush(&self) -> DbResult<()> {
        self.flush_with(FlushMode::Renew)
    }

    /// Commits pending work. No-op while closed.
    pub fn flush_with(&self, mode: FlushMode) -> DbResult<()> {
        let inner = self.inner.lock();
        self.flush_locked(&inner, mode).map(|_| ())
    }

    /// Flushes only when the scheduler has requested it since the last
    /// flush. Returns whether a flush ran.
    pub fn execute_auto_flush(&self) -> DbResult<bool> {
        if !self.signal.is_pending() {
            return Ok(false);
        }
        let inner = self.inner.lock();
        if inner.handle.is_none() {
            return Ok(false);
        }
        self.flush_locked(&inner, FlushMode::Renew)?;
        info!("event=db_auto_flush module=db status=ok");
        Ok(true)
    }

    /// Raises the flush request flag as the scheduler would.
    pub fn request_flush(&self) {
        self.signal.request();
    }

    pub fn is_flush_pending(&self) -> bool {
        self.signal.is_pending()
    }

    pub fn is_auto_flush_enabled(&self) -> bool {
        self.auto_flush.load(Ordering::Acquire)
    }

    /// Turns periodic flush requests back on.
    pub fn enable_auto_flush(&self) -> DbResult<()> {
        self.auto_flush.store(true, Ordering::Release);
        if self.is_open() {
            self.start_scheduler()?;
        }
        Ok(())
    }

    /// Stops periodic flush requests, typically for bulk loads.
    ///
    /// A request raised before the call is discarded.
    pub fn disable_auto_flush(&self) {
        self.auto_flush.store(false, Ordering::Release);
        self.stop_scheduler();
        self.signal.clear();
    }

    /// Best-effort flush for crash boundaries.
    ///
    /// Never fails: errors are logged and reported as `false`.
    pub fn recover_flush(&self) -> bool {
        let Some(inner) = self.inner.try_lock_for(RECOVERY_LOCK_TIMEOUT) else {
            error!("event=db_recover module=db status=error error_code=lock_timeout");
            return false;
        };
        if inner.state != ConnectionState::Open {
            return false;
        }
        match self.flush_locked(&inner, FlushMode::Renew) {
            Ok(_) => {
                info!("event=db_recover module=db status=ok");
                true
            }
            Err(err) => {
                error!(
                    "event=db_recover module=db status=error error_code=flush_failed error={}",
                    err
                );
                false
            }
        }
    }

    /// Guard that runs [`Self::recover_flush`] if dropped during a panic.
    pub fn crash_guard(&self) -> CrashGuard<'_> {
        CrashGuard { connection: self }
    }

    /// Writes a complete copy of the database to `path`.
    ///
    /// Pending work is committed first and a new transaction is begun
    /// afterwards. Returns `Ok(false)` while closed or for the `:memory:`
    /// target, otherwise whether `path` exists after the copy.
    pub fn backup(&self, path: impl AsRef<Path>) -> DbResult<bool> {
        let path = path.as_ref();
        let started_at = Instant::now();
        let inner = self.inner.lock();
        let Some(handle) = inner.handle.as_ref() else {
            return Ok(false);
        };

        self.flush_locked(&inner, FlushMode::CommitOnly)?;
        let copied = handle.backup(DatabaseName::Main, path, None);
        handle.execute_batch("BEGIN;")?;
        if let Err(err) = copied {
            error!(
                "event=db_backup module=db status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        if path == Path::new(MEMORY_PATH) {
            info!(
                "event=db_backup module=db status=skipped target=memory duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Ok(false);
        }
        info!(
            "event=db_backup module=db status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(path.exists())
    }

    /// Commits pending work and releases the file. No-op while closed.
    ///
    /// # Errors
    /// - The final commit failed. The connection stays open with its
    ///   transaction so nothing is lost, and auto-flush resumes if enabled.
    pub fn close(&self) -> DbResult<()> {
        self.stop_scheduler();
        let mut inner = self.inner.lock();
        let Some(handle) = inner.handle.take() else {
            inner.state = ConnectionState::Closed;
            return Ok(());
        };

        if let Err(err) = commit_pending(&handle) {
            error!(
                "event=db_close module=db status=error error_code=commit_failed error={}",
                err
            );
            inner.handle = Some(handle);
            self.resume_scheduler();
            return Err(err);
        }
        if let Err((handle, err)) = handle.close() {
            error!(
                "event=db_close module=db status=error error_code=close_failed error={}",
                err
            );
            let renewed = handle.execute_batch("BEGIN;");
            inner.handle = Some(handle);
            self.resume_scheduler();
            renewed?;
            return Err(err.into());
        }

        inner.state = ConnectionState::Closed;
        inner.path = None;
        self.signal.clear();
        info!("event=db_close module=db status=ok");
        Ok(())
    }

    /// Runs `work` against the open handle inside the batching transaction.
    ///
    /// # Errors
    /// - `NotOpen` while closed.
    pub fn with_handle<R, E>(&self, work: impl FnOnce(&SqliteHandle) -> Result<R, E>) -> Result<R, E>
    where
        E: From<DbError>,
    {
        let inner = self.inner.lock();
        let handle = inner.handle.as_ref().ok_or(DbError::NotOpen)?;
        work(handle)
    }

    pub fn table_exists(&self, name: &str) -> DbResult<bool> {
        self.with_handle(|handle| table_exists(handle, name).map_err(DbError::from))
    }

    fn load_schema(&self, path: &Path) -> DbResult<()> {
        let mut handle = open_handle(path, OpenMode::Create, &self.config)?;
        let tx = handle.transaction()?;
        create_table(&InfoTable, &tx)?;
        for table in &self.config.tables {
            create_table(table.as_ref(), &tx)?;
        }
        tx.commit()?;
        handle.close().map_err(|(_, err)| DbError::from(err))
    }

    fn open_locked(&self, inner: &mut MutexGuard<'_, Inner>, path: &Path) -> DbResult<()> {
        if !path.exists() {
            inner.state = ConnectionState::Closed;
            return Err(DbError::FileNotFound(path.to_path_buf()));
        }

        let handle = match open_handle(path, OpenMode::Existing, &self.config)
            .and_then(|handle| handle.execute_batch("BEGIN;").map(|_| handle).map_err(DbError::from))
        {
            Ok(handle) => handle,
            Err(err) => {
                inner.state = ConnectionState::Closed;
                return Err(err);
            }
        };

        inner.handle = Some(handle);
        inner.path = Some(path.to_path_buf());
        inner.state = ConnectionState::Open;
        self.signal.clear();

        if self.is_auto_flush_enabled() {
            if let Err(err) = self.start_scheduler() {
                warn!(
                    "event=flush_scheduler_start module=db status=error error={}",
                    err
                );
            }
        }
        Ok(())
    }

    /// Returns whether a transaction was committed.
    fn flush_locked(&self, inner: &Inner, mode: FlushMode) -> DbResult<bool> {
        let Some(handle) = inner.handle.as_ref() else {
            return Ok(false);
        };
        let started_at = Instant::now();
        let committed = commit_pending(handle)?;
        self.signal.clear();
        if mode == FlushMode::Renew {
            handle.execute_batch("BEGIN;")?;
        }
        debug!(
            "event=db_flush module=db status=ok committed={} renew={} duration_ms={}",
            committed,
            mode == FlushMode::Renew,
            started_at.elapsed().as_millis()
        );
        Ok(committed)
    }

    fn start_scheduler(&self) -> DbResult<()> {
        let mut scheduler = self.scheduler.lock();
        if scheduler.is_none() {
            *scheduler = Some(FlushScheduler::start(
                self.config.flush_interval,
                self.signal.clone(),
            )?);
        }
        Ok(())
    }

    /// Restarts periodic requests after a failed close left the file open.
    fn resume_scheduler(&self) {
        if !self.is_auto_flush_enabled() {
            return;
        }
        if let Err(err) = self.start_scheduler() {
            warn!(
                "event=flush_scheduler_start module=db status=error error={}",
                err
            );
        }
    }

    fn stop_scheduler(&self) {
        let scheduler = self.scheduler.lock().take();
        if let Some(scheduler) = scheduler {
            scheduler.stop();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            error!("event=db_close module=db status=error error_code=drop error={}", err);
        }
    }
}

/// Calls [`Connection::recover_flush`] when dropped while the thread panics.
///
/// Place one at the top of a unit of work so committed-but-unflushed writes
/// survive a crash in that work.
#[must_use = "the guard only protects work done while it is alive"]
pub struct CrashGuard<'a> {
    connection: &'a Connection,
}

impl Drop for CrashGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let recovered = self.connection.recover_flush();
            warn!(
                "event=crash_guard module=db status=triggered recovered={}",
                recovered
            );
        }
    }
}

fn ensure_closed(inner: &Inner) -> DbResult<()> {
    if inner.state != ConnectionState::Closed {
        return Err(DbError::AlreadyOpen);
    }
    Ok(())
}

fn create_table(table: &dyn DomainTable, handle: &SqliteHandle) -> DbResult<()> {
    let created = table.create(handle)?;
    let indexes = table.create_index(handle)?;
    debug!(
        "event=table_create module=db status=ok table={} created={} indexes={}",
        table.name(),
        created,
        indexes
    );
    Ok(())
}

fn commit_pending(handle: &SqliteHandle) -> DbResult<bool> {
    if handle.is_autocommit() {
        return Ok(false);
    }
    handle.execute_batch("COMMIT;")?;
    Ok(true)
}
