use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;
use crate::error::StorageError;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Opens the file, switches it to WAL and brings the schema up to date.
fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("Could not enable WAL mode: {err}");
    }
    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

/// Owns the connection until every sender is gone.
fn serve(mut conn: Connection, tasks: mpsc::Receiver<DbTask>) {
    for task in tasks {
        task(&mut conn);
    }
    info!("Database thread shutting down");
}

struct Worker {
    tasks: Option<mpsc::Sender<DbTask>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(path: PathBuf) -> Result<Self> {
        let (tasks_tx, tasks_rx) = mpsc::channel::<DbTask>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

        let handle = thread::Builder::new()
            .name("lazy-genius-db".into())
            .spawn(move || match open_connection(&path) {
                Ok(conn) => {
                    if ready_tx.send(Ok(())).is_ok() {
                        serve(conn, tasks_rx);
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .context("failed to spawn database worker thread")?;

        let mut worker = Self {
            tasks: Some(tasks_tx),
            handle: Some(handle),
        };
        let opened = ready_rx
            .recv()
            .map_err(|_| anyhow!("database worker exited before it was ready"))
            .and_then(|ready| ready);
        if let Err(err) = opened {
            worker.stop();
            return Err(err.context(StorageError::new("open database")));
        }
        Ok(worker)
    }

    fn sender(&self) -> Result<mpsc::Sender<DbTask>> {
        self.tasks
            .clone()
            .ok_or_else(|| anyhow!("database worker has stopped"))
    }

    /// Closes the task channel and waits for the thread to drain it.
    fn stop(&mut self) {
        self.tasks.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Database thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handle to the single SQLite connection.
///
/// The connection is opened once and owned by a dedicated worker thread;
/// every operation is a closure shipped to that thread, so calls are
/// serialized without holding a lock across an await point. Clones share
/// the same worker.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let worker = Worker::spawn(db_path.clone())?;
        info!("Database initialized at {}", db_path.display());

        Ok(Self {
            worker: Arc::new(worker),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Runs `task` on the database thread. Any failure, including a dead
    /// worker, carries a [`StorageError`] naming `operation`.
    pub async fn execute<F, T>(&self, operation: &'static str, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: DbTask = Box::new(move |conn| {
            if reply_tx.send(task(conn)).is_err() {
                error!("DB caller dropped before receiving result");
            }
        });

        self.worker
            .sender()
            .and_then(|sender| {
                sender
                    .send(job)
                    .map_err(|_| anyhow!("database thread is not accepting work"))
            })
            .context(StorageError::new(operation))?;

        let result = reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))
            .context(StorageError::new(operation))?;

        result.context(StorageError::new(operation))
    }
}
