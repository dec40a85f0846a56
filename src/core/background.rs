use crate::core::etl::{EtlEngine, RunSummary};
use crate::core::{ExportConfirmation, Result, TableSink, TableSource};
use crate::utils::error::EtlError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Runs audits on tokio's blocking pool. At most one run per source/sink
/// pair is active at a time.
#[derive(Clone, Default)]
pub struct BackgroundRunner {
    active: Arc<Mutex<HashSet<String>>>,
}

impl BackgroundRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called from inside a tokio runtime.
    pub fn spawn<S, K, C>(&self, engine: EtlEngine<S, K>, confirmation: C) -> Result<RunHandle>
    where
        S: TableSource + 'static,
        K: TableSink + 'static,
        C: ExportConfirmation + 'static,
    {
        let key = engine.run_key();
        let guard = ActiveRun::acquire(Arc::clone(&self.active), key.clone())?;

        tracing::info!("⏳ Processing {} in background", key);
        let handle = tokio::task::spawn_blocking(move || {
            // guard 跟著任務結束（包含 panic）一起釋放
            let _guard = guard;
            engine.run(&confirmation)
        });

        Ok(RunHandle { key, handle })
    }

    pub fn is_running(&self, key: &str) -> bool {
        self.active
            .lock()
            .map(|active| active.contains(key))
            .unwrap_or(false)
    }
}

struct ActiveRun {
    active: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl ActiveRun {
    fn acquire(active: Arc<Mutex<HashSet<String>>>, key: String) -> Result<Self> {
        {
            let mut running = active.lock().map_err(|_| EtlError::TaskFailed {
                message: "run registry is poisoned".to_string(),
            })?;
            if !running.insert(key.clone()) {
                return Err(EtlError::RunInProgress { key });
            }
        }
        Ok(Self { active, key })
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        if let Ok(mut running) = self.active.lock() {
            running.remove(&self.key);
        }
    }
}

pub struct RunHandle {
    key: String,
    handle: JoinHandle<Result<RunSummary>>,
}

impl RunHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocking work cannot be interrupted: a run that already started goes
    /// on to completion. Only a run still queued on the pool is dropped, and
    /// `wait` then reports `TaskFailed`.
    pub fn abort(&self) {
        tracing::warn!("Abort requested for {}", self.key);
        self.handle.abort();
    }

    /// Waits for the run. A panic inside the run comes back as
    /// `TaskFailed` instead of being lost.
    pub async fn wait(self) -> Result<RunSummary> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(EtlError::TaskFailed {
                message: format!("{}: {}", self.key, e),
            }),
        }
    }
}
