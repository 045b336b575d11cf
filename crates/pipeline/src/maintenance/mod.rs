//! Startup maintenance gate.
//!
//! Every instance runs [`MaintenanceCoordinator::run`] before serving
//! traffic. Exactly one of them holds the maintenance lock and runs the
//! steps; the others wait and retry until it is released. A failing step
//! is fatal: the lock is released and the error is returned so the
//! instance does not start.

pub mod checks;

use std::time::Duration;

use async_trait::async_trait;
use docport_core::backoff::Backoff;
use docport_core::locks::{LockFamily, MAINTENANCE_LOCK_KEY};
use docport_db::repositories::{LockError, LockRepo};
use sqlx::PgPool;

pub use checks::{ExpiredLockCheck, FinishedBatchCheck, MigrationStep, OrderCounterCheck};

/// Errors that abort startup maintenance.
#[derive(Debug, thiserror::Error)]
pub enum MaintenanceError {
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Consistency check '{step}' failed: {message}")]
    Check { step: &'static str, message: String },
}

/// One unit of work run while holding the maintenance lock.
#[async_trait]
pub trait MaintenanceStep: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    async fn run(&self, pool: &PgPool) -> Result<(), MaintenanceError>;
}

/// The standard step list: migrations first, then consistency checks.
pub fn default_steps() -> Vec<Box<dyn MaintenanceStep>> {
    vec![
        Box::new(MigrationStep),
        Box::new(ExpiredLockCheck),
        Box::new(OrderCounterCheck),
        Box::new(FinishedBatchCheck),
    ]
}

/// Summary of a completed maintenance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Lock attempts made, including the successful one.
    pub attempts: u32,
}

enum State {
    Attempting { attempt: u32 },
    Done(MaintenanceReport),
}

/// Runs the maintenance steps on exactly one instance at a time.
pub struct MaintenanceCoordinator {
    pool: PgPool,
    steps: Vec<Box<dyn MaintenanceStep>>,
    lock_ttl: Option<Duration>,
    backoff: Backoff,
}

impl MaintenanceCoordinator {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            steps: default_steps(),
            lock_ttl: LockFamily::Maintenance.default_ttl(),
            backoff: Backoff::default(),
        }
    }

    pub fn with_steps(mut self, steps: Vec<Box<dyn MaintenanceStep>>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_lock_ttl(mut self, lock_ttl: Option<Duration>) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Block until this instance has held the maintenance lock and run
    /// every step.
    ///
    /// Retries indefinitely while the lock is held elsewhere. Steps are
    /// idempotent, so an instance that waited on a peer finds nothing left
    /// to migrate. Any other failure is returned after releasing the lock.
    pub async fn run(&self) -> Result<MaintenanceReport, MaintenanceError> {
        let mut state = State::Attempting { attempt: 0 };

        loop {
            state = match state {
                State::Attempting { attempt } => self.attempt(attempt).await?,
                State::Done(report) => {
                    tracing::info!(attempts = report.attempts, "Maintenance done");
                    return Ok(report);
                }
            };
        }
    }

    async fn attempt(&self, attempt: u32) -> Result<State, MaintenanceError> {
        let lock = match LockRepo::take(
            &self.pool,
            LockFamily::Maintenance,
            MAINTENANCE_LOCK_KEY,
            self.lock_ttl,
        )
        .await
        {
            Ok(lock) => lock,
            Err(LockError::AlreadyTaken { .. }) => {
                let delay = self.backoff.delay(attempt);
                tracing::info!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Maintenance lock held by another instance, waiting"
                );
                tokio::time::sleep(delay).await;
                return Ok(State::Attempting {
                    attempt: attempt + 1,
                });
            }
            Err(LockError::Database(e)) => return Err(e.into()),
        };

        tracing::info!(attempt = attempt + 1, "Maintenance lock acquired");
        let result = self.run_steps().await;

        match LockRepo::release(&self.pool, &lock).await {
            Ok(true) => tracing::info!("Maintenance lock released"),
            Ok(false) => tracing::warn!("Maintenance lock expired before release"),
            Err(e) => tracing::error!(error = %e, "Failed to release maintenance lock"),
        }

        result?;
        Ok(State::Done(MaintenanceReport {
            attempts: attempt + 1,
        }))
    }

    async fn run_steps(&self) -> Result<(), MaintenanceError> {
        for step in &self.steps {
            tracing::info!(step = step.name(), "Running maintenance step");
            if let Err(e) = step.run(&self.pool).await {
                tracing::error!(step = step.name(), error = %e, "Maintenance step failed");
                return Err(e);
            }
        }
        Ok(())
    }
}
