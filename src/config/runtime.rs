// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::backends::sqlite::{open_pool, SqliteGraphStore, SqliteJobQueue};
use crate::config::consts::DEFAULT_MAX_CONNECTIONS;
use crate::config::EngineConfig;
use crate::engine::{ProcessInsertDispatcher, QueueWorkerPool, Reconciler, Retrigger};
use crate::errors::{EngineError, StoreError};
use crate::registry::Registry;
use crate::traits::{GraphStore, JobQueue};

/// Builds a [`Runtime`] from configuration.
///
/// # Examples
///
/// ```no_run
/// use playbook_engine::config::{EngineConfig, RuntimeBuilder};
/// use playbook_engine::steps::builtin_registry;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = EngineConfig {
///     database_url: Some("sqlite://playbook.db".into()),
///     ..EngineConfig::default()
/// };
/// let runtime = RuntimeBuilder::connect(&config, Arc::new(builtin_registry()?)).await?;
/// runtime.run(CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Open the database named by the config and create the graph schema.
    ///
    /// The queue schema is created when the queue is started.
    pub async fn connect(
        config: &EngineConfig,
        registry: Arc<Registry>,
    ) -> Result<Runtime, EngineError> {
        let pool = open_pool(config.database_url()?, DEFAULT_MAX_CONNECTIONS)
            .await
            .map_err(StoreError::from)?;
        let store = Arc::new(SqliteGraphStore::new(pool.clone()));
        store.migrate().await?;
        let queue = Arc::new(SqliteJobQueue::new(pool, config.queue_policy()));

        Ok(Runtime {
            config: config.clone(),
            registry,
            store,
            queue,
        })
    }
}

/// A connected engine, ready to run its trigger paths.
pub struct Runtime {
    config: EngineConfig,
    registry: Arc<Registry>,
    store: Arc<SqliteGraphStore>,
    queue: Arc<SqliteJobQueue>,
}

impl Runtime {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn store(&self) -> Arc<dyn GraphStore> {
        self.store.clone()
    }

    pub fn queue(&self) -> Arc<dyn JobQueue> {
        self.queue.clone()
    }

    fn reconciler(&self) -> Arc<Reconciler> {
        let dispatch = &self.config.dispatch;
        let mut retrigger = Retrigger::new(self.store()).via_notify(dispatch.retrigger_notify);
        if dispatch.retrigger_queue {
            retrigger = retrigger.via_queue(self.queue(), self.config.queue.name.clone());
        }
        Arc::new(Reconciler::new(
            self.registry.clone(),
            self.store(),
            retrigger,
            self.config.claim_lease(),
        ))
    }

    /// Run the enabled trigger paths until `cancel` fires or one of them fails.
    ///
    /// A failure in either path cancels the other; the first error is returned.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), EngineError> {
        let cancel = cancel.child_token();
        let reconciler = self.reconciler();
        let dispatch = &self.config.dispatch;

        // The queue goes first so an unreachable queue fails before anything is spawned.
        let pool = if dispatch.queue {
            let pool = QueueWorkerPool::new(
                self.config.worker_options(),
                self.store(),
                self.queue(),
                reconciler.clone(),
            );
            Some(pool.start(cancel.clone()).await?)
        } else {
            None
        };
        // Re-triggering by queue needs a started queue even when no workers drain it.
        if dispatch.retrigger_queue && !dispatch.queue {
            self.queue.start().await.map_err(EngineError::QueueUnavailable)?;
        }
        let dispatcher = dispatch.listen.then(|| {
            ProcessInsertDispatcher::new(self.store(), reconciler)
                .with_redelivery_delay(self.config.redelivery_delay())
                .spawn(cancel.clone())
        });

        let stop_on_error = |result: Result<(), EngineError>| {
            if result.is_err() {
                cancel.cancel();
            }
            result
        };
        let (dispatched, pooled) = tokio::join!(
            async {
                let result = match dispatcher {
                    Some(handle) => handle
                        .await
                        .unwrap_or_else(|e| Err(EngineError::TaskAborted(e.to_string()))),
                    None => Ok(()),
                };
                stop_on_error(result)
            },
            async {
                let result = match pool {
                    Some(handle) => handle.join().await,
                    None => Ok(()),
                };
                stop_on_error(result)
            },
        );
        dispatched.and(pooled)
    }
}
