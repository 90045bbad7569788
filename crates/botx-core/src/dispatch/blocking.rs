//! Worker-pool backend for blocking handlers.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use botx_models::{BotStatus, IncomingMessage};

use crate::api::BoxedBot;
use crate::dispatch::{
    Dispatcher, DispatcherState, ParseResult, RequestKind, decode_message,
};
use crate::error::{DispatchError, DispatchResult};
use crate::handler::{Callable, CommandHandler};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Dispatcher executing handlers on a fixed-size pool of OS threads.
///
/// Handlers may block on I/O freely; a panicking handler is logged and never
/// kills its worker. Accepts [`Callable::Blocking`] only.
pub struct BlockingDispatcher {
    state: DispatcherState,
    workers: usize,
    pool: Mutex<PoolSlot>,
}

enum PoolSlot {
    Idle,
    Running(WorkerPool),
    Stopped,
}

impl BlockingDispatcher {
    /// Creates a dispatcher sized to the CPU count.
    pub fn new() -> Self {
        Self::with_workers(num_cpus::get())
    }

    /// Creates a dispatcher with an explicit pool size.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            state: DispatcherState::new(),
            workers: workers.max(1),
            pool: Mutex::new(PoolSlot::Idle),
        }
    }

    fn reject_cooperative(&self, callable: &Callable, trigger: &str) -> DispatchResult<()> {
        match callable {
            Callable::Blocking(_) => Ok(()),
            Callable::Cooperative(_) => Err(DispatchError::HandlerKindMismatch {
                dispatcher: "blocking",
                offered: "cooperative",
                trigger: trigger.to_string(),
            }),
        }
    }
}

impl Default for BlockingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dispatcher for BlockingDispatcher {
    fn start(&self) -> DispatchResult<()> {
        let mut pool = self.pool.lock();
        if matches!(&*pool, PoolSlot::Running(_)) {
            return Ok(());
        }
        *pool = PoolSlot::Running(WorkerPool::spawn(self.workers)?);
        info!(workers = self.workers, "Started worker pool");
        Ok(())
    }

    async fn shutdown(&self) {
        let slot = {
            let mut pool = self.pool.lock();
            std::mem::replace(&mut *pool, PoolSlot::Stopped)
        };
        if let PoolSlot::Running(worker_pool) = slot {
            worker_pool.drain();
            info!("Worker pool drained and stopped");
        }
    }

    fn add_handler(&self, handler: CommandHandler) -> DispatchResult<()> {
        self.reject_cooperative(&handler.callable, &handler.trigger_body)?;
        self.state.add_handler(handler);
        Ok(())
    }

    fn register_next_step(
        &self,
        message: &IncomingMessage,
        callable: Callable,
    ) -> DispatchResult<()> {
        self.reject_cooperative(&callable, message.body())?;
        self.state.register_next_step(message, callable);
        Ok(())
    }

    fn status(&self) -> BotStatus {
        self.state.status()
    }

    async fn parse(
        &self,
        payload: Value,
        kind: RequestKind,
        bot: BoxedBot,
    ) -> DispatchResult<ParseResult> {
        match kind {
            RequestKind::Status => Ok(ParseResult::Status(self.state.status())),
            RequestKind::Command => {
                // Pool availability is checked before resolution: resolving
                // consumes a pending continuation, which must not be lost to
                // a parse that cannot schedule it.
                let slot = self.pool.lock();
                let worker_pool = match &*slot {
                    PoolSlot::Running(worker_pool) => worker_pool,
                    PoolSlot::Idle => return Err(DispatchError::NotStarted),
                    PoolSlot::Stopped => return Err(DispatchError::ShutDown),
                };

                let message = decode_message(payload)?;
                let Some((callable, route)) = self.state.resolve(&message) else {
                    return Ok(ParseResult::Command(false));
                };

                let f = match callable {
                    Callable::Blocking(f) => f,
                    // Only reachable through a continuation that slipped past
                    // the registration check; refuse rather than block the pool.
                    Callable::Cooperative(_) => {
                        return Err(DispatchError::HandlerKindMismatch {
                            dispatcher: "blocking",
                            offered: "cooperative",
                            trigger: message.body().to_string(),
                        });
                    }
                };

                let body = message.body().to_string();
                debug!(body = %body, route = route, "Scheduling handler on worker pool");
                let job: Job = Box::new(move || {
                    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| f(message, bot))) {
                        error!(
                            body = %body,
                            panic = %panic_message(&panic),
                            "Command handler panicked"
                        );
                    }
                });
                worker_pool
                    .job_tx
                    .send(job)
                    .map_err(|_| DispatchError::ShutDown)?;
                Ok(ParseResult::Command(true))
            }
        }
    }
}

// =============================================================================
// Worker pool
// =============================================================================

struct WorkerPool {
    job_tx: mpsc::Sender<Job>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    fn spawn(workers: usize) -> DispatchResult<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let handle = thread::Builder::new()
                .name(format!("botx-worker-{worker_id}"))
                .spawn(move || Self::worker_loop(worker_id, &job_rx))?;
            handles.push(handle);
        }

        Ok(Self { job_tx, handles })
    }

    fn worker_loop(worker_id: usize, job_rx: &Mutex<mpsc::Receiver<Job>>) {
        debug!(worker_id, "Worker started");
        loop {
            // Hold the lock only while waiting; release it before running
            // the job so workers execute in parallel.
            let job = {
                let rx = job_rx.lock();
                rx.recv()
            };
            match job {
                Ok(job) => job(),
                Err(_) => {
                    debug!(worker_id, "Worker shutting down");
                    break;
                }
            }
        }
    }

    /// Closes the channel and joins every worker, letting queued jobs finish.
    fn drain(self) {
        drop(self.job_tx);
        for handle in self.handles {
            if handle.join().is_err() {
                warn!("Worker thread panicked outside a handler");
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{NullBot, incoming};
    use std::sync::mpsc::channel;
    use std::time::Duration;

    fn notifying(tx: std::sync::mpsc::Sender<&'static str>, tag: &'static str) -> Callable {
        Callable::blocking(move |_message, _bot| {
            tx.send(tag).unwrap();
        })
    }

    #[tokio::test]
    async fn exact_trigger_match_is_scheduled() {
        let dispatcher = BlockingDispatcher::with_workers(2);
        let (tx, rx) = channel();
        dispatcher
            .add_handler(
                CommandHandler::builder("hello", notifying(tx, "hello"))
                    .description("says hi")
                    .build(),
            )
            .unwrap();
        dispatcher.start().unwrap();

        let result = dispatcher
            .parse(incoming("/hello world", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();

        assert!(result.was_scheduled());
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "hello");
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn default_handler_catches_unmatched_commands() {
        let dispatcher = BlockingDispatcher::with_workers(1);
        let (tx, rx) = channel();
        dispatcher
            .add_handler(
                CommandHandler::builder("fallback", notifying(tx, "default"))
                    .as_default(true)
                    .build(),
            )
            .unwrap();
        dispatcher.start().unwrap();

        let result = dispatcher
            .parse(incoming("/missing", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();

        assert!(result.was_scheduled());
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "default");
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn unmatched_command_without_default_is_not_scheduled() {
        let dispatcher = BlockingDispatcher::with_workers(1);
        dispatcher.start().unwrap();

        let result = dispatcher
            .parse(incoming("/missing", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();

        assert!(!result.was_scheduled());
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn next_step_wins_over_default_and_is_consumed() {
        let dispatcher = BlockingDispatcher::with_workers(1);
        let (tx, rx) = channel();
        dispatcher
            .add_handler(
                CommandHandler::builder("fallback", notifying(tx.clone(), "default"))
                    .as_default(true)
                    .build(),
            )
            .unwrap();
        dispatcher.start().unwrap();

        let message = decode_message(incoming("/whatever", true)).unwrap();
        dispatcher
            .register_next_step(&message, notifying(tx, "continuation"))
            .unwrap();

        let first = dispatcher
            .parse(incoming("/whatever", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();
        assert!(first.was_scheduled());
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            "continuation"
        );

        // The continuation was consumed; the same command now falls through.
        let second = dispatcher
            .parse(incoming("/whatever", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();
        assert!(second.was_scheduled());
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "default");
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn registered_trigger_wins_over_next_step() {
        let dispatcher = BlockingDispatcher::with_workers(1);
        let (tx, rx) = channel();
        dispatcher
            .add_handler(CommandHandler::builder("hello", notifying(tx.clone(), "hello")).build())
            .unwrap();
        dispatcher.start().unwrap();

        let message = decode_message(incoming("/hello", true)).unwrap();
        dispatcher
            .register_next_step(&message, notifying(tx, "continuation"))
            .unwrap();

        dispatcher
            .parse(incoming("/hello", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "hello");
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn cooperative_handler_is_rejected_before_registration() {
        let dispatcher = BlockingDispatcher::with_workers(1);
        let result = dispatcher.add_handler(
            CommandHandler::builder("hello", Callable::cooperative(|_, _| async {})).build(),
        );

        assert!(matches!(
            result,
            Err(DispatchError::HandlerKindMismatch { .. })
        ));
        assert!(dispatcher.status().result.commands.is_empty());
    }

    #[tokio::test]
    async fn parse_before_start_and_after_shutdown_fail() {
        let dispatcher = BlockingDispatcher::with_workers(1);
        let (tx, _rx) = channel();
        dispatcher
            .add_handler(CommandHandler::builder("hello", notifying(tx, "hello")).build())
            .unwrap();

        let early = dispatcher
            .parse(incoming("/hello", true), RequestKind::Command, NullBot::boxed())
            .await;
        assert!(matches!(early, Err(DispatchError::NotStarted)));

        dispatcher.start().unwrap();
        dispatcher.shutdown().await;

        let late = dispatcher
            .parse(incoming("/hello", true), RequestKind::Command, NullBot::boxed())
            .await;
        assert!(matches!(late, Err(DispatchError::ShutDown)));
    }

    #[tokio::test]
    async fn continuation_survives_a_parse_before_start() {
        let dispatcher = BlockingDispatcher::with_workers(1);
        let (tx, rx) = channel();
        let message = decode_message(incoming("/later", true)).unwrap();
        dispatcher
            .register_next_step(&message, notifying(tx, "continuation"))
            .unwrap();

        let early = dispatcher
            .parse(incoming("/later", true), RequestKind::Command, NullBot::boxed())
            .await;
        assert!(matches!(early, Err(DispatchError::NotStarted)));

        // The failed parse must not have consumed the continuation.
        dispatcher.start().unwrap();
        let result = dispatcher
            .parse(incoming("/later", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();
        assert!(result.was_scheduled());
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            "continuation"
        );
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn panicking_handler_does_not_kill_the_pool() {
        let dispatcher = BlockingDispatcher::with_workers(1);
        let (tx, rx) = channel();
        dispatcher
            .add_handler(
                CommandHandler::builder(
                    "boom",
                    Callable::blocking(|_, _| panic!("handler fault")),
                )
                .build(),
            )
            .unwrap();
        dispatcher
            .add_handler(CommandHandler::builder("hello", notifying(tx, "hello")).build())
            .unwrap();
        dispatcher.start().unwrap();

        dispatcher
            .parse(incoming("/boom", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();
        dispatcher
            .parse(incoming("/hello", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();

        // The second handler runs on the same single worker.
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "hello");
        dispatcher.shutdown().await;
    }
}
