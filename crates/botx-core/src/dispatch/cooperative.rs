//! Single-threaded cooperative backend for suspendable handlers.

use std::thread;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use botx_models::{BotStatus, IncomingMessage};

use crate::api::BoxedBot;
use crate::dispatch::{
    Dispatcher, DispatcherState, ParseResult, RequestKind, decode_message,
};
use crate::error::{DispatchError, DispatchResult};
use crate::handler::{Callable, CommandHandler};

/// Dispatcher executing handlers as tasks on one scheduler thread.
///
/// Handlers interleave at await points; a handler that blocks the thread
/// stalls every other handler. Accepts [`Callable::Cooperative`] only.
/// Shutting down cancels tasks that have not finished.
pub struct CooperativeDispatcher {
    state: DispatcherState,
    scheduler: Mutex<SchedulerSlot>,
}

enum SchedulerSlot {
    Idle,
    Running(Scheduler),
    Stopped,
}

struct Scheduler {
    handle: runtime::Handle,
    stop_tx: oneshot::Sender<()>,
    thread: thread::JoinHandle<()>,
}

impl CooperativeDispatcher {
    /// Creates a dispatcher; the scheduler thread is spawned by `start`.
    pub fn new() -> Self {
        Self {
            state: DispatcherState::new(),
            scheduler: Mutex::new(SchedulerSlot::Idle),
        }
    }

    fn reject_blocking(&self, callable: &Callable, trigger: &str) -> DispatchResult<()> {
        match callable {
            Callable::Cooperative(_) => Ok(()),
            Callable::Blocking(_) => Err(DispatchError::HandlerKindMismatch {
                dispatcher: "cooperative",
                offered: "blocking",
                trigger: trigger.to_string(),
            }),
        }
    }
}

impl Default for CooperativeDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dispatcher for CooperativeDispatcher {
    fn start(&self) -> DispatchResult<()> {
        let mut scheduler = self.scheduler.lock();
        if matches!(&*scheduler, SchedulerSlot::Running(_)) {
            return Ok(());
        }

        // IO and time drivers enabled: handlers drive network futures here.
        let rt = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let handle = rt.handle().clone();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        // The runtime lives on its own thread, parked inside block_on until
        // shutdown; tasks spawned through the handle run there. Dropping the
        // runtime at the end of the closure cancels whatever is still pending.
        let thread = thread::Builder::new()
            .name("botx-scheduler".to_string())
            .spawn(move || {
                rt.block_on(async {
                    let _ = stop_rx.await;
                });
            })?;

        *scheduler = SchedulerSlot::Running(Scheduler {
            handle,
            stop_tx,
            thread,
        });
        info!("Started cooperative scheduler");
        Ok(())
    }

    async fn shutdown(&self) {
        let slot = {
            let mut scheduler = self.scheduler.lock();
            std::mem::replace(&mut *scheduler, SchedulerSlot::Stopped)
        };
        if let SchedulerSlot::Running(scheduler) = slot {
            let _ = scheduler.stop_tx.send(());
            if scheduler.thread.join().is_err() {
                error!("Scheduler thread panicked");
            }
            info!("Cooperative scheduler stopped");
        }
    }

    fn add_handler(&self, handler: CommandHandler) -> DispatchResult<()> {
        self.reject_blocking(&handler.callable, &handler.trigger_body)?;
        self.state.add_handler(handler);
        Ok(())
    }

    fn register_next_step(
        &self,
        message: &IncomingMessage,
        callable: Callable,
    ) -> DispatchResult<()> {
        self.reject_blocking(&callable, message.body())?;
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
                // Scheduler availability is checked before resolution:
                // resolving consumes a pending continuation, which must not
                // be lost to a parse that cannot schedule it. The lock is
                // held through the spawn so the handle cannot outlive the
                // runtime it points at.
                let slot = self.scheduler.lock();
                let scheduler = match &*slot {
                    SchedulerSlot::Running(scheduler) => scheduler,
                    SchedulerSlot::Idle => return Err(DispatchError::NotStarted),
                    SchedulerSlot::Stopped => return Err(DispatchError::ShutDown),
                };

                let message = decode_message(payload)?;
                let Some((callable, route)) = self.state.resolve(&message) else {
                    return Ok(ParseResult::Command(false));
                };

                let f = match callable {
                    Callable::Cooperative(f) => f,
                    Callable::Blocking(_) => {
                        return Err(DispatchError::HandlerKindMismatch {
                            dispatcher: "cooperative",
                            offered: "blocking",
                            trigger: message.body().to_string(),
                        });
                    }
                };

                let body = message.body().to_string();
                debug!(body = %body, route = route, "Scheduling handler on scheduler thread");
                let fut = f(message, bot);
                scheduler.handle.spawn(async move {
                    if std::panic::AssertUnwindSafe(fut).catch_unwind().await.is_err() {
                        error!(body = %body, "Command handler panicked");
                    }
                });
                Ok(ParseResult::Command(true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{NullBot, incoming};
    use std::time::Duration;
    use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
    use tokio::time::timeout;

    fn notifying(tx: UnboundedSender<&'static str>, tag: &'static str) -> Callable {
        Callable::cooperative(move |_message, _bot| {
            let tx = tx.clone();
            async move {
                tx.send(tag).unwrap();
            }
        })
    }

    async fn expect(rx: &mut tokio::sync::mpsc::UnboundedReceiver<&'static str>) -> &'static str {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("handler did not run in time")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn exact_trigger_match_is_scheduled() {
        let dispatcher = CooperativeDispatcher::new();
        let (tx, mut rx) = unbounded_channel();
        dispatcher
            .add_handler(CommandHandler::builder("hello", notifying(tx, "hello")).build())
            .unwrap();
        dispatcher.start().unwrap();

        let result = dispatcher
            .parse(incoming("/hello world", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();

        assert!(result.was_scheduled());
        assert_eq!(expect(&mut rx).await, "hello");
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn suspending_handler_completes() {
        let dispatcher = CooperativeDispatcher::new();
        let (tx, mut rx) = unbounded_channel();
        dispatcher
            .add_handler(
                CommandHandler::builder(
                    "slow",
                    Callable::cooperative(move |_message, _bot| {
                        let tx = tx.clone();
                        async move {
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            tx.send("slow").unwrap();
                        }
                    }),
                )
                .build(),
            )
            .unwrap();
        dispatcher.start().unwrap();

        dispatcher
            .parse(incoming("/slow", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();
        assert_eq!(expect(&mut rx).await, "slow");
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn next_step_is_consumed_once() {
        let dispatcher = CooperativeDispatcher::new();
        let (tx, mut rx) = unbounded_channel();
        dispatcher.start().unwrap();

        let message = decode_message(incoming("/dialog", true)).unwrap();
        dispatcher
            .register_next_step(&message, notifying(tx, "continuation"))
            .unwrap();

        let first = dispatcher
            .parse(incoming("/dialog", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();
        assert!(first.was_scheduled());
        assert_eq!(expect(&mut rx).await, "continuation");

        let second = dispatcher
            .parse(incoming("/dialog", true), RequestKind::Command, NullBot::boxed())
            .await
            .unwrap();
        assert!(!second.was_scheduled());
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn continuation_survives_a_parse_before_start() {
        let dispatcher = CooperativeDispatcher::new();
        let (tx, mut rx) = unbounded_channel();
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
        assert_eq!(expect(&mut rx).await, "continuation");
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn blocking_handler_is_rejected_before_registration() {
        let dispatcher = CooperativeDispatcher::new();
        let result = dispatcher
            .add_handler(CommandHandler::builder("hello", Callable::blocking(|_, _| {})).build());

        assert!(matches!(
            result,
            Err(DispatchError::HandlerKindMismatch { .. })
        ));
        assert!(dispatcher.status().result.commands.is_empty());
    }

    #[tokio::test]
    async fn parse_before_start_and_after_shutdown_fail() {
        let dispatcher = CooperativeDispatcher::new();
        let (tx, _rx) = unbounded_channel();
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
    async fn status_request_returns_the_menu() {
        let dispatcher = CooperativeDispatcher::new();
        let (tx, _rx) = unbounded_channel();
        dispatcher
            .add_handler(
                CommandHandler::builder("hello", notifying(tx, "hello"))
                    .description("says hi")
                    .build(),
            )
            .unwrap();

        let result = dispatcher
            .parse(serde_json::Value::Null, RequestKind::Status, NullBot::boxed())
            .await
            .unwrap();
        match result {
            ParseResult::Status(status) => {
                assert_eq!(status.result.commands.len(), 1);
                assert_eq!(status.result.commands[0].body, "/hello");
            }
            ParseResult::Command(_) => panic!("expected a status result"),
        }
    }
}
