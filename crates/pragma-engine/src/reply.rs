//! Single-assignment result slots.
//!
//! A command carries a [`Responder`], the engine side of its slot. Completing
//! a responder consumes it, so a slot can never be written twice. The caller
//! side is either a [`Reply`] (await it, or block on it from a plain thread)
//! or a continuation that the worker invokes inline on completion.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::warn;

use crate::error::{EngineError, EngineResult};

type Callback<T> = Box<dyn FnOnce(EngineResult<T>) + Send + 'static>;

enum Delivery<T> {
    Channel(oneshot::Sender<EngineResult<T>>),
    Callback(Callback<T>),
}

/// Engine side of a result slot.
pub struct Responder<T> {
    delivery: Delivery<T>,
}

/// Create a connected responder/reply pair.
pub fn slot<T>() -> (Responder<T>, Reply<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Responder {
            delivery: Delivery::Channel(tx),
        },
        Reply { rx },
    )
}

impl<T> Responder<T> {
    /// A responder that runs `callback` with the outcome.
    ///
    /// The callback runs on the engine's worker thread. A panic inside it is
    /// caught and logged.
    pub fn callback(callback: impl FnOnce(EngineResult<T>) + Send + 'static) -> Self {
        Self {
            delivery: Delivery::Callback(Box::new(callback)),
        }
    }

    /// Resolve the slot. Returns `false` if nobody observed the outcome,
    /// either because the reply was dropped or the callback panicked.
    pub(crate) fn complete(self, outcome: EngineResult<T>) -> bool {
        match self.delivery {
            Delivery::Channel(tx) => tx.send(outcome).is_ok(),
            Delivery::Callback(callback) => {
                match panic::catch_unwind(AssertUnwindSafe(move || callback(outcome))) {
                    Ok(()) => true,
                    Err(_) => {
                        warn!("command continuation panicked");
                        false
                    }
                }
            }
        }
    }
}

impl<T> std::fmt::Debug for Responder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.delivery {
            Delivery::Channel(_) => "channel",
            Delivery::Callback(_) => "callback",
        };
        f.debug_struct("Responder").field("delivery", &kind).finish()
    }
}

/// Caller side of a result slot.
///
/// Await it from async code, or call [`Reply::wait`] from a plain thread.
#[derive(Debug)]
pub struct Reply<T> {
    rx: oneshot::Receiver<EngineResult<T>>,
}

impl<T> Reply<T> {
    /// Block the current thread until the outcome is available.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an async runtime; await the reply
    /// there instead. Never call it from a command continuation, which runs
    /// on the worker that would have to produce the outcome.
    pub fn wait(self) -> EngineResult<T> {
        debug_assert!(
            tokio::runtime::Handle::try_current().is_err(),
            "Reply::wait called inside an async runtime; await the reply instead"
        );
        self.rx.blocking_recv().unwrap_or(Err(EngineError::Dropped))
    }

    /// The outcome if it is already available, without blocking.
    pub fn try_take(&mut self) -> Option<EngineResult<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(EngineError::Dropped)),
        }
    }
}

impl<T> Future for Reply<T> {
    type Output = EngineResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(EngineError::Dropped)))
    }
}
