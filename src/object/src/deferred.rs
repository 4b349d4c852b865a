use std::{collections::VecDeque, fmt, mem};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{CallError, Callable, ObjectRegistry, Variant};

// === DeferredCall === //

#[derive(Debug, Clone)]
pub struct DeferredCall {
    callable: Callable,
    args: SmallVec<[Variant; 4]>,
}

impl DeferredCall {
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn args(&self) -> &[Variant] {
        &self.args
    }

    pub fn invoke(&self, registry: &mut dyn ObjectRegistry) -> Result<Variant, CallError> {
        self.callable.call(registry, &self.args)
    }
}

// === DeferredCalls === //

/// A queue of calls to be made later, typically at the end of the current frame.
///
/// Pushing only needs a shared reference so the queue can be fed from any thread or from within an
/// emission. Draining hands out the calls queued so far; calls pushed while they are being invoked
/// land in the next batch.
#[derive(Default)]
pub struct DeferredCalls {
    queue: Mutex<VecDeque<DeferredCall>>,
}

impl fmt::Debug for DeferredCalls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredCalls")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl DeferredCalls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, callable: Callable, args: &[Variant]) {
        if callable.is_null() {
            tracing::warn!("ignoring deferred call to a null callable");
            return;
        }

        self.queue.lock().push_back(DeferredCall {
            callable,
            args: args.iter().cloned().collect(),
        });
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn drain(&self) -> Vec<DeferredCall> {
        Vec::from(mem::take(&mut *self.queue.lock()))
    }

    /// Invokes every queued call against `registry` until the queue stays empty, returning the number
    /// of calls made. Failures are logged.
    pub fn flush(&self, registry: &mut dyn ObjectRegistry) -> usize {
        let mut total = 0;

        loop {
            let batch = self.drain();
            if batch.is_empty() {
                break total;
            }

            total += batch.len();

            for call in batch {
                if let Err(err) = call.invoke(registry) {
                    tracing::warn!("deferred call to {:?} failed: {err}", call.callable());
                }
            }
        }
    }
}
