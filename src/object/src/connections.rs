use std::collections::{btree_map, BTreeMap};

use bitflags::bitflags;

use crate::{hash::FxHashMap, Callable, ConnectError, ObjectHandle, Signal, StringName};

// === ConnectFlags === //

bitflags! {
    #[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ConnectFlags: u32 {
        /// Deliver through the registry's deferred queue instead of during emission.
        const DEFERRED = 1 << 0;
        /// Connections which should be saved alongside their object.
        const PERSIST = 1 << 1;
        /// Disconnect right before the first delivery.
        const ONE_SHOT = 1 << 2;
        /// Allow connecting the same callable more than once, requiring as many disconnections.
        const REFERENCE_COUNTED = 1 << 3;
    }
}

// === Connection === //

/// Describes a single subscription of a [`Callable`] to a [`Signal`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Connection {
    pub signal: Signal,
    pub callable: Callable,
    pub flags: ConnectFlags,
}

// === SignalTable === //

/// Per-object connection bookkeeping, for [`Object`](crate::Object) implementors to embed.
///
/// Subscribers of a signal are keyed by [`Callable`] alone and are delivered to in the callables'
/// total order.
#[derive(Debug, Default)]
#[cfg_attr(test, derive(PartialEq))]
pub struct SignalTable {
    signals: FxHashMap<StringName, SignalSlots>,
}

#[derive(Debug, Default)]
#[cfg_attr(test, derive(PartialEq))]
struct SignalSlots {
    slots: BTreeMap<Callable, SlotState>,
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
struct SlotState {
    flags: ConnectFlags,
    // Only ever above one for `REFERENCE_COUNTED` connections.
    ref_count: u32,
}

impl SignalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signals<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<StringName>,
    {
        let mut table = Self::new();
        for name in names {
            table.add_signal(name);
        }
        table
    }

    /// Declares a signal. Declaring an existing signal again leaves its connections untouched.
    pub fn add_signal(&mut self, name: impl Into<StringName>) {
        self.signals.entry(name.into()).or_default();
    }

    pub fn has_signal(&self, name: StringName) -> bool {
        self.signals.contains_key(&name)
    }

    pub fn signal_names(&self) -> impl Iterator<Item = StringName> + '_ {
        self.signals.keys().copied()
    }

    pub fn connect(
        &mut self,
        signal: StringName,
        callable: Callable,
        flags: ConnectFlags,
    ) -> Result<(), ConnectError> {
        if callable.is_null() {
            return Err(ConnectError::NullCallable);
        }

        let Some(slots) = self.signals.get_mut(&signal) else {
            return Err(ConnectError::NonexistentSignal { signal });
        };

        match slots.slots.entry(callable) {
            btree_map::Entry::Occupied(mut entry) => {
                let state = entry.get_mut();

                if !flags.contains(ConnectFlags::REFERENCE_COUNTED)
                    || !state.flags.contains(ConnectFlags::REFERENCE_COUNTED)
                {
                    tracing::warn!(
                        "callable {:?} is already connected to signal {signal:?}",
                        entry.key()
                    );
                    return Err(ConnectError::AlreadyConnected { signal });
                }

                state.ref_count += 1;
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(SlotState {
                    flags,
                    ref_count: 1,
                });
            }
        }

        Ok(())
    }

    pub fn disconnect(&mut self, signal: StringName, callable: &Callable) -> Result<(), ConnectError> {
        let Some(slots) = self.signals.get_mut(&signal) else {
            return Err(ConnectError::NonexistentSignal { signal });
        };

        let Some(state) = slots.slots.get_mut(callable) else {
            tracing::warn!("callable {callable:?} is not connected to signal {signal:?}");
            return Err(ConnectError::NotConnected { signal });
        };

        state.ref_count -= 1;
        if state.ref_count == 0 {
            slots.slots.remove(callable);
        }

        Ok(())
    }

    pub fn is_connected(&self, signal: StringName, callable: &Callable) -> bool {
        self.signals
            .get(&signal)
            .is_some_and(|slots| slots.slots.contains_key(callable))
    }

    /// Lists the connections to `signal` of the object `me` owning this table.
    pub fn connections(&self, me: ObjectHandle, signal: StringName) -> Vec<Connection> {
        let Some(slots) = self.signals.get(&signal) else {
            return Vec::new();
        };

        slots
            .slots
            .iter()
            .map(|(callable, state)| Connection {
                signal: Signal::from_raw_parts(me, signal),
                callable: callable.clone(),
                flags: state.flags,
            })
            .collect()
    }

    pub fn connection_count(&self, signal: StringName) -> usize {
        self.signals.get(&signal).map_or(0, |slots| slots.slots.len())
    }
}
