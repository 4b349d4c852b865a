use crate::{
    CallError, Callable, ConnectError, ConnectFlags, Connection, DeferredCalls, ObjectHandle,
    SignalTable, StringName, Variant,
};

// === Object === //

/// The engine object behind an [`ObjectHandle`].
///
/// Method dispatch and argument marshalling are entirely up to the implementor. Signal bookkeeping
/// defaults to the object's [`SignalTable`], if it exposes one.
pub trait Object: 'static {
    fn class_name(&self) -> &str;

    /// The path of the script attached to this object, if any.
    fn script_path(&self) -> Option<&str> {
        None
    }

    fn call(&mut self, method: StringName, args: &[Variant]) -> Result<Variant, CallError>;

    fn signal_table(&self) -> Option<&SignalTable> {
        None
    }

    fn signal_table_mut(&mut self) -> Option<&mut SignalTable> {
        None
    }

    fn connect(
        &mut self,
        signal: StringName,
        callable: Callable,
        flags: ConnectFlags,
    ) -> Result<(), ConnectError> {
        match self.signal_table_mut() {
            Some(table) => table.connect(signal, callable, flags),
            None => Err(ConnectError::NonexistentSignal { signal }),
        }
    }

    fn disconnect(&mut self, signal: StringName, callable: &Callable) -> Result<(), ConnectError> {
        match self.signal_table_mut() {
            Some(table) => table.disconnect(signal, callable),
            None => Err(ConnectError::NonexistentSignal { signal }),
        }
    }

    fn is_connected(&self, signal: StringName, callable: &Callable) -> bool {
        self.signal_table()
            .is_some_and(|table| table.is_connected(signal, callable))
    }

    fn connections(&self, me: ObjectHandle, signal: StringName) -> Vec<Connection> {
        self.signal_table()
            .map(|table| table.connections(me, signal))
            .unwrap_or_default()
    }
}

impl<T: ?Sized + Object> Object for Box<T> {
    fn class_name(&self) -> &str {
        (**self).class_name()
    }

    fn script_path(&self) -> Option<&str> {
        (**self).script_path()
    }

    fn call(&mut self, method: StringName, args: &[Variant]) -> Result<Variant, CallError> {
        (**self).call(method, args)
    }

    fn signal_table(&self) -> Option<&SignalTable> {
        (**self).signal_table()
    }

    fn signal_table_mut(&mut self) -> Option<&mut SignalTable> {
        (**self).signal_table_mut()
    }

    fn connect(
        &mut self,
        signal: StringName,
        callable: Callable,
        flags: ConnectFlags,
    ) -> Result<(), ConnectError> {
        (**self).connect(signal, callable, flags)
    }

    fn disconnect(&mut self, signal: StringName, callable: &Callable) -> Result<(), ConnectError> {
        (**self).disconnect(signal, callable)
    }

    fn is_connected(&self, signal: StringName, callable: &Callable) -> bool {
        (**self).is_connected(signal, callable)
    }

    fn connections(&self, me: ObjectHandle, signal: StringName) -> Vec<Connection> {
        (**self).connections(me, signal)
    }
}

// === ObjectRegistry === //

/// Maps [`ObjectHandle`]s to live objects.
///
/// ## Contract
///
/// `resolve` and `resolve_mut` must return `None` for [`ObjectHandle::NULL`] and for any handle
/// whose generation does not match the current occupant of its slot.
pub trait ObjectRegistry {
    fn resolve(&self, handle: ObjectHandle) -> Option<&dyn Object>;

    fn resolve_mut(&mut self, handle: ObjectHandle) -> Option<&mut dyn Object>;

    fn is_valid(&self, handle: ObjectHandle) -> bool {
        self.resolve(handle).is_some()
    }

    /// The queue receiving [`ConnectFlags::DEFERRED`] deliveries. Registries without one deliver
    /// such connections immediately.
    fn deferred_calls(&self) -> Option<&DeferredCalls> {
        None
    }
}
