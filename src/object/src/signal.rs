use std::fmt;

use crate::{
    fmt::{write_class_prefix, DisplayFromFn},
    Callable, CallableError, ConnectError, ConnectFlags, Connection, ContractViolation,
    ObjectHandle, ObjectRegistry, StringName, Variant,
};

// === Signal === //

/// A named event on the object behind an [`ObjectHandle`].
///
/// A signal is a plain locator: every operation resolves the target through the registry it is
/// given and delegates to the object's own connection bookkeeping. Once the target dies, the signal
/// stays a valid value but becomes inert.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct Signal {
    target: ObjectHandle,
    name: StringName,
}

impl Signal {
    pub fn try_new(target: ObjectHandle, name: impl Into<StringName>) -> Result<Self, CallableError> {
        if target.is_null() {
            return Err(ContractViolation::NullObject.into());
        }

        Ok(Self {
            target,
            name: name.into(),
        })
    }

    /// Builds a signal, reporting a null `target` through `tracing`. The resulting signal is inert.
    pub fn new(target: ObjectHandle, name: impl Into<StringName>) -> Self {
        let name = name.into();

        if target.is_null() {
            tracing::error!("object argument to the signal constructor for {name:?} must be non-null");
        }

        Self { target, name }
    }

    pub(crate) fn from_raw_parts(target: ObjectHandle, name: StringName) -> Self {
        Self { target, name }
    }

    pub fn object(self) -> ObjectHandle {
        self.target
    }

    pub fn name(self) -> StringName {
        self.name
    }

    pub fn is_null(self) -> bool {
        self.target.is_null()
    }

    // === Connections === //

    pub fn connect(
        self,
        registry: &mut dyn ObjectRegistry,
        callable: Callable,
        flags: ConnectFlags,
    ) -> Result<(), ConnectError> {
        let Some(object) = registry.resolve_mut(self.target) else {
            return Err(ConnectError::Unconfigured);
        };

        object.connect(self.name, callable, flags)
    }

    pub fn disconnect(
        self,
        registry: &mut dyn ObjectRegistry,
        callable: &Callable,
    ) -> Result<(), ConnectError> {
        let Some(object) = registry.resolve_mut(self.target) else {
            return Err(ConnectError::Unconfigured);
        };

        object.disconnect(self.name, callable)
    }

    pub fn is_connected(self, registry: &dyn ObjectRegistry, callable: &Callable) -> bool {
        registry
            .resolve(self.target)
            .is_some_and(|object| object.is_connected(self.name, callable))
    }

    pub fn connections(self, registry: &dyn ObjectRegistry) -> Vec<Connection> {
        registry
            .resolve(self.target)
            .map(|object| object.connections(self.target, self.name))
            .unwrap_or_default()
    }

    // === Emission === //

    /// Delivers `args` to every subscriber, returning the number of connections notified.
    ///
    /// `ONE_SHOT` connections are removed before anything is delivered so subscribers may freely
    /// reconnect. `DEFERRED` connections are pushed onto the registry's deferred queue if it has one.
    /// Subscriber failures are logged and do not interrupt the emission.
    pub fn emit(
        self,
        registry: &mut dyn ObjectRegistry,
        args: &[Variant],
    ) -> Result<usize, ConnectError> {
        let Some(object) = registry.resolve_mut(self.target) else {
            return Err(ConnectError::Unconfigured);
        };

        let connections = object.connections(self.target, self.name);

        for conn in &connections {
            if conn.flags.contains(ConnectFlags::ONE_SHOT) {
                // Reference-counted one-shots are dropped entirely.
                while object.disconnect(self.name, &conn.callable).is_ok()
                    && object.is_connected(self.name, &conn.callable)
                {}
            }
        }

        for conn in &connections {
            if conn.flags.contains(ConnectFlags::DEFERRED) {
                if let Some(queue) = registry.deferred_calls() {
                    conn.callable.call_deferred(queue, args);
                    continue;
                }
            }

            if let Err(err) = conn.callable.call(registry, args) {
                tracing::warn!(
                    "error delivering signal {:?} to {:?}: {err}",
                    self.name,
                    conn.callable
                );
            }
        }

        Ok(connections.len())
    }

    // === Formatting === //

    /// Formats the signal as `Class(script)::[signal]name`, resolving the class through `registry`.
    pub fn display<'a>(&'a self, registry: &'a dyn ObjectRegistry) -> impl fmt::Display + 'a {
        DisplayFromFn(move |f: &mut fmt::Formatter| {
            match registry.resolve(self.target) {
                Some(object) => write_class_prefix(f, object.class_name(), object.script_path())?,
                None => f.write_str("null")?,
            }

            write!(f, "::[signal]{}", self.name)
        })
    }

    pub fn to_display_string(&self, registry: &dyn ObjectRegistry) -> String {
        self.display(registry).to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::{test_util::Counter, FnCallable, ObjectArena};

    fn counter_with_changed() -> Counter {
        Counter::new()
    }

    fn tally() -> (Callable, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let callable = Callable::from_custom(FnCallable::new("tally", {
            let hits = hits.clone();
            move |_, _| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(Variant::Nil)
            }
        }));

        (callable, hits)
    }

    #[test]
    fn connect_and_query() {
        let mut registry = ObjectArena::new();
        let source = registry.insert(counter_with_changed());
        let sink = registry.insert(Counter::new());

        let signal = Signal::new(source, "changed");
        let callable = Callable::new(sink, "foo");

        assert_eq!(signal.object(), source);
        assert_eq!(signal.name(), StringName::new("changed"));

        signal
            .connect(&mut registry, callable.clone(), ConnectFlags::empty())
            .unwrap();
        assert!(signal.is_connected(&registry, &callable));

        let connections = signal.connections(&registry);
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].signal, signal);
        assert_eq!(connections[0].callable, callable);

        signal.disconnect(&mut registry, &callable).unwrap();
        assert!(!signal.is_connected(&registry, &callable));
        assert!(signal.connections(&registry).is_empty());
    }

    #[test]
    fn unknown_signals_are_reported() {
        let mut registry = ObjectArena::new();
        let source = registry.insert(Counter::new());
        let signal = Signal::new(source, "missing");

        assert_eq!(
            signal.connect(&mut registry, Callable::new(source, "foo"), ConnectFlags::empty()),
            Err(ConnectError::NonexistentSignal {
                signal: StringName::new("missing")
            })
        );
    }

    #[test]
    fn stale_target_is_inert() {
        let mut registry = ObjectArena::new();
        let source = registry.insert(Counter::new());
        let sink = registry.insert(Counter::new());

        let signal = Signal::new(source, "changed");
        let callable = Callable::new(sink, "foo");
        signal
            .connect(&mut registry, callable.clone(), ConnectFlags::empty())
            .unwrap();

        registry.remove(source);
        registry.insert(Counter::new());

        assert_eq!(
            signal.connect(&mut registry, callable.clone(), ConnectFlags::empty()),
            Err(ConnectError::Unconfigured)
        );
        assert_eq!(
            signal.disconnect(&mut registry, &callable),
            Err(ConnectError::Unconfigured)
        );
        assert!(!signal.is_connected(&registry, &callable));
        assert!(signal.connections(&registry).is_empty());
        assert_eq!(
            signal.emit(&mut registry, &[]),
            Err(ConnectError::Unconfigured)
        );
        assert_eq!(signal.to_display_string(&registry), "null::[signal]changed");
    }

    #[test]
    fn null_signal_is_inert() {
        let mut registry = ObjectArena::<Counter>::new();
        let signal = Signal::new(ObjectHandle::NULL, "changed");

        assert!(signal.is_null());
        assert_eq!(
            Signal::try_new(ObjectHandle::NULL, "changed"),
            Err(CallableError::ContractViolation(ContractViolation::NullObject))
        );
        assert_eq!(
            signal.connect(&mut registry, Callable::NULL, ConnectFlags::empty()),
            Err(ConnectError::Unconfigured)
        );
        assert!(signal.connections(&registry).is_empty());
    }

    #[test]
    fn emit_delivers_to_subscribers() {
        let mut registry = ObjectArena::new();
        let source = registry.insert(Counter::new());
        let sink = registry.insert(Counter::new());

        let signal = Signal::new(source, "changed");
        let (tally, hits) = tally();

        signal
            .connect(&mut registry, Callable::new(sink, "add"), ConnectFlags::empty())
            .unwrap();
        signal
            .connect(&mut registry, tally, ConnectFlags::empty())
            .unwrap();

        assert_eq!(signal.emit(&mut registry, &[Variant::Int(3)]), Ok(2));
        assert_eq!(signal.emit(&mut registry, &[Variant::Int(4)]), Ok(2));

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(registry.get(sink).unwrap().total, 7);
    }

    #[test]
    fn emit_skips_dead_subscribers() {
        let mut registry = ObjectArena::new();
        let source = registry.insert(Counter::new());
        let sink = registry.insert(Counter::new());
        let (tally, hits) = tally();

        let signal = Signal::new(source, "changed");
        signal
            .connect(&mut registry, Callable::new(sink, "foo"), ConnectFlags::empty())
            .unwrap();
        signal
            .connect(&mut registry, tally, ConnectFlags::empty())
            .unwrap();

        registry.remove(sink);

        assert_eq!(signal.emit(&mut registry, &[]), Ok(2));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn one_shot_connections_fire_once() {
        let mut registry = ObjectArena::new();
        let source = registry.insert(Counter::new());
        let (tally, hits) = tally();

        let signal = Signal::new(source, "changed");
        signal
            .connect(&mut registry, tally.clone(), ConnectFlags::ONE_SHOT)
            .unwrap();

        assert_eq!(signal.emit(&mut registry, &[]), Ok(1));
        assert!(!signal.is_connected(&registry, &tally));
        assert_eq!(signal.emit(&mut registry, &[]), Ok(0));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deferred_connections_wait_for_flush() {
        let mut registry = ObjectArena::new();
        let source = registry.insert(Counter::new());
        let (tally, hits) = tally();

        let signal = Signal::new(source, "changed");
        signal
            .connect(&mut registry, tally, ConnectFlags::DEFERRED)
            .unwrap();

        assert_eq!(signal.emit(&mut registry, &[]), Ok(1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(registry.deferred().len(), 1);

        assert_eq!(registry.flush_deferred(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(registry.deferred().is_empty());
    }

    #[test]
    fn display_uses_class_and_script() {
        let mut registry = ObjectArena::new();
        let plain = registry.insert(Counter::new());
        let scripted = registry.insert(Counter::with_script("res://ui/button.gd"));

        assert_eq!(
            Signal::new(plain, "changed").to_display_string(&registry),
            "Counter::[signal]changed"
        );
        assert_eq!(
            Signal::new(scripted, "changed").to_display_string(&registry),
            "Counter(button.gd)::[signal]changed"
        );
    }

    #[test]
    fn signals_order_by_target_then_name() {
        let a = ObjectHandle::new(1, std::num::NonZeroU32::new(1).unwrap());
        let b = ObjectHandle::new(2, std::num::NonZeroU32::new(1).unwrap());

        assert!(Signal::new(a, "zz") < Signal::new(b, "aa"));
        assert!(Signal::new(a, "aa") < Signal::new(a, "zz"));
        assert_eq!(Signal::new(a, "aa"), Signal::new(a, "aa"));
    }
}
