use std::{
    any::Any,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use crate::{
    hash::fx_hash_one, CallError, CompareEqualFn, CompareLessFn, CustomCallable, Object,
    ObjectHandle, ObjectRegistry, ReferencedFlag, SignalTable, StringName, Variant, VariantType,
};

pub fn init_seed() {
    let seed = fastrand::u64(..);
    fastrand::seed(seed);
    println!("Set seed to {seed}.");
}

// === Counter === //

/// A scriptable object exposing `foo()`, `add(int)` and a `changed` signal.
#[derive(Debug, PartialEq)]
pub struct Counter {
    pub script: Option<String>,
    pub calls: u32,
    pub total: i64,
    pub signals: SignalTable,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            script: None,
            calls: 0,
            total: 0,
            signals: SignalTable::with_signals(["changed"]),
        }
    }

    pub fn with_script(path: &str) -> Self {
        Self {
            script: Some(path.to_string()),
            ..Self::new()
        }
    }
}

impl Object for Counter {
    fn class_name(&self) -> &str {
        "Counter"
    }

    fn script_path(&self) -> Option<&str> {
        self.script.as_deref()
    }

    fn call(&mut self, method: StringName, args: &[Variant]) -> Result<Variant, CallError> {
        match method.as_str() {
            "foo" => {
                self.calls += 1;
                Ok(Variant::Int(i64::from(self.calls)))
            }
            "add" => {
                match args.len() {
                    0 => return Err(CallError::TooFewArguments { expected: 1 }),
                    1 => {}
                    _ => return Err(CallError::TooManyArguments { expected: 1 }),
                }

                let Some(value) = args[0].as_int() else {
                    return Err(CallError::InvalidArgument {
                        index: 0,
                        expected: VariantType::Int,
                    });
                };

                self.total += value;
                Ok(Variant::Int(self.total))
            }
            _ => Err(CallError::InvalidMethod { method }),
        }
    }

    fn signal_table(&self) -> Option<&SignalTable> {
        Some(&self.signals)
    }

    fn signal_table_mut(&mut self) -> Option<&mut SignalTable> {
        Some(&mut self.signals)
    }
}

// === Probe === //

/// A custom callable which counts its drops. Probes with the same id are equal.
#[derive(Debug)]
pub struct Probe {
    referenced: ReferencedFlag,
    id: i64,
    object: ObjectHandle,
    drops: Arc<AtomicUsize>,
}

impl Probe {
    pub fn new(id: i64) -> (Self, Arc<AtomicUsize>) {
        Self::with_object(id, ObjectHandle::NULL)
    }

    pub fn with_object(id: i64, object: ObjectHandle) -> (Self, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        let probe = Self {
            referenced: ReferencedFlag::new(),
            id,
            object,
            drops: drops.clone(),
        };

        (probe, drops)
    }

    fn compare_equal(a: &dyn CustomCallable, b: &dyn CustomCallable) -> bool {
        let (Some(a), Some(b)) = (a.downcast_ref::<Self>(), b.downcast_ref::<Self>()) else {
            return false;
        };

        a.id == b.id
    }

    fn compare_less(a: &dyn CustomCallable, b: &dyn CustomCallable) -> bool {
        let (Some(a), Some(b)) = (a.downcast_ref::<Self>(), b.downcast_ref::<Self>()) else {
            return false;
        };

        a.id < b.id
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl CustomCallable for Probe {
    fn referenced(&self) -> &ReferencedFlag {
        &self.referenced
    }

    fn call(
        &self,
        _registry: &mut dyn ObjectRegistry,
        args: &[Variant],
    ) -> Result<Variant, CallError> {
        let sum = args.iter().filter_map(Variant::as_int).sum::<i64>();
        Ok(Variant::Int(self.id + sum))
    }

    fn hash_value(&self) -> u64 {
        fx_hash_one(self.id)
    }

    fn to_display_string(&self) -> String {
        format!("Probe({})", self.id)
    }

    fn bound_object(&self) -> ObjectHandle {
        self.object
    }

    fn compare_equal_fn(&self) -> CompareEqualFn {
        Self::compare_equal
    }

    fn compare_less_fn(&self) -> CompareLessFn {
        Self::compare_less
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// === OtherProbe === //

/// A second custom callable kind whose equality comparator never reports a match.
#[derive(Debug)]
pub struct OtherProbe {
    referenced: ReferencedFlag,
    id: i64,
}

impl OtherProbe {
    pub fn new(id: i64) -> Self {
        Self {
            referenced: ReferencedFlag::new(),
            id,
        }
    }

    fn compare_equal(_a: &dyn CustomCallable, _b: &dyn CustomCallable) -> bool {
        false
    }

    fn compare_less(a: &dyn CustomCallable, b: &dyn CustomCallable) -> bool {
        let (Some(a), Some(b)) = (a.downcast_ref::<Self>(), b.downcast_ref::<Self>()) else {
            return false;
        };

        a.id < b.id
    }
}

impl CustomCallable for OtherProbe {
    fn referenced(&self) -> &ReferencedFlag {
        &self.referenced
    }

    fn call(
        &self,
        _registry: &mut dyn ObjectRegistry,
        _args: &[Variant],
    ) -> Result<Variant, CallError> {
        Ok(Variant::Int(-self.id))
    }

    fn hash_value(&self) -> u64 {
        fx_hash_one(("other", self.id))
    }

    fn to_display_string(&self) -> String {
        format!("OtherProbe({})", self.id)
    }

    fn compare_equal_fn(&self) -> CompareEqualFn {
        Self::compare_equal
    }

    fn compare_less_fn(&self) -> CompareLessFn {
        Self::compare_less
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
