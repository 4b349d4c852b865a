use std::{any::Any, borrow::Cow, fmt, ptr};

use crate::{
    hash::fx_hash_one, CallError, CompareEqualFn, CompareLessFn, CustomCallable, ObjectHandle,
    ObjectRegistry, ReferencedFlag, Variant,
};

type ClosureFn =
    dyn Fn(&mut dyn ObjectRegistry, &[Variant]) -> Result<Variant, CallError> + Send + Sync;

// === FnCallable === //

/// A custom callable wrapping a Rust closure, such as a handler handed over by a script bridge.
///
/// Closures have no meaningful notion of equality so an `FnCallable` is only ever equal to itself.
pub struct FnCallable {
    referenced: ReferencedFlag,
    label: Cow<'static, str>,
    bound: ObjectHandle,
    handler: Box<ClosureFn>,
}

impl fmt::Debug for FnCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCallable")
            .field("label", &self.label)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

impl FnCallable {
    pub fn new<F>(label: impl Into<Cow<'static, str>>, handler: F) -> Self
    where
        F: 'static + Send + Sync + Fn(&mut dyn ObjectRegistry, &[Variant]) -> Result<Variant, CallError>,
    {
        Self {
            referenced: ReferencedFlag::new(),
            label: label.into(),
            bound: ObjectHandle::NULL,
            handler: Box::new(handler),
        }
    }

    /// Reports `object` as the object this closure acts upon.
    pub fn bound_to(mut self, object: ObjectHandle) -> Self {
        self.bound = object;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn addr(&self) -> *const () {
        ptr::from_ref(self).cast()
    }

    fn compare_equal(a: &dyn CustomCallable, b: &dyn CustomCallable) -> bool {
        ptr::addr_eq(ptr::from_ref(a), ptr::from_ref(b))
    }

    fn compare_less(a: &dyn CustomCallable, b: &dyn CustomCallable) -> bool {
        let (Some(a), Some(b)) = (a.downcast_ref::<Self>(), b.downcast_ref::<Self>()) else {
            return false;
        };

        a.addr() < b.addr()
    }
}

impl CustomCallable for FnCallable {
    fn referenced(&self) -> &ReferencedFlag {
        &self.referenced
    }

    fn call(
        &self,
        registry: &mut dyn ObjectRegistry,
        args: &[Variant],
    ) -> Result<Variant, CallError> {
        (self.handler)(registry, args)
    }

    fn hash_value(&self) -> u64 {
        fx_hash_one(self.addr() as usize)
    }

    fn to_display_string(&self) -> String {
        format!("<closure {}>", self.label)
    }

    fn bound_object(&self) -> ObjectHandle {
        self.bound
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
