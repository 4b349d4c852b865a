use std::{
    any::Any,
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{CallError, ObjectHandle, ObjectRegistry, Variant};

// === CustomCallable === //

/// Decides whether two custom callables of the same kind are equal.
///
/// Both arguments are guaranteed to report this exact function from
/// [`CustomCallable::compare_equal_fn`], so implementations may downcast them to their own type.
pub type CompareEqualFn = fn(&dyn CustomCallable, &dyn CustomCallable) -> bool;

/// Decides whether the first of two custom callables of the same kind sorts before the second.
pub type CompareLessFn = fn(&dyn CustomCallable, &dyn CustomCallable) -> bool;

/// The extension point for [`Callable`](crate::Callable)s which are not a plain object-method pair.
///
/// ## Contract
///
/// - Implementors must embed a [`ReferencedFlag`] and return it from [`referenced`](Self::referenced).
///   A [`Callable`](crate::Callable) raises it when adopting the instance and refuses to adopt an
///   instance whose flag is already raised.
/// - [`compare_equal_fn`](Self::compare_equal_fn) and [`compare_less_fn`](Self::compare_less_fn) must
///   return plain, non-generic functions which are the same for every instance of an implementation
///   and different from those of every other implementation. Avoid marking them `#[inline]` since
///   their address is their identity.
/// - Instances comparing equal must produce the same [`hash_value`](Self::hash_value).
/// - The instance is dropped when the last [`Callable`](crate::Callable) referencing it is dropped.
pub trait CustomCallable: Any + Send + Sync + 'static {
    fn referenced(&self) -> &ReferencedFlag;

    fn call(
        &self,
        registry: &mut dyn ObjectRegistry,
        args: &[Variant],
    ) -> Result<Variant, CallError>;

    fn hash_value(&self) -> u64;

    fn to_display_string(&self) -> String;

    fn bound_object(&self) -> ObjectHandle {
        ObjectHandle::NULL
    }

    fn compare_equal_fn(&self) -> CompareEqualFn;

    fn compare_less_fn(&self) -> CompareLessFn;

    fn as_any(&self) -> &dyn Any;
}

impl dyn CustomCallable {
    pub fn downcast_ref<T: CustomCallable>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn is<T: CustomCallable>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl fmt::Debug for dyn CustomCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

// === ReferencedFlag === //

/// A one-shot flag recording that a custom callable instance has been adopted by a
/// [`Callable`](crate::Callable).
#[derive(Default)]
pub struct ReferencedFlag(AtomicBool);

impl ReferencedFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Raises the flag, returning `false` if it was already raised.
    pub(crate) fn try_set(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl fmt::Debug for ReferencedFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReferencedFlag").field(&self.is_set()).finish()
    }
}
