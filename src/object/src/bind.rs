use std::{any::Any, cmp::Ordering};

use smallvec::SmallVec;

use crate::{
    hash::{fx_hash_one, hash_combine},
    total_cmp_slices, CallError, Callable, CompareEqualFn, CompareLessFn, CustomCallable, ObjectHandle,
    ObjectRegistry, ReferencedFlag, Variant,
};

// === BoundCallable === //

/// A custom callable forwarding to an inner [`Callable`] with extra trailing arguments.
#[derive(Debug)]
pub struct BoundCallable {
    referenced: ReferencedFlag,
    callable: Callable,
    binds: SmallVec<[Variant; 2]>,
}

impl BoundCallable {
    pub fn new(callable: Callable, binds: SmallVec<[Variant; 2]>) -> Self {
        Self {
            referenced: ReferencedFlag::new(),
            callable,
            binds,
        }
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn binds(&self) -> &[Variant] {
        &self.binds
    }

    fn compare_equal(a: &dyn CustomCallable, b: &dyn CustomCallable) -> bool {
        let (Some(a), Some(b)) = (a.downcast_ref::<Self>(), b.downcast_ref::<Self>()) else {
            return false;
        };

        a.order(b).is_eq()
    }

    fn compare_less(a: &dyn CustomCallable, b: &dyn CustomCallable) -> bool {
        let (Some(a), Some(b)) = (a.downcast_ref::<Self>(), b.downcast_ref::<Self>()) else {
            return false;
        };

        a.order(b).is_lt()
    }

    // Both comparators derive from this order.
    fn order(&self, other: &Self) -> Ordering {
        self.callable
            .cmp(&other.callable)
            .then_with(|| total_cmp_slices(&self.binds, &other.binds))
    }
}

impl CustomCallable for BoundCallable {
    fn referenced(&self) -> &ReferencedFlag {
        &self.referenced
    }

    fn call(
        &self,
        registry: &mut dyn ObjectRegistry,
        args: &[Variant],
    ) -> Result<Variant, CallError> {
        let mut full_args = SmallVec::<[Variant; 8]>::with_capacity(args.len() + self.binds.len());
        full_args.extend(args.iter().cloned());
        full_args.extend(self.binds.iter().cloned());

        self.callable.call(registry, &full_args)
    }

    fn hash_value(&self) -> u64 {
        hash_combine(self.callable.hash_value(), fx_hash_one(self.binds.len()))
    }

    fn to_display_string(&self) -> String {
        format!("{:?} (bound {})", self.callable, self.binds.len())
    }

    fn bound_object(&self) -> ObjectHandle {
        self.callable.object()
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
