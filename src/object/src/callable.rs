use std::{cmp::Ordering, fmt, hash, ptr, sync::Arc};

use smallvec::SmallVec;

use crate::{
    fmt::{write_class_prefix, DisplayFromFn},
    hash::{fx_hash_one, hash_combine},
    BoundCallable, CallError, CallableError, ContractViolation, CustomCallable, DeferredCalls,
    ObjectHandle, ObjectRegistry, StringName, Variant,
};

// === Callable === //

/// A type-erased, reference-semantic callback value.
///
/// A callable is either *standard*, naming a method on the object behind an [`ObjectHandle`], or
/// *custom*, sharing ownership of a [`CustomCallable`] instance. The default callable is the *null*
/// callable: a standard callable with a null target and an empty method name.
///
/// Standard callables never dereference their target until they are called. A callable whose target
/// has been destroyed stays a perfectly valid value; calling it reports [`CallError::StaleTarget`].
pub struct Callable(CallableRepr);

enum CallableRepr {
    Standard {
        target: ObjectHandle,
        method: StringName,
    },
    Custom(Arc<dyn CustomCallable>),
}

impl Callable {
    pub const NULL: Self = Self(CallableRepr::Standard {
        target: ObjectHandle::NULL,
        method: StringName::EMPTY,
    });

    // === Constructors === //

    pub fn try_new(
        target: ObjectHandle,
        method: impl Into<StringName>,
    ) -> Result<Self, CallableError> {
        let method = method.into();

        if method.is_empty() {
            return Err(ContractViolation::EmptyMethod.into());
        }

        if target.is_null() {
            return Err(ContractViolation::NullObject.into());
        }

        Ok(Self(CallableRepr::Standard { target, method }))
    }

    /// Builds a standard callable, reporting contract violations through `tracing` and yielding the
    /// null callable in their stead.
    pub fn new(target: ObjectHandle, method: impl Into<StringName>) -> Self {
        let method = method.into();

        Self::try_new(target, method).unwrap_or_else(|err| {
            tracing::error!("failed to create callable for {target:?}::{method:?}: {err}");
            Self::NULL
        })
    }

    /// Like [`new`](Self::new) but asserts in debug builds that `target` is live in `registry`.
    pub fn from_object(
        registry: &dyn ObjectRegistry,
        target: ObjectHandle,
        method: impl Into<StringName>,
    ) -> Self {
        debug_assert!(
            target.is_null() || registry.is_valid(target),
            "attempted to create a callable targeting dead object {target:?}",
        );

        Self::new(target, method)
    }

    /// Takes shared ownership of `custom`. Fails if the instance was already adopted by another
    /// callable, leaving its reference count untouched.
    pub fn try_adopt(custom: Arc<dyn CustomCallable>) -> Result<Self, CallableError> {
        if !custom.referenced().try_set() {
            return Err(CallableError::AlreadyReferenced);
        }

        Ok(Self(CallableRepr::Custom(custom)))
    }

    pub fn adopt(custom: Arc<dyn CustomCallable>) -> Self {
        Self::try_adopt(custom).unwrap_or_else(|err| {
            tracing::error!("failed to adopt custom callable: {err}");
            Self::NULL
        })
    }

    pub fn from_custom(custom: impl CustomCallable) -> Self {
        Self::adopt(Arc::new(custom))
    }

    // === Queries === //

    pub fn is_null(&self) -> bool {
        matches!(&self.0, CallableRepr::Standard { target, .. } if target.is_null())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.0, CallableRepr::Custom(_))
    }

    pub fn is_standard(&self) -> bool {
        !self.is_custom()
    }

    /// The object this callable acts upon. Custom callables report their bound object, if any.
    pub fn object(&self) -> ObjectHandle {
        match &self.0 {
            CallableRepr::Standard { target, .. } => *target,
            CallableRepr::Custom(custom) => custom.bound_object(),
        }
    }

    pub fn method(&self) -> Result<StringName, CallableError> {
        match &self.0 {
            CallableRepr::Standard { method, .. } => Ok(*method),
            CallableRepr::Custom(custom) => {
                tracing::error!("cannot get the method of custom callable {custom:?}");
                Err(CallableError::InvalidMethodOnCustom)
            }
        }
    }

    pub fn custom(&self) -> Option<&dyn CustomCallable> {
        match &self.0 {
            CallableRepr::Standard { .. } => None,
            CallableRepr::Custom(custom) => Some(&**custom),
        }
    }

    /// The number of callables currently sharing this callable's custom instance.
    pub fn custom_ref_count(&self) -> Option<usize> {
        match &self.0 {
            CallableRepr::Standard { .. } => None,
            CallableRepr::Custom(custom) => Some(Arc::strong_count(custom)),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (CallableRepr::Custom(a), CallableRepr::Custom(b)) => same_instance(&**a, &**b),
            _ => false,
        }
    }

    pub fn hash_value(&self) -> u64 {
        match &self.0 {
            CallableRepr::Standard { target, method } => {
                hash_combine(fx_hash_one(method), target.raw())
            }
            CallableRepr::Custom(custom) => custom.hash_value(),
        }
    }

    // === Invocation === //

    pub fn call(
        &self,
        registry: &mut dyn ObjectRegistry,
        args: &[Variant],
    ) -> Result<Variant, CallError> {
        match &self.0 {
            CallableRepr::Standard { target, .. } if target.is_null() => {
                Err(CallError::TargetIsNull)
            }
            CallableRepr::Standard { target, method } => {
                let Some(object) = registry.resolve_mut(*target) else {
                    return Err(CallError::StaleTarget { target: *target });
                };

                object.call(*method, args)
            }
            CallableRepr::Custom(custom) => custom.call(registry, args),
        }
    }

    pub fn call_deferred(&self, queue: &DeferredCalls, args: &[Variant]) {
        queue.push(self.clone(), args);
    }

    /// Produces a callable which appends `args` to the arguments of every call made through it.
    pub fn bind(&self, args: impl IntoIterator<Item = Variant>) -> Callable {
        Callable::from_custom(BoundCallable::new(
            self.clone(),
            args.into_iter().collect::<SmallVec<_>>(),
        ))
    }

    // === Formatting === //

    /// Formats the callable as `Class(script)::method`, resolving the class through `registry`.
    pub fn display<'a>(&'a self, registry: &'a dyn ObjectRegistry) -> impl fmt::Display + 'a {
        DisplayFromFn(move |f: &mut fmt::Formatter| match &self.0 {
            CallableRepr::Custom(custom) => f.write_str(&custom.to_display_string()),
            CallableRepr::Standard { target, .. } if target.is_null() => f.write_str("null::null"),
            CallableRepr::Standard { target, method } => match registry.resolve(*target) {
                Some(object) => {
                    write_class_prefix(f, object.class_name(), object.script_path())?;
                    write!(f, "::{method}")
                }
                None => write!(f, "null::{method}"),
            },
        })
    }

    pub fn to_display_string(&self, registry: &dyn ObjectRegistry) -> String {
        self.display(registry).to_string()
    }
}

impl Default for Callable {
    fn default() -> Self {
        Self::NULL
    }
}

impl Clone for Callable {
    fn clone(&self) -> Self {
        Self(match &self.0 {
            CallableRepr::Standard { target, method } => CallableRepr::Standard {
                target: *target,
                method: *method,
            },
            CallableRepr::Custom(custom) => CallableRepr::Custom(custom.clone()),
        })
    }

    fn clone_from(&mut self, source: &Self) {
        // Reassigning a shared instance to itself must not touch its reference count.
        if self.ptr_eq(source) {
            return;
        }

        *self = source.clone();
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            CallableRepr::Standard { target, .. } if target.is_null() => {
                f.write_str("Callable(null)")
            }
            CallableRepr::Standard { target, method } => {
                write!(f, "Callable({target:?}::{method})")
            }
            CallableRepr::Custom(custom) => write!(f, "Callable({custom:?})"),
        }
    }
}

impl Eq for Callable {}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (
                CallableRepr::Standard {
                    target: target_a,
                    method: method_a,
                },
                CallableRepr::Standard {
                    target: target_b,
                    method: method_b,
                },
            ) => target_a == target_b && method_a == method_b,
            (CallableRepr::Custom(a), CallableRepr::Custom(b)) => custom_eq(&**a, &**b),
            _ => false,
        }
    }
}

impl Ord for Callable {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (
                CallableRepr::Standard {
                    target: target_a,
                    method: method_a,
                },
                CallableRepr::Standard {
                    target: target_b,
                    method: method_b,
                },
            ) => (target_a, method_a).cmp(&(target_b, method_b)),
            (CallableRepr::Standard { .. }, CallableRepr::Custom(_)) => Ordering::Less,
            (CallableRepr::Custom(_), CallableRepr::Standard { .. }) => Ordering::Greater,
            (CallableRepr::Custom(a), CallableRepr::Custom(b)) => custom_cmp(&**a, &**b),
        }
    }
}

impl PartialOrd for Callable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl hash::Hash for Callable {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_value());
    }
}

// === Custom comparison === //

fn same_instance(a: &dyn CustomCallable, b: &dyn CustomCallable) -> bool {
    ptr::addr_eq(ptr::from_ref(a), ptr::from_ref(b))
}

fn custom_eq(a: &dyn CustomCallable, b: &dyn CustomCallable) -> bool {
    if same_instance(a, b) {
        return true;
    }

    let eq_a = a.compare_equal_fn();
    let eq_b = b.compare_equal_fn();

    ptr::fn_addr_eq(eq_a, eq_b) && eq_a(a, b)
}

fn custom_cmp(a: &dyn CustomCallable, b: &dyn CustomCallable) -> Ordering {
    if custom_eq(a, b) {
        return Ordering::Equal;
    }

    let less_a = a.compare_less_fn();
    let less_b = b.compare_less_fn();

    if !ptr::fn_addr_eq(less_a, less_b) {
        // Different implementation kinds. Function addresses are stable for the lifetime of the
        // process but not across runs, so this order must never be persisted.
        return (less_a as usize).cmp(&(less_b as usize));
    }

    if less_a(a, b) {
        Ordering::Less
    } else if less_a(b, a) {
        Ordering::Greater
    } else {
        // Unequal but unordered by their comparator. Fall back to instance addresses, which are
        // stable while both callables are alive.
        ptr::from_ref(a)
            .cast::<()>()
            .cmp(&ptr::from_ref(b).cast::<()>())
    }
}
