use std::{cmp::Ordering, fmt};

use crate::{Callable, ObjectHandle, Signal, StringName};

// === VariantType === //

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum VariantType {
    Nil,
    Bool,
    Int,
    Float,
    String,
    Name,
    Object,
    Callable,
    Signal,
    Array,
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// === Variant === //

/// An argument or return value passed through a [`Callable`].
///
/// How an object maps these onto its own method parameters is up to the object.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Name(StringName),
    Object(ObjectHandle),
    Callable(Callable),
    Signal(Signal),
    Array(Vec<Variant>),
}

impl Variant {
    pub fn get_type(&self) -> VariantType {
        match self {
            Variant::Nil => VariantType::Nil,
            Variant::Bool(_) => VariantType::Bool,
            Variant::Int(_) => VariantType::Int,
            Variant::Float(_) => VariantType::Float,
            Variant::String(_) => VariantType::String,
            Variant::Name(_) => VariantType::Name,
            Variant::Object(_) => VariantType::Object,
            Variant::Callable(_) => VariantType::Callable,
            Variant::Signal(_) => VariantType::Signal,
            Variant::Array(_) => VariantType::Array,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Variant::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Variant::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Variant::Float(v) => Some(*v),
            Variant::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(v) => Some(v),
            Variant::Name(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Variant::Object(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Variant::Callable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_signal(&self) -> Option<Signal> {
        match self {
            Variant::Signal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Variant]> {
        match self {
            Variant::Array(v) => Some(v),
            _ => None,
        }
    }

    /// A total order over variants, grouping by type first.
    ///
    /// Unlike `==`, floats are compared with [`f64::total_cmp`] so every value, `NaN` included, is
    /// equal to itself. Containers needing a strict order over variants should use this instead.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Variant::Nil, Variant::Nil) => Ordering::Equal,
            (Variant::Bool(a), Variant::Bool(b)) => a.cmp(b),
            (Variant::Int(a), Variant::Int(b)) => a.cmp(b),
            (Variant::Float(a), Variant::Float(b)) => a.total_cmp(b),
            (Variant::String(a), Variant::String(b)) => a.cmp(b),
            (Variant::Name(a), Variant::Name(b)) => a.cmp(b),
            (Variant::Object(a), Variant::Object(b)) => a.cmp(b),
            (Variant::Callable(a), Variant::Callable(b)) => a.cmp(b),
            (Variant::Signal(a), Variant::Signal(b)) => a.cmp(b),
            (Variant::Array(a), Variant::Array(b)) => total_cmp_slices(a, b),
            _ => self.get_type().cmp(&other.get_type()),
        }
    }
}

/// Lexicographic [`Variant::total_cmp`] over two slices.
pub fn total_cmp_slices(a: &[Variant], b: &[Variant]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(a, b)| a.total_cmp(b))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

macro_rules! impl_variant_from {
    ($($ty:ty => $variant:ident),*$(,)?) => {$(
        impl From<$ty> for Variant {
            fn from(value: $ty) -> Self {
                Variant::$variant(value.into())
            }
        }
    )*};
}

impl_variant_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => String,
    &str => String,
    StringName => Name,
    ObjectHandle => Object,
    Callable => Callable,
    Signal => Signal,
    Vec<Variant> => Array,
}

impl From<()> for Variant {
    fn from((): ()) -> Self {
        Variant::Nil
    }
}
