use std::{fmt, num::NonZeroU32};

// === ObjectHandle === //

/// A copyable, non-owning reference to an object living in an [`ObjectRegistry`](crate::ObjectRegistry).
///
/// ## Format
///
/// The slot index takes the most significant half of the word and the slot's generation takes the
/// least significant half. Live generations are always odd (see [`ObjectArena`](crate::ObjectArena))
/// so the all-zero bit-pattern can never name a live slot and is reserved as [`ObjectHandle::NULL`].
///
/// Equality, hashing and ordering all operate on the raw word, which makes a handle usable as a map
/// key and makes a handle to a reused slot compare unequal to any handle of a previous occupant.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    pub const NULL: Self = Self(0);

    pub const fn new(slot: u32, gen: NonZeroU32) -> Self {
        Self(((slot as u64) << 32) | gen.get() as u64)
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn slot(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub const fn gen(self) -> u32 {
        self.0 as u32
    }

    pub const fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }

    pub fn slot_usize(self) -> usize {
        self.slot() as usize
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("ObjectHandle(null)")
        } else {
            write!(f, "ObjectHandle({} @ {})", self.slot(), self.gen())
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ObjectHandle {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ObjectHandle {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <u64 as serde::Deserialize>::deserialize(deserializer).map(Self)
    }
}
