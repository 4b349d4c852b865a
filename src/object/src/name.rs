use std::{cmp::Ordering, fmt, hash, ptr, sync::OnceLock};

use parking_lot::RwLock;

use crate::hash::FxHashSet;

// === Interner === //

fn interner() -> &'static RwLock<FxHashSet<&'static str>> {
    static INTERNER: OnceLock<RwLock<FxHashSet<&'static str>>> = OnceLock::new();

    INTERNER.get_or_init(Default::default)
}

fn intern(text: &str, alloc: impl FnOnce() -> &'static str) -> StringName {
    if text.is_empty() {
        return StringName::EMPTY;
    }

    // Fast path: most names are interned once and looked up many times.
    if let Some(&interned) = interner().read().get(text) {
        return StringName(Some(interned));
    }

    let mut interns = interner().write();
    if let Some(&interned) = interns.get(text) {
        return StringName(Some(interned));
    }

    let interned = alloc();
    interns.insert(interned);
    StringName(Some(interned))
}

// === StringName === //

/// An interned identifier used for method and signal names.
///
/// Every distinct text is interned exactly once so names compare and hash by the address of their
/// interned text in constant time, and reading the text never takes the interner's lock. The empty
/// string is never interned and is represented by [`StringName::EMPTY`].
#[derive(Copy, Clone, Default)]
pub struct StringName(Option<&'static str>);

impl StringName {
    pub const EMPTY: Self = Self(None);

    pub fn new(text: &str) -> Self {
        intern(text, || Box::leak(Box::<str>::from(text)))
    }

    pub fn from_static(text: &'static str) -> Self {
        intern(text, || text)
    }

    pub fn as_str(self) -> &'static str {
        self.0.unwrap_or("")
    }

    pub fn is_empty(self) -> bool {
        self.0.is_none()
    }
}

impl Eq for StringName {}

impl PartialEq for StringName {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            // Both the address and the length are compared since the compiler may place one
            // static literal inside another.
            (Some(a), Some(b)) => ptr::eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl hash::Hash for StringName {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        match self.0 {
            Some(text) => {
                state.write_usize(text.as_ptr() as usize);
                state.write_usize(text.len());
            }
            None => state.write_usize(0),
        }
    }
}

impl Ord for StringName {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }

        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for StringName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for StringName {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<&String> for StringName {
    fn from(text: &String) -> Self {
        Self::new(text)
    }
}

impl From<String> for StringName {
    fn from(text: String) -> Self {
        Self::new(&text)
    }
}

impl PartialEq<str> for StringName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for StringName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StringName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for StringName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <std::borrow::Cow<'de, str> as serde::Deserialize>::deserialize(deserializer)?;
        Ok(Self::new(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let a = StringName::new("name_interning_is_idempotent");
        let b = StringName::new(&String::from("name_interning_is_idempotent"));
        let c = StringName::from_static("name_interning_is_idempotent");

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "name_interning_is_idempotent");
        assert!(!a.is_empty());
    }

    #[test]
    fn empty_text_is_the_empty_name() {
        assert_eq!(StringName::new(""), StringName::EMPTY);
        assert_eq!(StringName::default(), StringName::EMPTY);
        assert!(StringName::EMPTY.is_empty());
        assert_eq!(StringName::EMPTY.as_str(), "");
    }

    #[test]
    fn ordering_follows_text() {
        // Intern in reverse order so that allocation order disagrees with text order.
        let zed = StringName::new("ordering_follows_text_zed");
        let abe = StringName::new("ordering_follows_text_abe");

        assert!(abe < zed);
        assert!(StringName::EMPTY < abe);
        assert_eq!(abe.cmp(&abe), Ordering::Equal);
    }

    #[test]
    fn overlapping_statics_stay_distinct() {
        let whole: &'static str = "name_overlapping_statics";
        let prefix = StringName::from_static(&whole[..4]);
        let full = StringName::from_static(whole);

        assert_ne!(prefix, full);
        assert_eq!(prefix.as_str(), "name");
        assert_eq!(full.as_str(), whole);
    }

    #[test]
    fn text_is_readable_while_interning_is_blocked() {
        let name = StringName::new("name_text_is_readable");

        let _guard = interner().write();
        assert_eq!(name.as_str(), "name_text_is_readable");
        assert!(name < StringName::EMPTY || StringName::EMPTY < name);
    }
}
