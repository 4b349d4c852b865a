use std::{fmt, iter, num::NonZeroU32, slice, sync::Arc};

use derive_where::derive_where;

use crate::{DeferredCalls, Object, ObjectHandle, ObjectRegistry};

// === ObjectArena === //

/// A generational slot allocator handing out [`ObjectHandle`]s.
///
/// Each slot carries a generation counter which is odd while the slot is occupied and even while it
/// is vacant. Removing an object bumps its slot's generation so every handle minted for the previous
/// occupant stops resolving, even after the slot is reused. A slot whose generation would wrap back
/// to zero is retired instead of being reused.
#[derive_where(Default)]
pub struct ObjectArena<T> {
    // Invariant: this vector can never be u32::MAX elements in length.
    slots: Vec<ArenaSlot<T>>,
    free_slots: Vec<u32>,
    len: usize,
    deferred: Arc<DeferredCalls>,
}

struct ArenaSlot<T> {
    // Invariant: `value` is `Some` iff `gen` is odd.
    gen: u32,
    value: Option<T>,
}

impl<T> ObjectArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> ObjectHandle {
        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];

            // This cannot overflow because the value is even and `u32::MAX` is odd.
            slot.gen += 1;
            slot.value = Some(value);
            self.len += 1;

            ObjectHandle::new(index, Self::live_gen(slot.gen))
        } else {
            let index = u32::try_from(self.slots.len())
                .ok()
                .filter(|&index| index != u32::MAX)
                .expect("too many slots");

            self.slots.push(ArenaSlot {
                gen: 1,
                value: Some(value),
            });
            self.len += 1;

            ObjectHandle::new(index, Self::live_gen(1))
        }
    }

    fn live_gen(gen: u32) -> NonZeroU32 {
        debug_assert_eq!(gen % 2, 1);
        NonZeroU32::new(gen).expect("live generations are odd")
    }

    // Only odd generations can name a live slot. Rejecting the rest keeps forged handles carrying a
    // vacant slot's generation from matching it.
    fn slot(&self, handle: ObjectHandle) -> Option<&ArenaSlot<T>> {
        if handle.gen() % 2 == 0 {
            return None;
        }

        self.slots
            .get(handle.slot_usize())
            .filter(|slot| slot.gen == handle.gen())
    }

    fn slot_mut(&mut self, handle: ObjectHandle) -> Option<&mut ArenaSlot<T>> {
        if handle.gen() % 2 == 0 {
            return None;
        }

        self.slots
            .get_mut(handle.slot_usize())
            .filter(|slot| slot.gen == handle.gen())
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&T> {
        self.slot(handle)?.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut T> {
        self.slot_mut(handle)?.value.as_mut()
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn remove(&mut self, handle: ObjectHandle) -> Option<T> {
        let slot = self.slot_mut(handle)?;
        let value = slot.value.take()?;

        slot.gen = slot.gen.wrapping_add(1);
        let retired = slot.gen == 0;
        self.len -= 1;

        if retired {
            tracing::trace!("retiring slot {} after exhausting its generations", handle.slot());
        } else {
            self.free_slots.push(handle.slot());
        }

        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> ArenaIter<'_, T> {
        ArenaIter {
            slots: self.slots.iter().enumerate(),
        }
    }

    pub fn deferred(&self) -> &DeferredCalls {
        &self.deferred
    }
}

impl<T: Object> ObjectArena<T> {
    /// Invokes every call queued through [`ObjectRegistry::deferred_calls`], including calls queued
    /// while flushing. Returns the number of calls made.
    pub fn flush_deferred(&mut self) -> usize {
        let deferred = self.deferred.clone();
        deferred.flush(self)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObjectArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();

        for (key, value) in self {
            map.entry(&key, value);
        }

        map.finish()
    }
}

impl<T: Object> ObjectRegistry for ObjectArena<T> {
    fn resolve(&self, handle: ObjectHandle) -> Option<&dyn Object> {
        self.get(handle).map(|obj| obj as &dyn Object)
    }

    fn resolve_mut(&mut self, handle: ObjectHandle) -> Option<&mut dyn Object> {
        self.get_mut(handle).map(|obj| obj as &mut dyn Object)
    }

    fn is_valid(&self, handle: ObjectHandle) -> bool {
        self.contains(handle)
    }

    fn deferred_calls(&self) -> Option<&DeferredCalls> {
        Some(&*self.deferred)
    }
}

impl<'a, T> IntoIterator for &'a ObjectArena<T> {
    type Item = (ObjectHandle, &'a T);
    type IntoIter = ArenaIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive_where(Clone)]
pub struct ArenaIter<'a, T> {
    slots: iter::Enumerate<slice::Iter<'a, ArenaSlot<T>>>,
}

impl<'a, T> Iterator for ArenaIter<'a, T> {
    type Item = (ObjectHandle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, slot) = self.slots.next()?;
            let Some(value) = &slot.value else {
                continue;
            };

            let handle = ObjectHandle::new(index as u32, ObjectArena::<T>::live_gen(slot.gen));
            return Some((handle, value));
        }
    }
}
