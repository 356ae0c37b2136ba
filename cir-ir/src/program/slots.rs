//! Lazily-constructed auxiliary result buffers keyed by integer

use cir_common::fatal;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// A buffer a stage can park on a program. `KEY` must be unique per type.
pub trait ResultSection: Any {
    const KEY: u32;
}

#[derive(Default)]
pub struct SlotMap {
    slots: HashMap<u32, Box<dyn Any>>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `S`, built with `init` on first use. Later calls ignore
    /// `init` and return the existing slot.
    pub fn get_or_insert<S: ResultSection>(&mut self, init: impl FnOnce() -> S) -> &mut S {
        let slot = self
            .slots
            .entry(S::KEY)
            .or_insert_with(|| Box::new(init()));
        match slot.downcast_mut::<S>() {
            Some(section) => section,
            None => fatal!(
                "result section key {} is already used by a different type than {}",
                S::KEY,
                std::any::type_name::<S>()
            ),
        }
    }

    pub fn get<S: ResultSection>(&self) -> Option<&S> {
        self.slots.get(&S::KEY).and_then(|slot| slot.downcast_ref::<S>())
    }

    /// Drop the slot for `S`; returns whether one existed
    pub fn release<S: ResultSection>(&mut self) -> bool {
        self.slots.remove(&S::KEY).is_some()
    }

    pub fn contains<S: ResultSection>(&self) -> bool {
        self.get::<S>().is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for SlotMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.slots.keys().collect();
        keys.sort();
        f.debug_struct("SlotMap").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Offsets(Vec<u32>);

    impl ResultSection for Offsets {
        const KEY: u32 = 1;
    }

    #[derive(Debug)]
    struct Impostor;

    impl ResultSection for Impostor {
        const KEY: u32 = 1;
    }

    #[test]
    fn test_slot_is_idempotent() {
        let mut slots = SlotMap::new();
        slots.get_or_insert(|| Offsets(vec![1])).0.push(2);
        let again = slots.get_or_insert(|| Offsets(vec![99]));
        assert_eq!(again, &Offsets(vec![1, 2]));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn test_release() {
        let mut slots = SlotMap::new();
        assert!(!slots.release::<Offsets>());
        slots.get_or_insert(|| Offsets(Vec::new()));
        assert!(slots.contains::<Offsets>());
        assert!(slots.release::<Offsets>());
        assert!(slots.is_empty());
        assert_eq!(format!("{slots:?}"), "SlotMap { keys: [] }");
    }

    #[test]
    #[should_panic(expected = "already used by a different type")]
    fn test_key_confusion_is_fatal() {
        let mut slots = SlotMap::new();
        slots.get_or_insert(|| Offsets(Vec::new()));
        slots.get_or_insert(|| Impostor);
    }
}
