//! Offset values: a cursor into an array or record owned elsewhere
//!
//! An offset holds a weak link to its target, so a value may contain an
//! offset into itself without keeping itself alive. Walks that follow the
//! target (encoding, equality) go through [`OffsetValue::visit_target`],
//! which refuses to enter a target already being walked on this thread.

use super::{Value, ValueData};
use cir_common::{IrError, IrResult};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared, mutable value an offset can point into
pub type ValueHandle = Rc<RefCell<Value>>;

thread_local! {
    static VISITING: RefCell<Vec<*const RefCell<Value>>> = const { RefCell::new(Vec::new()) };
}

/// Marks a target as being walked until dropped
struct Visit(*const RefCell<Value>);

impl Visit {
    fn enter(target: &ValueHandle) -> Option<Self> {
        let ptr = Rc::as_ptr(target);
        VISITING.with(|visiting| {
            let mut visiting = visiting.borrow_mut();
            if visiting.contains(&ptr) {
                return None;
            }
            visiting.push(ptr);
            Some(Visit(ptr))
        })
    }
}

impl Drop for Visit {
    fn drop(&mut self) {
        VISITING.with(|visiting| visiting.borrow_mut().retain(|&ptr| ptr != self.0));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetValue {
    #[serde(skip)]
    target: Weak<RefCell<Value>>,
    /// Target read from an envelope; nothing else owns it
    #[serde(skip)]
    anchor: Option<ValueHandle>,
    position: usize,
}

impl OffsetValue {
    /// Cursor at `position` of `target`. The cursor does not keep the
    /// target alive.
    pub fn new(target: &ValueHandle, position: usize) -> Self {
        Self {
            target: Rc::downgrade(target),
            anchor: None,
            position,
        }
    }

    /// Cursor that owns its target
    pub(crate) fn anchored(target: ValueHandle, position: usize) -> Self {
        Self {
            target: Rc::downgrade(&target),
            anchor: Some(target),
            position,
        }
    }

    /// The target, or an access violation once it has been dropped
    pub fn target(&self) -> IrResult<ValueHandle> {
        match &self.anchor {
            Some(anchor) => Ok(Rc::clone(anchor)),
            None => self
                .target
                .upgrade()
                .ok_or_else(|| IrError::access_violation("offset target has been dropped")),
        }
    }

    pub fn is_dangling(&self) -> bool {
        self.target.strong_count() == 0
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Run `f` on the target. `None` when the target is dead, mutably
    /// borrowed, or already being walked further up this call stack.
    pub(crate) fn visit_target<R>(&self, f: impl FnOnce(&Value) -> R) -> Option<R> {
        let target = self.target.upgrade()?;
        let _visit = Visit::enter(&target)?;
        let value = target.try_borrow().ok()?;
        let result = f(&value);
        Some(result)
    }

    /// Element count of the target
    pub fn len(&self) -> IrResult<usize> {
        let target = self.target()?;
        let len = target.borrow().multi_element_size();
        len
    }

    /// Read the element under the cursor
    pub fn deref(&self) -> IrResult<Value> {
        let handle = self.target()?;
        let target = handle.borrow();
        let element = match target.data() {
            ValueData::Array(array) => array.get(self.position).map(Value::from_primitive),
            ValueData::Record(record) => record
                .get(self.position)
                .map(|entry| entry.value.clone())
                .ok_or(IrError::OutOfBounds {
                    index: self.position,
                    size: record.len(),
                }),
            _ => Err(IrError::invalid_cast(target.category(), "multi-element value")),
        };
        element
    }

    /// Overwrite the array element under the cursor
    pub fn store(&self, value: &Value) -> IrResult<()> {
        let primitive = value
            .as_primitive()
            .ok_or_else(|| IrError::invalid_cast(value.category(), "builtin"))?;
        let handle = self.target()?;
        let mut target = handle.borrow_mut();
        let category = target.category();
        let stored = match target.data_mut() {
            ValueData::Array(array) => array.set(self.position, primitive),
            _ => Err(IrError::invalid_cast(category, "array")),
        };
        stored
    }

    /// Moving past the end is allowed; only dereferencing checks bounds.
    pub fn increment(&mut self) {
        self.position += 1;
    }

    pub fn decrement(&mut self) -> IrResult<()> {
        if self.position == 0 {
            return Err(IrError::OutOfBounds {
                index: 0,
                size: self.len().unwrap_or(0),
            });
        }
        self.position -= 1;
        Ok(())
    }
}

/// Offsets are equal when they sit at the same position of equal targets.
/// A target already under comparison further up is taken as equal there,
/// so self-referential values compare without looping.
impl PartialEq for OffsetValue {
    fn eq(&self, other: &Self) -> bool {
        if self.position != other.position {
            return false;
        }
        if Weak::ptr_eq(&self.target, &other.target) {
            return true;
        }
        match (self.is_dangling(), other.is_dangling()) {
            (true, true) => true,
            (false, false) => self
                .visit_target(|a| other.visit_target(|b| a == b).unwrap_or(true))
                .unwrap_or(true),
            _ => false,
        }
    }
}
