//! Dynamically typed values exchanged between instrumented call sites and overrides.

use std::any::{type_name, Any};
use std::fmt;

/// An owned value of any `'static` type, tagged with the name of that type.
pub struct Value {
    inner: Box<dyn Any>,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Recover the concrete value, or hand the `Value` back untouched.
    pub fn downcast<T: Any>(self) -> Result<T, Value> {
        let Value { inner, type_name } = self;
        match inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Value { inner, type_name }),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.type_name).finish()
    }
}

/// A typed output position the registry writes a single result into.
pub trait ResultSlot {
    /// Store `value`, or return it when its type is not the slot's type.
    fn fill(&mut self, value: Value) -> Result<(), Value>;

    fn expected_type(&self) -> &'static str;

    fn is_filled(&self) -> bool;
}

/// Result slot declared by generated preambles, one per result of the intercepted function.
pub struct Slot<T> {
    value: Option<T>,
}

impl<T: Any> Slot<T> {
    pub fn empty() -> Self {
        Self { value: None }
    }

    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    /// Take the written result.
    ///
    /// A successful dispatch fills every slot, so an empty slot here means the
    /// caller returned early without checking the dispatch outcome.
    pub fn into_inner(self) -> T {
        match self.value {
            Some(value) => value,
            None => panic!(
                "mockexec: result slot of type `{}` was read before an override filled it",
                type_name::<T>()
            ),
        }
    }
}

impl<T: Any> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Any> ResultSlot for Slot<T> {
    fn fill(&mut self, value: Value) -> Result<(), Value> {
        self.value = Some(value.downcast::<T>()?);
        Ok(())
    }

    fn expected_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn is_filled(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("type", &type_name::<T>())
            .field("filled", &self.value.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_round_trip_keeps_type_name() {
        let value = Value::new(String::from("hello"));
        assert_eq!(value.type_name(), "alloc::string::String");
        assert!(value.is::<String>());
        assert_eq!(value.downcast::<String>().unwrap(), "hello");
    }

    #[test]
    fn test_failed_downcast_returns_original_value() {
        let value = Value::new(7u32);
        let value = value.downcast::<i64>().unwrap_err();
        assert_eq!(value.downcast_ref::<u32>(), Some(&7));
    }

    #[test]
    fn test_slot_rejects_wrong_type() {
        let mut slot = Slot::<String>::empty();
        let rejected = slot.fill(Value::new(1u8)).unwrap_err();
        assert!(rejected.is::<u8>());
        assert!(!ResultSlot::is_filled(&slot));

        slot.fill(Value::new(String::from("ok"))).unwrap();
        assert!(slot.is_filled());
        assert_eq!(slot.into_inner(), "ok");
    }

    #[test]
    #[should_panic(expected = "was read before an override filled it")]
    fn test_reading_empty_slot_panics() {
        Slot::<i32>::empty().into_inner();
    }
}
