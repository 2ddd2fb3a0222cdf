//! Bound destinations for flag values.
//!
//! A flag can be bound to a [`Bound<T>`] handle. The parser writes every
//! value it resolves for that flag into the handle, coerced to `T`, and the
//! caller reads it back after parsing.
//!
//! ```
//! use flagwright::{Bound, Flag, Parser};
//!
//! let retries = Bound::new(0i64);
//! let mut parser = Parser::new();
//! parser.register(Flag::new("retries").bind(&retries)).unwrap();
//!
//! assert!(parser.parse(["--retries", "3"]));
//! assert_eq!(retries.get(), 3);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::flag::FlagKind;
use crate::value::parse_bool;

/// Shared handle a flag writes its value into.
pub struct Bound<T>(Arc<Mutex<T>>);

impl<T> Bound<T> {
    /// Create a handle holding an initial value.
    pub fn new(initial: T) -> Self {
        Self(Arc::new(Mutex::new(initial)))
    }

    /// Replace the held value.
    pub fn set(&self, value: T) {
        *self.0.lock() = value;
    }

    /// Run a closure against the held value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.lock())
    }
}

impl<T: Clone> Bound<T> {
    /// A copy of the held value.
    pub fn get(&self) -> T {
        self.0.lock().clone()
    }
}

impl<T> Clone for Bound<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Default> Default for Bound<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Bound<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Bound").field(&*self.0.lock()).finish()
    }
}

/// A type a flag value can be coerced into.
pub trait Bindable: Send + 'static {
    /// The flag kind a binding of this type implies when none is set.
    const KIND: FlagKind;

    /// Name used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Replace `self` with the coerced raw value.
    fn assign(&mut self, raw: &str, split: &dyn Fn(&str) -> Vec<String>) -> Result<(), String>;

    /// Prepare `capacity` indexed slots.
    fn reserve_slots(&mut self, _capacity: usize) -> Result<(), String> {
        Err(format!("{} does not support indexed slots", Self::TYPE_NAME))
    }

    /// Write one indexed slot.
    fn assign_slot(&mut self, _index: usize, _raw: &str) -> Result<(), String> {
        Err(format!("{} does not support indexed slots", Self::TYPE_NAME))
    }
}

impl Bindable for bool {
    const KIND: FlagKind = FlagKind::Standalone;
    const TYPE_NAME: &'static str = "bool";

    fn assign(&mut self, raw: &str, _: &dyn Fn(&str) -> Vec<String>) -> Result<(), String> {
        *self = parse_bool(raw).ok_or_else(|| format!("'{}' is not a boolean", raw))?;
        Ok(())
    }
}

impl Bindable for String {
    const KIND: FlagKind = FlagKind::Single;
    const TYPE_NAME: &'static str = "string";

    fn assign(&mut self, raw: &str, _: &dyn Fn(&str) -> Vec<String>) -> Result<(), String> {
        *self = raw.to_string();
        Ok(())
    }
}

macro_rules! bindable_number {
    ($ty:ty, $name:literal) => {
        impl Bindable for $ty {
            const KIND: FlagKind = FlagKind::Single;
            const TYPE_NAME: &'static str = $name;

            fn assign(
                &mut self,
                raw: &str,
                _: &dyn Fn(&str) -> Vec<String>,
            ) -> Result<(), String> {
                *self = raw.trim().parse::<$ty>().map_err(|e| e.to_string())?;
                Ok(())
            }
        }
    };
}

bindable_number!(i64, "integer");
bindable_number!(u64, "unsigned integer");
bindable_number!(f64, "float");

impl Bindable for Vec<String> {
    const KIND: FlagKind = FlagKind::Chained;
    const TYPE_NAME: &'static str = "list";

    fn assign(&mut self, raw: &str, split: &dyn Fn(&str) -> Vec<String>) -> Result<(), String> {
        *self = split(raw);
        Ok(())
    }

    fn reserve_slots(&mut self, capacity: usize) -> Result<(), String> {
        self.resize(capacity, String::new());
        Ok(())
    }

    fn assign_slot(&mut self, index: usize, raw: &str) -> Result<(), String> {
        let slot = self
            .get_mut(index)
            .ok_or_else(|| format!("slot {} is out of range", index))?;
        *slot = raw.to_string();
        Ok(())
    }
}

/// Type-erased binding stored on a [`Flag`](crate::Flag).
pub trait BindTarget: Send + Sync {
    /// The flag kind this binding implies.
    fn natural_kind(&self) -> FlagKind;

    /// Name used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Coerce and store a value.
    fn assign(&self, raw: &str, split: &dyn Fn(&str) -> Vec<String>) -> Result<(), String>;

    /// Prepare indexed slots.
    fn reserve_slots(&self, capacity: usize) -> Result<(), String>;

    /// Store one indexed slot.
    fn assign_slot(&self, index: usize, raw: &str) -> Result<(), String>;
}

impl<T: Bindable> BindTarget for Bound<T> {
    fn natural_kind(&self) -> FlagKind {
        T::KIND
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn assign(&self, raw: &str, split: &dyn Fn(&str) -> Vec<String>) -> Result<(), String> {
        self.0.lock().assign(raw, split)
    }

    fn reserve_slots(&self, capacity: usize) -> Result<(), String> {
        self.0.lock().reserve_slots(capacity)
    }

    fn assign_slot(&self, index: usize, raw: &str) -> Result<(), String> {
        self.0.lock().assign_slot(index, raw)
    }
}
