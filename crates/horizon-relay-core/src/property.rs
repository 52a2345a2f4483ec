//! Property cells for model state.
//!
//! A [`Property<T>`] holds one piece of model state behind a lock and reports
//! whether a write actually changed it. Models use the returned old value to
//! fire change events; `#[derive(Model)]` generates exactly that pattern.
//!
//! # Example
//!
//! ```
//! use horizon_relay_core::property::Property;
//!
//! let weight = Property::new(1.5_f64);
//!
//! // Setting the same value reports no change
//! assert!(weight.replace(1.5).is_none());
//!
//! // A different value hands back the previous one
//! assert_eq!(weight.replace(42.0), Some(1.5));
//! assert_eq!(weight.get(), 42.0);
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A lock-protected value with change detection.
///
/// # Thread Safety
///
/// `Property<T>` uses interior mutability with `RwLock` and is `Send + Sync`
/// whenever `T` is.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Overwrite the value without change detection.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if it changed.
    pub fn set(&self, value: T) -> bool {
        self.replace(value).is_some()
    }

    /// Set the value, returning the previous one if it changed.
    ///
    /// Equal values leave the property untouched and return `None`.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current != value {
            Some(std::mem::replace(&mut *current, value))
        } else {
            None
        }
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.value.read())
            .finish()
    }
}
