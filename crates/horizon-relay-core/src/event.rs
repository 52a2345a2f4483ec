//! Change events passed from models to views.

use std::any::Any;
use std::sync::Arc;

use crate::value::PropertyValue;

/// An immutable `(property_name, old_value, new_value)` triple.
///
/// Either value may be absent. The controller forwards events unmodified, so
/// every view observes the same payload allocations.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    property_name: Arc<str>,
    old_value: Option<PropertyValue>,
    new_value: Option<PropertyValue>,
}

impl ChangeEvent {
    /// Create an event.
    pub fn new(
        property_name: impl Into<Arc<str>>,
        old_value: Option<PropertyValue>,
        new_value: Option<PropertyValue>,
    ) -> Self {
        Self {
            property_name: property_name.into(),
            old_value,
            new_value,
        }
    }

    /// The name of the property that changed.
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// The value before the change, if known.
    pub fn old_value(&self) -> Option<&PropertyValue> {
        self.old_value.as_ref()
    }

    /// The value after the change, if any.
    pub fn new_value(&self) -> Option<&PropertyValue> {
        self.new_value.as_ref()
    }

    /// The old value as a `T`, if present and of that type.
    pub fn old_as<T: Any>(&self) -> Option<&T> {
        self.old_value.as_ref().and_then(|value| value.downcast_ref::<T>())
    }

    /// The new value as a `T`, if present and of that type.
    pub fn new_as<T: Any>(&self) -> Option<&T> {
        self.new_value.as_ref().and_then(|value| value.downcast_ref::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let event = ChangeEvent::new(
            "Weight",
            Some(PropertyValue::new(1.5_f64)),
            Some(PropertyValue::new(42.0_f64)),
        );
        assert_eq!(event.property_name(), "Weight");
        assert_eq!(event.old_as::<f64>(), Some(&1.5));
        assert_eq!(event.new_as::<f64>(), Some(&42.0));
        assert!(event.new_as::<i32>().is_none());
    }

    #[test]
    fn test_absent_old_value() {
        let event = ChangeEvent::new("Text", None, Some("hello".into()));
        assert!(event.old_value().is_none());
        assert_eq!(event.new_as::<String>().map(String::as_str), Some("hello"));
    }

    #[test]
    fn test_clone_is_unmodified() {
        let event = ChangeEvent::new("Count", None, Some(PropertyValue::new(3_i32)));
        let copy = event.clone();
        assert!(
            copy.new_value()
                .unwrap()
                .ptr_eq(event.new_value().unwrap())
        );
    }
}
