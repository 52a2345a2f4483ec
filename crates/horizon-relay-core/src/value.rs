//! Opaque, type-tagged property payloads.
//!
//! A [`PropertyValue`] carries any `Send + Sync` value behind an `Arc`, so a
//! single change event can be handed to many views without copying its
//! payload. The runtime type is kept so that setter dispatch can select an
//! overload by the value's actual type.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A shared, immutable value of any `'static + Send + Sync` type.
#[derive(Clone)]
pub struct PropertyValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl PropertyValue {
    /// Wrap a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` of the wrapped value (not of the wrapper).
    pub fn value_type_id(&self) -> TypeId {
        Any::type_id(&*self.inner)
    }

    /// The type name of the wrapped value, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the wrapped value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Get a shared handle to the wrapped value as a `T`.
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Check whether two values share the same payload allocation.
    pub fn ptr_eq(&self, other: &PropertyValue) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

macro_rules! impl_from_for_property_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::new(value)
                }
            }
        )*
    };
}

impl_from_for_property_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String,
);

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::new(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Color(u8, u8, u8);

    #[test]
    fn test_value_type_id_is_payload_type() {
        let value = PropertyValue::new(42.0_f64);
        assert_eq!(value.value_type_id(), TypeId::of::<f64>());
        assert_ne!(value.value_type_id(), TypeId::of::<PropertyValue>());
        assert_eq!(value.type_name(), "f64");
    }

    #[test]
    fn test_downcast() {
        let value = PropertyValue::new(Color(1, 2, 3));
        assert!(value.is::<Color>());
        assert!(!value.is::<f64>());
        assert_eq!(value.downcast_ref::<Color>(), Some(&Color(1, 2, 3)));
        assert!(value.downcast_ref::<String>().is_none());
        assert_eq!(*value.downcast_arc::<Color>().unwrap(), Color(1, 2, 3));
    }

    #[test]
    fn test_str_converts_to_string() {
        let value: PropertyValue = "bold".into();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("bold"));
    }

    #[test]
    fn test_clone_shares_payload() {
        let a = PropertyValue::new(vec![1, 2, 3]);
        let b = a.clone();
        let c = PropertyValue::new(vec![1, 2, 3]);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
