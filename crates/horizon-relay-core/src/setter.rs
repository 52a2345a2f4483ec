//! Named, type-guarded setter tables.
//!
//! A [`SetterTable<M>`] maps operation names such as `"setWeight"` to typed
//! setter functions on a model type `M`. An operation may have several
//! overloads, one per parameter type; [`SetterTable::invoke`] picks the
//! overload whose parameter type is exactly the runtime type of the value.
//!
//! Hand-written models keep one table per type, typically in a `OnceLock`,
//! and delegate [`Model::invoke_setter`](crate::model::Model::invoke_setter)
//! to it:
//!
//! ```
//! use std::sync::OnceLock;
//! use horizon_relay_core::model::{Model, ModelBase};
//! use horizon_relay_core::property::Property;
//! use horizon_relay_core::setter::SetterTable;
//! use horizon_relay_core::{DispatchResult, PropertyValue};
//!
//! struct Scale {
//!     base: ModelBase,
//!     weight: Property<f64>,
//! }
//!
//! impl Scale {
//!     fn set_weight(&self, weight: f64) {
//!         if let Some(old) = self.weight.replace(weight) {
//!             self.fire_change("Weight", Some(old.into()), Some(weight.into()));
//!         }
//!     }
//!
//!     fn setters() -> &'static SetterTable<Scale> {
//!         static SETTERS: OnceLock<SetterTable<Scale>> = OnceLock::new();
//!         SETTERS.get_or_init(|| SetterTable::new().setter("Weight", Scale::set_weight))
//!     }
//! }
//!
//! impl Model for Scale {
//!     fn model_base(&self) -> &ModelBase {
//!         &self.base
//!     }
//!
//!     fn invoke_setter(&self, operation: &str, value: &PropertyValue) -> DispatchResult<()> {
//!         Self::setters().invoke(self, operation, value)
//!     }
//!
//!     fn setter_operations(&self) -> Vec<String> {
//!         Self::setters().operations()
//!     }
//! }
//!
//! let scale = Scale { base: ModelBase::new(), weight: Property::new(0.0) };
//! scale.invoke_setter("setWeight", &PropertyValue::new(42.0_f64)).unwrap();
//! assert_eq!(scale.weight.get(), 42.0);
//! assert!(scale.invoke_setter("setWeight", &PropertyValue::new(42_i32)).is_err());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::error::{DispatchError, DispatchResult};
use crate::value::PropertyValue;

/// Prefix joined with a property name to form its setter operation name.
pub const SETTER_PREFIX: &str = "set";

/// Build the operation name for `property` with the default prefix.
pub fn setter_name(property: &str) -> String {
    format!("{SETTER_PREFIX}{property}")
}

type ApplyFn<M> = Box<dyn Fn(&M, &PropertyValue) + Send + Sync>;

struct SetterEntry<M> {
    type_id: TypeId,
    type_name: &'static str,
    apply: ApplyFn<M>,
}

/// Operation-name to typed-setter mapping for model type `M`.
pub struct SetterTable<M> {
    operations: HashMap<String, Vec<SetterEntry<M>>>,
}

impl<M: 'static> SetterTable<M> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
        }
    }

    /// Register a setter for `property` under the operation name
    /// `"set" + property`, accepting values of type `T`.
    pub fn setter<T, F>(self, property: &str, setter: F) -> Self
    where
        T: Any + Clone + Send + Sync,
        F: Fn(&M, T) + Send + Sync + 'static,
    {
        self.operation(setter_name(property), setter)
    }

    /// Register a setter under an explicit operation name.
    ///
    /// Registering the same name and parameter type again replaces the
    /// previous setter, so at most one overload ever matches a value.
    pub fn operation<T, F>(mut self, operation: impl Into<String>, setter: F) -> Self
    where
        T: Any + Clone + Send + Sync,
        F: Fn(&M, T) + Send + Sync + 'static,
    {
        let entry = SetterEntry {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            apply: Box::new(move |model: &M, value: &PropertyValue| {
                if let Some(value) = value.downcast_ref::<T>() {
                    setter(model, value.clone());
                }
            }),
        };
        let overloads = self.operations.entry(operation.into()).or_default();
        overloads.retain(|existing| existing.type_id != entry.type_id);
        overloads.push(entry);
        self
    }

    /// Invoke `operation` on `model` with `value`.
    ///
    /// Fails with [`DispatchError::NoSuchOperation`] for an unknown name and
    /// [`DispatchError::TypeMismatch`] when no overload takes the value's
    /// runtime type. Nothing is invoked on failure.
    pub fn invoke(&self, model: &M, operation: &str, value: &PropertyValue) -> DispatchResult<()> {
        let overloads = self
            .operations
            .get(operation)
            .ok_or_else(|| DispatchError::no_such_operation(operation))?;
        let entry = overloads
            .iter()
            .find(|entry| entry.type_id == value.value_type_id())
            .ok_or_else(|| DispatchError::type_mismatch(operation, value.type_name()))?;

        tracing::trace!(
            target: "horizon_relay_core::setter",
            operation,
            parameter = entry.type_name,
            "invoking setter"
        );
        (entry.apply)(model, value);
        Ok(())
    }

    /// Check whether an operation with this name exists.
    pub fn contains(&self, operation: &str) -> bool {
        self.operations.contains_key(operation)
    }

    /// All operation names, sorted.
    pub fn operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.operations.keys().cloned().collect();
        names.sort();
        names
    }

    /// Parameter type names accepted by `operation`, in registration order.
    pub fn parameter_types(&self, operation: &str) -> Vec<&'static str> {
        self.operations
            .get(operation)
            .map(|overloads| overloads.iter().map(|entry| entry.type_name).collect())
            .unwrap_or_default()
    }

    /// Number of operation names.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check whether the table has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<M: 'static> Default for SetterTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: 'static> fmt::Debug for SetterTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetterTable")
            .field("operations", &self.operations())
            .finish()
    }
}
