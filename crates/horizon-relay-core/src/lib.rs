//! Core systems for Horizon Relay.
//!
//! This crate provides the building blocks of a Model-View-Controller
//! mediator:
//!
//! - **Weak Registry**: An ordered list of weak observer references that
//!   prunes itself as referents are dropped
//! - **Models**: State holders with an ordered change-listener registry
//! - **Views**: Passive receivers of change events
//! - **Controller**: Owns models, weakly tracks views, broadcasts every model
//!   change to every live view and routes property writes back to models
//! - **Setter Tables**: Name- and type-guarded setter dispatch
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use horizon_relay_core::{
//!     ChangeEvent, Controller, DispatchResult, Model, ModelBase, Property, PropertyValue,
//!     SinkResult,
//! };
//!
//! struct Counter {
//!     base: ModelBase,
//!     value: Property<i32>,
//! }
//!
//! impl Model for Counter {
//!     fn model_base(&self) -> &ModelBase {
//!         &self.base
//!     }
//!
//!     fn invoke_setter(&self, operation: &str, value: &PropertyValue) -> DispatchResult<()> {
//!         match (operation, value.downcast_ref::<i32>()) {
//!             ("setValue", Some(new)) => {
//!                 if let Some(old) = self.value.replace(*new) {
//!                     self.fire_change("Value", Some(old.into()), Some(value.clone()));
//!                 }
//!                 Ok(())
//!             }
//!             _ => Err(horizon_relay_core::DispatchError::no_such_operation(operation)),
//!         }
//!     }
//! }
//!
//! let controller = Controller::new();
//! let counter = Arc::new(Counter { base: ModelBase::new(), value: Property::new(0) });
//! controller.add_model(&counter);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_by_view = seen.clone();
//! let view = Arc::new(move |event: &ChangeEvent| -> SinkResult {
//!     seen_by_view.lock().push(*event.new_as::<i32>().unwrap());
//!     Ok(())
//! });
//! controller.add_view(&view);
//!
//! controller.set_model_property("Value", 7);
//! assert_eq!(counter.value.get(), 7);
//! assert_eq!(*seen.lock(), vec![7]);
//! ```

pub mod controller;
mod error;
pub mod event;
pub mod logging;
pub mod model;
pub mod property;
pub mod setter;
pub mod value;
pub mod view;
pub mod weak_list;

pub use controller::{
    BroadcastOutcome, ChangeDispatcher, Controller, ControllerBuilder, ControllerConfig,
    ViewErrorPolicy,
};
pub use error::{
    DispatchError, DispatchResult, RegistryError, RegistryResult, RelayError, Result, SinkError,
    SinkResult,
};
pub use event::ChangeEvent;
pub use model::{ChangeListener, ChangeSupport, ListenerId, Model, ModelBase};
pub use property::Property;
pub use setter::{SETTER_PREFIX, SetterTable, setter_name};
pub use value::PropertyValue;
pub use view::ViewEventSink;
pub use weak_list::WeakList;
