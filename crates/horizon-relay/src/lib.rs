//! Horizon Relay - Model/View/Controller mediation for Rust.
//!
//! This is the main umbrella crate that re-exports all public APIs.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_relay::prelude::*;
//!
//! #[derive(Model)]
//! struct Scale {
//!     base: ModelBase,
//!
//!     #[property]
//!     weight: Property<f64>,
//! }
//!
//! let controller = Controller::new();
//! let scale = Arc::new(Scale { base: ModelBase::new(), weight: Property::new(0.0) });
//! controller.add_model(&scale);
//!
//! let view = Arc::new(|event: &ChangeEvent| -> SinkResult {
//!     println!("{} is now {:?}", event.property_name(), event.new_as::<f64>());
//!     Ok(())
//! });
//! controller.add_view(&view);
//!
//! controller.set_model_property("Weight", 42.0);
//! assert_eq!(scale.weight.get(), 42.0);
//! ```

pub use horizon_relay_core::*;
pub use horizon_relay_macros::*;

pub mod prelude;
