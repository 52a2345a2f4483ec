//! Prelude module for Horizon Relay.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_relay::prelude::*;
//! ```
//!
//! This provides access to:
//! - The mediator (`Controller`, `ControllerBuilder`, `ViewErrorPolicy`)
//! - Model plumbing (`Model`, `ModelBase`, `Property`, `#[derive(Model)]`)
//! - View plumbing (`ViewEventSink`, `ChangeEvent`, `SinkResult`)

// ============================================================================
// Controller
// ============================================================================

pub use crate::{
    BroadcastOutcome, ChangeDispatcher, Controller, ControllerBuilder, ControllerConfig,
    ViewErrorPolicy,
};

// ============================================================================
// Models
// ============================================================================

pub use crate::{ChangeListener, Model, ModelBase, Property, PropertyValue, SetterTable};

// ============================================================================
// Views
// ============================================================================

pub use crate::{ChangeEvent, SinkError, SinkResult, ViewEventSink};

// ============================================================================
// Errors
// ============================================================================

pub use crate::{DispatchError, DispatchResult, RegistryError, RelayError};
