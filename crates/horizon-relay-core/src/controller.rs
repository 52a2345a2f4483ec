//! The controller: mediator between models and views.
//!
//! A [`Controller`] strongly owns a list of models and weakly tracks a list
//! of views. It listens to every registered model and forwards each change
//! event, unmodified, to every view that is still alive. In the other
//! direction, views push edits through
//! [`set_model_property`](Controller::set_model_property), which offers the
//! write to every registered model.
//!
//! # Roles
//!
//! The controller composes two capabilities:
//!
//! - [`ChangeListener`]: receives events from models and broadcasts them
//! - [`ChangeDispatcher`]: forwards named property writes to models
//!
//! Models never hold the controller strongly. They hold a small link object
//! with a weak back-reference, so dropping the last `Controller` handle
//! releases it and unsubscribes it from every model it still owns.
//!
//! # Delivery guarantees
//!
//! - Views receive events in registration order.
//! - Each broadcast walks a snapshot of the live views taken when it starts.
//!   A view enrolled during a broadcast first hears the next event; a view
//!   removed during a broadcast still hears the current one.
//! - Dropped views are skipped silently; no error or log is produced.
//! - A view returning an error is logged at `warn` and, with the default
//!   [`ViewErrorPolicy::Isolate`], does not stop delivery to later views.
//! - Property writes are best effort: a model without a matching setter is
//!   skipped, and the caller is never told.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_relay_core::{ChangeEvent, Controller, SinkResult};
//!
//! let controller = Controller::new();
//! let view = Arc::new(|event: &ChangeEvent| -> SinkResult {
//!     println!("{} changed", event.property_name());
//!     Ok(())
//! });
//! controller.add_view(&view);
//! assert_eq!(controller.view_count(), 1);
//!
//! drop(view);
//! assert_eq!(controller.view_count(), 0);
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::Result;
use crate::event::ChangeEvent;
use crate::model::{ChangeListener, ListenerId, Model};
use crate::setter::SETTER_PREFIX;
use crate::value::PropertyValue;
use crate::view::ViewEventSink;
use crate::weak_list::WeakList;

/// Forwards named property writes to models.
pub trait ChangeDispatcher: Send + Sync {
    /// Offer `value` to the setter for `property` on every registered model.
    fn set_model_property(&self, property: &str, value: PropertyValue);
}

/// What the controller does when a view fails to handle an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewErrorPolicy {
    /// Report the failure and keep delivering to the remaining views.
    #[default]
    Isolate,

    /// Report the failure and stop delivering this event.
    Abort,
}

/// Configuration for a [`Controller`].
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Name used in log records.
    pub name: String,
    /// Prefix joined with a property name to form the setter operation name.
    pub setter_prefix: String,
    /// Handling of view failures during a broadcast.
    pub view_error_policy: ViewErrorPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            name: "controller".to_string(),
            setter_prefix: SETTER_PREFIX.to_string(),
            view_error_policy: ViewErrorPolicy::default(),
        }
    }
}

impl ControllerConfig {
    /// Create a configuration with the given controller name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for creating Controllers with custom configuration.
#[derive(Debug, Default)]
pub struct ControllerBuilder {
    config: ControllerConfig,
}

impl ControllerBuilder {
    /// Create a new ControllerBuilder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the controller name used in log records.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the setter operation prefix.
    pub fn setter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.setter_prefix = prefix.into();
        self
    }

    /// Set the view failure policy.
    pub fn view_error_policy(mut self, policy: ViewErrorPolicy) -> Self {
        self.config.view_error_policy = policy;
        self
    }

    /// Build the controller.
    pub fn build(self) -> Controller {
        Controller::with_config(self.config)
    }
}

/// Counts from one broadcast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Views that handled the event successfully.
    pub delivered: usize,
    /// Views that returned an error.
    pub failed: usize,
    /// Whether delivery stopped early under [`ViewErrorPolicy::Abort`].
    pub aborted: bool,
}

struct ModelEntry {
    model: Arc<dyn Model>,
    listener: ListenerId,
}

struct ControllerInner {
    config: ControllerConfig,
    models: Mutex<Vec<ModelEntry>>,
    views: WeakList<dyn ViewEventSink>,
    /// The listener registered on every model.
    link: Arc<ControllerLink>,
}

/// The listener models actually hold; it does not keep the controller alive.
struct ControllerLink {
    controller: Weak<ControllerInner>,
}

impl ChangeListener for ControllerLink {
    fn property_change(&self, event: &ChangeEvent) {
        if let Some(inner) = self.controller.upgrade() {
            inner.broadcast(event);
        }
    }
}

impl ControllerInner {
    #[tracing::instrument(skip_all, target = "horizon_relay_core::controller", level = "trace")]
    fn broadcast(&self, event: &ChangeEvent) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();

        // Views may add or remove views, themselves included, mid-fan-out.
        let views = self.views.snapshot();

        for view in views {
            match view.model_property_change(event) {
                Ok(()) => outcome.delivered += 1,
                Err(err) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        target: "horizon_relay_core::controller",
                        controller = %self.config.name,
                        property = event.property_name(),
                        error = %err,
                        "view failed to handle change"
                    );
                    if self.config.view_error_policy == ViewErrorPolicy::Abort {
                        outcome.aborted = true;
                        break;
                    }
                }
            }
        }

        tracing::trace!(
            target: "horizon_relay_core::controller",
            property = event.property_name(),
            delivered = outcome.delivered,
            failed = outcome.failed,
            "broadcast complete"
        );
        outcome
    }

    #[tracing::instrument(skip_all, target = "horizon_relay_core::controller", level = "trace")]
    fn dispatch(&self, property: &str, value: &PropertyValue) {
        let operation = format!("{}{}", self.config.setter_prefix, property);

        // Snapshot so setters may re-enter the controller.
        let models: Vec<Arc<dyn Model>> = self
            .models
            .lock()
            .iter()
            .map(|entry| Arc::clone(&entry.model))
            .collect();

        for model in models {
            if let Err(err) = model.invoke_setter(&operation, value) {
                tracing::trace!(
                    target: "horizon_relay_core::controller",
                    controller = %self.config.name,
                    error = %err,
                    "model skipped property write"
                );
            }
        }
    }
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        for entry in self.models.get_mut().drain(..) {
            entry
                .model
                .model_base()
                .support()
                .remove_listener_by_id(entry.listener);
        }
    }
}

/// Mediator between models and views.
///
/// `Controller` is a cheap handle; clones share the same registries. See the
/// [module documentation](self) for delivery guarantees.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

impl Controller {
    /// Create a controller with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    /// Create a controller with a custom configuration.
    pub fn with_config(config: ControllerConfig) -> Self {
        let inner = Arc::new_cyclic(|controller| ControllerInner {
            config,
            models: Mutex::new(Vec::new()),
            views: WeakList::new(),
            link: Arc::new(ControllerLink {
                controller: controller.clone(),
            }),
        });
        Self { inner }
    }

    /// Start building a controller.
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::new()
    }

    /// The controller's configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Register a model and subscribe to its changes.
    ///
    /// Registering the same model twice subscribes twice, so each of its
    /// events is broadcast twice.
    pub fn add_model<M: Model>(&self, model: &Arc<M>) {
        let model: Arc<dyn Model> = model.clone();
        self.add_dyn_model(&model);
    }

    /// Register a type-erased model. See [`add_model`](Self::add_model).
    pub fn add_dyn_model(&self, model: &Arc<dyn Model>) {
        let model = Arc::clone(model);
        let listener = model.add_listener(self.inner.link.clone());
        tracing::debug!(
            target: "horizon_relay_core::controller",
            controller = %self.inner.config.name,
            model = %model.model_base().name(),
            "model added"
        );
        self.inner.models.lock().push(ModelEntry { model, listener });
    }

    /// Unregister one registration of a model and unsubscribe from it.
    ///
    /// Removing a model that is not registered does nothing. Returns whether
    /// a registration was removed.
    pub fn remove_model<M: Model>(&self, model: &Arc<M>) -> bool {
        let model: Arc<dyn Model> = model.clone();
        self.remove_dyn_model(&model)
    }

    /// Unregister a type-erased model. See [`remove_model`](Self::remove_model).
    pub fn remove_dyn_model(&self, model: &Arc<dyn Model>) -> bool {
        let target = Arc::as_ptr(model);
        let entry = {
            let mut models = self.inner.models.lock();
            models
                .iter()
                .position(|entry| std::ptr::addr_eq(Arc::as_ptr(&entry.model), target))
                .map(|position| models.remove(position))
        };

        match entry {
            Some(entry) => {
                entry
                    .model
                    .model_base()
                    .support()
                    .remove_listener_by_id(entry.listener);
                tracing::debug!(
                    target: "horizon_relay_core::controller",
                    controller = %self.inner.config.name,
                    model = %entry.model.model_base().name(),
                    "model removed"
                );
                true
            }
            None => false,
        }
    }

    /// Check whether a model is registered.
    pub fn contains_model<M: Model>(&self, model: &Arc<M>) -> bool {
        let model: Arc<dyn Model> = model.clone();
        self.contains_dyn_model(&model)
    }

    /// Check whether a type-erased model is registered.
    pub fn contains_dyn_model(&self, model: &Arc<dyn Model>) -> bool {
        let target = Arc::as_ptr(model);
        self.inner
            .models
            .lock()
            .iter()
            .any(|entry| std::ptr::addr_eq(Arc::as_ptr(&entry.model), target))
    }

    /// Number of model registrations, duplicates included.
    pub fn model_count(&self) -> usize {
        self.inner.models.lock().len()
    }

    /// Start tracking a view.
    ///
    /// The controller keeps only a weak reference: the caller must hold the
    /// view for as long as it should receive events. A dropped view silently
    /// stops receiving them.
    pub fn add_view<V: ViewEventSink + 'static>(&self, view: &Arc<V>) {
        let view: Arc<dyn ViewEventSink> = view.clone();
        self.add_dyn_view(&view);
    }

    /// Start tracking a type-erased view. See [`add_view`](Self::add_view).
    pub fn add_dyn_view(&self, view: &Arc<dyn ViewEventSink>) {
        self.inner.views.push(view);
        tracing::debug!(
            target: "horizon_relay_core::controller",
            controller = %self.inner.config.name,
            "view added"
        );
    }

    /// Stop tracking a view. Returns whether a live registration was removed.
    pub fn remove_view<V: ViewEventSink + 'static>(&self, view: &Arc<V>) -> bool {
        let view: Arc<dyn ViewEventSink> = view.clone();
        self.remove_dyn_view(&view)
    }

    /// Stop tracking a type-erased view. See [`remove_view`](Self::remove_view).
    pub fn remove_dyn_view(&self, view: &Arc<dyn ViewEventSink>) -> bool {
        let removed = self.inner.views.remove(view);
        if removed {
            tracing::debug!(
                target: "horizon_relay_core::controller",
                controller = %self.inner.config.name,
                "view removed"
            );
        }
        removed
    }

    /// Number of live views. Prunes dropped views as a side effect.
    pub fn view_count(&self) -> usize {
        self.inner.views.len()
    }

    /// The view at `index`, or `None` if it has been dropped.
    ///
    /// Indices shift whenever dropped views are pruned.
    pub fn view(&self, index: usize) -> Result<Option<Arc<dyn ViewEventSink>>> {
        Ok(self.inner.views.get(index)?)
    }

    /// Deliver `event` to every live view and report the counts.
    pub fn broadcast(&self, event: &ChangeEvent) -> BroadcastOutcome {
        self.inner.broadcast(event)
    }

    /// Offer `value` to the `prefix + property` setter of every registered
    /// model.
    ///
    /// Models without a setter of that name, or whose setter takes a
    /// different type, are skipped. This never fails.
    pub fn set_model_property(&self, property: &str, value: impl Into<PropertyValue>) {
        self.inner.dispatch(property, &value.into());
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeListener for Controller {
    fn property_change(&self, event: &ChangeEvent) {
        self.inner.broadcast(event);
    }
}

impl ChangeDispatcher for Controller {
    fn set_model_property(&self, property: &str, value: PropertyValue) {
        self.inner.dispatch(property, &value);
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.inner.config.name)
            .field("model_count", &self.model_count())
            .field("views", &self.inner.views)
            .finish()
    }
}

static_assertions::assert_impl_all!(Controller: Send, Sync, Clone);
static_assertions::assert_impl_all!(WeakList<dyn ViewEventSink>: Send, Sync);
