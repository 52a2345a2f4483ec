//! Models: state holders that announce their own changes.
//!
//! Every model embeds a [`ModelBase`], which owns a [`ChangeSupport`]
//! listener registry. After mutating its state a model calls
//! [`Model::fire_change`], which synchronously notifies every registered
//! [`ChangeListener`] in registration order.
//!
//! # Key Types
//!
//! - [`Model`] - Trait implemented by every model (usually via `#[derive(Model)]`)
//! - [`ModelBase`] - Helper struct embedded in each model
//! - [`ChangeSupport`] - Ordered listener registry with snapshot fan-out
//! - [`ChangeListener`] - Receiver of change events (e.g. a controller)
//! - [`ListenerId`] - Generation-counted handle for one registration
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_relay_core::model::{ChangeListener, Model, ModelBase};
//! use horizon_relay_core::property::Property;
//! use horizon_relay_core::{ChangeEvent, PropertyValue};
//!
//! struct Thermostat {
//!     base: ModelBase,
//!     target: Property<f64>,
//! }
//!
//! impl Model for Thermostat {
//!     fn model_base(&self) -> &ModelBase {
//!         &self.base
//!     }
//! }
//!
//! impl Thermostat {
//!     fn set_target(&self, value: f64) {
//!         if let Some(old) = self.target.replace(value) {
//!             self.fire_change("Target", Some(PropertyValue::new(old)), Some(PropertyValue::new(value)));
//!         }
//!     }
//! }
//!
//! let model = Thermostat { base: ModelBase::new(), target: Property::new(20.0) };
//! let listener: Arc<dyn ChangeListener> = Arc::new(|event: &ChangeEvent| {
//!     println!("{} -> {:?}", event.property_name(), event.new_as::<f64>());
//! });
//! model.add_listener(listener);
//! model.set_target(21.5);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use slotmap::{SlotMap, new_key_type};

use crate::error::{DispatchError, DispatchResult};
use crate::event::ChangeEvent;
use crate::value::PropertyValue;

new_key_type! {
    /// Handle for one listener registration.
    ///
    /// Handles are generation-counted: a handle whose registration has been
    /// removed never aliases a later registration.
    pub struct ListenerId;
}

/// Receiver of model change events.
pub trait ChangeListener: Send + Sync {
    /// Called synchronously on the firing thread for every change event.
    fn property_change(&self, event: &ChangeEvent);
}

impl<F> ChangeListener for F
where
    F: Fn(&ChangeEvent) + Send + Sync,
{
    fn property_change(&self, event: &ChangeEvent) {
        self(event)
    }
}

struct ListenerEntry {
    listener: Arc<dyn ChangeListener>,
    /// Only events for this property are delivered when set.
    property: Option<Arc<str>>,
}

impl ListenerEntry {
    fn accepts(&self, event: &ChangeEvent) -> bool {
        self.property
            .as_deref()
            .is_none_or(|name| name == event.property_name())
    }
}

#[derive(Default)]
struct ListenerSet {
    entries: SlotMap<ListenerId, ListenerEntry>,
    /// Registration order; `entries` alone does not preserve it.
    order: Vec<ListenerId>,
}

/// An ordered registry of change listeners.
///
/// Registration order is preserved and duplicates are allowed: registering
/// the same listener twice delivers each event to it twice.
///
/// # Thread Safety
///
/// Listeners may be added or removed from any thread, including from inside
/// a listener callback. [`fire`](Self::fire) snapshots the registry under its
/// lock and releases the lock before invoking anyone, so a concurrent
/// add/remove affects the next event, never one in progress.
pub struct ChangeSupport {
    listeners: Mutex<ListenerSet>,
    blocked: AtomicBool,
}

impl ChangeSupport {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(ListenerSet::default()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Register a listener for every property.
    pub fn add_listener(&self, listener: Arc<dyn ChangeListener>) -> ListenerId {
        self.insert(listener, None)
    }

    /// Register a listener for a single property name.
    pub fn add_property_listener(
        &self,
        property: impl Into<Arc<str>>,
        listener: Arc<dyn ChangeListener>,
    ) -> ListenerId {
        self.insert(listener, Some(property.into()))
    }

    fn insert(&self, listener: Arc<dyn ChangeListener>, property: Option<Arc<str>>) -> ListenerId {
        let mut set = self.listeners.lock();
        let id = set.entries.insert(ListenerEntry { listener, property });
        set.order.push(id);
        id
    }

    /// Remove the earliest registration of `listener`.
    ///
    /// Listeners are compared by identity. Returns `false` if the listener is
    /// not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn ChangeListener>) -> bool {
        let target = Arc::as_ptr(listener);
        let removed = {
            let mut set = self.listeners.lock();
            let position = set.order.iter().position(|id| {
                set.entries
                    .get(*id)
                    .is_some_and(|entry| std::ptr::addr_eq(Arc::as_ptr(&entry.listener), target))
            });
            position.and_then(|position| {
                let id = set.order.remove(position);
                set.entries.remove(id)
            })
        };
        // Dropped outside the lock: releasing a listener may re-enter this registry.
        removed.is_some()
    }

    /// Remove one registration by handle.
    pub fn remove_listener_by_id(&self, id: ListenerId) -> bool {
        let removed = {
            let mut set = self.listeners.lock();
            let removed = set.entries.remove(id);
            if removed.is_some() {
                set.order.retain(|registered| *registered != id);
            }
            removed
        };
        removed.is_some()
    }

    /// Number of registrations.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().order.len()
    }

    /// Check whether any registration would receive events for `property`.
    pub fn has_listeners(&self, property: &str) -> bool {
        self.listeners.lock().entries.values().any(|entry| {
            entry
                .property
                .as_deref()
                .is_none_or(|name| name == property)
        })
    }

    /// Suppress (or resume) event delivery.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if delivery is currently suppressed.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Deliver `event` to every matching listener, in registration order.
    ///
    /// A panicking listener is not isolated from the rest of the fan-out.
    #[tracing::instrument(skip_all, target = "horizon_relay_core::model", level = "trace")]
    pub fn fire(&self, event: &ChangeEvent) {
        if self.is_blocked() {
            tracing::trace!(target: "horizon_relay_core::model", "change support blocked, skipping fire");
            return;
        }

        let targets: Vec<Arc<dyn ChangeListener>> = {
            let set = self.listeners.lock();
            set.order
                .iter()
                .filter_map(|id| set.entries.get(*id))
                .filter(|entry| entry.accepts(event))
                .map(|entry| Arc::clone(&entry.listener))
                .collect()
        };

        tracing::trace!(
            target: "horizon_relay_core::model",
            property = event.property_name(),
            listener_count = targets.len(),
            "firing change"
        );

        for listener in targets {
            listener.property_change(event);
        }
    }

    /// Fire a change from typed old and new values.
    ///
    /// Nothing is fired when the values are equal. Returns whether an event
    /// was fired.
    pub fn fire_property_change<T>(&self, property: &str, old: T, new: T) -> bool
    where
        T: Any + Send + Sync + PartialEq,
    {
        if old == new {
            return false;
        }
        self.fire(&ChangeEvent::new(
            property,
            Some(PropertyValue::new(old)),
            Some(PropertyValue::new(new)),
        ));
        true
    }
}

impl Default for ChangeSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSupport")
            .field("listener_count", &self.listener_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

/// State shared by every model: its listener registry and a debug name.
#[derive(Debug, Default)]
pub struct ModelBase {
    support: ChangeSupport,
    name: RwLock<String>,
}

impl ModelBase {
    /// Create an unnamed base.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a base with a debug name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            support: ChangeSupport::new(),
            name: RwLock::new(name.into()),
        }
    }

    /// The model's listener registry.
    pub fn support(&self) -> &ChangeSupport {
        &self.support
    }

    /// The debug name (empty if unnamed).
    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// Set the debug name.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }
}

/// A state holder that announces its changes to listeners.
///
/// Implementors supply [`model_base`](Self::model_base); everything else has
/// a default. Models that accept named property writes from a controller
/// override [`invoke_setter`](Self::invoke_setter), either through
/// `#[derive(Model)]` or by delegating to a
/// [`SetterTable`](crate::setter::SetterTable).
pub trait Model: Any + Send + Sync {
    /// The embedded base holding the listener registry.
    fn model_base(&self) -> &ModelBase;

    /// Register a listener for every property change of this model.
    fn add_listener(&self, listener: Arc<dyn ChangeListener>) -> ListenerId {
        self.model_base().support().add_listener(listener)
    }

    /// Remove the earliest registration of `listener`.
    fn remove_listener(&self, listener: &Arc<dyn ChangeListener>) -> bool {
        self.model_base().support().remove_listener(listener)
    }

    /// Notify every listener that `property` changed.
    ///
    /// Implementations call this after mutating their state.
    fn fire_change(
        &self,
        property: &str,
        old_value: Option<PropertyValue>,
        new_value: Option<PropertyValue>,
    ) {
        self.model_base()
            .support()
            .fire(&ChangeEvent::new(property, old_value, new_value));
    }

    /// Invoke the setter named `operation` with `value`.
    ///
    /// The default model exposes no setters.
    fn invoke_setter(&self, operation: &str, value: &PropertyValue) -> DispatchResult<()> {
        let _ = value;
        Err(DispatchError::no_such_operation(operation))
    }

    /// Names of the setter operations this model accepts.
    fn setter_operations(&self) -> Vec<String> {
        Vec::new()
    }
}
