//! View-side capability: receiving change events.

use crate::error::SinkResult;
use crate::event::ChangeEvent;

/// A passive receiver of model change events, such as a view.
///
/// Views are owned by the caller; a controller only tracks them weakly. A
/// view that returns an error is reported by the controller and, under the
/// default policy, does not prevent delivery to the remaining views.
pub trait ViewEventSink: Send + Sync {
    /// Handle a change that happened in one of the controller's models.
    fn model_property_change(&self, event: &ChangeEvent) -> SinkResult;
}

impl<F> ViewEventSink for F
where
    F: Fn(&ChangeEvent) -> SinkResult + Send + Sync,
{
    fn model_property_change(&self, event: &ChangeEvent) -> SinkResult {
        self(event)
    }
}
