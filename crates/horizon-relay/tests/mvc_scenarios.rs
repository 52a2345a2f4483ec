//! End-to-end model/view/controller scenarios.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use horizon_relay::prelude::*;
use parking_lot::Mutex;

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Model)]
struct Scale {
    base: ModelBase,

    #[property]
    weight: Property<f64>,
}

impl Scale {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            base: ModelBase::named("scale"),
            weight: Property::new(0.0),
        })
    }
}

#[derive(Model)]
struct Document {
    base: ModelBase,

    #[property]
    title: Property<String>,

    #[property]
    page_count: Property<u32>,
}

impl Document {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            base: ModelBase::named("document"),
            title: Property::new(String::new()),
            page_count: Property::new(1),
        })
    }
}

/// A hand-written model whose `Zoom` setter accepts both integers and floats.
struct Viewport {
    base: ModelBase,
    zoom: Property<f64>,
}

impl Viewport {
    fn set_zoom(&self, zoom: f64) {
        if let Some(old) = self.zoom.replace(zoom) {
            self.fire_change("Zoom", Some(old.into()), Some(zoom.into()));
        }
    }

    fn set_zoom_percent(&self, percent: i32) {
        self.set_zoom(f64::from(percent) / 100.0);
    }

    fn setters() -> &'static SetterTable<Viewport> {
        static SETTERS: OnceLock<SetterTable<Viewport>> = OnceLock::new();
        SETTERS.get_or_init(|| {
            SetterTable::new()
                .setter("Zoom", Viewport::set_zoom)
                .setter("Zoom", Viewport::set_zoom_percent)
        })
    }
}

impl Model for Viewport {
    fn model_base(&self) -> &ModelBase {
        &self.base
    }

    fn invoke_setter(&self, operation: &str, value: &PropertyValue) -> DispatchResult<()> {
        Self::setters().invoke(self, operation, value)
    }

    fn setter_operations(&self) -> Vec<String> {
        Self::setters().operations()
    }
}

/// A text field that shows one property and pushes user edits back.
struct TextField {
    property: &'static str,
    shown: Mutex<String>,
    dispatcher: Arc<dyn ChangeDispatcher>,
}

impl TextField {
    fn new(property: &'static str, controller: &Controller) -> Arc<Self> {
        let field = Arc::new(Self {
            property,
            shown: Mutex::new(String::new()),
            dispatcher: Arc::new(controller.clone()),
        });
        controller.add_view(&field);
        field
    }

    fn type_text(&self, text: &str) {
        self.dispatcher
            .set_model_property(self.property, PropertyValue::from(text));
    }

    fn shown(&self) -> String {
        self.shown.lock().clone()
    }
}

impl ViewEventSink for TextField {
    fn model_property_change(&self, event: &ChangeEvent) -> SinkResult {
        if event.property_name() != self.property {
            return Ok(());
        }
        let text = event
            .new_as::<String>()
            .ok_or_else(|| SinkError::new("expected a string"))?;
        *self.shown.lock() = text.clone();
        Ok(())
    }
}

type Log = Arc<Mutex<Vec<String>>>;

fn recording_view(tag: &'static str, log: &Log) -> Arc<impl ViewEventSink + use<>> {
    let log = log.clone();
    Arc::new(move |event: &ChangeEvent| -> SinkResult {
        log.lock().push(format!("{tag}:{}", event.property_name()));
        Ok(())
    })
}

fn failing_view(tag: &'static str, log: &Log) -> Arc<impl ViewEventSink + use<>> {
    let log = log.clone();
    Arc::new(move |event: &ChangeEvent| -> SinkResult {
        log.lock().push(format!("{tag}:{}", event.property_name()));
        Err(SinkError::new(format!("{tag} cannot render")))
    })
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Capture formatted log output on this thread until the guard is dropped.
fn capture_logs(directive: &str) -> (CapturedLogs, impl Sized + use<>) {
    use tracing_subscriber::util::SubscriberInitExt;

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let guard = tracing_subscriber::fmt()
        .with_env_filter(directive)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .set_default();
    (logs, guard)
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_weight_reaches_only_matching_model() {
    let controller = Controller::new();
    let scale = Scale::new();
    let document = Document::new();
    controller.add_model(&scale);
    controller.add_model(&document);

    let log = Log::default();
    let view = recording_view("view", &log);
    controller.add_view(&view);

    controller.set_model_property("Weight", 42.0);

    assert_eq!(scale.weight.get(), 42.0);
    assert_eq!(document.title.get(), "");
    assert_eq!(document.page_count.get(), 1);
    assert_eq!(*log.lock(), vec!["view:Weight"]);
}

#[test]
fn test_dropped_view_stops_receiving() {
    let controller = Controller::new();
    let scale = Scale::new();
    controller.add_model(&scale);

    let log = Log::default();
    let v1 = recording_view("v1", &log);
    let v2 = recording_view("v2", &log);
    controller.add_view(&v1);
    controller.add_view(&v2);

    drop(v1);
    scale.set_weight(1.0);

    assert_eq!(*log.lock(), vec!["v2:Weight"]);
    assert_eq!(controller.view_count(), 1);
}

#[test]
fn test_remove_model_twice_is_harmless() {
    let controller = Controller::new();
    let scale = Scale::new();
    let document = Document::new();
    controller.add_model(&scale);
    controller.add_model(&document);

    assert!(controller.remove_model(&scale));
    assert!(!controller.remove_model(&scale));
    assert_eq!(controller.model_count(), 1);
    assert!(controller.contains_model(&document));
}

#[test]
fn test_two_way_text_binding() {
    let controller = Controller::new();
    let document = Document::new();
    controller.add_model(&document);

    let title_field = TextField::new("Title", &controller);
    let mirror = TextField::new("Title", &controller);

    title_field.type_text("Quarterly report");

    assert_eq!(document.title.get(), "Quarterly report");
    assert_eq!(title_field.shown(), "Quarterly report");
    assert_eq!(mirror.shown(), "Quarterly report");

    // A model-side change reaches both fields too.
    document.set_title("Draft".to_string());
    assert_eq!(mirror.shown(), "Draft");
}

#[test]
fn test_overloaded_setter_picks_runtime_type() {
    let controller = Controller::new();
    let viewport = Arc::new(Viewport {
        base: ModelBase::named("viewport"),
        zoom: Property::new(1.0),
    });
    controller.add_model(&viewport);

    controller.set_model_property("Zoom", 2.5);
    assert_eq!(viewport.zoom.get(), 2.5);

    controller.set_model_property("Zoom", 50_i32);
    assert_eq!(viewport.zoom.get(), 0.5);

    // No overload for strings: skipped.
    controller.set_model_property("Zoom", "3x");
    assert_eq!(viewport.zoom.get(), 0.5);
    assert_eq!(viewport.setter_operations(), vec!["setZoom"]);
}

#[test]
fn test_failing_view_is_reported_and_isolated() {
    let (logs, _guard) = capture_logs("horizon_relay_core::controller=warn");

    let controller = Controller::builder().name("editor").build();
    let scale = Scale::new();
    controller.add_model(&scale);

    let log = Log::default();
    let bad = failing_view("bad", &log);
    let good = recording_view("good", &log);
    controller.add_view(&bad);
    controller.add_view(&good);

    scale.set_weight(3.0);

    assert_eq!(*log.lock(), vec!["bad:Weight", "good:Weight"]);
    let output = logs.contents();
    assert!(output.contains("view failed to handle change"));
    assert!(output.contains("bad cannot render"));
    assert!(output.contains("editor"));
}

#[test]
fn test_abort_policy_skips_later_views() {
    let controller = Controller::builder()
        .view_error_policy(ViewErrorPolicy::Abort)
        .build();
    let scale = Scale::new();
    controller.add_model(&scale);

    let log = Log::default();
    let bad = failing_view("bad", &log);
    let good = recording_view("good", &log);
    controller.add_view(&bad);
    controller.add_view(&good);

    scale.set_weight(3.0);
    assert_eq!(*log.lock(), vec!["bad:Weight"]);
}

#[test]
fn test_dispatch_misses_are_silent_at_warn() {
    let (logs, _guard) = capture_logs("horizon_relay_core=warn");

    let controller = Controller::new();
    controller.add_model(&Scale::new());
    controller.set_model_property("Nothing", 1.0);
    controller.set_model_property("Weight", "heavy");

    assert!(logs.contents().is_empty());
}

#[test]
fn test_enrollment_is_logged_at_debug() {
    let (logs, _guard) = capture_logs("horizon_relay_core::controller=debug");

    let controller = Controller::builder().name("inspector").build();
    let scale = Scale::new();
    controller.add_model(&scale);
    controller.remove_model(&scale);

    horizon_relay::relay_debug!("done");

    let output = logs.contents();
    assert!(output.contains("model added"));
    assert!(output.contains("model removed"));
    assert!(output.contains("inspector"));
    // The core target is not enabled by the controller directive.
    assert!(!output.contains("done"));
}

#[test]
fn test_models_changed_from_many_threads() {
    let controller = Controller::new();
    let scales: Vec<_> = (0..4).map(|_| Scale::new()).collect();
    for scale in &scales {
        controller.add_model(scale);
    }

    let received = Arc::new(AtomicUsize::new(0));
    let counter = received.clone();
    let view = Arc::new(move |_: &ChangeEvent| -> SinkResult {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    controller.add_view(&view);

    let handles: Vec<_> = scales
        .iter()
        .cloned()
        .map(|scale| {
            std::thread::spawn(move || {
                for step in 1..=25 {
                    scale.set_weight(f64::from(step));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(received.load(Ordering::SeqCst), 100);
}

#[test]
fn test_dropping_controller_releases_models() {
    let scale = Scale::new();
    let log = Log::default();
    let view = recording_view("view", &log);

    {
        let controller = Controller::new();
        controller.add_model(&scale);
        controller.add_view(&view);
        scale.set_weight(1.0);
    }

    scale.set_weight(2.0);
    assert_eq!(*log.lock(), vec!["view:Weight"]);
    assert_eq!(Arc::strong_count(&scale), 1);
    assert_eq!(scale.model_base().support().listener_count(), 0);
}
