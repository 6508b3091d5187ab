//! Test doubles for the export capabilities.

use crate::charts::Figure;
use crate::export::{
    encode_data_uri, Alerter, ChartSurface, ClickHandler, ClipboardAccess, ClipboardItem,
    CopyPngHandler, DataUriFetcher, Document, ExportError, Fetcher, ImageOptions, ImageRenderer,
    TriggerButton, CONTAINER_ID, SURFACE_CLASS, TRIGGER_ID,
};
use super::fetch::FetchResponse;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

pub fn sample_figure() -> Arc<Figure> {
    Arc::new(Figure {
        title: "Sensor Comparison Dashboard".into(),
        x_title: "Time (s)".into(),
        y_title: "Sensor Value".into(),
        subplots: vec![],
    })
}

#[derive(Default)]
pub struct FakeButton {
    handler: Mutex<Option<ClickHandler>>,
    attachments: AtomicUsize,
}

impl FakeButton {
    pub fn attachments(&self) -> usize {
        self.attachments.load(Ordering::SeqCst)
    }

    /// Run the attached handler once; no-op when nothing is attached.
    pub async fn click(&self) {
        let handler = self.handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler().await;
        }
    }
}

impl TriggerButton for FakeButton {
    fn set_on_click(&self, handler: ClickHandler) {
        self.attachments.fetch_add(1, Ordering::SeqCst);
        *self.handler.lock().unwrap() = Some(handler);
    }
}

pub struct FakeDocument {
    button: Mutex<Option<Arc<FakeButton>>>,
    surface: Mutex<Option<ChartSurface>>,
    trigger_lookups: AtomicUsize,
}

impl FakeDocument {
    pub fn new() -> Self {
        Self {
            button: Mutex::new(None),
            surface: Mutex::new(Some(ChartSurface::new(SURFACE_CLASS, sample_figure()))),
            trigger_lookups: AtomicUsize::new(0),
        }
    }

    pub fn mount_button(&self) -> Arc<FakeButton> {
        let button = Arc::new(FakeButton::default());
        *self.button.lock().unwrap() = Some(Arc::clone(&button));
        button
    }

    pub fn remove_surface(&self) {
        *self.surface.lock().unwrap() = None;
    }

    pub fn trigger_lookups(&self) -> usize {
        self.trigger_lookups.load(Ordering::SeqCst)
    }
}

impl Document for FakeDocument {
    fn trigger(&self, id: &str) -> Option<Arc<dyn TriggerButton>> {
        self.trigger_lookups.fetch_add(1, Ordering::SeqCst);
        if id != TRIGGER_ID {
            return None;
        }
        let button = self.button.lock().unwrap().clone()?;
        Some(button)
    }

    fn chart_surface(&self, container_id: &str, class_name: &str) -> Option<ChartSurface> {
        if container_id != CONTAINER_ID {
            return None;
        }
        self.surface
            .lock()
            .unwrap()
            .clone()
            .filter(|s| s.class_name == class_name)
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    requests: Mutex<Vec<ImageOptions>>,
    failure: Mutex<Option<String>>,
    uri: Mutex<Option<String>>,
    yield_first: AtomicBool,
}

impl FakeRenderer {
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn return_uri(&self, uri: &str) {
        *self.uri.lock().unwrap() = Some(uri.to_string());
    }

    pub fn yield_before_returning(&self) {
        self.yield_first.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<ImageOptions> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageRenderer for FakeRenderer {
    async fn to_image(
        &self,
        _surface: &ChartSurface,
        options: ImageOptions,
    ) -> Result<String, ExportError> {
        self.requests.lock().unwrap().push(options);
        if self.yield_first.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(ExportError::Render(message));
        }
        let uri = self.uri.lock().unwrap().clone();
        Ok(uri.unwrap_or_else(|| encode_data_uri("image/png", FAKE_PNG)))
    }
}

#[derive(Default)]
pub struct CountingFetcher {
    calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, uri: &str) -> Result<FetchResponse, ExportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DataUriFetcher.fetch(uri).await
    }
}

pub struct FakeClipboard {
    supported: AtomicBool,
    failure: Mutex<Option<String>>,
    writes: Mutex<Vec<Vec<ClipboardItem>>>,
}

impl FakeClipboard {
    pub fn new() -> Self {
        Self {
            supported: AtomicBool::new(true),
            failure: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn writes(&self) -> Vec<Vec<ClipboardItem>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl ClipboardAccess for FakeClipboard {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    async fn write(&self, items: Vec<ClipboardItem>) -> Result<(), ExportError> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(ExportError::Clipboard(message));
        }
        self.writes.lock().unwrap().push(items);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAlerter {
    messages: Mutex<Vec<String>>,
}

impl RecordingAlerter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Alerter for RecordingAlerter {
    fn alert(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Every double, shared with the handler under test.
pub struct TestEnv {
    pub document: Arc<FakeDocument>,
    pub renderer: Arc<FakeRenderer>,
    pub fetcher: Arc<CountingFetcher>,
    pub clipboard: Arc<FakeClipboard>,
    pub alerter: Arc<RecordingAlerter>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            document: Arc::new(FakeDocument::new()),
            renderer: Arc::new(FakeRenderer::default()),
            fetcher: Arc::new(CountingFetcher::default()),
            clipboard: Arc::new(FakeClipboard::new()),
            alerter: Arc::new(RecordingAlerter::default()),
        }
    }

    pub fn handler(&self) -> CopyPngHandler {
        CopyPngHandler::new(
            self.document.clone(),
            self.renderer.clone(),
            self.fetcher.clone(),
            self.clipboard.clone(),
            self.alerter.clone(),
        )
    }
}

/// Collects ERROR-level tracing events for the current thread.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    errors: Arc<Mutex<Vec<String>>>,
}

impl CapturedLogs {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

struct FieldText(String);

impl Visit for FieldText {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.push_str(&format!("{}={:?} ", field.name(), value));
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }
        let mut text = FieldText(String::new());
        event.record(&mut text);
        self.errors.lock().unwrap().push(text.0);
    }
}
