use crate::report::{CountReport, Reporter};
use crate::ticker::ReportTicker;
use chrono::{DateTime, Local};
use headcount_core::{Embedding, FaceAnalyzer, PresenceRegistry};
use headcount_hw::{count_label, CameraError, Display, DisplayError, FaceBox, FrameError, FrameSource, Headless, Overlay};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("frame capture failed: {0}")]
    Capture(#[from] CameraError),
    #[error("frame rejected: {0}")]
    Frame(#[from] FrameError),
    #[error("display failed: {0}")]
    Display(#[from] DisplayError),
}

/// What the loop should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

/// The counting loop: capture, analyze, update presence, render, report.
///
/// Everything runs on the caller's thread. The registry is owned here and
/// touched only by [`Engine::step_at`].
pub struct Engine<S, A> {
    source: S,
    analyzer: A,
    registry: PresenceRegistry,
    ticker: ReportTicker,
    display: Box<dyn Display>,
    overlay: Overlay,
    reporter: Option<Box<dyn Reporter>>,
}

impl<S: FrameSource, A: FaceAnalyzer> Engine<S, A> {
    /// Headless, box-only overlay and no reporting until configured otherwise.
    pub fn new(source: S, analyzer: A, registry: PresenceRegistry, ticker: ReportTicker) -> Self {
        Self {
            source,
            analyzer,
            registry,
            ticker,
            display: Box::new(Headless),
            overlay: Overlay::boxes_only(),
            reporter: None,
        }
    }

    pub fn with_display(mut self, display: Box<dyn Display>) -> Self {
        self.display = display;
        self
    }

    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn registry(&self) -> &PresenceRegistry {
        &self.registry
    }

    /// Run until quit, an external stop request, or a capture failure.
    ///
    /// `stop` is checked between iterations, never mid-frame.
    pub fn run(&mut self, stop: impl Fn() -> bool) -> Result<(), EngineError> {
        tracing::info!("counting loop started");
        loop {
            if stop() {
                tracing::info!("stop requested");
                break;
            }
            match self.step()? {
                Step::Continue => {}
                Step::Quit => {
                    tracing::info!("quit requested");
                    break;
                }
            }
        }
        tracing::info!(present = self.registry().len(), "counting loop finished");
        Ok(())
    }

    pub fn step(&mut self) -> Result<Step, EngineError> {
        self.step_at(Instant::now(), Local::now())
    }

    /// One iteration with explicit clocks: `now` drives expiry, `wall`
    /// drives the report ticker and timestamp.
    pub fn step_at(&mut self, now: Instant, wall: DateTime<Local>) -> Result<Step, EngineError> {
        let frame = self.source.next_frame().map_err(|e| {
            tracing::error!(error = %e, "could not read frame");
            e
        })?;

        let observations = self
            .analyzer
            .analyze(&frame.data, frame.width, frame.height)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, seq = frame.sequence, "face analysis failed; frame skipped");
                Vec::new()
            });

        let (boxes, embeddings): (Vec<FaceBox>, Vec<Embedding>) = observations
            .into_iter()
            .map(|o| {
                let b = FaceBox { x: o.bbox.x, y: o.bbox.y, width: o.bbox.width, height: o.bbox.height };
                (b, o.embedding)
            })
            .unzip();

        let update = self.registry.update(&embeddings, now);
        let count = self.registry.len();
        tracing::trace!(
            faces = boxes.len(),
            expired = update.expired,
            matched = update.matched,
            inserted = update.inserted,
            present = count,
            "frame processed"
        );

        let mut image = frame.into_image()?;
        self.overlay.draw(&mut image, &boxes, count);
        self.display.show(&image, &count_label(count))?;
        if self.display.quit_requested() {
            return Ok(Step::Quit);
        }

        if self.ticker.poll(wall.timestamp()) {
            self.report(&wall, count);
        }

        Ok(Step::Continue)
    }

    fn report(&mut self, wall: &DateTime<Local>, count: usize) {
        let Some(reporter) = self.reporter.as_mut() else {
            return;
        };
        let report = CountReport::at(wall, count);
        match reporter.send(&report) {
            Ok(status) => tracing::info!(status, fecha = %report.timestamp, cantidad = report.count, "passenger count sent"),
            Err(e) => tracing::warn!(error = %e, cantidad = report.count, "failed to send passenger count"),
        }
    }
}
