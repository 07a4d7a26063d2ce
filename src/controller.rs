//! The conversion workflow controller.
//!
//! [`Controller`] owns everything that changes while a user works through
//! one image: the accepted file, the selected output format, the converted
//! artifact and the phase. Hosts call four operations and render what
//! [`Controller::render`] returns:
//!
//! ```text
//!            submit_file ok                convert ok
//!  Empty ─────────────────▶ Ready ──▶ Converting ──────▶ Converted
//!    │                        ▲            │                 │
//!    │ submit_file err        │ cancel     │ convert err     │ submit_file / convert
//!    ▼                        │            ▼                 ▼
//!  Failed ◀───────────────────┴────────  Failed          Ready / Converting
//! ```
//!
//! ## One suspension point
//!
//! Everything is synchronous except the codec call. [`Controller::convert`]
//! awaits it while holding `&mut self`, which is enough for hosts that drive
//! the controller from one task. Hosts that must stay responsive while the
//! codec runs use the split form: [`Controller::begin_conversion`] returns a
//! [`ConversionJob`] that borrows nothing, and
//! [`Controller::complete_conversion`] applies its outcome. In between, the
//! controller rejects new files with [`ConvertError::ConversionInProgress`]
//! and [`Controller::cancel_conversion`] can abandon the job; an outcome
//! arriving after that is ignored as stale.
//!
//! ## Handle lifetime
//!
//! The preview handle lives inside [`ConversionArtifact`], so it is revoked
//! exactly when the artifact is dropped: on a new file, on a new conversion,
//! or on a failed submission.

use crate::candidate::{CandidateFile, FileSummary};
use crate::codec::HeicCodec;
use crate::config::ControllerConfig;
use crate::delivery::{Delivery, FileSaver};
use crate::error::{CodecError, ConvertError};
use crate::format::TargetFormat;
use crate::handle::{HandleRegistry, ObjectHandle, PreviewRef};
use crate::naming;
use crate::notices;
use crate::observer::SharedObserver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Discrete workflow state driving UI affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No file accepted yet.
    Empty,
    /// A file is accepted and can be converted.
    Ready,
    /// The codec is running.
    Converting,
    /// An artifact is live and can be downloaded.
    Converted,
    /// The last submission or conversion failed; see the notice.
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Empty => "empty",
            Phase::Ready => "ready",
            Phase::Converting => "converting",
            Phase::Converted => "converted",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// The message currently shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Output of a successful conversion.
///
/// `format` is the format captured when the conversion began, regardless of
/// later [`Controller::set_target_format`] calls.
pub struct ConversionArtifact {
    bytes: Arc<[u8]>,
    format: TargetFormat,
    source_name: String,
    preview: ObjectHandle,
}

impl ConversionArtifact {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> TargetFormat {
        self.format
    }

    /// Name of the candidate the artifact was produced from.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn preview(&self) -> &ObjectHandle {
        &self.preview
    }
}

impl fmt::Debug for ConversionArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionArtifact")
            .field("bytes", &self.bytes.len())
            .field("format", &self.format)
            .field("source_name", &self.source_name)
            .field("preview", &self.preview.url())
            .finish()
    }
}

/// Snapshot handed to the host after every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    pub phase: Phase,
    pub notice: Option<Notice>,
    pub file_summary: Option<FileSummary>,
    pub preview: Option<PreviewRef>,
    pub target_format: TargetFormat,
    /// Show a busy indicator.
    pub busy: bool,
    /// Whether the host offers the convert action. Advisory: it goes false
    /// after a rejected pick, but [`Controller::convert`] only requires a
    /// kept file and no running conversion.
    pub convert_enabled: bool,
    pub download_enabled: bool,
}

/// A codec invocation detached from the controller.
///
/// Produced by [`Controller::begin_conversion`]; everything the codec needs
/// was captured at that moment, so changing the controller afterwards does
/// not affect the job.
pub struct ConversionJob {
    ticket: u64,
    codec: Arc<dyn HeicCodec>,
    input: Arc<[u8]>,
    format: TargetFormat,
    quality: f32,
}

impl ConversionJob {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn format(&self) -> TargetFormat {
        self.format
    }

    /// Run the codec. Dropping the returned future abandons the conversion.
    pub async fn run(self) -> ConversionOutcome {
        let start = Instant::now();
        debug!(
            "Conversion #{}: invoking {} ({} bytes → {})",
            self.ticket,
            self.codec.name(),
            self.input.len(),
            self.format.label()
        );
        let result = self.codec.convert(self.input, self.format, self.quality).await;
        ConversionOutcome {
            ticket: self.ticket,
            format: self.format,
            result,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

impl fmt::Debug for ConversionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionJob")
            .field("ticket", &self.ticket)
            .field("codec", &self.codec.name())
            .field("input", &self.input.len())
            .field("format", &self.format)
            .field("quality", &self.quality)
            .finish()
    }
}

/// Result of [`ConversionJob::run`], applied with
/// [`Controller::complete_conversion`].
#[derive(Debug)]
pub struct ConversionOutcome {
    ticket: u64,
    format: TargetFormat,
    result: Result<Vec<u8>, CodecError>,
    duration_ms: u64,
}

impl ConversionOutcome {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn is_success(&self) -> bool {
        matches!(&self.result, Ok(bytes) if !bytes.is_empty())
    }
}

/// The conversion workflow state machine. See the module docs.
pub struct Controller {
    config: ControllerConfig,
    codec: Arc<dyn HeicCodec>,
    saver: Arc<dyn FileSaver>,
    handles: HandleRegistry,
    observers: Vec<SharedObserver>,

    phase: Phase,
    current_file: Option<CandidateFile>,
    target_format: TargetFormat,
    artifact: Option<ConversionArtifact>,
    notice: Option<Notice>,
    convert_enabled: bool,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl Controller {
    pub fn new(
        config: ControllerConfig,
        codec: Arc<dyn HeicCodec>,
        saver: Arc<dyn FileSaver>,
    ) -> Self {
        let target_format = config.default_format;
        Self {
            config,
            codec,
            saver,
            handles: HandleRegistry::new(),
            observers: Vec::new(),
            phase: Phase::Empty,
            current_file: None,
            target_format,
            artifact: None,
            notice: None,
            convert_enabled: false,
            in_flight: None,
            next_ticket: 0,
        }
    }

    /// Mint handles from a registry the host already holds, so it can
    /// resolve preview URLs.
    pub fn with_registry(mut self, handles: HandleRegistry) -> Self {
        self.handles = handles;
        self
    }

    pub fn add_observer(&mut self, observer: SharedObserver) {
        self.observers.push(observer);
    }

    // ── Operations ───────────────────────────────────────────────────────

    /// Accept or reject a candidate file.
    ///
    /// On rejection the current file stays, any artifact is discarded and the
    /// phase becomes [`Phase::Failed`]. On acceptance the file replaces the
    /// previous one wholesale and the phase becomes [`Phase::Ready`].
    pub fn submit_file(
        &mut self,
        candidate: Option<CandidateFile>,
    ) -> Result<FileSummary, ConvertError> {
        if self.phase == Phase::Converting {
            warn!("Rejecting new file while conversion #{:?} runs", self.in_flight);
            self.notice = Some(Notice::error(notices::conversion_in_progress(
                self.config.language,
            )));
            self.emit();
            return Err(ConvertError::ConversionInProgress);
        }

        let candidate = match candidate {
            Some(c) if naming::is_heic_name(c.name()) => c,
            other => {
                let name = other.map(|c| c.name().to_string());
                warn!("Rejected candidate {:?}: not a .heic file", name);
                self.discard_artifact();
                self.convert_enabled = false;
                self.notice = Some(Notice::error(notices::invalid_file(self.config.language)));
                self.set_phase(Phase::Failed);
                self.emit();
                return Err(ConvertError::InvalidFileKind { name });
            }
        };

        let summary = candidate.summary();
        info!(
            "Accepted {} ({} bytes, {} MB)",
            summary.name, summary.size_bytes, summary.size_mib
        );
        self.discard_artifact();
        self.current_file = Some(candidate);
        self.convert_enabled = true;
        self.notice = Some(Notice::info(notices::file_selected(
            self.config.language,
            &summary,
        )));
        self.set_phase(Phase::Ready);
        self.emit();
        Ok(summary)
    }

    /// Select the format used by the next conversion.
    pub fn set_target_format(&mut self, format: TargetFormat) {
        if self.target_format != format {
            debug!("Target format {} → {}", self.target_format, format);
        }
        self.target_format = format;
        self.emit();
    }

    /// Convert the current file to the selected format.
    ///
    /// Equivalent to [`begin_conversion`](Self::begin_conversion), awaiting
    /// the job, then [`complete_conversion`](Self::complete_conversion).
    pub async fn convert(&mut self) -> Result<&ConversionArtifact, ConvertError> {
        let job = self.begin_conversion()?;
        let outcome = job.run().await;
        self.complete_conversion(outcome)
    }

    /// Enter [`Phase::Converting`] and hand out the codec invocation.
    ///
    /// Requires an accepted file and no conversion in flight. The
    /// `convert_enabled` render flag is not consulted; a file kept through a
    /// rejected pick can still be converted.
    pub fn begin_conversion(&mut self) -> Result<ConversionJob, ConvertError> {
        if self.phase == Phase::Converting {
            warn!("Conversion requested while #{:?} is running", self.in_flight);
            self.emit();
            return Err(ConvertError::ConversionInProgress);
        }

        let Some(file) = self.current_file.as_ref() else {
            warn!("Conversion requested with no file selected");
            self.notice = Some(Notice::error(notices::no_file_selected(
                self.config.language,
            )));
            self.emit();
            return Err(ConvertError::NoFileSelected);
        };

        self.next_ticket += 1;
        let job = ConversionJob {
            ticket: self.next_ticket,
            codec: Arc::clone(&self.codec),
            input: Arc::clone(file.content()),
            format: self.target_format,
            quality: self.config.quality,
        };
        let file_name = file.name().to_string();

        info!(
            "Conversion #{} started: {} → {}",
            job.ticket,
            file_name,
            job.format.label()
        );
        for o in &self.observers {
            o.on_conversion_start(&file_name, job.format);
        }

        self.discard_artifact();
        self.in_flight = Some(job.ticket);
        self.convert_enabled = false;
        self.notice = None;
        self.set_phase(Phase::Converting);
        self.emit();
        Ok(job)
    }

    /// Apply the outcome of a job started by
    /// [`begin_conversion`](Self::begin_conversion).
    ///
    /// Outcomes of cancelled or superseded jobs change nothing and return
    /// [`ConvertError::StaleOutcome`].
    pub fn complete_conversion(
        &mut self,
        outcome: ConversionOutcome,
    ) -> Result<&ConversionArtifact, ConvertError> {
        if self.in_flight != Some(outcome.ticket) {
            warn!(
                "Ignoring outcome of conversion #{} (in flight: {:?})",
                outcome.ticket, self.in_flight
            );
            return Err(ConvertError::StaleOutcome {
                ticket: outcome.ticket,
            });
        }
        self.in_flight = None;
        self.convert_enabled = true;

        let ConversionOutcome {
            ticket,
            format,
            result,
            duration_ms,
        } = outcome;

        let bytes = match result {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return Err(self.fail_conversion(ticket, CodecError::EmptyOutput)),
            Err(e) => return Err(self.fail_conversion(ticket, e)),
        };

        let source_name = self
            .current_file
            .as_ref()
            .map(|f| f.name().to_string())
            .unwrap_or_default();
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let preview = self.handles.create(Arc::clone(&bytes), format.mime_type());
        let size = bytes.len();

        info!(
            "Conversion #{} finished: {} bytes {} in {}ms",
            ticket,
            size,
            format.label(),
            duration_ms
        );
        for o in &self.observers {
            o.on_conversion_complete(format, size, duration_ms);
        }

        self.artifact = Some(ConversionArtifact {
            bytes,
            format,
            source_name,
            preview,
        });
        self.notice = Some(Notice::success(notices::converted(
            self.config.language,
            format,
        )));
        self.set_phase(Phase::Converted);
        self.emit();

        self.artifact
            .as_ref()
            .ok_or_else(|| ConvertError::Internal("artifact vanished after conversion".into()))
    }

    /// Abandon the running conversion; its outcome will be ignored.
    ///
    /// The codec keeps running until the job future is dropped; the
    /// controller simply stops waiting for it.
    pub fn cancel_conversion(&mut self) -> Result<(), ConvertError> {
        let Some(ticket) = self.in_flight.take() else {
            return Err(ConvertError::NoConversionInProgress);
        };
        info!("Conversion #{} cancelled", ticket);
        self.convert_enabled = self.current_file.is_some();
        self.notice = Some(Notice::info(notices::conversion_cancelled(
            self.config.language,
        )));
        let next = if self.current_file.is_some() {
            Phase::Ready
        } else {
            Phase::Empty
        };
        self.set_phase(next);
        self.emit();
        Ok(())
    }

    /// Deliver the artifact under its derived name.
    ///
    /// May be called any number of times while the artifact is live. The
    /// transient handle created for delivery is revoked before returning,
    /// whether or not delivery succeeded.
    pub fn download(&mut self) -> Result<Delivery, ConvertError> {
        let Some(artifact) = self.artifact.as_ref() else {
            warn!("Download requested with no artifact");
            self.notice = Some(Notice::error(notices::no_artifact(self.config.language)));
            self.emit();
            return Err(ConvertError::NoArtifact);
        };

        let name = naming::download_name(
            &artifact.source_name,
            &self.config.name_marker,
            artifact.format,
        );
        let handle = self
            .handles
            .create(Arc::clone(&artifact.bytes), artifact.format.mime_type());
        let result = self.saver.deliver(&handle, &name);
        drop(handle);

        match result {
            Ok(delivery) => {
                info!("Delivered {} → {}", name, delivery.location);
                self.emit();
                Ok(delivery)
            }
            Err(source) => {
                warn!("Delivery of {} failed: {}", name, source);
                self.notice = Some(Notice::error(notices::delivery_failed(
                    self.config.language,
                )));
                self.emit();
                Err(ConvertError::DeliveryFailed { name, source })
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Snapshot of everything the host renders.
    pub fn render(&self) -> RenderState {
        RenderState {
            phase: self.phase,
            notice: self.notice.clone(),
            file_summary: self.current_file.as_ref().map(CandidateFile::summary),
            preview: self.artifact.as_ref().map(|a| a.preview.to_ref()),
            target_format: self.target_format,
            busy: self.phase == Phase::Converting,
            convert_enabled: self.convert_enabled,
            download_enabled: self.artifact.is_some(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn target_format(&self) -> TargetFormat {
        self.target_format
    }

    pub fn current_file(&self) -> Option<&CandidateFile> {
        self.current_file.as_ref()
    }

    pub fn artifact(&self) -> Option<&ConversionArtifact> {
        self.artifact.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Text of the current notice, if any.
    pub fn last_message(&self) -> Option<&str> {
        self.notice.as_ref().map(|n| n.text.as_str())
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    /// Ticket of the running conversion, if any.
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn fail_conversion(&mut self, ticket: u64, error: CodecError) -> ConvertError {
        let detail = error.to_string();
        warn!("Conversion #{} failed: {}", ticket, detail);
        for o in &self.observers {
            o.on_conversion_error(detail.clone());
        }
        self.discard_artifact();
        self.notice = Some(Notice::error(notices::conversion_failed(
            self.config.language,
        )));
        self.set_phase(Phase::Failed);
        self.emit();
        ConvertError::ConversionFailed { detail }
    }

    /// Drop the artifact, which revokes its preview handle.
    fn discard_artifact(&mut self) {
        if let Some(old) = self.artifact.take() {
            debug!("Discarding {} artifact ({})", old.format.label(), old.preview.url());
        }
    }

    fn set_phase(&mut self, next: Phase) {
        if self.phase != next {
            info!("Phase {} → {}", self.phase, next);
        }
        self.phase = next;
    }

    fn emit(&self) {
        if self.observers.is_empty() {
            return;
        }
        let state = self.render();
        for o in &self.observers {
            o.on_render(&state);
        }
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("phase", &self.phase)
            .field("current_file", &self.current_file)
            .field("target_format", &self.target_format)
            .field("artifact", &self.artifact)
            .field("notice", &self.notice)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use async_trait::async_trait;

    struct TaggingCodec;

    #[async_trait]
    impl HeicCodec for TaggingCodec {
        async fn convert(
            &self,
            input: Arc<[u8]>,
            target: TargetFormat,
            _quality: f32,
        ) -> Result<Vec<u8>, CodecError> {
            Ok(format!("{}:{}", target.name(), input.len()).into_bytes())
        }
    }

    struct NullSaver;

    impl FileSaver for NullSaver {
        fn deliver(&self, h: &ObjectHandle, name: &str) -> Result<Delivery, DeliveryError> {
            Ok(Delivery {
                file_name: name.to_string(),
                location: name.to_string(),
                size_bytes: h.bytes().len() as u64,
            })
        }
    }

    fn controller() -> Controller {
        Controller::new(
            ControllerConfig::default(),
            Arc::new(TaggingCodec),
            Arc::new(NullSaver),
        )
    }

    fn heic(name: &str) -> Option<CandidateFile> {
        Some(CandidateFile::new(name, vec![0u8; 4]))
    }

    #[test]
    fn starts_empty_with_default_format() {
        let c = controller();
        let s = c.render();
        assert_eq!(s.phase, Phase::Empty);
        assert_eq!(s.target_format, TargetFormat::Png);
        assert!(!s.convert_enabled);
        assert!(!s.download_enabled);
        assert!(s.notice.is_none());
    }

    #[test]
    fn submit_while_converting_is_rejected() {
        let mut c = controller();
        c.submit_file(heic("a.heic")).unwrap();
        let _job = c.begin_conversion().unwrap();

        let err = c.submit_file(heic("b.heic")).unwrap_err();
        assert!(matches!(err, ConvertError::ConversionInProgress));
        assert_eq!(c.phase(), Phase::Converting);
        assert_eq!(c.current_file().map(|f| f.name()), Some("a.heic"));
    }

    #[test]
    fn begin_twice_is_rejected() {
        let mut c = controller();
        c.submit_file(heic("a.heic")).unwrap();
        let _job = c.begin_conversion().unwrap();
        assert!(matches!(
            c.begin_conversion(),
            Err(ConvertError::ConversionInProgress)
        ));
        assert!(c.render().busy);
        assert!(!c.render().convert_enabled);
    }

    #[tokio::test]
    async fn cancelled_outcome_is_stale() {
        let mut c = controller();
        c.submit_file(heic("a.heic")).unwrap();
        let job = c.begin_conversion().unwrap();
        c.cancel_conversion().unwrap();
        assert_eq!(c.phase(), Phase::Ready);
        assert!(c.render().convert_enabled);

        let outcome = job.run().await;
        assert!(outcome.is_success());
        let err = c.complete_conversion(outcome).unwrap_err();
        assert!(matches!(err, ConvertError::StaleOutcome { ticket: 1 }));
        assert_eq!(c.phase(), Phase::Ready);
        assert!(c.artifact().is_none());
    }

    #[tokio::test]
    async fn kept_file_converts_after_rejected_pick() {
        let mut c = controller();
        c.submit_file(heic("keep.heic")).unwrap();
        let _ = c.submit_file(heic("other.png"));
        assert!(!c.render().convert_enabled);

        let artifact = c.convert().await.unwrap();
        assert_eq!(artifact.source_name(), "keep.heic");
        assert_eq!(c.phase(), Phase::Converted);
        assert!(c.render().convert_enabled);
    }

    #[test]
    fn cancel_without_conversion() {
        let mut c = controller();
        assert!(matches!(
            c.cancel_conversion(),
            Err(ConvertError::NoConversionInProgress)
        ));
    }

    #[tokio::test]
    async fn job_keeps_format_captured_at_begin() {
        let mut c = controller();
        c.submit_file(heic("a.heic")).unwrap();
        let job = c.begin_conversion().unwrap();
        c.set_target_format(TargetFormat::Jpeg);

        let outcome = job.run().await;
        let artifact = c.complete_conversion(outcome).unwrap();
        assert_eq!(artifact.format(), TargetFormat::Png);
        assert_eq!(artifact.bytes(), b"png:4");
        assert_eq!(c.target_format(), TargetFormat::Jpeg);
    }

    #[tokio::test]
    async fn new_conversion_discards_previous_artifact() {
        let mut c = controller();
        c.submit_file(heic("a.heic")).unwrap();
        c.convert().await.unwrap();
        assert_eq!(c.handles().live_count(), 1);

        let _job = c.begin_conversion().unwrap();
        assert!(c.artifact().is_none());
        assert_eq!(c.handles().live_count(), 0);
        assert!(matches!(c.download(), Err(ConvertError::NoArtifact)));
    }

    #[tokio::test]
    async fn download_uses_artifact_format_not_selection() {
        let mut c = controller();
        c.submit_file(heic("IMG_0001.HEIC")).unwrap();
        c.convert().await.unwrap();
        c.set_target_format(TargetFormat::Jpeg);

        let d = c.download().unwrap();
        assert_eq!(d.file_name, "IMG_0001_convertido.png");
        // Only the preview handle survives the download.
        assert_eq!(c.handles().live_count(), 1);
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Converting.to_string(), "converting");
        assert_eq!(
            serde_json::to_string(&Phase::Converted).unwrap(),
            "\"converted\""
        );
    }
}
