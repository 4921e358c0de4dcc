//! Pipeline Coordinator - three-stage roster export
//!
//! ```text
//! STAGE L: Load       opens `data_ready` (never fails, never blocks)
//! STAGE S: Serialize  waits `data_ready` -> snapshot store -> write XML -> opens `xml_ready`
//! STAGE R: Render     waits `xml_ready`  -> report renderer on the written XML
//! ```
//!
//! Each stage is its own tokio task; the only synchronization between them
//! is the run's two latches. A failed Serialize never opens `xml_ready`, so
//! Render is never invoked for that run and stays waiting until the run is
//! cancelled or the gate timeout (if any) elapses.
//!
//! Runs are not re-entrant: [`PipelineCoordinator::trigger`] refuses to start
//! while the previous run still has a live stage.

use super::latch::Latch;
use super::state::{RunReport, Stage, StageOutcome};
use crate::codec;
use crate::config::ClinicConfig;
use crate::report::{RenderRequest, ReportFormat, ReportRenderer};
use crate::storage::SharedRecordStore;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("a pipeline run is already in progress")]
    AlreadyRunning,
}

/// Paths and limits for pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Where Stage S writes the roster XML
    pub xml_path: PathBuf,
    /// Report template handed to the renderer
    pub template: PathBuf,
    /// Report output handed to the renderer
    pub report_output: PathBuf,
    /// Maximum wait on each gate; `None` waits forever
    pub gate_timeout: Option<Duration>,
}

impl PipelineOptions {
    /// Options for a run that renders a `format` report.
    pub fn from_config(config: &ClinicConfig, format: ReportFormat) -> Self {
        Self {
            xml_path: config.storage.data_file.clone(),
            template: config.report.template(format).to_path_buf(),
            report_output: config.report.output(format).to_path_buf(),
            gate_timeout: config.pipeline.gate_timeout(),
        }
    }
}

/// Pipeline statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub runs_started: u64,
    pub runs_rejected: u64,
}

/// Starts pipeline runs against a shared record store.
pub struct PipelineCoordinator {
    store: SharedRecordStore,
    renderer: Arc<dyn ReportRenderer>,
    options: PipelineOptions,
    in_flight: Arc<AtomicBool>,
    runs_started: AtomicU64,
    runs_rejected: AtomicU64,
}

impl PipelineCoordinator {
    pub fn new(
        store: SharedRecordStore,
        renderer: Arc<dyn ReportRenderer>,
        options: PipelineOptions,
    ) -> Self {
        info!(
            xml = %options.xml_path.display(),
            renderer = renderer.renderer_name(),
            timeout = ?options.gate_timeout,
            "Initializing Pipeline Coordinator"
        );
        Self {
            store,
            renderer,
            options,
            in_flight: Arc::new(AtomicBool::new(false)),
            runs_started: AtomicU64::new(0),
            runs_rejected: AtomicU64::new(0),
        }
    }

    pub const fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// True while a run still has a live stage task.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_rejected: self.runs_rejected.load(Ordering::Relaxed),
        }
    }

    /// Start a run: spawn the three stage tasks on the current tokio runtime.
    pub fn trigger(&self) -> Result<PipelineRun, PipelineError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.runs_rejected.fetch_add(1, Ordering::Relaxed);
            warn!("Pipeline trigger rejected: previous run still in progress");
            return Err(PipelineError::AlreadyRunning);
        }

        let run_id = self.runs_started.fetch_add(1, Ordering::Relaxed) + 1;
        info!(run = run_id, "Pipeline run started");

        let guard = Arc::new(RunGuard(Arc::clone(&self.in_flight)));
        let data_ready = Latch::new("data_ready");
        let xml_ready = Latch::new("xml_ready");
        let cancel = CancellationToken::new();

        let load = tokio::spawn(load_stage(
            run_id,
            data_ready.clone(),
            Arc::clone(&guard),
        ));

        let serialize = tokio::spawn(serialize_stage(
            SerializeContext {
                run_id,
                store: self.store.clone(),
                xml_path: self.options.xml_path.clone(),
                data_ready: data_ready.clone(),
                xml_ready: xml_ready.clone(),
                gate: GateWait::new(cancel.clone(), self.options.gate_timeout),
            },
            Arc::clone(&guard),
        ));

        let render = tokio::spawn(render_stage(
            RenderContext {
                run_id,
                renderer: Arc::clone(&self.renderer),
                request: RenderRequest {
                    template: self.options.template.clone(),
                    data: self.options.xml_path.clone(),
                    output: self.options.report_output.clone(),
                },
                xml_ready: xml_ready.clone(),
                gate: GateWait::new(cancel.clone(), self.options.gate_timeout),
            },
            guard,
        ));

        Ok(PipelineRun {
            run_id,
            cancel,
            data_ready,
            xml_ready,
            load,
            serialize,
            render,
        })
    }
}

/// Clears the coordinator's in-flight flag once the last stage task ends.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// Pipeline Run
// ============================================================================

/// Handle to one in-flight run.
pub struct PipelineRun {
    run_id: u64,
    cancel: CancellationToken,
    data_ready: Latch,
    xml_ready: Latch,
    load: JoinHandle<StageOutcome>,
    serialize: JoinHandle<StageOutcome>,
    render: JoinHandle<StageOutcome>,
}

impl PipelineRun {
    pub const fn id(&self) -> u64 {
        self.run_id
    }

    /// Release any stage still waiting on a gate; it reports `Starved`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn data_ready(&self) -> bool {
        self.data_ready.is_open()
    }

    pub fn xml_ready(&self) -> bool {
        self.xml_ready.is_open()
    }

    /// Wait for all three stages and collect their outcomes.
    ///
    /// Without a gate timeout this does not return while a stage is starved,
    /// unless [`PipelineRun::cancel`] is called.
    pub async fn wait(self) -> RunReport {
        let report = RunReport {
            run_id: self.run_id,
            load: join_stage(Stage::Load, self.load).await,
            serialize: join_stage(Stage::Serialize, self.serialize).await,
            render: join_stage(Stage::Render, self.render).await,
        };
        info!(run = report.run_id, "{}", report);
        report
    }
}

async fn join_stage(stage: Stage, handle: JoinHandle<StageOutcome>) -> StageOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(%stage, error = %e, "Stage task aborted");
            StageOutcome::Failed(format!("{stage} task aborted: {e}"))
        }
    }
}

// ============================================================================
// Gate Waiting
// ============================================================================

struct GateWait {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl GateWait {
    const fn new(cancel: CancellationToken, timeout: Option<Duration>) -> Self {
        Self { cancel, timeout }
    }

    /// `true` once `gate` opens; `false` on cancellation or timeout.
    async fn pass(&self, gate: &Latch) -> bool {
        let opened = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, gate.wait()).await.is_ok(),
                None => {
                    gate.wait().await;
                    true
                }
            }
        };
        tokio::select! {
            () = self.cancel.cancelled() => false,
            passed = opened => passed,
        }
    }
}

// ============================================================================
// Stages
// ============================================================================

async fn load_stage(run_id: u64, data_ready: Latch, _guard: Arc<RunGuard>) -> StageOutcome {
    debug!(run = run_id, "Stage L: roster data ready");
    data_ready.open();
    StageOutcome::Completed
}

struct SerializeContext {
    run_id: u64,
    store: SharedRecordStore,
    xml_path: PathBuf,
    data_ready: Latch,
    xml_ready: Latch,
    gate: GateWait,
}

async fn serialize_stage(ctx: SerializeContext, _guard: Arc<RunGuard>) -> StageOutcome {
    if !ctx.gate.pass(&ctx.data_ready).await {
        warn!(run = ctx.run_id, gate = ctx.data_ready.name(), "Stage S starved");
        return StageOutcome::Starved;
    }

    let records = ctx.store.snapshot();
    info!(
        run = ctx.run_id,
        records = records.len(),
        path = %ctx.xml_path.display(),
        "Stage S: writing roster XML"
    );

    let bytes = match codec::serialize(&records) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(run = ctx.run_id, error = %e, "Stage S failed to encode roster");
            return StageOutcome::Failed(e.to_string());
        }
    };
    if let Err(e) = tokio::fs::write(&ctx.xml_path, bytes).await {
        error!(
            run = ctx.run_id,
            path = %ctx.xml_path.display(),
            error = %e,
            "Stage S failed to write roster XML"
        );
        return StageOutcome::Failed(format!("{}: {e}", ctx.xml_path.display()));
    }

    info!(run = ctx.run_id, "Stage S: roster XML saved");
    ctx.xml_ready.open();
    StageOutcome::Completed
}

struct RenderContext {
    run_id: u64,
    renderer: Arc<dyn ReportRenderer>,
    request: RenderRequest,
    xml_ready: Latch,
    gate: GateWait,
}

async fn render_stage(ctx: RenderContext, _guard: Arc<RunGuard>) -> StageOutcome {
    if !ctx.gate.pass(&ctx.xml_ready).await {
        warn!(
            run = ctx.run_id,
            gate = ctx.xml_ready.name(),
            "Stage R starved: roster XML was never produced"
        );
        return StageOutcome::Starved;
    }

    info!(
        run = ctx.run_id,
        renderer = ctx.renderer.renderer_name(),
        "Stage R: rendering report"
    );
    let renderer = Arc::clone(&ctx.renderer);
    let request = ctx.request.clone();
    match tokio::task::spawn_blocking(move || renderer.render(&request)).await {
        Ok(Ok(output)) => {
            info!(run = ctx.run_id, output = %output.display(), "Stage R: report created");
            StageOutcome::Completed
        }
        Ok(Err(e)) => {
            error!(run = ctx.run_id, error = %e, "Stage R failed");
            StageOutcome::Failed(e.to_string())
        }
        Err(e) => {
            error!(run = ctx.run_id, error = %e, "Stage R renderer panicked");
            StageOutcome::Failed(format!("renderer panicked: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RenderError;
    use crate::storage::RecordStore;
    use crate::types::RecordDraft;
    use std::sync::Mutex;

    /// Records how many patients the XML held at each render call.
    #[derive(Default)]
    struct CountingRenderer {
        seen: Mutex<Vec<usize>>,
    }

    impl ReportRenderer for CountingRenderer {
        fn render(&self, request: &RenderRequest) -> Result<PathBuf, RenderError> {
            let records = codec::load_from_file(&request.data, codec::LoadPolicy::Strict)?;
            self.seen.lock().unwrap().push(records.len());
            Ok(request.output.clone())
        }

        fn renderer_name(&self) -> &'static str {
            "counting"
        }
    }

    fn options(dir: &std::path::Path, timeout: Option<Duration>) -> PipelineOptions {
        PipelineOptions {
            xml_path: dir.join("roster.xml"),
            template: dir.join("template.html"),
            report_output: dir.join("report.html"),
            gate_timeout: timeout,
        }
    }

    #[test]
    fn test_options_follow_report_format() {
        let config = ClinicConfig::default();
        let pdf = PipelineOptions::from_config(&config, ReportFormat::Pdf);
        assert_eq!(pdf.xml_path, config.storage.data_file);
        assert_eq!(pdf.template, config.report.pdf_template);
        assert_eq!(pdf.report_output, config.report.pdf_output);

        let html = PipelineOptions::from_config(&config, ReportFormat::Html);
        assert_eq!(html.report_output, config.report.html_output);
        assert_eq!(html.gate_timeout, Some(Duration::from_secs(30)));
    }

    fn store_with(count: usize) -> SharedRecordStore {
        let mut store = RecordStore::new();
        for _ in 0..count {
            store
                .add(RecordDraft::new(
                    "Ivanov",
                    "Flu",
                    "Petrov",
                    "Therapist",
                    "01.01.2024",
                    "Waiting",
                ))
                .unwrap();
        }
        store.into()
    }

    #[tokio::test]
    async fn test_successful_run() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let renderer = Arc::new(CountingRenderer::default());
        let coordinator =
            PipelineCoordinator::new(store_with(3), renderer.clone(), options(dir.path(), None));

        let run = coordinator.trigger().unwrap();
        assert_eq!(run.id(), 1);
        let report = run.wait().await;

        assert!(report.is_complete(), "{report}");
        assert_eq!(*renderer.seen.lock().unwrap(), vec![3]);
        assert!(!coordinator.is_running());
        assert_eq!(coordinator.stats().runs_started, 1);
    }

    #[tokio::test]
    async fn test_failed_write_starves_render() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let mut opts = options(dir.path(), Some(Duration::from_millis(100)));
        opts.xml_path = dir.path().join("missing-dir").join("roster.xml");
        let renderer = Arc::new(CountingRenderer::default());
        let coordinator = PipelineCoordinator::new(store_with(1), renderer.clone(), opts);

        let report = coordinator.trigger().unwrap().wait().await;

        assert!(report.load.is_completed());
        assert!(matches!(report.serialize, StageOutcome::Failed(_)));
        assert_eq!(report.render, StageOutcome::Starved);
        assert!(renderer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_releases_starved_render() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let mut opts = options(dir.path(), None);
        opts.xml_path = dir.path().join("missing-dir").join("roster.xml");
        let coordinator =
            PipelineCoordinator::new(store_with(1), Arc::new(CountingRenderer::default()), opts);

        let run = coordinator.trigger().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(run.data_ready());
        assert!(!run.xml_ready());
        assert!(coordinator.is_running(), "starved render keeps the run alive");

        run.cancel();
        let report = run.wait().await;
        assert_eq!(report.render, StageOutcome::Starved);
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn test_overlapping_trigger_rejected() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let mut opts = options(dir.path(), None);
        opts.xml_path = dir.path().join("missing-dir").join("roster.xml");
        let coordinator =
            PipelineCoordinator::new(store_with(1), Arc::new(CountingRenderer::default()), opts);

        let run = coordinator.trigger().unwrap();
        assert!(matches!(
            coordinator.trigger(),
            Err(PipelineError::AlreadyRunning)
        ));
        assert_eq!(coordinator.stats().runs_rejected, 1);

        run.cancel();
        run.wait().await;
        assert!(coordinator.trigger().is_ok());
    }
}
