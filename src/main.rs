//! Iris Capture CLI
//!
//! Runs one capture session: pulls frames until the quota of accepted eye
//! samples is stored, the source runs out, or Ctrl+C is pressed.
//!
//! Exit status is 0 when the quota was reached, 2 when the session was
//! aborted and 1 on error.

use clap::Parser;
use iris_capture::{
    capture::{FileConfig, FrameSource, SyntheticCamera, SyntheticScene},
    detection::{FixedLayoutDetector, RegionDetector},
    output::DiskSink,
    session::{CancelToken, CaptureController, CaptureError, SessionOutcome, SessionReport},
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Capture quality-gated eye samples from a camera.
#[derive(Parser, Debug)]
#[command(name = "iris-capture", version, about)]
struct Args {
    /// TOML configuration file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory accepted samples are written to.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Subject label used as the file name prefix.
    #[arg(long)]
    label: Option<String>,
    /// Session number used in file names.
    #[arg(long)]
    session_index: Option<u32>,
    /// Accepted samples needed to complete the session.
    #[arg(long)]
    quota: Option<u32>,
    /// Minimum Laplacian variance.
    #[arg(long)]
    sharpness: Option<f64>,
    /// Minimum intensity standard deviation.
    #[arg(long)]
    contrast: Option<f64>,
    /// Minimum contour circularity.
    #[arg(long)]
    circularity: Option<f64>,
    /// Maximum centre offset as a fraction of the frame size.
    #[arg(long)]
    centering_margin: Option<f64>,
    /// Stop the synthetic source after this many frames.
    #[arg(long)]
    frames: Option<u64>,
    /// Camera device index.
    #[cfg(feature = "camera")]
    #[arg(long)]
    device: Option<u32>,
    /// Capture from a hardware camera instead of the synthetic scene.
    #[cfg(feature = "camera")]
    #[arg(long, default_value_t = false)]
    native: bool,
    /// Serve Prometheus metrics on this port (0 disables).
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_port: Option<u16>,
}

impl Args {
    /// Applies command-line overrides on top of the file configuration.
    fn apply(&self, config: &mut FileConfig) {
        if let Some(output) = &self.output {
            config.session.output_dir = output.clone();
        }
        if let Some(label) = &self.label {
            config.session.label = label.clone();
        }
        if let Some(index) = self.session_index {
            config.session.session_index = index;
        }
        if let Some(quota) = self.quota {
            config.session.quota = quota;
        }
        if let Some(sharpness) = self.sharpness {
            config.gates.sharpness = sharpness;
        }
        if let Some(contrast) = self.contrast {
            config.gates.contrast = contrast;
        }
        if let Some(circularity) = self.circularity {
            config.gates.circularity = circularity;
        }
        if let Some(margin) = self.centering_margin {
            config.gates.centering_margin = margin;
        }
        #[cfg(feature = "camera")]
        if let Some(device) = self.device {
            config.capture.device_id = device;
        }
        #[cfg(feature = "metrics")]
        if let Some(port) = self.metrics_port {
            config.metrics.port = port;
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Iris Capture v{}", iris_capture::VERSION);

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), "Failed to load config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => FileConfig::default(),
    };
    args.apply(&mut config);
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let cancel = CancelToken::new();
    if let Err(e) = cancel.install_ctrlc_handler() {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let result = open_and_run(&args, &config, cancel);
    match result {
        Ok(report) => {
            log_summary(&report);
            match report.outcome {
                SessionOutcome::Complete => ExitCode::SUCCESS,
                SessionOutcome::Aborted(_) => ExitCode::from(2),
            }
        }
        Err(e) => {
            error!("Capture failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_and_run(
    args: &Args,
    config: &FileConfig,
    cancel: CancelToken,
) -> Result<SessionReport, CaptureError> {
    #[cfg(feature = "camera")]
    if args.native {
        info!(device = config.capture.device_id, "Using hardware camera");
        let detector = guide_detector(config);
        let camera = iris_capture::capture::NativeCamera::new();
        return run_session(camera, detector, config, cancel);
    }

    let scene = SyntheticScene::centered_eye(config.capture.width, config.capture.height);
    let detector: Box<dyn RegionDetector> = match FixedLayoutDetector::from_config(&config.detection)
    {
        Some(detector) => Box::new(detector),
        None => Box::new(FixedLayoutDetector::for_scene(&scene)),
    };
    let mut camera = SyntheticCamera::new().with_scene(scene);
    if let Some(limit) = args.frames {
        camera = camera.with_frame_limit(limit);
    }
    info!(frames = ?args.frames, "Using synthetic camera");
    run_session(camera, detector, config, cancel)
}

/// Guide boxes from the configuration, or a centred layout for a rig that
/// frames the face in the middle of the image.
#[cfg(feature = "camera")]
fn guide_detector(config: &FileConfig) -> Box<dyn RegionDetector> {
    match FixedLayoutDetector::from_config(&config.detection) {
        Some(detector) => Box::new(detector),
        None => {
            warn!("No guide boxes configured, assuming a centred face");
            let scene = SyntheticScene::centered_eye(config.capture.width, config.capture.height);
            Box::new(FixedLayoutDetector::for_scene(&scene))
        }
    }
}

fn run_session<S: FrameSource>(
    source: S,
    detector: Box<dyn RegionDetector>,
    config: &FileConfig,
    cancel: CancelToken,
) -> Result<SessionReport, CaptureError> {
    let sink = DiskSink::new(&config.session.output_dir);
    let controller = CaptureController::new(source, detector, sink, config)?.with_cancel(cancel);

    #[cfg(feature = "metrics")]
    let controller = match start_metrics(config.metrics.port) {
        Some(observer) => controller.with_observer(observer),
        None => controller,
    };

    let mut controller = controller;
    controller.run()
}

#[cfg(feature = "metrics")]
fn start_metrics(port: u16) -> Option<Box<dyn iris_capture::session::FrameObserver>> {
    use iris_capture::metrics::{
        MetricsObserver, MetricsRegistry, MetricsServer, MetricsServerConfig,
    };

    if port == 0 {
        return None;
    }
    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            return None;
        }
    };
    MetricsServer::new(MetricsServerConfig::with_port(port), registry.clone()).spawn();
    Some(Box::new(MetricsObserver::new(registry)))
}

fn log_summary(report: &SessionReport) {
    let elapsed = report.finished_at - report.started_at;
    match report.outcome {
        SessionOutcome::Complete => info!(
            label = %report.label,
            session = report.session_index,
            accepted = report.accepted,
            frames = report.stats.frames,
            elapsed_ms = elapsed.num_milliseconds(),
            "Session complete"
        ),
        SessionOutcome::Aborted(reason) => warn!(
            %reason,
            label = %report.label,
            session = report.session_index,
            accepted = report.accepted,
            quota = report.quota,
            frames = report.stats.frames,
            elapsed_ms = elapsed.num_milliseconds(),
            "Session aborted"
        ),
    }

    match toml::to_string_pretty(report) {
        Ok(summary) => println!("{}", summary),
        Err(e) => warn!("Failed to render session summary: {}", e),
    }
}
