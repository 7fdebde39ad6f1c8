//! End-to-end capture sessions against synthetic sources and real files.

use image::GrayImage;
use iris_capture::capture::{CaptureConfig, FileConfig, SyntheticCamera, SyntheticScene};
use iris_capture::detection::{FixedLayoutDetector, Region, RegionDetector, ScanParams};
use iris_capture::output::{DiskSink, MemorySink, OutputSink, SampleName, SinkError};
use iris_capture::session::{
    AbortReason, CaptureController, CaptureError, ControllerState, SessionOutcome,
};
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn config(output_dir: PathBuf, quota: u32) -> FileConfig {
    let mut config = FileConfig::default();
    config.capture = CaptureConfig::with_dimensions(WIDTH, HEIGHT);
    config.session.output_dir = output_dir;
    config.session.label = "300".to_string();
    config.session.quota = quota;
    config
}

/// Reports the scene's eye for the first `qualifying_frames` frames, then
/// nothing.
struct FirstFramesDetector {
    face: Region,
    eye: Region,
    qualifying_frames: usize,
    frames_seen: usize,
}

impl RegionDetector for FirstFramesDetector {
    fn detect_faces(&mut self, _frame: &GrayImage, _params: &ScanParams) -> Vec<Region> {
        self.frames_seen += 1;
        if self.frames_seen <= self.qualifying_frames {
            vec![self.face]
        } else {
            Vec::new()
        }
    }

    fn detect_eyes(&mut self, _face: &GrayImage, _params: &ScanParams) -> Vec<Region> {
        vec![self.eye]
    }
}

/// Counts persist calls and fails every one of them.
#[derive(Default)]
struct FailingSink {
    calls: usize,
}

impl OutputSink for FailingSink {
    fn persist(&mut self, name: &SampleName, _image: &GrayImage) -> Result<PathBuf, SinkError> {
        self.calls += 1;
        Err(SinkError::EmptyImage(name.file_name()))
    }
}

#[test]
fn test_quota_reached_before_source_ends() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("300");

    let scene = SyntheticScene::centered_eye(WIDTH, HEIGHT);
    let detector = FirstFramesDetector {
        face: scene.face.unwrap(),
        eye: scene.eye.unwrap(),
        qualifying_frames: 10,
        frames_seen: 0,
    };
    let camera = SyntheticCamera::new().with_scene(scene).with_frame_limit(20);

    let mut controller =
        CaptureController::new(camera, detector, DiskSink::new(&out), &config(out.clone(), 10))
            .unwrap();
    let report = controller.run().unwrap();

    assert_eq!(report.outcome, SessionOutcome::Complete);
    assert_eq!(report.accepted, 10);
    assert_eq!(report.saved.len(), 10);

    let unique: HashSet<_> = report.saved.iter().collect();
    assert_eq!(unique.len(), 10);
    for index in 1..=10 {
        let path = out.join(format!("300_1_{}.jpg", index));
        assert!(path.is_file(), "missing {}", path.display());
    }
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 10);

    // Frames 11 to 20 are never pulled
    let (camera, detector, _) = controller.into_parts();
    assert_eq!(camera.frames_captured(), 10);
    assert_eq!(detector.frames_seen, 10);
}

#[test]
fn test_stored_samples_are_grayscale_eye_crops() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().to_path_buf();

    let scene = SyntheticScene::centered_eye(WIDTH, HEIGHT);
    let eye = scene.eye_in_frame().unwrap();
    let detector = FixedLayoutDetector::for_scene(&scene);
    let camera = SyntheticCamera::new().with_scene(scene);

    let mut controller =
        CaptureController::new(camera, detector, DiskSink::new(&out), &config(out.clone(), 1))
            .unwrap();
    let report = controller.run().unwrap();

    let stored = image::open(&report.saved[0]).unwrap();
    assert_eq!(stored.color(), image::ColorType::L8);
    assert_eq!((stored.width(), stored.height()), (eye.width, eye.height));
}

#[test]
fn test_source_failure_aborts_without_captures() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("never-created");

    // A face with an eye box over flat background never passes the gates.
    let scene = SyntheticScene::blank(WIDTH, HEIGHT);
    let detector = FixedLayoutDetector::new(
        vec![Region::new(80, 40, 160, 160)],
        vec![Region::new(40, 40, 80, 80)],
    );
    let camera = SyntheticCamera::new().with_scene(scene).with_frame_limit(3);

    let mut controller =
        CaptureController::new(camera, detector, DiskSink::new(&out), &config(out.clone(), 10))
            .unwrap();
    let report = controller.run().unwrap();

    assert_eq!(
        report.outcome,
        SessionOutcome::Aborted(AbortReason::SourceExhausted)
    );
    assert_eq!(report.accepted, 0);
    assert!(report.saved.is_empty());
    assert_eq!(report.stats.frames, 3);
    assert_eq!(report.stats.total_rejections(), 3);
    assert!(!out.exists());
}

#[test]
fn test_zero_area_regions_never_reach_sink() {
    let scene = SyntheticScene::centered_eye(WIDTH, HEIGHT);
    let face = scene.face.unwrap();
    let detector = FixedLayoutDetector::new(
        vec![
            Region::new(10, 10, 0, 50),
            Region::new(WIDTH + 5, 0, 50, 50),
            face,
        ],
        vec![Region::new(500, 500, 60, 60)],
    );
    let camera = SyntheticCamera::new().with_scene(scene).with_frame_limit(2);

    let mut controller = CaptureController::new(
        camera,
        detector,
        FailingSink::default(),
        &config(PathBuf::from("unused"), 1),
    )
    .unwrap();
    let report = controller.run().unwrap();

    assert_eq!(
        report.outcome,
        SessionOutcome::Aborted(AbortReason::SourceExhausted)
    );
    assert_eq!(report.accepted, 0);
    // Two bad faces and one eye outside its face, on each of two frames
    assert_eq!(report.stats.invalid_regions, 6);
    assert_eq!(controller.sink().calls, 0);
}

#[test]
fn test_sink_failure_is_a_hard_error() {
    let scene = SyntheticScene::centered_eye(WIDTH, HEIGHT);
    let detector = FixedLayoutDetector::for_scene(&scene);
    let camera = SyntheticCamera::new().with_scene(scene);

    let mut controller = CaptureController::new(
        camera,
        detector,
        FailingSink::default(),
        &config(PathBuf::from("unused"), 3),
    )
    .unwrap();

    assert!(matches!(controller.run(), Err(CaptureError::Sink(_))));
    assert_eq!(controller.sink().calls, 1);
    assert_eq!(controller.session().accepted(), 0);
}

#[test]
fn test_session_driven_by_config_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("captures");
    let path = dir.path().join("iris.toml");
    std::fs::write(
        &path,
        format!(
            r#"
            [capture]
            width = {WIDTH}
            height = {HEIGHT}

            [session]
            output_dir = {out:?}
            label = "042"
            session_index = 3
            quota = 2

            [detection]
            guide_face = {{ x = 80, y = 40, width = 160, height = 160 }}
            guide_eye = {{ x = 40, y = 40, width = 80, height = 80 }}
            "#
        ),
    )
    .unwrap();

    let config = FileConfig::from_file(&path).unwrap();
    let scene = SyntheticScene::blank(WIDTH, HEIGHT).with_face(
        config.detection.guide_face.unwrap(),
        config.detection.guide_eye.unwrap(),
    );
    let detector = FixedLayoutDetector::from_config(&config.detection).unwrap();
    let camera = SyntheticCamera::new().with_scene(scene).with_frame_limit(5);

    let mut controller = CaptureController::new(
        camera,
        detector,
        DiskSink::new(&config.session.output_dir),
        &config,
    )
    .unwrap();

    assert_eq!(controller.state(), ControllerState::Idle);
    let report = controller.run().unwrap();

    assert_eq!(report.outcome, SessionOutcome::Complete);
    assert!(out.join("042_3_1.jpg").is_file());
    assert!(out.join("042_3_2.jpg").is_file());
    assert_eq!(report.stats.frames, 2);
}

#[test]
fn test_off_centre_eye_is_rejected() {
    // Eye in the top-left corner of a face in the top-left corner.
    let face = Region::new(0, 0, 120, 120);
    let eye = Region::new(10, 10, 80, 80);
    let scene = SyntheticScene::blank(WIDTH, HEIGHT).with_face(face, eye);
    let detector = FixedLayoutDetector::new(vec![face], vec![eye]);
    let camera = SyntheticCamera::new().with_scene(scene).with_frame_limit(1);

    let mut controller = CaptureController::new(
        camera,
        detector,
        MemorySink::new(),
        &config(PathBuf::from("unused"), 1),
    )
    .unwrap();
    let report = controller.run().unwrap();

    assert_eq!(report.accepted, 0);
    assert_eq!(
        report
            .stats
            .rejections(iris_capture::quality::Gate::Centering),
        1
    );
    assert!(controller.sink().is_empty());
}
