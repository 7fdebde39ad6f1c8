//! Quality gate benchmarks.
//!
//! Run with: cargo bench --bench gates
//!
//! Measures the full gate battery and each gate alone on rendered eye crops
//! of typical sizes, so per-frame cost can be compared against the camera
//! frame interval.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use iris_capture::capture::{crop_gray, SyntheticScene};
use iris_capture::quality::{Candidate, Gate, GateThresholds};

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;

/// Renders a centred eye of the given side and returns its crop.
fn eye_crop(side: u32) -> (image::GrayImage, iris_capture::detection::Region) {
    let face = iris_capture::detection::Region::new(
        (FRAME_WIDTH - side * 2) / 2,
        (FRAME_HEIGHT - side * 2) / 2,
        side * 2,
        side * 2,
    );
    let eye = iris_capture::detection::Region::new(side / 2, side / 2, side, side);
    let scene = SyntheticScene::blank(FRAME_WIDTH, FRAME_HEIGHT).with_face(face, eye);
    let placement = eye.offset_by(&face);
    let crop = crop_gray(&scene.render_gray(), &placement).expect("eye inside frame");
    (crop, placement)
}

fn bench_full_battery(c: &mut Criterion) {
    let mut group = c.benchmark_group("Gate battery");
    let thresholds = GateThresholds::default();

    for side in [40u32, 80, 160] {
        let (crop, placement) = eye_crop(side);
        group.throughput(Throughput::Elements(u64::from(side * side)));
        group.bench_with_input(BenchmarkId::from_parameter(side), &crop, |b, crop| {
            let candidate = Candidate::new(crop, placement, FRAME_WIDTH, FRAME_HEIGHT);
            b.iter(|| thresholds.evaluate(black_box(&candidate)))
        });
    }
    group.finish();
}

fn bench_single_gates(c: &mut Criterion) {
    let mut group = c.benchmark_group("Single gate");
    let thresholds = GateThresholds::default();
    let (crop, placement) = eye_crop(120);
    let candidate = Candidate::new(&crop, placement, FRAME_WIDTH, FRAME_HEIGHT);

    for gate in Gate::ALL {
        group.bench_function(gate.as_str(), |b| {
            b.iter(|| thresholds.check_gate(gate, black_box(&candidate)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_battery, bench_single_gates);
criterion_main!(benches);
