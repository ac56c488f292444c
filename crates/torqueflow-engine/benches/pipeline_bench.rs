//! Cost of one steady-state tick for every algorithm.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use torqueflow_algorithms::Algorithm;
use torqueflow_engine::prelude::*;

const ID: DeviceId = DeviceId::new(1);

fn telemetry(torque_nm: f32) -> TelemetryFrame {
    TelemetryFrame {
        torque_samples: [torque_nm, torque_nm + 0.5, torque_nm + 1.0, torque_nm + 0.5, 0.0, -0.5],
        source_valid: true,
        connected: true,
        on_track: true,
        on_racing_surface: true,
        vehicle_speed: 40.0,
        steering_angle: 1.0,
        steering_angle_max: 4.0,
        sim_ffb_enabled: false,
    }
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_tick");
    for algorithm in Algorithm::ALL {
        let settings = Settings {
            algorithm,
            friction: 0.1,
            ..Settings::default()
        };
        let mut device = VirtualDevice::new(ID);
        let mut pipeline = TorquePipeline::new(settings);
        pipeline.select_device(Some(ID));
        let mut lfe = SilentLfe;
        let mut seq = 0u32;

        group.bench_with_input(BenchmarkId::from_parameter(algorithm), &algorithm, |b, _| {
            b.iter(|| {
                seq = seq.wrapping_add(1);
                // A telemetry frame arrives on roughly every eighth tick.
                let frame = seq.is_multiple_of(8).then(|| telemetry(12.0));
                black_box(pipeline.tick(
                    black_box(2.0),
                    ControlRequests::default(),
                    frame,
                    &mut device,
                    &mut lfe,
                ))
            });
        });
    }
    group.finish();
}

fn bench_idle_tick(c: &mut Criterion) {
    let mut device = VirtualDevice::new(ID);
    let mut pipeline = TorquePipeline::new(Settings::default());
    pipeline.select_device(Some(ID));
    let disconnected = Some(TelemetryFrame::disconnected());
    pipeline.tick(2.0, ControlRequests::default(), disconnected, &mut device, &mut SilentLfe);
    c.bench_function("pipeline_tick_suspended", |b| {
        b.iter(|| {
            black_box(pipeline.tick(
                black_box(2.0),
                ControlRequests::default(),
                None,
                &mut device,
                &mut SilentLfe,
            ))
        });
    });
}

criterion_group!(benches, bench_tick, bench_idle_tick);
criterion_main!(benches);
