use bevy::prelude::{Entity, Quat, Transform, Vec2, Vec3};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dyngrav::body::{
    begin_fixed_step, finish_fixed_step, AccelerationMode, DgsBody, Kinematics, MotionState, StepFrame, StepInput,
};
use dyngrav::controller::{MoveInput, PlayerController};
use dyngrav::gravity::{GravityField, GravityQuery, GravitySource, SourceSnapshot};
use dyngrav::ground::{ContactReport, GroundContact};
use dyngrav::motor::MotorMode;

/// Field with `n` radial sources spread on a line.
fn field_with_sources(n: u32) -> GravityField {
    let mut field = GravityField::default();
    for i in 0..n {
        let transform = Transform::from_xyz(i as f32 * 50.0, 0.0, 0.0);
        field.push_source(SourceSnapshot::new(
            Entity::from_raw(i),
            &transform,
            &GravitySource::center_of_mass(9.8, 40.0),
        ));
    }
    field
}

/// Deterministic LCG body positions across the field.
fn queries(n: usize, span: f32) -> Vec<GravityQuery> {
    let mut state: u32 = 0x1234_5678;
    let mut next = || {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        ((state >> 16) & 0x7fff) as f32 / 32767.0
    };
    (0..n)
        .map(|i| GravityQuery {
            body: Entity::from_raw(10_000 + i as u32),
            position: Vec3::new(next() * span, next() * 40.0 - 20.0, next() * 40.0 - 20.0),
            current_up: Vec3::Y,
        })
        .collect()
}

/// Nearest-source scan, one body at a time, over a growing source count.
fn bench_resolver_scan(c: &mut Criterion) {
    for sources in [4u32, 32, 128] {
        let field = field_with_sources(sources);
        let qs = queries(1_000, sources as f32 * 50.0);
        c.bench_function(&format!("resolver_scan_{sources}_sources"), |b| {
            b.iter(|| {
                for q in &qs {
                    black_box(field.sample(black_box(q)));
                }
            })
        });
    }
}

/// Same lookups through the rayon batch path.
fn bench_resolver_batch(c: &mut Criterion) {
    let field = field_with_sources(32);
    let qs = queries(10_000, 32.0 * 50.0);
    c.bench_function("resolver_sample_all_10k", |b| {
        b.iter(|| black_box(field.sample_all(black_box(&qs))))
    });
}

/// Each acceleration formula converging on a wish velocity.
fn bench_acceleration_modes(c: &mut Criterion) {
    for mode in [AccelerationMode::Basic, AccelerationMode::Source, AccelerationMode::Quake] {
        c.bench_function(&format!("accelerate_{mode:?}"), |b| {
            b.iter(|| {
                let mut motion = MotionState::new(1.0);
                let wish = Vec3::new(5.0, 0.0, 2.0);
                for i in 0..1_000 {
                    let frame = StepFrame {
                        local_up: Vec3::Y,
                        gravity_magnitude: 9.8,
                        true_velocity: motion.target_velocity(),
                        grounded: i % 7 != 0,
                        ground_friction: 0.8,
                    };
                    motion.begin_step(frame);
                    motion.accelerate(black_box(wish), 0.02, 14.0, mode);
                }
                black_box(motion)
            })
        });
    }
}

/// Full body tick: contact, gravity/friction, controller and motor.
fn bench_body_step(c: &mut Criterion) {
    let field = field_with_sources(1);
    let floor = Entity::from_raw(0);
    let body = DgsBody::new(MotorMode::AdvancedCharacter, 80.0).unwrap_or_else(|e| panic!("{e}"));

    c.bench_function("body_step_5000_ticks", |b| {
        b.iter(|| {
            let mut motion = MotionState::new(body.mass());
            let mut contact = GroundContact::default();
            let mut kinematics = Kinematics::default();
            let mut controller = PlayerController::default();
            let mut position = Vec3::new(0.0, 20.0, 0.0);
            let mut input = MoveInput { axis: Vec2::new(0.3, 1.0), ..Default::default() };
            let dt = 0.02;

            for i in 0..5_000 {
                if i % 250 == 0 {
                    input.press_jump();
                }
                let gravity = field.sample(&GravityQuery { body: Entity::from_raw(1), position, current_up: Vec3::Y });
                let report = if i % 250 < 40 && i % 250 != 0 { ContactReport::airborne() } else { ContactReport::on(floor) };
                let step = StepInput { report, gravity, true_velocity: kinematics.velocity, coyote_time: body.coyote_time, dt };

                begin_fixed_step(body.policy(), &mut motion, &mut contact, step, |_| 0.8);
                controller.update(&input, &mut motion, &contact, Quat::IDENTITY, dt);
                finish_fixed_step(body.policy(), &mut motion, &contact, &mut kinematics);
                input.consume_edges();
                position += kinematics.velocity * dt;
            }
            black_box((position, motion, contact));
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(100);
    targets =
        bench_resolver_scan,
        bench_resolver_batch,
        bench_acceleration_modes,
        bench_body_step
}
criterion_main!(benches);
