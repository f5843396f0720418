//! Scripted input and console reporting for the headless demo.
//!
//! The player walks, jumps, strafes around the planet and crouches on a fixed
//! timeline, then a debug dump is written and the app exits.
use bevy::app::AppExit;
use bevy::prelude::*;
use dyngrav::body::MotionState;
use dyngrav::controller::MoveInput;
use dyngrav::debug::DumpRequest;
use dyngrav::gravity::LocalGravity;
use dyngrav::ground::{GroundContact, GroundEvent, GroundTransition};

use crate::app::setup::Player;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Walk(Vec2),
    Turn(f32),
    Jump,
    Crouch(bool),
    Dump,
    Quit,
}

/// Timeline of `(seconds since start, action)`, sorted by time.
#[derive(Resource, Debug, Clone)]
pub struct Script {
    steps: Vec<(f32, Action)>,
    next: usize,
}

impl Script {
    #[must_use]
    pub fn new(mut steps: Vec<(f32, Action)>) -> Self {
        steps.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { steps, next: 0 }
    }

    /// Actions whose time has come, each returned once.
    pub fn due(&mut self, elapsed: f32) -> Vec<Action> {
        let start = self.next;
        while self.next < self.steps.len() && self.steps[self.next].0 <= elapsed {
            self.next += 1;
        }
        self.steps[start..self.next].iter().map(|(_, a)| *a).collect()
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new(vec![
            (0.5, Action::Walk(Vec2::new(0.0, 1.0))),
            (2.0, Action::Jump),
            (3.0, Action::Walk(Vec2::new(1.0, 0.0))),
            (3.0, Action::Turn(0.4)),
            (4.5, Action::Walk(Vec2::ZERO)),
            (5.0, Action::Crouch(true)),
            (6.0, Action::Crouch(false)),
            (6.5, Action::Jump),
            (8.0, Action::Dump),
            (8.2, Action::Quit),
        ])
    }
}

/// Seconds between two status lines.
#[derive(Resource)]
pub struct ReportTimer(pub Timer);

impl Default for ReportTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(1.0, TimerMode::Repeating))
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn run_script(
    time: Res<Time>,
    mut script: ResMut<Script>,
    mut players: Query<&mut MoveInput, With<Player>>,
    mut dumps: EventWriter<DumpRequest>,
    mut exit: EventWriter<AppExit>,
) {
    for action in script.due(time.elapsed_seconds()) {
        info!("script: {action:?}");
        match action {
            Action::Dump => {
                dumps.send(DumpRequest { reason: "end of demo script".to_string() });
            }
            Action::Quit => {
                exit.send(AppExit::Success);
            }
            _ => {
                for mut input in &mut players {
                    match action {
                        Action::Walk(axis) => input.axis = axis,
                        Action::Turn(radians) => input.add_yaw(radians),
                        Action::Jump => {
                            input.press_jump();
                            input.release_jump();
                        }
                        Action::Crouch(true) => input.press_crouch(),
                        Action::Crouch(false) => input.release_crouch(),
                        Action::Dump | Action::Quit => {}
                    }
                }
            }
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn report_status(
    time: Res<Time>,
    mut timer: ResMut<ReportTimer>,
    players: Query<(&Transform, &MotionState, &GroundContact, &LocalGravity), With<Player>>,
) {
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }
    for (transform, motion, contact, gravity) in &players {
        info!(
            "t={:.1}s pos={:.2} flat_speed={:.2} grounded={} g={:.2} from {:?}",
            time.elapsed_seconds(),
            transform.translation,
            motion.flat_speed(),
            contact.is_grounded(),
            gravity.0.magnitude,
            gravity.0.source
        );
    }
}

pub fn log_ground_events(mut events: EventReader<GroundEvent>) {
    for event in events.read() {
        match event.transition {
            GroundTransition::Landed => info!("{:?} landed on {:?}", event.body, event.surface),
            GroundTransition::LeftGround => info!("{:?} left the ground", event.body),
            _ => {}
        }
    }
}
