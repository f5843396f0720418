use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use dyngrav::debug::DebugDumpPlugin;
use dyngrav::settings::loader::{self as settings_loader, DEFAULT_SETTINGS_DIR};
use dyngrav::{DgsSet, DynamicGravityPlugin};
use std::time::Duration;

mod app;
use app::{
    integrate_bodies,
    log_ground_events,
    probe_sphere_surfaces,
    report_status,
    run_script,
    setup,
    ReportTimer,
    Script,
};

// Frame rate of the headless loop, independent of the fixed physics rate
pub const FRAME_RATE: f64 = 60.0;

fn main() -> AppExit {
    let settings = settings_loader::load_settings_from_dir(DEFAULT_SETTINGS_DIR);
    let settings_watcher = settings_loader::setup_settings_watcher(DEFAULT_SETTINGS_DIR)
        .unwrap_or_else(|_| settings_loader::SettingsWatcher::stub(DEFAULT_SETTINGS_DIR));

    let mut app = App::new();

    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / FRAME_RATE))),
    )
    .add_plugins(LogPlugin::default())
    .add_plugins(DynamicGravityPlugin::from_settings(&settings))
    .add_plugins(DebugDumpPlugin::default());

    app.insert_resource(settings);
    app.insert_resource(settings_watcher);
    app.insert_resource(Script::default());
    app.insert_resource(ReportTimer::default());

    app.add_systems(Startup, setup);
    app.add_systems(FixedUpdate, probe_sphere_surfaces.in_set(DgsSet::Probe));
    app.add_systems(FixedUpdate, integrate_bodies.after(DgsSet::Drive));
    app.add_systems(Update, run_script);
    app.add_systems(Update, report_status);
    app.add_systems(Update, log_ground_events);

    app.run()
}
