pub mod script;
pub mod setup;
pub mod world;

pub use script::{log_ground_events, report_status, run_script, ReportTimer, Script};
pub use setup::setup;
pub use world::{integrate_bodies, probe_sphere_surfaces};
