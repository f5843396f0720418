pub mod body;
pub mod controller;
pub mod debug;
pub mod gravity;
pub mod ground;
pub mod math;
pub mod motor;
pub mod plugin;
pub mod ron;
pub mod settings;

pub use plugin::{DgsSet, DynamicGravityPlugin};
