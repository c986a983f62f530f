//! CLI commands

pub mod addons;
pub mod down;
pub mod preflight;
pub mod status;
pub mod up;
pub mod version;
