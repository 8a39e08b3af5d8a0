//! Environment profiles

pub mod profile;

pub use profile::{Profile, ProfileSet, DEFAULT_PROFILE};
