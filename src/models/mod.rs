//! Plain data types shared across layers.

pub mod oncall;
pub mod settings;
pub mod tracking;
