//! Vertical slices: pointer analysis and the taint analysis built on it

pub mod points_to;
pub mod taint_analysis;
