pub mod taint_analysis;

pub use taint_analysis::TaintAnalysis;
