//! Driver, pre-analyses and the result facade

pub mod analyzer;
pub mod pre_analysis;
pub mod result;

pub use analyzer::PointerAnalysis;
pub use result::PointerAnalysisResult;
