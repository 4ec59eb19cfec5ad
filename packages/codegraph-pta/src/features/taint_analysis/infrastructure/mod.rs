//! Taint infrastructure: config loading, taint objects and the handlers
//! the taint plugin delegates to

pub mod config_loader;
pub mod sanitizer_handler;
pub mod sink_handler;
pub mod source_handler;
pub mod taint_manager;
pub mod transfer_handler;

pub use config_loader::{load_taint_config, TaintDocument};
pub use sanitizer_handler::SanitizerHandler;
pub use sink_handler::SinkHandler;
pub use source_handler::SourceHandler;
pub use taint_manager::{convert_taint, TaintManager};
pub use transfer_handler::{TaintTypeTransfer, TransferHandler};
