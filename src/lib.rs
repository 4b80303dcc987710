pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod store;

pub use config::Config;
pub use error::{EtlError, Result};
pub use pipeline::{process_data, run_all, BatchReport};
pub use source::{DataSource, LogSource, SongSource};
pub use store::{LoadStats, Sink, WarehouseStore};
