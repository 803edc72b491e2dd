pub mod charts;
pub mod config;
pub mod dataset;
pub mod model;
pub mod page;
pub mod server;
pub mod stats;

pub use model::{Analysis, Dataset, GroupTotal, HistogramBucket, SongPlay, Summary};
pub use stats::{AnalysisOptions, EmptyDatasetError};
