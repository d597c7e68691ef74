//! HTTP API handlers for dongjeop-api

pub mod analyze;
pub mod batches;
pub mod buildinfo;
pub mod health;
pub mod images;
pub mod stats;

pub use analyze::{analyze_batch, analyze_images};
pub use batches::{list_batch_images, list_batches};
pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use images::{get_image, list_images};
pub use stats::{get_statistics, get_summary, reload_dataset};
