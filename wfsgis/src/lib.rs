pub mod collect;
pub mod commons;
pub mod error;
pub mod geo_core;
pub mod geocode;
pub mod geometric;
pub mod pipeline;

pub use error::GisError;
