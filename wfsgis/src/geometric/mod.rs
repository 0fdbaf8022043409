pub mod analysis;
pub mod centroid;
pub mod merge;
pub mod shapefile_io;
