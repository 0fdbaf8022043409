pub mod wfs_collect;
pub mod wfs_params;

pub use wfs_collect::WfsCollect;
pub use wfs_params::WfsParams;
