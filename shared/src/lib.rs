pub mod map_data;
pub mod size_sync;

pub use map_data::*;
pub use size_sync::SizeSyncMode;
