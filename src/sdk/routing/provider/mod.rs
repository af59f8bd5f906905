pub mod custom;
pub mod osrm;
pub mod types;

pub use custom::CustomPathProvider;
pub use osrm::OsrmProvider;
