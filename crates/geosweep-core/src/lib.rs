pub mod app_config;
pub mod config;
pub mod geometry;
pub mod records;
pub mod regions;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use geometry::{
    bounds_from_radius, distance_km, subdivide, BoundingBox, Coordinate, GeometryError, Tile,
};
pub use records::{BusinessStatus, RecordKey, StoreRecord};
pub use regions::{load_regions, parse_regions, RegionConfig, RegionsFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read regions file {path}: {source}")]
    RegionsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse regions file: {0}")]
    RegionsFileParse(#[from] serde_yaml::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
