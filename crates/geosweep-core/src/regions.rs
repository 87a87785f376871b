//! Named region centroids for fixed-list surveys.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::Coordinate;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Filter radius around the centroid. Without it every result the
    /// service returns for this point is kept.
    pub radius_km: Option<f64>,
}

impl RegionConfig {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lon, self.lat)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegionsFile {
    pub regions: Vec<RegionConfig>,
}

impl RegionsFile {
    /// Keep only the regions whose name matches one of `names`
    /// (case-insensitive), preserving file order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first entry of `names`
    /// that matches no region.
    pub fn select(&self, names: &[String]) -> Result<Vec<RegionConfig>, ConfigError> {
        if names.is_empty() {
            return Ok(self.regions.clone());
        }
        let wanted: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
        if let Some(missing) = wanted
            .iter()
            .find(|w| !self.regions.iter().any(|r| r.name.to_lowercase() == **w))
        {
            return Err(ConfigError::Validation(format!("unknown region '{missing}'")));
        }
        Ok(self
            .regions
            .iter()
            .filter(|r| wanted.contains(&r.name.to_lowercase()))
            .cloned()
            .collect())
    }
}

/// Load and validate the region list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_regions(path: &Path) -> Result<RegionsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RegionsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_regions(&content)
}

/// Parse and validate a region list from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text is not valid YAML or fails validation.
pub fn parse_regions(content: &str) -> Result<RegionsFile, ConfigError> {
    let regions_file: RegionsFile =
        serde_yaml::from_str(content).map_err(ConfigError::RegionsFileParse)?;
    validate_regions(&regions_file)?;
    Ok(regions_file)
}

fn validate_regions(regions_file: &RegionsFile) -> Result<(), ConfigError> {
    if regions_file.regions.is_empty() {
        return Err(ConfigError::Validation(
            "region list must not be empty".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    for region in &regions_file.regions {
        if region.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "region name must be non-empty".to_string(),
            ));
        }

        if !region.coordinate().is_valid() {
            return Err(ConfigError::Validation(format!(
                "region '{}' has out-of-range coordinate lat={} lon={}",
                region.name, region.lat, region.lon
            )));
        }

        if let Some(radius) = region.radius_km {
            if radius.is_nan() || radius <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "region '{}' has invalid radius_km {radius}",
                    region.name
                )));
            }
        }

        if !seen_names.insert(region.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate region name: '{}'",
                region.name
            )));
        }
    }

    Ok(())
}
