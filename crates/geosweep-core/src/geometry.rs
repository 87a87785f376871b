//! Planar geometry for tiling a survey area.
//!
//! Coordinates are WGS84 degrees treated as a plane for box arithmetic.
//! Longitude spans shrink with latitude, so radius-derived boxes widen in
//! longitude as they move away from the equator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const EARTH_RADIUS_KM: f64 = 6371.0;
const KM_PER_LAT_DEGREE: f64 = 111.0;

/// Upper bound on `divisions` for a single subdivision step (65 536 tiles).
pub const MAX_DIVISIONS: u32 = 256;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("radius must be a positive number of kilometres, got {0}")]
    InvalidRadius(f64),

    #[error("subdivision count must be between 1 and {MAX_DIVISIONS}, got {0}")]
    InvalidSubdivision(u32),

    #[error("invalid bounding box: {0}")]
    InvalidBounds(String),

    #[error("longitude span is undefined at latitude {lat}")]
    DegenerateLongitude { lat: f64 },

    #[error("invalid coordinate \"{input}\": {reason}")]
    InvalidCoordinate { input: String, reason: String },
}

/// A WGS84 point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `true` when both axes are finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Parse the `lon;lat` form used by the search service. A comma is
    /// accepted as the separator too.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidCoordinate`] when the input does not
    /// hold exactly two numbers or the point lies outside WGS84 ranges.
    pub fn parse(input: &str) -> Result<Self, GeometryError> {
        let invalid = |reason: &str| GeometryError::InvalidCoordinate {
            input: input.to_owned(),
            reason: reason.to_owned(),
        };

        let mut parts = input.split([';', ',']).map(str::trim);
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid("expected \"lon;lat\""));
        };
        let lon = lon
            .parse::<f64>()
            .map_err(|e| invalid(&format!("longitude: {e}")))?;
        let lat = lat
            .parse::<f64>()
            .map_err(|e| invalid(&format!("latitude: {e}")))?;

        let coord = Self { lon, lat };
        if !coord.is_valid() {
            return Err(invalid("out of range"));
        }
        Ok(coord)
    }

    /// Render as the service's `searchCoord` query value.
    #[must_use]
    pub fn to_search_coord(&self) -> String {
        format!("{};{}", self.lon, self.lat)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

/// Axis-aligned box in degrees. Bounds are inclusive on all four edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Build a box, rejecting non-finite edges, inverted axes and zero area.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidBounds`] describing the offending axis.
    pub fn new(
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    ) -> Result<Self, GeometryError> {
        let bounds = Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check the invariants [`BoundingBox::new`] enforces. Needed for boxes
    /// built from public fields or deserialised.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidBounds`] describing the offending axis.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let edges = [self.min_lat, self.max_lat, self.min_lon, self.max_lon];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::InvalidBounds(
                "edges must be finite".to_string(),
            ));
        }
        if self.min_lat >= self.max_lat {
            return Err(GeometryError::InvalidBounds(format!(
                "min_lat {} must be below max_lat {}",
                self.min_lat, self.max_lat
            )));
        }
        if self.min_lon >= self.max_lon {
            return Err(GeometryError::InvalidBounds(format!(
                "min_lon {} must be below max_lon {}",
                self.min_lon, self.max_lon
            )));
        }
        Ok(())
    }

    /// The whole globe.
    #[must_use]
    pub const fn world() -> Self {
        Self {
            min_lat: -90.0,
            max_lat: 90.0,
            min_lon: -180.0,
            max_lon: 180.0,
        }
    }

    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }

    #[must_use]
    pub fn centroid(&self) -> Coordinate {
        Coordinate {
            lon: (self.min_lon + self.max_lon) / 2.0,
            lat: (self.min_lat + self.max_lat) / 2.0,
        }
    }

    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    #[must_use]
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}

/// One query unit: a box plus the single point sent to the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub bounds: BoundingBox,
    pub center: Coordinate,
    /// Optional human label, e.g. a region name.
    pub label: Option<String>,
}

impl Tile {
    /// Tile whose query point is the centroid of `bounds`.
    #[must_use]
    pub fn from_bounds(bounds: BoundingBox) -> Self {
        Self {
            center: bounds.centroid(),
            bounds,
            label: None,
        }
    }

    /// Tile that accepts every coordinate; the query point is `center`.
    #[must_use]
    pub fn unbounded(center: Coordinate) -> Self {
        Self {
            bounds: BoundingBox::world(),
            center,
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Great-circle distance in kilometres (haversine).
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Box of `radius_km` around `center`, using 111 km per degree of latitude
/// and `111 * cos(lat)` km per degree of longitude.
///
/// # Errors
///
/// - [`GeometryError::InvalidRadius`] when `radius_km` is not strictly positive.
/// - [`GeometryError::InvalidCoordinate`] when `center` is outside WGS84 ranges.
/// - [`GeometryError::DegenerateLongitude`] when the longitude span diverges
///   (the centre sits on a pole).
pub fn bounds_from_radius(center: Coordinate, radius_km: f64) -> Result<BoundingBox, GeometryError> {
    if radius_km.is_nan() || radius_km <= 0.0 || radius_km.is_infinite() {
        return Err(GeometryError::InvalidRadius(radius_km));
    }

    if !center.is_valid() {
        return Err(GeometryError::InvalidCoordinate {
            input: center.to_string(),
            reason: "out of range".to_string(),
        });
    }
    if center.lat.abs() >= 90.0 {
        return Err(GeometryError::DegenerateLongitude { lat: center.lat });
    }

    let lat_delta = radius_km / KM_PER_LAT_DEGREE;
    let lon_delta = radius_km / (KM_PER_LAT_DEGREE * center.lat.to_radians().cos());
    if !lon_delta.is_finite() || lon_delta <= 0.0 {
        return Err(GeometryError::DegenerateLongitude { lat: center.lat });
    }

    BoundingBox::new(
        center.lat - lat_delta,
        center.lat + lat_delta,
        center.lon - lon_delta,
        center.lon + lon_delta,
    )
}

/// Split `bounds` into a `divisions x divisions` grid of equal-degree tiles.
///
/// Tiles come back row-major: rows run south to north, columns west to east.
/// Interior edges are shared by neighbours and the outer edges equal the
/// parent's, so the tiles partition `bounds` exactly.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidSubdivision`] when `divisions` is zero or
/// above [`MAX_DIVISIONS`], and [`GeometryError::InvalidBounds`] when
/// `bounds` is inverted, empty or not finite.
pub fn subdivide(bounds: &BoundingBox, divisions: u32) -> Result<Vec<Tile>, GeometryError> {
    bounds.validate()?;
    if divisions == 0 || divisions > MAX_DIVISIONS {
        return Err(GeometryError::InvalidSubdivision(divisions));
    }

    let lat_edges = edges(bounds.min_lat, bounds.max_lat, divisions);
    let lon_edges = edges(bounds.min_lon, bounds.max_lon, divisions);

    let mut tiles = Vec::with_capacity((divisions * divisions) as usize);
    for lat in lat_edges.windows(2) {
        for lon in lon_edges.windows(2) {
            tiles.push(Tile::from_bounds(BoundingBox {
                min_lat: lat[0],
                max_lat: lat[1],
                min_lon: lon[0],
                max_lon: lon[1],
            }));
        }
    }
    Ok(tiles)
}

fn edges(min: f64, max: f64, divisions: u32) -> Vec<f64> {
    let n = f64::from(divisions);
    let mut out: Vec<f64> = (0..divisions)
        .map(|i| min + (max - min) * f64::from(i) / n)
        .collect();
    out.push(max);
    out
}
