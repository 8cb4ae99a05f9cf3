//! Provides utilities related to coordinates.

use std::{
    f64::consts::PI,
    fmt,
    fmt::{Display, Formatter},
};

use cgmath::Point2;
use serde::{Deserialize, Serialize};

/// Size of a tile in pixels at its native zoom level.
pub const TILE_SIZE: f64 = 512.0;
pub const MAX_ZOOM: u8 = 32;

/// Semi-major axis of the WGS84 ellipsoid used by spherical mercator.
pub const EARTH_RADIUS: f64 = 6_378_137.0;
pub const EARTH_CIRCUMFERENCE: f64 = 2.0 * PI * EARTH_RADIUS;
/// Latitude at which the mercator world becomes square.
pub const MAX_LATITUDE: f64 = 85.05112877980659;

/// Integer zoom level at which style-dependent mesh detail is built.
#[derive(
    Ord, PartialOrd, Eq, PartialEq, Hash, Copy, Clone, Debug, Default, Serialize, Deserialize,
)]
#[repr(C)]
pub struct ZoomLevel(u8);

impl ZoomLevel {
    pub const fn new(z: u8) -> Self {
        ZoomLevel(z)
    }

    /// The zoom value seen by style expressions and stops.
    pub fn as_f32(self) -> f32 {
        self.0 as f32
    }
}

impl Display for ZoomLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ZoomLevel {
    fn from(zoom_level: u8) -> Self {
        ZoomLevel(zoom_level.min(MAX_ZOOM))
    }
}

impl From<ZoomLevel> for u8 {
    fn from(val: ZoomLevel) -> Self {
        val.0
    }
}

/// A geographic coordinate in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct LngLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LngLat {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        LngLat {
            longitude,
            latitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}

impl Display for LngLat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.longitude, self.latitude)
    }
}

impl From<(f64, f64)> for LngLat {
    fn from(tuple: (f64, f64)) -> Self {
        LngLat::new(tuple.0, tuple.1)
    }
}

/// Projected coordinates in world meters.
///
/// # Coordinate System Origin
///
/// The origin is where the equator crosses the prime meridian. `x` grows towards the east and
/// `y` grows towards the north, so the minimum corner of a bounding box is its south-west corner.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldCoords {
    pub x: f64,
    pub y: f64,
}

impl WorldCoords {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for WorldCoords {
    fn from(tuple: (f64, f64)) -> Self {
        WorldCoords {
            x: tuple.0,
            y: tuple.1,
        }
    }
}

impl From<Point2<f64>> for WorldCoords {
    fn from(point: Point2<f64>) -> Self {
        WorldCoords {
            x: point.x,
            y: point.y,
        }
    }
}

impl From<WorldCoords> for Point2<f64> {
    fn from(coords: WorldCoords) -> Self {
        Point2::new(coords.x, coords.y)
    }
}

impl Display for WorldCoords {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "W(x={x},y={y})", x = self.x, y = self.y)
    }
}

/// Maps geographic coordinates into the flat world used for all geometry math.
///
/// Implementations must be deterministic and keep no state between calls.
pub trait MapProjection: Send + Sync {
    fn lon_lat_to_meters(&self, lng_lat: LngLat) -> WorldCoords;

    fn meters_to_lon_lat(&self, meters: WorldCoords) -> LngLat;
}

/// Spherical (web) mercator projection, EPSG:3857.
#[derive(Clone, Copy, Debug, Default)]
pub struct MercatorProjection;

impl MapProjection for MercatorProjection {
    fn lon_lat_to_meters(&self, lng_lat: LngLat) -> WorldCoords {
        let lat = lng_lat.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let x = lng_lat.longitude * EARTH_CIRCUMFERENCE / 360.0;
        let y = f64::ln(f64::tan(PI / 4.0 + lat.to_radians() / 2.0)) * EARTH_RADIUS;
        WorldCoords { x, y }
    }

    fn meters_to_lon_lat(&self, meters: WorldCoords) -> LngLat {
        let longitude = meters.x * 360.0 / EARTH_CIRCUMFERENCE;
        let latitude = (2.0 * f64::atan(f64::exp(meters.y / EARTH_RADIUS)) - PI / 2.0).to_degrees();
        LngLat {
            longitude,
            latitude,
        }
    }
}

/// Size of one screen pixel in world meters at the given zoom level.
pub fn meters_per_pixel(zoom: ZoomLevel) -> f64 {
    EARTH_CIRCUMFERENCE / (TILE_SIZE * 2.0_f64.powi(u8::from(zoom) as i32))
}
