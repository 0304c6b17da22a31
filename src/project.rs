//! WGS84 (EPSG:4326) to Web Mercator (EPSG:3857) conversion.
//!
//! EPSG:3857 treats WGS84 longitude/latitude as coordinates on a sphere
//! whose radius is the WGS84 semi-major axis:
//!
//! ```text
//! x = R * lon
//! y = R * ln(tan(pi/4 + lat/2)) = R * atanh(sin(lat))
//! ```
//!
//! with angles in radians. Points are `geo::Point` with x = longitude and
//! y = latitude on the geographic side, x/y in meters on the projected side.

use geo::Point;
use std::f64::consts::FRAC_PI_4;

use crate::error::{Error, Result};

/// WGS84 semi-major axis in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Projects a longitude/latitude point in degrees to Web Mercator meters.
///
/// # Errors
///
/// [`Error::CoordinateOutOfRange`] for non-finite values, a longitude
/// outside [-180, 180] or a latitude at or beyond the poles, where the
/// projection is undefined.
pub fn to_web_mercator(p: Point<f64>) -> Result<Point<f64>> {
    let (lon, lat) = (p.x(), p.y());
    if !lon.is_finite() || !lat.is_finite() || lon.abs() > 180.0 || lat.abs() >= 90.0 {
        return Err(Error::CoordinateOutOfRange { lon, lat });
    }

    let x = EARTH_RADIUS * lon.to_radians();
    // atanh form is exact on the equator
    let y = EARTH_RADIUS * lat.to_radians().sin().atanh();
    Ok(Point::new(x, y))
}

/// Inverse of [`to_web_mercator`].
pub fn from_web_mercator(p: Point<f64>) -> Point<f64> {
    let lon = (p.x() / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (p.y() / EARTH_RADIUS).exp().atan() - 2.0 * FRAC_PI_4).to_degrees();
    Point::new(lon, lat)
}
