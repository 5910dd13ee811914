//! Transverse Mercator projection on the WGS84 ellipsoid.
//!
//! Forward and inverse series follow Snyder, *Map Projections: A Working
//! Manual* (USGS PP 1395), §8. Scale factor is 1 on the central meridian and
//! there is no false easting or northing, so the projection centre maps to
//! `(0, 0)`. Accuracy is sub-millimetre within a few degrees of the central
//! meridian, which is all a regional map needs.

use geo::{coord, Coord, Rect};

use crate::error::{Error, Result};

/// WGS84 semi-major axis in metres.
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Scale factor on the central meridian.
const K0: f64 = 1.0;

/// Boundary samples per side when computing the geographic envelope.
const ENVELOPE_SAMPLES: usize = 16;

/// A transverse Mercator projection centred on a latitude/longitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    lat_0: f64,
    lon_0: f64,
    e2: f64,
    ep2: f64,
    m0: f64,
}

impl TransverseMercator {
    /// Create a projection centred on `lat_0`, `lon_0` (degrees).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`] if either value is not finite or is out
    /// of range.
    pub fn new(lat_0: f64, lon_0: f64) -> Result<Self> {
        if !lat_0.is_finite() || !(-90.0..=90.0).contains(&lat_0) {
            return Err(Error::projection(format!(
                "centre latitude must be within [-90, 90] (got {lat_0})"
            )));
        }
        if !lon_0.is_finite() || !(-180.0..=180.0).contains(&lon_0) {
            return Err(Error::projection(format!(
                "centre longitude must be within [-180, 180] (got {lon_0})"
            )));
        }

        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);
        Ok(Self {
            lat_0,
            lon_0,
            e2,
            ep2,
            m0: meridian_arc(lat_0.to_radians(), e2),
        })
    }

    /// Centre latitude in degrees.
    #[must_use]
    pub fn lat_0(&self) -> f64 {
        self.lat_0
    }

    /// Centre (central meridian) longitude in degrees.
    #[must_use]
    pub fn lon_0(&self) -> f64 {
        self.lon_0
    }

    /// Project a longitude/latitude in degrees to metres.
    #[must_use]
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let dlambda = wrap_degrees(lon - self.lon_0).to_radians();

        let (sin_phi, cos_phi) = phi.sin_cos();
        let n = WGS84_A / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = phi.tan().powi(2);
        let c = self.ep2 * cos_phi * cos_phi;
        let a = dlambda * cos_phi;
        let m = meridian_arc(phi, self.e2);

        let a2 = a * a;
        let x = K0
            * n
            * (a + (1.0 - t + c) * a2 * a / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a2 * a2 * a / 120.0);
        let y = K0
            * (m - self.m0
                + n * phi.tan()
                    * (a2 / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a2 * a2 / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2)
                            * a2
                            * a2
                            * a2
                            / 720.0));
        (x, y)
    }

    /// Project a coordinate whose `x` is longitude and `y` latitude.
    #[must_use]
    pub fn forward_coord(&self, c: Coord<f64>) -> Coord<f64> {
        let (x, y) = self.forward(c.x, c.y);
        coord! { x: x, y: y }
    }

    /// Invert a projected point in metres to longitude/latitude in degrees.
    #[must_use]
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let e2 = self.e2;
        let m1 = self.m0 + y / K0;
        let mu = m1 / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));
        let sq = (1.0 - e2).sqrt();
        let e1 = (1.0 - sq) / (1.0 + sq);

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let tan1 = phi1.tan();
        let c1 = self.ep2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let w = 1.0 - e2 * sin1 * sin1;
        let n1 = WGS84_A / w.sqrt();
        let r1 = WGS84_A * (1.0 - e2) / w.powf(1.5);
        let d = x / (n1 * K0);
        let d2 = d * d;

        let phi = phi1
            - (n1 * tan1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * self.ep2) * d2 * d2 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * self.ep2
                        - 3.0 * c1 * c1)
                        * d2
                        * d2
                        * d2
                        / 720.0);
        let dlambda = (d - (1.0 + 2.0 * t1 + c1) * d2 * d / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * self.ep2 + 24.0 * t1 * t1)
                * d2
                * d2
                * d
                / 120.0)
            / cos1;

        (wrap_degrees(self.lon_0 + dlambda.to_degrees()), phi.to_degrees())
    }
}

/// Physical size of the map in projected metres, centred on the projection
/// origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtent {
    width_m: f64,
    height_m: f64,
}

impl MapExtent {
    /// Create an extent of `width_m` by `height_m` metres.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`] unless both sides are finite and positive.
    pub fn new(width_m: f64, height_m: f64) -> Result<Self> {
        if !(width_m.is_finite() && height_m.is_finite() && width_m > 0.0 && height_m > 0.0) {
            return Err(Error::projection(format!(
                "map extent must be positive (got {width_m} x {height_m} m)"
            )));
        }
        Ok(Self { width_m, height_m })
    }

    /// Width in metres.
    #[must_use]
    pub fn width_m(&self) -> f64 {
        self.width_m
    }

    /// Height in metres.
    #[must_use]
    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    /// The projected rectangle covered by the map.
    #[must_use]
    pub fn rect(&self) -> Rect<f64> {
        let (hw, hh) = (self.width_m / 2.0, self.height_m / 2.0);
        Rect::new(coord! { x: -hw, y: -hh }, coord! { x: hw, y: hh })
    }

    /// Check whether a projected point lies on the map.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let r = self.rect();
        x >= r.min().x && x <= r.max().x && y >= r.min().y && y <= r.max().y
    }

    /// Longitude/latitude bounding box of the map under `projection`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`] if the boundary does not invert to finite
    /// coordinates.
    pub fn geographic_envelope(&self, projection: &TransverseMercator) -> Result<Rect<f64>> {
        let r = self.rect();
        let (mut min_lon, mut min_lat) = (f64::INFINITY, f64::INFINITY);
        let (mut max_lon, mut max_lat) = (f64::NEG_INFINITY, f64::NEG_INFINITY);

        for i in 0..=ENVELOPE_SAMPLES {
            let f = i as f64 / ENVELOPE_SAMPLES as f64;
            let x = r.min().x + f * r.width();
            let y = r.min().y + f * r.height();
            for (px, py) in [(x, r.min().y), (x, r.max().y), (r.min().x, y), (r.max().x, y)] {
                let (lon, lat) = projection.inverse(px, py);
                if !lon.is_finite() || !lat.is_finite() {
                    return Err(Error::projection(
                        "map extent does not invert to finite coordinates",
                    ));
                }
                // Unwrap around the central meridian so the box never spans the antimeridian
                let lon = projection.lon_0() + wrap_degrees(lon - projection.lon_0());
                min_lon = min_lon.min(lon);
                max_lon = max_lon.max(lon);
                min_lat = min_lat.min(lat);
                max_lat = max_lat.max(lat);
            }
        }

        // The centre can lie beyond the boundary's latitude range near the poles
        min_lat = min_lat.min(projection.lat_0());
        max_lat = max_lat.max(projection.lat_0());

        Ok(Rect::new(
            coord! { x: min_lon, y: min_lat },
            coord! { x: max_lon, y: max_lat },
        ))
    }
}

/// Distance along the meridian from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Wrap an angle in degrees into `[-180, 180)`.
fn wrap_degrees(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}
