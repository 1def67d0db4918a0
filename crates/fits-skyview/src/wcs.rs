//! Linear + gnomonic (TAN) world coordinate mapping.
//!
//! Pixel coordinates follow the FITS convention: 1-based, with `(1, 1)` at
//! the centre of the first stored sample. No half-pixel or 0/1 offset is
//! applied here, so `pixel_to_world(CRPIX1, CRPIX2)` returns
//! `(CRVAL1, CRVAL2)` exactly.
//!
//! Recognized keywords: `CRPIX1/2`, `CRVAL1/2` (required); `CD1_1`, `CD1_2`,
//! `CD2_1`, `CD2_2`; `CDELT1/2` with `PC1_1`, `PC1_2`, `PC2_1`, `PC2_2` or
//! `CROTA2`; `CTYPE1/2` for the projection code.

use core::fmt;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::header::Header;

/// Sky projection named by the CTYPE suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Gnomonic tangent-plane projection.
    Tan,
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::Tan => f.write_str("TAN"),
        }
    }
}

/// Projection code of a CTYPE value, e.g. `RA---TAN` -> `TAN`,
/// `DEC--TAN-SIP` -> `TAN-SIP`.
fn projection_code(ctype: &str) -> &str {
    let ctype = ctype.trim();
    // The axis name occupies the first 4 characters, dashes pad it to the code.
    let tail = ctype.get(4..).unwrap_or("");
    tail.trim_start_matches('-')
}

fn parse_projection(header: &Header) -> Result<Projection> {
    let mut projection = Projection::Tan;
    for key in ["CTYPE1", "CTYPE2"] {
        let ctype = match header.str_opt(key)? {
            Some(s) if !s.trim().is_empty() => s.trim(),
            _ => continue,
        };
        projection = match projection_code(ctype) {
            "TAN" => Projection::Tan,
            "TAN-SIP" => {
                warn!("{key} = {ctype:?}: SIP distortion terms are ignored");
                Projection::Tan
            }
            _ => return Err(Error::UnsupportedProjection(ctype.to_string())),
        };
    }
    Ok(projection)
}

/// Pixel-to-world transform for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct WcsMapper {
    /// Reference pixel (CRPIX1, CRPIX2), 1-based.
    pub crpix: [f64; 2],
    /// Reference sky position (CRVAL1, CRVAL2) in degrees.
    pub crval: [f64; 2],
    /// Degrees per pixel, `matrix[i][j]` = CD(i+1)_(j+1).
    pub matrix: [[f64; 2]; 2],
    pub projection: Projection,
}

fn determinant(m: &[[f64; 2]; 2]) -> f64 {
    m[0][0] * m[1][1] - m[0][1] * m[1][0]
}

/// Build the 2x2 matrix from CD, else CDELT x PC, else CDELT with CROTA2.
fn linear_matrix(header: &Header) -> Result<[[f64; 2]; 2]> {
    let read = |key: &str| header.float_opt(key);

    let cd = [
        read("CD1_1")?,
        read("CD1_2")?,
        read("CD2_1")?,
        read("CD2_2")?,
    ];
    if cd.iter().any(Option::is_some) {
        let v = cd.map(|x| x.unwrap_or(0.0));
        return Ok([[v[0], v[1]], [v[2], v[3]]]);
    }

    let cdelt1 = header.get_float("CDELT1")?;
    let cdelt2 = header.get_float("CDELT2")?;

    let pc = [
        read("PC1_1")?,
        read("PC1_2")?,
        read("PC2_1")?,
        read("PC2_2")?,
    ];
    if pc.iter().any(Option::is_some) {
        let pc = [
            [pc[0].unwrap_or(1.0), pc[1].unwrap_or(0.0)],
            [pc[2].unwrap_or(0.0), pc[3].unwrap_or(1.0)],
        ];
        return Ok([
            [cdelt1 * pc[0][0], cdelt1 * pc[0][1]],
            [cdelt2 * pc[1][0], cdelt2 * pc[1][1]],
        ]);
    }

    // AIPS rotation of the latitude axis.
    let rho = read("CROTA2")?.unwrap_or(0.0).to_radians();
    let (s, c) = rho.sin_cos();
    Ok([[cdelt1 * c, -cdelt2 * s], [cdelt1 * s, cdelt2 * c]])
}

impl WcsMapper {
    /// Build a mapper from explicit parts, rejecting a singular matrix.
    pub fn new(crpix: [f64; 2], crval: [f64; 2], matrix: [[f64; 2]; 2]) -> Result<Self> {
        let det = determinant(&matrix);
        if det == 0.0 || !det.is_finite() {
            return Err(Error::DegenerateMatrix { determinant: det });
        }
        Ok(Self {
            crpix,
            crval,
            matrix,
            projection: Projection::Tan,
        })
    }

    /// Build a mapper from header keywords.
    pub fn from_header(header: &Header) -> Result<Self> {
        let crpix = [header.get_float("CRPIX1")?, header.get_float("CRPIX2")?];
        let crval = [header.get_float("CRVAL1")?, header.get_float("CRVAL2")?];
        let projection = parse_projection(header)?;
        let matrix = linear_matrix(header)?;

        let mut mapper = Self::new(crpix, crval, matrix)?;
        mapper.projection = projection;
        debug!(
            "built {} mapper: crpix={:?} crval={:?} scale={:.3e} deg/px",
            mapper.projection,
            mapper.crpix,
            mapper.crval,
            mapper.pixel_scale()
        );
        Ok(mapper)
    }

    /// Approximate pixel scale in degrees per pixel.
    pub fn pixel_scale(&self) -> f64 {
        determinant(&self.matrix).abs().sqrt()
    }

    /// Intermediate world coordinates (degrees) of a pixel.
    pub fn pixel_to_intermediate(&self, x: f64, y: f64) -> (f64, f64) {
        let u = x - self.crpix[0];
        let v = y - self.crpix[1];
        let m = &self.matrix;
        (m[0][0] * u + m[0][1] * v, m[1][0] * u + m[1][1] * v)
    }

    /// Sky position `(lon, lat)` in degrees of a 1-based pixel coordinate.
    ///
    /// Longitude is wrapped into `[0, 360)`.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        let (xi, eta) = self.pixel_to_intermediate(x, y);
        let xi = xi.to_radians();
        let eta = eta.to_radians();
        let lon0 = self.crval[0].to_radians();
        let (sin_d0, cos_d0) = self.crval[1].to_radians().sin_cos();

        let rho = xi.hypot(eta);
        if rho == 0.0 {
            return (wrap_degrees(self.crval[0]), self.crval[1]);
        }
        let c = rho.atan();
        let (sin_c, cos_c) = c.sin_cos();

        let lat = (cos_c * sin_d0 + eta * sin_c * cos_d0 / rho).asin();
        let lon = lon0 + (xi * sin_c).atan2(rho * cos_d0 * cos_c - eta * sin_d0 * sin_c);
        (wrap_degrees(lon.to_degrees()), lat.to_degrees())
    }

    /// Inverse of [`pixel_to_world`](Self::pixel_to_world).
    ///
    /// Returns `None` if the position is on or behind the tangent plane's
    /// horizon.
    pub fn world_to_pixel(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let (sin_d, cos_d) = lat.to_radians().sin_cos();
        let (sin_d0, cos_d0) = self.crval[1].to_radians().sin_cos();
        let (sin_da, cos_da) = (lon - self.crval[0]).to_radians().sin_cos();

        let cos_c = sin_d0 * sin_d + cos_d0 * cos_d * cos_da;
        if cos_c <= 0.0 {
            return None;
        }
        let xi = (cos_d * sin_da / cos_c).to_degrees();
        let eta = ((cos_d0 * sin_d - sin_d0 * cos_d * cos_da) / cos_c).to_degrees();

        let m = &self.matrix;
        let inv_det = 1.0 / determinant(m);
        let u = inv_det * (m[1][1] * xi - m[0][1] * eta);
        let v = inv_det * (-m[1][0] * xi + m[0][0] * eta);
        Some((u + self.crpix[0], v + self.crpix[1]))
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(deg: f64) -> f64 {
    let w = deg.rem_euclid(360.0);
    if w >= 360.0 {
        0.0
    } else {
        w
    }
}
