//! Point queries: display pixel to sky position.

use log::debug;
use serde::Serialize;

use crate::error::Result;
use crate::registry::SessionRegistry;

/// Sky coordinate of a queried display pixel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkyPosition {
    /// Right ascension / longitude in degrees, `[0, 360)`.
    pub lon: f64,
    /// Declination / latitude in degrees.
    pub lat: f64,
    /// Right ascension as `HH:MM:SS.ss`.
    pub ra_hms: String,
    /// Declination as `+DD:MM:SS.ss`.
    pub dec_dms: String,
}

impl SkyPosition {
    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            ra_hms: format_ra_hms(lon),
            dec_dms: format_dec_dms(lat),
        }
    }
}

/// Split a non-negative magnitude into (whole, minutes, hundredths of a
/// second), rounding once so the seconds field never reads 60.00.
fn sexagesimal(value: f64) -> (u64, u64, u64) {
    let centis = (value * 360_000.0).round() as u64;
    let whole = centis / 360_000;
    let minutes = (centis / 6_000) % 60;
    let centis = centis % 6_000;
    (whole, minutes, centis)
}

fn write_sexagesimal(whole: u64, minutes: u64, centis: u64) -> String {
    format!(
        "{whole:02}:{minutes:02}:{:02}.{:02}",
        centis / 100,
        centis % 100
    )
}

/// Right ascension in degrees as hours `HH:MM:SS.ss`, wrapped into `[0, 24)`.
pub fn format_ra_hms(deg: f64) -> String {
    let hours = (deg / 15.0).rem_euclid(24.0);
    let (h, m, cs) = sexagesimal(hours);
    write_sexagesimal(h % 24, m, cs)
}

/// Declination in degrees as `±DD:MM:SS.ss`.
pub fn format_dec_dms(deg: f64) -> String {
    let sign = if deg.is_sign_negative() && deg != 0.0 { '-' } else { '+' };
    let (d, m, cs) = sexagesimal(deg.abs());
    // Values that round to zero print as positive.
    let sign = if d == 0 && m == 0 && cs == 0 { '+' } else { sign };
    format!("{sign}{}", write_sexagesimal(d, m, cs))
}

/// Sky position of display pixel `(pixel_x, pixel_y)` in image `id`.
///
/// The two axes use different origins:
///
/// - `pixel_x` is the 1-based FITS column and goes to the mapper unchanged.
///   The centre of display column index `c` is `pixel_x = c + 1`.
/// - `pixel_y` is the 0-based display row counted down from the top of the
///   rendered (row-flipped) image. It becomes `rows - pixel_y`, so display
///   row index `r` is FITS row `rows - r`.
///
/// The sample at display index `(c, r)` is therefore queried as
/// `locate(registry, id, c + 1, r)`.
pub fn locate(
    registry: &SessionRegistry,
    id: &str,
    pixel_x: f64,
    pixel_y: f64,
) -> Result<SkyPosition> {
    let entry = registry.get(id)?;
    let corrected_y = entry.rows as f64 - pixel_y;
    let (lon, lat) = entry.mapper.pixel_to_world(pixel_x, corrected_y);
    debug!("locate {id:?} ({pixel_x}, {pixel_y}) -> ({lon:.6}, {lat:.6})");
    Ok(SkyPosition::from_degrees(lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::wcs::WcsMapper;

    #[test]
    fn ra_formatting() {
        assert_eq!(format_ra_hms(0.0), "00:00:00.00");
        assert_eq!(format_ra_hms(180.0), "12:00:00.00");
        assert_eq!(format_ra_hms(10.684708), "00:42:44.33");
        assert_eq!(format_ra_hms(-15.0), "23:00:00.00");
        assert_eq!(format_ra_hms(375.0), "01:00:00.00");
    }

    #[test]
    fn ra_rounding_carries() {
        // 59.999 s rounds up into the next minute and hour.
        let deg = (23.0 + 59.0 / 60.0 + 59.999 / 3600.0) * 15.0;
        assert_eq!(format_ra_hms(deg), "00:00:00.00");
        let deg = (1.0 + 59.0 / 60.0 + 59.996 / 3600.0) * 15.0;
        assert_eq!(format_ra_hms(deg), "02:00:00.00");
    }

    #[test]
    fn dec_formatting() {
        assert_eq!(format_dec_dms(0.0), "+00:00:00.00");
        assert_eq!(format_dec_dms(41.269065), "+41:16:08.63");
        assert_eq!(format_dec_dms(-5.5), "-05:30:00.00");
        assert_eq!(format_dec_dms(-90.0), "-90:00:00.00");
        assert_eq!(format_dec_dms(-0.000_000_1), "+00:00:00.00");
    }

    #[test]
    fn dec_rounding_carries() {
        let deg = -(10.0 + 59.0 / 60.0 + 59.999 / 3600.0);
        assert_eq!(format_dec_dms(deg), "-11:00:00.00");
    }

    #[test]
    fn locate_inverts_rows() {
        let reg = SessionRegistry::new();
        let wcs = WcsMapper::new([100.0, 100.0], [180.0, 0.0], [[-0.001, 0.0], [0.0, 0.001]])
            .unwrap();
        reg.put("m", wcs.clone(), 200);

        let pos = locate(&reg, "m", 100.0, 100.0).unwrap();
        assert!((pos.lon - 180.0).abs() < 1e-9);
        assert!(pos.lat.abs() < 1e-9);
        assert_eq!(pos.ra_hms, "12:00:00.00");

        let pos = locate(&reg, "m", 40.0, 30.0).unwrap();
        let (lon, lat) = wcs.pixel_to_world(40.0, 170.0);
        assert_eq!((pos.lon, pos.lat), (lon, lat));
        assert!(pos.lat > 0.0);
    }

    #[test]
    fn locate_unknown_image() {
        let reg = SessionRegistry::new();
        assert!(matches!(
            locate(&reg, "nope", 1.0, 1.0),
            Err(Error::UnknownImage(_))
        ));
    }

    #[test]
    fn serializes_as_flat_object() {
        let pos = SkyPosition::from_degrees(180.0, -5.5);
        let json = serde_json::to_value(&pos).unwrap();
        assert_eq!(json["ra_hms"], "12:00:00.00");
        assert_eq!(json["dec_dms"], "-05:30:00.00");
        assert_eq!(json["lon"], 180.0);
    }
}
