//! Primary data unit decoding.
//!
//! Converts the big-endian samples following the header into a 2-D `f64`
//! array shaped `(NAXIS2, NAXIS1)`, with BSCALE/BZERO applied and BLANK
//! samples set to NaN. Row 0 is the first row stored in the file.

use bytemuck::pod_collect_to_vec;
use log::debug;
use ndarray::Array2;

use crate::error::{Error, Result};
use crate::header::Header;

/// Raw samples of the first image plane, typed by BITPIX.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSamples {
    U8(Vec<u8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Byte width of one sample for a BITPIX value.
pub fn bytes_per_pixel(bitpix: i64) -> Result<usize> {
    match bitpix {
        8 => Ok(1),
        16 => Ok(2),
        32 | -32 => Ok(4),
        64 | -64 => Ok(8),
        other => Err(Error::InvalidBitpix(other)),
    }
}

/// Decode `count` big-endian samples from the front of `raw`.
pub fn decode_samples(raw: &[u8], bitpix: i64, count: usize) -> Result<RawSamples> {
    let need = count
        .checked_mul(bytes_per_pixel(bitpix)?)
        .ok_or_else(|| Error::MalformedHeader(format!("{count} samples overflow the data size")))?;
    if raw.len() < need {
        return Err(Error::UnexpectedEof);
    }
    let raw = &raw[..need];

    let samples = match bitpix {
        8 => RawSamples::U8(raw.to_vec()),
        16 => {
            // Collect into an aligned Vec first, then swap to native order in place.
            let mut v: Vec<i16> = pod_collect_to_vec(raw);
            v.iter_mut().for_each(|p| *p = i16::from_be(*p));
            RawSamples::I16(v)
        }
        32 => {
            let mut v: Vec<i32> = pod_collect_to_vec(raw);
            v.iter_mut().for_each(|p| *p = i32::from_be(*p));
            RawSamples::I32(v)
        }
        64 => {
            let mut v: Vec<i64> = pod_collect_to_vec(raw);
            v.iter_mut().for_each(|p| *p = i64::from_be(*p));
            RawSamples::I64(v)
        }
        -32 => {
            let mut v: Vec<f32> = pod_collect_to_vec(raw);
            v.iter_mut()
                .for_each(|p| *p = f32::from_bits(u32::from_be(p.to_bits())));
            RawSamples::F32(v)
        }
        -64 => {
            let mut v: Vec<f64> = pod_collect_to_vec(raw);
            v.iter_mut()
                .for_each(|p| *p = f64::from_bits(u64::from_be(p.to_bits())));
            RawSamples::F64(v)
        }
        other => return Err(Error::InvalidBitpix(other)),
    };
    Ok(samples)
}

impl RawSamples {
    /// Apply `physical = bzero + bscale * raw`; integer samples equal to
    /// `blank` become NaN.
    pub fn to_physical(&self, bscale: f64, bzero: f64, blank: Option<i64>) -> Vec<f64> {
        let scale = |p: f64| bzero + bscale * p;
        let int = |p: i64| {
            if Some(p) == blank {
                f64::NAN
            } else {
                scale(p as f64)
            }
        };
        match self {
            RawSamples::U8(v) => v.iter().map(|&p| int(p as i64)).collect(),
            RawSamples::I16(v) => v.iter().map(|&p| int(p as i64)).collect(),
            RawSamples::I32(v) => v.iter().map(|&p| int(p as i64)).collect(),
            RawSamples::I64(v) => v.iter().map(|&p| int(p)).collect(),
            RawSamples::F32(v) => v.iter().map(|&p| scale(p as f64)).collect(),
            RawSamples::F64(v) => v.iter().map(|&p| scale(p)).collect(),
        }
    }
}

/// Image plane shape `(rows, cols)` = `(NAXIS2, NAXIS1)`.
///
/// Axes beyond the second only select the first plane.
pub fn image_shape(header: &Header) -> Result<(usize, usize)> {
    let axes = header.axes()?;
    if axes.len() < 2 {
        return Err(Error::MalformedHeader(format!(
            "image needs at least 2 axes, NAXIS = {}",
            axes.len()
        )));
    }
    if axes.len() > 2 {
        debug!("rendering first plane of {}-axis image {:?}", axes.len(), axes);
    }
    let (rows, cols) = (axes[1], axes[0]);
    if rows.checked_mul(cols).is_none() {
        return Err(Error::MalformedHeader(format!(
            "image plane {cols} x {rows} is too large"
        )));
    }
    Ok((rows, cols))
}

/// Decode the first image plane of the data unit `data`.
pub fn read_pixels(data: &[u8], header: &Header) -> Result<Array2<f64>> {
    let bitpix = header.bitpix()?;
    let (rows, cols) = image_shape(header)?;
    let bscale = header.float_opt("BSCALE")?.unwrap_or(1.0);
    let bzero = header.float_opt("BZERO")?.unwrap_or(0.0);
    let blank = if bitpix > 0 { header.int_opt("BLANK")? } else { None };

    // image_shape has already rejected an overflowing product.
    let raw = decode_samples(data, bitpix, rows * cols)?;
    let physical = raw.to_physical(bscale, bzero, blank);
    Array2::from_shape_vec((rows, cols), physical)
        .map_err(|e| Error::MalformedHeader(format!("pixel array shape: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(lines: &[&str]) -> Header {
        Header::parse(&lines.join("\n"))
    }

    #[test]
    fn bytes_per_pixel_all_bitpix() {
        assert_eq!(bytes_per_pixel(8).unwrap(), 1);
        assert_eq!(bytes_per_pixel(16).unwrap(), 2);
        assert_eq!(bytes_per_pixel(-32).unwrap(), 4);
        assert_eq!(bytes_per_pixel(-64).unwrap(), 8);
        assert!(matches!(bytes_per_pixel(12), Err(Error::InvalidBitpix(12))));
    }

    #[test]
    fn decodes_big_endian_i16() {
        let raw = [0x01, 0x00, 0xFF, 0xFE];
        assert_eq!(
            decode_samples(&raw, 16, 2).unwrap(),
            RawSamples::I16(vec![256, -2])
        );
    }

    #[test]
    fn decodes_big_endian_f32() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&1.5f32.to_be_bytes());
        raw.extend_from_slice(&(-2.25f32).to_be_bytes());
        assert_eq!(
            decode_samples(&raw, -32, 2).unwrap(),
            RawSamples::F32(vec![1.5, -2.25])
        );
    }

    #[test]
    fn short_data_is_eof() {
        assert!(matches!(
            decode_samples(&[0u8; 7], -64, 1),
            Err(Error::UnexpectedEof)
        ));
    }

    #[test]
    fn physical_scaling_and_blank() {
        let raw = RawSamples::I16(vec![0, 1, -1]);
        let phys = raw.to_physical(2.0, 32768.0, Some(-1));
        assert_eq!(phys[0], 32768.0);
        assert_eq!(phys[1], 32770.0);
        assert!(phys[2].is_nan());
    }

    #[test]
    fn read_pixels_shapes_rows_by_cols() {
        let h = header(&[
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =                    3",
            "NAXIS2  =                    2",
        ]);
        let data = [1u8, 2, 3, 4, 5, 6];
        let px = read_pixels(&data, &h).unwrap();
        assert_eq!(px.dim(), (2, 3));
        assert_eq!(px[[0, 2]], 3.0);
        assert_eq!(px[[1, 0]], 4.0);
    }

    #[test]
    fn cube_uses_first_plane() {
        let h = header(&[
            "BITPIX  =                    8",
            "NAXIS   =                    3",
            "NAXIS1  =                    2",
            "NAXIS2  =                    2",
            "NAXIS3  =                    2",
        ]);
        let data = [1u8, 2, 3, 4, 9, 9, 9, 9];
        let px = read_pixels(&data, &h).unwrap();
        assert_eq!(px.iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn one_axis_is_malformed() {
        let h = header(&[
            "BITPIX  =                    8",
            "NAXIS   =                    1",
            "NAXIS1  =                    4",
        ]);
        assert!(matches!(read_pixels(&[0; 4], &h), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn oversized_axes_are_malformed() {
        let h = header(&[
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =           8589934592",
            "NAXIS2  =           8589934592",
        ]);
        assert!(matches!(image_shape(&h), Err(Error::MalformedHeader(_))));
        assert!(matches!(read_pixels(&[0; 16], &h), Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn oversized_sample_count_is_malformed() {
        assert!(matches!(
            decode_samples(&[0; 16], -64, usize::MAX / 4),
            Err(Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn blank_ignored_for_float_data() {
        let h = header(&[
            "BITPIX  =                  -32",
            "NAXIS   =                    2",
            "NAXIS1  =                    1",
            "NAXIS2  =                    1",
            "BLANK   =                    0",
        ]);
        let px = read_pixels(&0.0f32.to_be_bytes(), &h).unwrap();
        assert_eq!(px[[0, 0]], 0.0);
    }
}
