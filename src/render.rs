use std::path::Path;

use ndarray::Array3;
use rayon::prelude::*;
use thiserror::Error;

use crate::decode::{self, DecodeError, PixelBuffer};
use crate::raster::{Raster, RasterLayout};

/// Raw value used by CT scanners for pixels outside the scan field of view.
/// Zeroed before calibration so the sentinel never leaks into physical units.
const OUT_OF_SCAN_RAW: i32 = -2000;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not access source file: {0}")]
    FileAccess(#[source] DecodeError),

    #[error("could not decode source file: {0}")]
    Decode(#[source] DecodeError),

    #[error("window width must be positive, got {width}")]
    InvalidWindow { width: f64 },

    #[error("unsupported raster shape: {channels} channel(s) at {bits_allocated} bits allocated")]
    UnsupportedFormat {
        channels: usize,
        bits_allocated: u16,
    },
}

/// Value range to compress into the visible greyscale, in calibrated units.
///
/// `center` is the midpoint of the clinically relevant range and `width` its
/// total extent, e.g. center 40 / width 400 for soft tissue in Hounsfield
/// units. `width` must be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    pub center: f64,
    pub width: f64,
}

impl WindowSpec {
    pub fn new(center: f64, width: f64) -> Self {
        Self { center, width }
    }

    fn validate(self) -> Result<(), RenderError> {
        if self.width > 0.0 {
            Ok(())
        } else {
            Err(RenderError::InvalidWindow { width: self.width })
        }
    }
}

/// Render one slice into a displayable raster.
///
/// The file is decoded, calibrated into physical units with its rescale
/// slope/intercept, optionally windowed, and packed:
///
/// - with a window, output is 8-bit and the layout follows the channel count
///   (1 greyscale, 3 RGB, 4 RGBA); any other channel count is
///   [`RenderError::UnsupportedFormat`];
/// - without a window, a single-channel slice passes through as calibrated
///   16-bit values ([`RasterLayout::Gray16`]). Callers taking that path must
///   bring their own display mapping for non-8-bit data; no default window is
///   applied on their behalf.
///
/// The output is deterministic: the same file and window always produce
/// byte-identical rasters.
pub fn render(path: impl AsRef<Path>, window: Option<WindowSpec>) -> Result<Raster, RenderError> {
    if let Some(window) = window {
        window.validate()?;
    }

    let buffer = decode::decode_pixels(path.as_ref()).map_err(|err| match err {
        DecodeError::Open { .. } => RenderError::FileAccess(err),
        DecodeError::Pixels { .. } => RenderError::Decode(err),
    })?;

    let calibrated = calibrate(&buffer);
    pack_raster(&calibrated, window, buffer.bits_allocated)
}

/// Pack calibrated values into a raster according to the channel count:
/// windowed output is 8-bit (1 greyscale, 3 RGB, 4 RGBA), windowless
/// single-channel data passes through as 16-bit, everything else is
/// unsupported.
fn pack_raster(
    calibrated: &Array3<i16>,
    window: Option<WindowSpec>,
    bits_allocated: u16,
) -> Result<Raster, RenderError> {
    let (rows, columns, channels) = calibrated.dim();
    let (width, height) = (columns as u32, rows as u32);

    match (window, channels) {
        (Some(window), 1) => Ok(Raster::new(
            width,
            height,
            RasterLayout::Gray8,
            apply_window(calibrated, window),
        )),
        (Some(window), 3) => Ok(Raster::new(
            width,
            height,
            RasterLayout::Rgb8,
            apply_window(calibrated, window),
        )),
        (Some(window), 4) => Ok(Raster::new(
            width,
            height,
            RasterLayout::Rgba8,
            apply_window(calibrated, window),
        )),
        (None, 1) => Ok(Raster::new(
            width,
            height,
            RasterLayout::Gray16,
            calibrated.iter().flat_map(|v| v.to_le_bytes()).collect(),
        )),
        _ => Err(RenderError::UnsupportedFormat {
            channels,
            bits_allocated,
        }),
    }
}

/// Convert raw stored values to calibrated physical units.
///
/// The out-of-scan sentinel is zeroed first, then each value becomes
/// `round(raw * slope) + intercept`, computed in f64 so a slope other than 1
/// cannot overflow an intermediate, and narrowed to the i16 domain.
fn calibrate(buffer: &PixelBuffer) -> Array3<i16> {
    let slope = buffer.rescale_slope;
    let intercept = buffer.rescale_intercept;
    buffer.samples.mapv(|raw| {
        let raw = if raw == OUT_OF_SCAN_RAW { 0 } else { raw };
        let value = (raw as f64 * slope).round() + intercept;
        value.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
    })
}

/// Clip calibrated values to the window range and rescale to `[0, 255]`.
///
/// Rounding is half away from zero, so a value exactly at the window center
/// maps to 128.
fn apply_window(values: &Array3<i16>, window: WindowSpec) -> Vec<u8> {
    let lo = window.center - window.width / 2.0;
    let hi = window.center + window.width / 2.0;
    values
        .into_par_iter()
        .map(|&v| {
            let clipped = f64::from(v).clamp(lo, hi);
            ((clipped - lo) / window.width * 255.0).round() as u8
        })
        .collect()
}
