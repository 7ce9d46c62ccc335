use std::path::{Path, PathBuf};

use dicom::core::Tag;
use dicom::object::{DefaultDicomObject, OpenFileOptions, open_file};
use dicom::pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use dicom_dictionary_std::tags;
use ndarray::{Array3, s};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("could not open DICOM file {path}: {source}")]
    Open {
        path: PathBuf,
        source: dicom::object::ReadError,
    },

    #[error("could not decode pixel data of {path}: {source}")]
    Pixels {
        path: PathBuf,
        source: dicom::pixeldata::Error,
    },
}

/// Header fields needed to place a slice into a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceMeta {
    pub series_number: i32,
    pub rows: u32,
    pub columns: u32,
    pub description: Option<String>,
    pub instance_number: i32,
}

/// Decoded pixel grid of one slice plus its calibration parameters.
///
/// `samples` holds raw stored values in (rows, columns, channels) order; no
/// rescale has been applied yet.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    pub samples: Array3<i32>,
    pub rescale_slope: f64,
    pub rescale_intercept: f64,
    pub bits_allocated: u16,
    /// Photometric interpretation as stored in the file (e.g. `MONOCHROME2`,
    /// `RGB`). Exposed for callers that need the display convention; the
    /// render pipeline keys off the channel count instead.
    pub photometric_interpretation: String,
}

/// Read series-level header fields without touching pixel data.
///
/// Missing Rows/Columns/InstanceNumber default to `0` and a missing series
/// description stays `None`; only a file that cannot be opened at all is an
/// error.
pub fn read_meta(path: &Path) -> Result<SliceMeta, DecodeError> {
    let obj = OpenFileOptions::new()
        .read_until(tags::PIXEL_DATA)
        .open_file(path)
        .map_err(|source| DecodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(SliceMeta {
        series_number: int_element(&obj, tags::SERIES_NUMBER).unwrap_or(0) as i32,
        rows: dimension_element(&obj, tags::ROWS),
        columns: dimension_element(&obj, tags::COLUMNS),
        description: str_element(&obj, tags::SERIES_DESCRIPTION),
        instance_number: int_element(&obj, tags::INSTANCE_NUMBER).unwrap_or(0) as i32,
    })
}

/// Decode the pixel grid of one slice together with its rescale parameters.
/// Missing RescaleSlope/RescaleIntercept default to `1.0`/`0.0`.
pub fn decode_pixels(path: &Path) -> Result<PixelBuffer, DecodeError> {
    let obj = open_file(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let decoded = obj.decode_pixel_data().map_err(|source| DecodeError::Pixels {
        path: path.to_path_buf(),
        source,
    })?;

    // Stored values only; calibration happens in the render pipeline so the
    // out-of-scan sentinel can be zeroed before the slope is applied.
    let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
    let samples = decoded
        .to_ndarray_with_options::<i32>(&options)
        .map_err(|source| DecodeError::Pixels {
            path: path.to_path_buf(),
            source,
        })?
        .slice_move(s![0, .., .., ..]);

    Ok(PixelBuffer {
        samples,
        rescale_slope: float_element(&obj, tags::RESCALE_SLOPE).unwrap_or(1.0),
        rescale_intercept: float_element(&obj, tags::RESCALE_INTERCEPT).unwrap_or(0.0),
        bits_allocated: decoded.bits_allocated(),
        photometric_interpretation: decoded.photometric_interpretation().as_str().to_string(),
    })
}

fn int_element(obj: &DefaultDicomObject, tag: Tag) -> Option<i64> {
    obj.element(tag).ok()?.to_int::<i64>().ok()
}

fn dimension_element(obj: &DefaultDicomObject, tag: Tag) -> u32 {
    int_element(obj, tag)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

fn float_element(obj: &DefaultDicomObject, tag: Tag) -> Option<f64> {
    obj.element(tag).ok()?.to_float64().ok()
}

fn str_element(obj: &DefaultDicomObject, tag: Tag) -> Option<String> {
    obj.element(tag)
        .ok()?
        .to_str()
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
