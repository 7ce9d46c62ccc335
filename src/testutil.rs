//! Helpers for writing small synthetic DICOM files in tests.

use std::path::Path;

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::{tags, uids};

pub(crate) struct MetaSpec<'a> {
    pub series_number: i32,
    pub rows: Option<u16>,
    pub columns: Option<u16>,
    pub description: Option<&'a str>,
    pub instance_number: Option<i32>,
}

pub(crate) struct PixelSpec<'a> {
    pub rows: u16,
    pub columns: u16,
    /// Signed 16-bit stored values, row-major.
    pub values: Vec<i16>,
    pub rescale_slope: &'a str,
    pub rescale_intercept: &'a str,
}

pub(crate) struct RgbPixelSpec {
    pub rows: u16,
    pub columns: u16,
    /// Interleaved 8-bit RGB samples, row-major.
    pub samples: Vec<u8>,
}

/// Write a header-only DICOM file carrying just the series-level fields the
/// indexer reads. `None` fields are left out entirely to exercise defaulting.
pub(crate) fn write_meta_dicom(path: &Path, spec: &MetaSpec<'_>) {
    let mut obj = base_object(spec.series_number, spec.instance_number.unwrap_or(0));
    if let Some(rows) = spec.rows {
        obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)));
    }
    if let Some(columns) = spec.columns {
        obj.put(DataElement::new(
            tags::COLUMNS,
            VR::US,
            PrimitiveValue::from(columns),
        ));
    }
    if let Some(description) = spec.description {
        obj.put(DataElement::new(
            tags::SERIES_DESCRIPTION,
            VR::LO,
            PrimitiveValue::from(description),
        ));
    }
    if let Some(instance_number) = spec.instance_number {
        obj.put(DataElement::new(
            tags::INSTANCE_NUMBER,
            VR::IS,
            PrimitiveValue::from(instance_number.to_string()),
        ));
    }
    write_object(path, obj);
}

/// Write a complete single-frame MONOCHROME2 DICOM file with signed 16-bit
/// pixel data in the explicit VR little endian transfer syntax.
pub(crate) fn write_pixel_dicom(path: &Path, spec: &PixelSpec<'_>) {
    assert_eq!(spec.values.len(), spec.rows as usize * spec.columns as usize);

    let mut obj = base_object(1, 1);
    obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(spec.rows)));
    obj.put(DataElement::new(
        tags::COLUMNS,
        VR::US,
        PrimitiveValue::from(spec.columns),
    ));
    obj.put(DataElement::new(
        tags::SAMPLES_PER_PIXEL,
        VR::US,
        PrimitiveValue::from(1_u16),
    ));
    obj.put(DataElement::new(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    obj.put(DataElement::new(
        tags::BITS_ALLOCATED,
        VR::US,
        PrimitiveValue::from(16_u16),
    ));
    obj.put(DataElement::new(
        tags::BITS_STORED,
        VR::US,
        PrimitiveValue::from(16_u16),
    ));
    obj.put(DataElement::new(
        tags::HIGH_BIT,
        VR::US,
        PrimitiveValue::from(15_u16),
    ));
    obj.put(DataElement::new(
        tags::PIXEL_REPRESENTATION,
        VR::US,
        PrimitiveValue::from(1_u16),
    ));
    obj.put(DataElement::new(
        tags::RESCALE_SLOPE,
        VR::DS,
        PrimitiveValue::from(spec.rescale_slope),
    ));
    obj.put(DataElement::new(
        tags::RESCALE_INTERCEPT,
        VR::DS,
        PrimitiveValue::from(spec.rescale_intercept),
    ));

    let bytes: Vec<u8> = spec
        .values
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    obj.put(DataElement::new(
        tags::PIXEL_DATA,
        VR::OW,
        PrimitiveValue::from(bytes),
    ));

    write_object(path, obj);
}

/// Write a complete single-frame interleaved RGB DICOM file with 8-bit
/// samples in the explicit VR little endian transfer syntax.
pub(crate) fn write_rgb_dicom(path: &Path, spec: &RgbPixelSpec) {
    assert_eq!(
        spec.samples.len(),
        spec.rows as usize * spec.columns as usize * 3
    );

    let mut obj = base_object(1, 1);
    obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(spec.rows)));
    obj.put(DataElement::new(
        tags::COLUMNS,
        VR::US,
        PrimitiveValue::from(spec.columns),
    ));
    obj.put(DataElement::new(
        tags::SAMPLES_PER_PIXEL,
        VR::US,
        PrimitiveValue::from(3_u16),
    ));
    obj.put(DataElement::new(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from("RGB"),
    ));
    obj.put(DataElement::new(
        tags::PLANAR_CONFIGURATION,
        VR::US,
        PrimitiveValue::from(0_u16),
    ));
    obj.put(DataElement::new(
        tags::BITS_ALLOCATED,
        VR::US,
        PrimitiveValue::from(8_u16),
    ));
    obj.put(DataElement::new(
        tags::BITS_STORED,
        VR::US,
        PrimitiveValue::from(8_u16),
    ));
    obj.put(DataElement::new(
        tags::HIGH_BIT,
        VR::US,
        PrimitiveValue::from(7_u16),
    ));
    obj.put(DataElement::new(
        tags::PIXEL_REPRESENTATION,
        VR::US,
        PrimitiveValue::from(0_u16),
    ));
    obj.put(DataElement::new(
        tags::PIXEL_DATA,
        VR::OB,
        PrimitiveValue::from(spec.samples.clone()),
    ));

    write_object(path, obj);
}

fn base_object(series_number: i32, instance_number: i32) -> InMemDicomObject {
    let mut obj = InMemDicomObject::new_empty();
    obj.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
    ));
    obj.put(DataElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(sop_instance_uid(series_number, instance_number)),
    ));
    obj.put(DataElement::new(
        tags::SERIES_NUMBER,
        VR::IS,
        PrimitiveValue::from(series_number.to_string()),
    ));
    obj
}

fn sop_instance_uid(series_number: i32, instance_number: i32) -> String {
    format!(
        "1.2.826.0.1.3680043.2.1125.{}.{}",
        series_number.unsigned_abs(),
        instance_number.unsigned_abs()
    )
}

fn write_object(path: &Path, obj: InMemDicomObject) {
    let sop_instance_uid = obj
        .element(tags::SOP_INSTANCE_UID)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let file_obj = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::SECONDARY_CAPTURE_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(sop_instance_uid),
        )
        .expect("file meta table should build");
    file_obj
        .write_to_file(path)
        .expect("test DICOM file should be written");
}
