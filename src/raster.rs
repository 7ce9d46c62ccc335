use image::{DynamicImage, ImageBuffer};

/// Pixel layout of a rendered raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterLayout {
    /// One 8-bit greyscale sample per pixel.
    Gray8,
    /// One 16-bit signed sample per pixel, little-endian. Produced only when
    /// rendering without a window.
    Gray16,
    /// Three 8-bit samples per pixel.
    Rgb8,
    /// Four 8-bit samples per pixel.
    Rgba8,
}

impl RasterLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            RasterLayout::Gray8 => 1,
            RasterLayout::Gray16 => 2,
            RasterLayout::Rgb8 => 3,
            RasterLayout::Rgba8 => 4,
        }
    }
}

/// Flat byte buffer holding one rendered slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    layout: RasterLayout,
    data: Vec<u8>,
}

impl Raster {
    pub(crate) fn new(width: u32, height: u32, layout: RasterLayout, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * layout.bytes_per_pixel()
        );
        Self {
            width,
            height,
            layout,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> RasterLayout {
        self.layout
    }

    /// Bytes of one row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Convert into an [`image::DynamicImage`] for saving or display.
    ///
    /// Returns `None` for [`RasterLayout::Gray16`]: those rasters carry
    /// signed calibrated values that have no direct display interpretation,
    /// so callers wanting an image should render with a window instead.
    pub fn to_image(&self) -> Option<DynamicImage> {
        match self.layout {
            RasterLayout::Gray8 => {
                ImageBuffer::from_raw(self.width, self.height, self.data.clone())
                    .map(DynamicImage::ImageLuma8)
            }
            RasterLayout::Gray16 => None,
            RasterLayout::Rgb8 => {
                ImageBuffer::from_raw(self.width, self.height, self.data.clone())
                    .map(DynamicImage::ImageRgb8)
            }
            RasterLayout::Rgba8 => {
                ImageBuffer::from_raw(self.width, self.height, self.data.clone())
                    .map(DynamicImage::ImageRgba8)
            }
        }
    }
}
