use std::{path::Path, sync::Arc};

use image::{
    DynamicImage, GrayAlphaImage, GrayImage, ImageBuffer, ImageFormat, Rgb32FImage, RgbImage,
    Rgba32FImage, RgbaImage, load_from_memory, load_from_memory_with_format,
};

use crate::{
    data_structures::texture::Image,
    error::{BakeError, Result},
    resources::load_binary,
};

fn dimension_error(label: &str) -> BakeError {
    BakeError::Image {
        label: label.to_string(),
        source: image::ImageError::Limits(image::error::LimitError::from_kind(
            image::error::LimitErrorKind::DimensionError,
        )),
    }
}

/// Decode an encoded image, trusting the mime type when one is given.
pub fn image_from_bytes(bytes: &[u8], label: &str, mime_type: Option<&str>) -> Result<Image> {
    let format = mime_type.and_then(ImageFormat::from_mime_type);
    let decoded = match format {
        Some(format) => load_from_memory_with_format(bytes, format),
        None => load_from_memory(bytes),
    }
    .map_err(|source| BakeError::Image {
        label: label.to_string(),
        source,
    })?;
    Image::from_dynamic(label, &decoded).ok_or_else(|| dimension_error(label))
}

fn u16s(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|b| u16::from_ne_bytes([b[0], b[1]]))
        .collect()
}

fn f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Convert pixels decoded by the `gltf` importer.
pub fn image_from_gltf_data(data: &gltf::image::Data, label: &str) -> Result<Image> {
    use gltf::image::Format;

    let (w, h) = (data.width, data.height);
    let pixels = &data.pixels;
    let dynamic = match data.format {
        Format::R8 => GrayImage::from_raw(w, h, pixels.clone()).map(DynamicImage::ImageLuma8),
        Format::R8G8 => {
            GrayAlphaImage::from_raw(w, h, pixels.clone()).map(DynamicImage::ImageLumaA8)
        }
        Format::R8G8B8 => RgbImage::from_raw(w, h, pixels.clone()).map(DynamicImage::ImageRgb8),
        Format::R8G8B8A8 => RgbaImage::from_raw(w, h, pixels.clone()).map(DynamicImage::ImageRgba8),
        Format::R16 => ImageBuffer::from_raw(w, h, u16s(pixels)).map(DynamicImage::ImageLuma16),
        Format::R16G16 => ImageBuffer::from_raw(w, h, u16s(pixels)).map(DynamicImage::ImageLumaA16),
        Format::R16G16B16 => ImageBuffer::from_raw(w, h, u16s(pixels)).map(DynamicImage::ImageRgb16),
        Format::R16G16B16A16 => {
            ImageBuffer::from_raw(w, h, u16s(pixels)).map(DynamicImage::ImageRgba16)
        }
        Format::R32G32B32FLOAT => {
            Rgb32FImage::from_raw(w, h, f32s(pixels)).map(DynamicImage::ImageRgb32F)
        }
        Format::R32G32B32A32FLOAT => {
            Rgba32FImage::from_raw(w, h, f32s(pixels)).map(DynamicImage::ImageRgba32F)
        }
    };
    dynamic
        .and_then(|dynamic| Image::from_dynamic(label, &dynamic))
        .ok_or_else(|| dimension_error(label))
}

/**
 * Loads the images of one glTF document.
 *
 * Embedded images are sliced out of their buffer view and external images are
 * read relative to `base`. Data URIs go through the `gltf` importer, which
 * decodes every image of the document at once, so that happens at most once.
 */
pub struct ImageLoader<'a> {
    document: &'a gltf::Document,
    buffers: &'a [gltf::buffer::Data],
    path: &'a Path,
    base: &'a Path,
    imported: Option<Vec<gltf::image::Data>>,
}

impl<'a> ImageLoader<'a> {
    pub fn new(
        document: &'a gltf::Document,
        buffers: &'a [gltf::buffer::Data],
        path: &'a Path,
        base: &'a Path,
    ) -> Self {
        Self {
            document,
            buffers,
            path,
            base,
            imported: None,
        }
    }

    pub fn load(&mut self, image: &gltf::Image) -> Result<Option<Arc<Image>>> {
        let label = image
            .name()
            .map_or_else(|| format!("Image_{}", image.index()), str::to_string);
        let image = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let buffer = &self.buffers[view.buffer().index()].0;
                let start = view.offset();
                let end = start + view.length();
                let Some(bytes) = buffer.get(start..end) else {
                    log::warn!("Image {label:?} points outside of its buffer.");
                    return Ok(None);
                };
                image_from_bytes(bytes, &label, Some(mime_type))?
            }
            gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
                let Some(data) = self.imported()?.get(image.index()) else {
                    log::warn!("Image {label:?} was not decoded by the glTF importer.");
                    return Ok(None);
                };
                image_from_gltf_data(data, &label)?
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                let bytes = load_binary(&self.base.join(uri))?;
                image_from_bytes(&bytes, &label, mime_type)?
            }
        };
        log::debug!("Decoded image {label:?} ({}x{})", image.width(), image.height());
        Ok(Some(Arc::new(image)))
    }

    fn imported(&mut self) -> Result<&[gltf::image::Data]> {
        if self.imported.is_none() {
            let images = gltf::import_images(self.document, Some(self.base), self.buffers)
                .map_err(|source| BakeError::Gltf {
                    path: self.path.to_path_buf(),
                    source,
                })?;
            self.imported = Some(images);
        }
        Ok(self.imported.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;

    fn png_bytes(img: RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn decodes_png_with_and_without_mime_type() {
        let bytes = png_bytes(RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 255])));
        let image = image_from_bytes(&bytes, "red", Some("image/png")).unwrap();
        assert_eq!(image.size(), (3, 2));
        assert_eq!(image.pixel(2, 1), Some([1.0, 0.0, 0.0, 1.0]));

        let image = image_from_bytes(&bytes, "red", None).unwrap();
        assert_eq!(image.size(), (3, 2));
    }

    #[test]
    fn garbage_is_an_image_error() {
        let err = image_from_bytes(b"not an image", "junk", Some("image/png")).unwrap_err();
        assert!(matches!(err, BakeError::Image { .. }));
    }

    #[test]
    fn converts_importer_pixels() {
        let data = gltf::image::Data {
            pixels: vec![255, 0, 0, 0, 255, 0],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let image = image_from_gltf_data(&data, "rg").unwrap();
        assert_eq!(image.size(), (2, 1));
        assert_eq!(image.pixel(0, 0), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(image.pixel(1, 0), Some([0.0, 1.0, 0.0, 1.0]));

        let short = gltf::image::Data {
            pixels: vec![0; 3],
            ..data
        };
        assert!(matches!(
            image_from_gltf_data(&short, "short").unwrap_err(),
            BakeError::Image { .. }
        ));
    }
}
