use crate::application::ports::media_processor::{MediaProcessor, PhotoMetadata};
use crate::domain::value_objects::GeoPoint;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{In, Reader, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;
use thiserror::Error;
use tokio::task::spawn_blocking;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("EXIF parse failed: {0}")]
    Exif(#[from] exif::Error),
    #[error("Image codec failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        AppError::MediaError(err.to_string())
    }
}

/// EXIF extraction and bounded re-encoding for imported photos.
pub struct ImageMediaProcessor {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl ImageMediaProcessor {
    pub fn new(max_dimension: u32, jpeg_quality: u8) -> Self {
        Self {
            max_dimension,
            jpeg_quality,
        }
    }
}

#[async_trait]
impl MediaProcessor for ImageMediaProcessor {
    async fn read_metadata(&self, bytes: &[u8]) -> Result<PhotoMetadata, AppError> {
        let bytes = bytes.to_vec();
        let metadata = spawn_blocking(move || extract_metadata(&bytes))
            .await
            .map_err(MediaError::from)?;
        Ok(metadata)
    }

    async fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>, AppError> {
        let bytes = bytes.to_vec();
        let max_dimension = self.max_dimension;
        let quality = self.jpeg_quality;

        let compressed = spawn_blocking(move || -> Result<Vec<u8>, MediaError> {
            let img = image::load_from_memory(&bytes)?;
            let img = if img.width().max(img.height()) > max_dimension {
                img.thumbnail(max_dimension, max_dimension)
            } else {
                img
            };

            let rgb = img.to_rgb8();
            let mut out = Vec::new();
            let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
            encoder.encode_image(&rgb)?;
            Ok(out)
        })
        .await
        .map_err(MediaError::from)?
        .map_err(MediaError::from)?;

        Ok(compressed)
    }
}

/// Images without EXIF are the common case, not an error.
fn extract_metadata(bytes: &[u8]) -> PhotoMetadata {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!(error = %e, "No EXIF container in imported image");
            return PhotoMetadata::default();
        }
    };

    let point = read_gps(&exif);
    let captured_at = read_datetime(&exif);
    PhotoMetadata { point, captured_at }
}

fn read_gps(exif: &exif::Exif) -> Option<GeoPoint> {
    let latitude = dms_to_decimal(exif, Tag::GPSLatitude)?;
    let longitude = dms_to_decimal(exif, Tag::GPSLongitude)?;

    let latitude = apply_ref(latitude, exif, Tag::GPSLatitudeRef, 'S');
    let longitude = apply_ref(longitude, exif, Tag::GPSLongitudeRef, 'W');

    GeoPoint::new(latitude, longitude).ok()
}

fn dms_to_decimal(exif: &exif::Exif, tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Rational(parts) if parts.len() >= 3 => {
            let degrees = parts[0].to_f64();
            let minutes = parts[1].to_f64();
            let seconds = parts[2].to_f64();
            Some(degrees + minutes / 60.0 + seconds / 3600.0)
        }
        _ => None,
    }
}

fn apply_ref(value: f64, exif: &exif::Exif, tag: Tag, negative: char) -> f64 {
    let Some(field) = exif.get_field(tag, In::PRIMARY) else {
        return value;
    };
    match &field.value {
        Value::Ascii(parts) => {
            let is_negative = parts
                .first()
                .and_then(|part| part.first())
                .map(|&c| c as char == negative)
                .unwrap_or(false);
            if is_negative {
                -value.abs()
            } else {
                value
            }
        }
        _ => value,
    }
}

fn read_datetime(exif: &exif::Exif) -> Option<DateTime<Utc>> {
    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))?;

    let raw = match &field.value {
        Value::Ascii(parts) => String::from_utf8(parts.first()?.clone()).ok()?,
        _ => return None,
    };

    // EXIF datetimes have no timezone; treat them as UTC.
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y:%m:%d %H:%M:%S").ok()?;
    Some(DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb::<u8>([120, 80, 40]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn image_without_exif_yields_empty_metadata() {
        let processor = ImageMediaProcessor::new(2048, 80);
        let metadata = processor.read_metadata(&png_bytes(8, 8)).await.unwrap();
        assert_eq!(metadata.point, None);
        assert_eq!(metadata.captured_at, None);
    }

    #[tokio::test]
    async fn compress_bounds_the_longest_edge() {
        let processor = ImageMediaProcessor::new(64, 80);
        let compressed = processor.compress(&png_bytes(256, 128)).await.unwrap();

        let reloaded = image::load_from_memory(&compressed).unwrap();
        assert!(reloaded.width().max(reloaded.height()) <= 64);
    }

    #[tokio::test]
    async fn compress_keeps_small_images_small() {
        let processor = ImageMediaProcessor::new(2048, 80);
        let compressed = processor.compress(&png_bytes(16, 16)).await.unwrap();

        let reloaded = image::load_from_memory(&compressed).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (16, 16));
    }

    #[tokio::test]
    async fn garbage_bytes_fail_compression() {
        let processor = ImageMediaProcessor::new(2048, 80);
        assert!(processor.compress(&[0, 1, 2, 3]).await.is_err());
    }
}
