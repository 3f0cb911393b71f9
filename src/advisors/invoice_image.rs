use crate::errors::AppError;
use crate::file_systems::FileSystemRef;
use crate::AppResult;
use base64::Engine;
use bytes::Bytes;
use image::ImageFormat;
use mime::Mime;

/// Invoice image as uploaded or captured, kept only for the duration of one analysis.
#[derive(Debug, Clone)]
pub struct InvoiceImage {
    pub file_ref: FileSystemRef,
    pub mime_type: Mime,
    pub data: Bytes,
}

impl InvoiceImage {
    /// Accepts any image media type; when the extension gives none, the format is sniffed from the bytes.
    pub fn new(file_ref: FileSystemRef, data: Bytes) -> AppResult<Self> {
        let mime_type = match file_ref.media_type {
            Some(ref mime) if mime.type_() == mime::IMAGE => mime.clone(),
            Some(ref mime) => {
                return Err(AppError::UnsupportedMediaType {
                    media_type: mime.to_string(),
                })
            }
            None => {
                let format =
                    image::guess_format(&data).map_err(|_| AppError::UnsupportedMediaType {
                        media_type: "unknown".to_string(),
                    })?;
                format
                    .to_mime_type()
                    .parse::<Mime>()
                    .map_err(|e| AppError::SystemError {
                        message: format!("Invalid image media type: {e}"),
                    })?
            }
        };
        Ok(Self {
            file_ref: FileSystemRef {
                media_type: Some(mime_type.clone()),
                ..file_ref
            },
            mime_type,
            data,
        })
    }

    /// Downsizes the image so that neither side exceeds `max_dimension`. Smaller images are kept as is.
    pub fn resize_to_fit(self, max_dimension: u32) -> AppResult<Self> {
        let image_format =
            ImageFormat::from_mime_type(&self.mime_type).ok_or_else(|| AppError::SystemError {
                message: format!("Unsupported image mime type: {}", self.mime_type),
            })?;
        let image = image::load_from_memory_with_format(&self.data, image_format)?;
        if image.width() <= max_dimension && image.height() <= max_dimension {
            return Ok(self);
        }
        let resized_image = image.resize(
            max_dimension,
            max_dimension,
            image::imageops::FilterType::Gaussian,
        );
        tracing::debug!(
            from_width = image.width(),
            from_height = image.height(),
            to_width = resized_image.width(),
            to_height = resized_image.height(),
            "Resized invoice image"
        );
        let mut resized_image_bytes = std::io::Cursor::new(Vec::new());
        resized_image.write_to(&mut resized_image_bytes, image_format)?;
        let data = Bytes::from(resized_image_bytes.into_inner());
        Ok(Self {
            file_ref: FileSystemRef {
                file_size: Some(data.len() as u64),
                ..self.file_ref
            },
            mime_type: self.mime_type,
            data,
        })
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_ref(name: &str, media_type: Option<Mime>) -> FileSystemRef {
        FileSystemRef {
            relative_path: name.to_string().into(),
            media_type,
            file_size: None,
        }
    }

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let image = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut writer = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut writer, ImageFormat::Png)
            .unwrap();
        Bytes::from(writer.into_inner())
    }

    #[test]
    fn test_data_url() {
        let image = InvoiceImage::new(
            file_ref("invoice.jpg", Some(mime::IMAGE_JPEG)),
            Bytes::from_static(b"hello"),
        )
        .unwrap();
        assert_eq!(image.to_base64(), "aGVsbG8=");
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,aGVsbG8=");
    }

    #[test]
    fn test_rejects_non_image_media() {
        let result = InvoiceImage::new(
            file_ref("invoice.pdf", Some(mime::APPLICATION_PDF)),
            Bytes::from_static(b"%PDF-1.7"),
        );
        assert!(matches!(
            result,
            Err(AppError::UnsupportedMediaType { media_type }) if media_type == "application/pdf"
        ));
    }

    #[test]
    fn test_sniffs_unknown_media_type() {
        let image = InvoiceImage::new(file_ref("capture", None), png_bytes(2, 2)).unwrap();
        assert_eq!(image.mime_type, mime::IMAGE_PNG);
        assert_eq!(image.file_ref.media_type, Some(mime::IMAGE_PNG));

        let result = InvoiceImage::new(file_ref("capture", None), Bytes::from_static(b"???"));
        assert!(matches!(result, Err(AppError::UnsupportedMediaType { .. })));
    }

    #[test]
    fn test_resize_to_fit() {
        let image = InvoiceImage::new(
            file_ref("invoice.png", Some(mime::IMAGE_PNG)),
            png_bytes(200, 100),
        )
        .unwrap();
        let resized = image.resize_to_fit(50).unwrap();
        let decoded = image::load_from_memory(&resized.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 25));
        assert_eq!(resized.file_ref.file_size, Some(resized.data.len() as u64));
    }

    #[test]
    fn test_resize_keeps_small_images() {
        let data = png_bytes(20, 10);
        let image = InvoiceImage::new(
            file_ref("invoice.png", Some(mime::IMAGE_PNG)),
            data.clone(),
        )
        .unwrap();
        let resized = image.resize_to_fit(1024).unwrap();
        assert_eq!(resized.data, data);
    }
}
