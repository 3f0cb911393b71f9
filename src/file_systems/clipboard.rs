use crate::errors::AppError;
use crate::file_systems::{AbsoluteFilePath, FileSystemConnection, FileSystemRef, FileSystemStream};
use crate::reporter::AppReporter;
use crate::AppResult;
use arboard::Clipboard;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use image::ImageFormat;
use rvstruct::ValueStruct;

/// Clipboard stands in for a camera capture: images are read from it and answers are written to it.
pub struct ClipboardFileSystem<'a> {
    clipboard: Clipboard,
    reporter: &'a AppReporter<'a>,
}

impl<'a> ClipboardFileSystem<'a> {
    pub async fn new(root_path: &str, reporter: &'a AppReporter<'a>) -> AppResult<Self> {
        if root_path != "clipboard://" {
            return Err(AppError::SystemError {
                message: "Clipboard should be specified as clipboard://".into(),
            });
        }
        Ok(Self {
            clipboard: Clipboard::new()?,
            reporter,
        })
    }
}

impl<'a> FileSystemConnection<'a> for ClipboardFileSystem<'a> {
    async fn download(
        &mut self,
        _file_ref: Option<&FileSystemRef>,
    ) -> AppResult<(FileSystemRef, FileSystemStream)> {
        let filename = format!(
            "capture-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)?
                .as_secs()
        );
        let image_data = self.clipboard.get_image().map_err(|err| AppError::SystemError {
            message: format!("Clipboard doesn't contain an image to analyze: {err}"),
        })?;
        let maybe_image: Option<image::RgbaImage> = image::ImageBuffer::from_raw(
            image_data.width as u32,
            image_data.height as u32,
            image_data.bytes.into_owned(),
        );
        match maybe_image {
            Some(image) => {
                let mut writer = std::io::Cursor::new(Vec::new());
                image.write_to(&mut writer, ImageFormat::Png)?;
                let png_image_bytes = writer.into_inner();
                self.reporter.report(format!(
                    "Captured {}x{} image from clipboard",
                    image.width(),
                    image.height()
                ))?;
                Ok((
                    FileSystemRef {
                        relative_path: format!("{}.png", filename).into(),
                        media_type: Some(mime::IMAGE_PNG),
                        file_size: Some(png_image_bytes.len() as u64),
                    },
                    Box::new(futures::stream::iter(vec![Ok(Bytes::from(
                        png_image_bytes,
                    ))])),
                ))
            }
            None => Err(AppError::SystemError {
                message: "Clipboard can't get any supported image format from clipboard://".into(),
            }),
        }
    }

    async fn upload<S: Stream<Item = AppResult<Bytes>> + Send + Unpin + Sync + 'static>(
        &mut self,
        input: S,
        file_ref: Option<&FileSystemRef>,
    ) -> AppResult<()> {
        match file_ref.and_then(|fr| fr.media_type.as_ref()) {
            Some(mime) if mime.type_() == mime::TEXT => {
                let all_chunks: Vec<Bytes> = input.try_collect().await?;
                let all_bytes = all_chunks.concat();
                self.clipboard
                    .set_text(String::from_utf8_lossy(&all_bytes))?;
                Ok(())
            }
            Some(mime) => Err(AppError::SystemError {
                message: format!("ClipboardFileSystem doesn't support exporting {mime}"),
            }),
            None => Err(AppError::SystemError {
                message: "ClipboardFileSystem requires a text media type to export".into(),
            }),
        }
    }

    async fn close(self) -> AppResult<()> {
        Ok(())
    }

    fn resolve(&self, file_ref: Option<&FileSystemRef>) -> AbsoluteFilePath {
        AbsoluteFilePath {
            file_path: format!(
                "clipboard://{}",
                file_ref
                    .map(|fr| fr.relative_path.value().to_string())
                    .unwrap_or("".to_string())
            ),
        }
    }
}
