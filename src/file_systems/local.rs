use crate::errors::AppError;
use crate::file_systems::{AbsoluteFilePath, FileSystemConnection, FileSystemRef, FileSystemStream};
use crate::reporter::AppReporter;
use crate::AppResult;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use rvstruct::ValueStruct;
use std::path::PathBuf;
use tokio::fs::File;

pub struct LocalFileSystem<'a> {
    root_path: String,
    is_dir: bool,
    reporter: &'a AppReporter<'a>,
}

impl<'a> LocalFileSystem<'a> {
    pub async fn new(root_path: &str, reporter: &'a AppReporter<'a>) -> AppResult<Self> {
        let root_path_base_str = root_path.trim_start_matches("file://").to_string();
        let root_path_path = PathBuf::from(&root_path_base_str);
        let is_dir = root_path.ends_with('/') || root_path_path.is_dir();
        let root_path_str = if is_dir && !root_path_base_str.ends_with('/') {
            format!("{root_path_base_str}/")
        } else {
            root_path_base_str
        };
        Ok(LocalFileSystem {
            root_path: root_path_str,
            is_dir,
            reporter,
        })
    }
}

impl<'a> FileSystemConnection<'a> for LocalFileSystem<'a> {
    async fn download(
        &mut self,
        file_ref: Option<&FileSystemRef>,
    ) -> AppResult<(FileSystemRef, FileSystemStream)> {
        let file_path = PathBuf::from(self.resolve(file_ref).file_path);
        if file_path.is_dir() {
            return Err(AppError::SystemError {
                message: format!(
                    "Expected an invoice image file, but {} is a directory",
                    file_path.to_string_lossy()
                ),
            });
        }

        let file = File::open(&file_path).await?;
        let stream = tokio_util::io::ReaderStream::new(file).map_err(AppError::from);
        let relative_file_path = file_path
            .file_name()
            .ok_or_else(|| AppError::SystemError {
                message: "Filename is empty".to_string(),
            })?
            .to_string_lossy()
            .to_string();
        let file_metadata = tokio::fs::metadata(&file_path).await?;
        let file_ref = FileSystemRef {
            relative_path: relative_file_path.into(),
            media_type: mime_guess::from_path(&file_path).first(),
            file_size: Some(file_metadata.len()),
        };
        Ok((file_ref, Box::new(stream)))
    }

    async fn upload<S: Stream<Item = AppResult<Bytes>> + Send + Sync + Unpin + 'static>(
        &mut self,
        input: S,
        file_ref: Option<&FileSystemRef>,
    ) -> AppResult<()> {
        let file_path = PathBuf::from(self.resolve(file_ref).file_path);

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        self.reporter.report(format!(
            "Writing {}",
            console::style(file_path.to_string_lossy()).bold()
        ))?;
        let mut file = File::create(file_path).await?;
        let mut reader = tokio_util::io::StreamReader::new(input.map_err(std::io::Error::other));
        tokio::io::copy(&mut reader, &mut file).await?;
        Ok(())
    }

    async fn close(self) -> AppResult<()> {
        Ok(())
    }

    fn resolve(&self, file_ref: Option<&FileSystemRef>) -> AbsoluteFilePath {
        AbsoluteFilePath {
            file_path: if self.is_dir {
                format!(
                    "{}{}",
                    self.root_path,
                    file_ref
                        .map(|fr| fr.relative_path.value().clone())
                        .unwrap_or("".to_string())
                )
            } else {
                self.root_path.clone()
            },
        }
    }
}

#[cfg(test)]
#[allow(unused_imports)]
mod tests {
    use super::*;
    use crate::file_systems::DetectFileSystem;
    use console::Term;

    #[tokio::test]
    async fn download_test() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let term = Term::stdout();
        let reporter: AppReporter = AppReporter::from(&term);
        let temp_dir = tempfile::TempDir::with_prefix("local_file_system_tests_download")?;
        let temp_file = temp_dir.path().join("invoice.png");
        let temp_content = b"not really a png";
        tokio::fs::write(&temp_file, temp_content).await?;

        let mut fs = DetectFileSystem::open(
            &format!("file://{}", temp_file.to_string_lossy()),
            &reporter,
        )
        .await?;
        let (file_ref, stream) = fs.download(None).await?;

        let downloaded_bytes: Vec<Bytes> = stream.try_collect().await?;
        assert_eq!(downloaded_bytes.concat(), temp_content.to_vec());
        assert_eq!(file_ref.relative_path.value(), "invoice.png");
        assert_eq!(file_ref.media_type, Some(mime::IMAGE_PNG));
        assert_eq!(file_ref.file_size, Some(temp_content.len() as u64));

        fs.close().await?;

        Ok(())
    }

    #[tokio::test]
    async fn download_directory_fails_test() -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    {
        let term = Term::stdout();
        let reporter: AppReporter = AppReporter::from(&term);
        let temp_dir = tempfile::TempDir::with_prefix("local_file_system_tests_download_dir")?;

        let mut fs =
            DetectFileSystem::open(&temp_dir.path().to_string_lossy(), &reporter).await?;
        assert!(fs.download(None).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn upload_to_dir_test() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let term = Term::stdout();
        let reporter: AppReporter = AppReporter::from(&term);
        let temp_dir = tempfile::TempDir::with_prefix("local_file_system_tests_upload")?;
        let temp_dir_path = temp_dir.path();

        let mut fs = DetectFileSystem::open(
            &format!("file://{}", temp_dir_path.to_string_lossy()),
            &reporter,
        )
        .await?;

        let content = "Debit: Office Supplies\nCredit: Cash";
        let stream = futures::stream::iter(vec![Ok(Bytes::from(content))]);
        fs.upload(
            stream,
            Some(&FileSystemRef {
                relative_path: "invoice-journal-entry.txt".into(),
                media_type: Some(mime::TEXT_PLAIN),
                file_size: None,
            }),
        )
        .await?;

        let file_content =
            tokio::fs::read_to_string(temp_dir_path.join("invoice-journal-entry.txt")).await?;
        assert_eq!(file_content, content);

        fs.close().await?;

        Ok(())
    }

    #[tokio::test]
    async fn upload_to_file_test() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let term = Term::stdout();
        let reporter: AppReporter = AppReporter::from(&term);
        let temp_dir = tempfile::TempDir::with_prefix("local_file_system_tests_upload_file")?;
        let target = temp_dir.path().join("nested").join("answer.txt");

        let mut fs = DetectFileSystem::open(&target.to_string_lossy(), &reporter).await?;
        let stream = futures::stream::iter(vec![Ok(Bytes::from("answer"))]);
        fs.upload(stream, None).await?;

        assert_eq!(tokio::fs::read_to_string(&target).await?, "answer");

        Ok(())
    }
}
