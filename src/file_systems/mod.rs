use crate::errors::AppError;
use crate::file_systems::local::LocalFileSystem;
use crate::reporter::AppReporter;
use crate::AppResult;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use mime::Mime;
use rvstruct::ValueStruct;

mod local;

#[cfg(feature = "clipboard")]
mod clipboard;

#[derive(Debug, Clone, ValueStruct)]
pub struct RelativeFilePath(pub String);

impl RelativeFilePath {
    pub fn filename(&self) -> String {
        self.value()
            .split('/')
            .last()
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    pub fn file_stem(&self) -> String {
        let filename = self.filename();
        match filename.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => filename,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbsoluteFilePath {
    pub file_path: String,
}

#[derive(Debug, Clone)]
pub struct FileSystemRef {
    pub relative_path: RelativeFilePath,
    pub media_type: Option<Mime>,
    pub file_size: Option<u64>,
}

pub type FileSystemStream = Box<dyn Stream<Item = AppResult<Bytes>> + Send + Sync + Unpin + 'static>;

pub trait FileSystemConnection<'a> {
    async fn download(
        &mut self,
        file_ref: Option<&FileSystemRef>,
    ) -> AppResult<(FileSystemRef, FileSystemStream)>;

    async fn upload<S: Stream<Item = AppResult<Bytes>> + Send + Unpin + Sync + 'static>(
        &mut self,
        input: S,
        file_ref: Option<&FileSystemRef>,
    ) -> AppResult<()>;

    async fn close(self) -> AppResult<()>;

    fn resolve(&self, file_ref: Option<&FileSystemRef>) -> AbsoluteFilePath;
}

pub enum DetectFileSystem<'a> {
    Local(LocalFileSystem<'a>),
    #[cfg(feature = "clipboard")]
    Clipboard(clipboard::ClipboardFileSystem<'a>),
}

impl<'a> DetectFileSystem<'a> {
    pub async fn open(file_path: &str, reporter: &'a AppReporter<'a>) -> AppResult<Self> {
        if file_path.starts_with("file://") || !file_path.contains("://") {
            Ok(DetectFileSystem::Local(
                LocalFileSystem::new(file_path, reporter).await?,
            ))
        } else if file_path.starts_with("clipboard://") {
            #[cfg(feature = "clipboard")]
            {
                Ok(DetectFileSystem::Clipboard(
                    clipboard::ClipboardFileSystem::new(file_path, reporter).await?,
                ))
            }
            #[cfg(not(feature = "clipboard"))]
            {
                Err(AppError::UnknownFileSystem {
                    file_path: file_path.to_string(),
                })
            }
        } else {
            Err(AppError::UnknownFileSystem {
                file_path: file_path.to_string(),
            })
        }
    }
}

impl<'a> FileSystemConnection<'a> for DetectFileSystem<'a> {
    async fn download(
        &mut self,
        file_ref: Option<&FileSystemRef>,
    ) -> AppResult<(FileSystemRef, FileSystemStream)> {
        match self {
            DetectFileSystem::Local(fs) => fs.download(file_ref).await,
            #[cfg(feature = "clipboard")]
            DetectFileSystem::Clipboard(fs) => fs.download(file_ref).await,
        }
    }

    async fn upload<S: Stream<Item = AppResult<Bytes>> + Send + Unpin + Sync + 'static>(
        &mut self,
        input: S,
        file_ref: Option<&FileSystemRef>,
    ) -> AppResult<()> {
        match self {
            DetectFileSystem::Local(fs) => fs.upload(input, file_ref).await,
            #[cfg(feature = "clipboard")]
            DetectFileSystem::Clipboard(fs) => fs.upload(input, file_ref).await,
        }
    }

    async fn close(self) -> AppResult<()> {
        match self {
            DetectFileSystem::Local(fs) => fs.close().await,
            #[cfg(feature = "clipboard")]
            DetectFileSystem::Clipboard(fs) => fs.close().await,
        }
    }

    fn resolve(&self, file_ref: Option<&FileSystemRef>) -> AbsoluteFilePath {
        match self {
            DetectFileSystem::Local(fs) => fs.resolve(file_ref),
            #[cfg(feature = "clipboard")]
            DetectFileSystem::Clipboard(fs) => fs.resolve(file_ref),
        }
    }
}

/// Downloads the whole file into memory, rejecting it early when it exceeds `max_size_limit`.
pub async fn download_all<'a, FS: FileSystemConnection<'a>>(
    fs: &mut FS,
    file_ref: Option<&FileSystemRef>,
    max_size_limit: Option<u64>,
) -> AppResult<(FileSystemRef, Bytes)> {
    let (file_ref, stream) = fs.download(file_ref).await?;
    check_size_limit(file_ref.file_size, max_size_limit)?;
    let all_chunks: Vec<Bytes> = stream.try_collect().await?;
    let all_bytes: Bytes = all_chunks.concat().into();
    check_size_limit(Some(all_bytes.len() as u64), max_size_limit)?;
    Ok((
        FileSystemRef {
            file_size: Some(all_bytes.len() as u64),
            ..file_ref
        },
        all_bytes,
    ))
}

fn check_size_limit(file_size: Option<u64>, max_size_limit: Option<u64>) -> AppResult<()> {
    match (file_size, max_size_limit) {
        (Some(file_size), Some(max_size_limit)) if file_size > max_size_limit => {
            Err(AppError::FileTooLarge {
                file_size,
                max_size_limit,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_file_path_names() {
        let path = RelativeFilePath("scans/2024/invoice-001.jpeg".to_string());
        assert_eq!(path.filename(), "invoice-001.jpeg");
        assert_eq!(path.file_stem(), "invoice-001");

        let no_ext = RelativeFilePath("invoice".to_string());
        assert_eq!(no_ext.file_stem(), "invoice");

        let dotfile = RelativeFilePath(".hidden".to_string());
        assert_eq!(dotfile.file_stem(), ".hidden");
    }

    #[test]
    fn test_check_size_limit() {
        assert!(check_size_limit(Some(10), Some(100)).is_ok());
        assert!(check_size_limit(None, Some(100)).is_ok());
        assert!(check_size_limit(Some(1000), None).is_ok());
        assert!(matches!(
            check_size_limit(Some(101), Some(100)),
            Err(AppError::FileTooLarge {
                file_size: 101,
                max_size_limit: 100
            })
        ));
    }

    #[tokio::test]
    async fn test_unknown_file_system() {
        let term = console::Term::stdout();
        let reporter = AppReporter::from(&term);
        let result = DetectFileSystem::open("s3://bucket/invoice.png", &reporter).await;
        assert!(matches!(result, Err(AppError::UnknownFileSystem { .. })));
    }
}
