//! Archive unpacking
//!
//! Archives are unpacked with their top-level directory intact. Truncated
//! or corrupt input is reported as [`BuildError::CorruptArchive`] so the
//! caller can tell the user to discard the cached file; failures on the
//! destination side propagate as ordinary I/O errors. A file whose leading
//! bytes belong to a different format than its name claims is an
//! extraction failure, not corruption.

use async_compression::tokio::bufread::{GzipDecoder, XzDecoder};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use xsdeps_errors::{BuildError, Error};

/// Supported archive layouts, detected from the filename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
    Tar,
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from the archive's filename
    ///
    /// # Errors
    ///
    /// Returns `BuildError::UnsupportedArchiveFormat` for unknown extensions.
    pub fn from_path(path: &Path) -> Result<Self, BuildError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Ok(Self::TarXz)
        } else if name.ends_with(".tar") {
            Ok(Self::Tar)
        } else if name.ends_with(".zip") {
            Ok(Self::Zip)
        } else {
            Err(BuildError::UnsupportedArchiveFormat { format: name })
        }
    }

    /// Detect the format from the archive's leading bytes
    #[must_use]
    pub fn sniff(head: &[u8]) -> Option<Self> {
        if head.starts_with(GZIP_MAGIC) {
            Some(Self::TarGz)
        } else if head.starts_with(XZ_MAGIC) {
            Some(Self::TarXz)
        } else if head.starts_with(ZIP_MAGIC) || head.starts_with(ZIP_EMPTY_MAGIC) {
            Some(Self::Zip)
        } else if head.get(USTAR_OFFSET..USTAR_OFFSET + USTAR_MAGIC.len()) == Some(USTAR_MAGIC) {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Leading bytes every archive of this format starts with
    fn magic(self) -> &'static [u8] {
        match self {
            Self::TarGz => GZIP_MAGIC,
            Self::TarXz => XZ_MAGIC,
            Self::Zip => ZIP_MAGIC,
            Self::Tar => &[],
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::TarGz => "gzip",
            Self::TarXz => "xz",
            Self::Tar => "tar",
            Self::Zip => "zip",
        }
    }
}

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const USTAR_MAGIC: &[u8] = b"ustar";
const USTAR_OFFSET: usize = 257;
const HEAD_LEN: usize = USTAR_OFFSET + 5;

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

fn corrupt(archive: &Path, message: impl Into<String>) -> Error {
    BuildError::CorruptArchive {
        file: file_label(archive),
        message: message.into(),
    }
    .into()
}

/// Read up to `HEAD_LEN` bytes from the start of the archive
async fn read_head(archive: &Path) -> Result<Vec<u8>, Error> {
    let file = tokio::fs::File::open(archive)
        .await
        .map_err(|e| Error::io_with_path(&e, archive))?;
    let mut head = Vec::with_capacity(HEAD_LEN);
    file.take(HEAD_LEN as u64)
        .read_to_end(&mut head)
        .await
        .map_err(|e| Error::io_with_path(&e, archive))?;
    Ok(head)
}

/// Check the leading bytes against the format the filename promises
///
/// Truncation keeps the leading bytes of the expected format, so only a
/// head that matches some other format (or no prefix of the expected magic)
/// is rejected here.
fn check_content(archive: &Path, expected: ArchiveFormat, head: &[u8]) -> Result<(), Error> {
    match ArchiveFormat::sniff(head) {
        Some(found) if found == expected => Ok(()),
        Some(found) => Err(BuildError::ExtractionFailed {
            message: format!(
                "{} holds {} data, expected {}",
                file_label(archive),
                found.label(),
                expected.label()
            ),
        }
        .into()),
        None => {
            let magic = expected.magic();
            let len = head.len().min(magic.len());
            if head[..len] == magic[..len] {
                // Shorter than its own header, or a plain tar without ustar magic
                Ok(())
            } else {
                Err(BuildError::ExtractionFailed {
                    message: format!(
                        "{} is not a {} archive",
                        file_label(archive),
                        expected.label()
                    ),
                }
                .into())
            }
        }
    }
}

fn is_corruption(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::UnexpectedEof | ErrorKind::InvalidData)
}

/// Unpack `archive` into `destination`
///
/// # Errors
///
/// Returns `CorruptArchive` for empty, truncated or malformed input,
/// `UnsupportedArchiveFormat` for unknown extensions, `ExtractionFailed`
/// when the content is not in the format its name claims, and an I/O error
/// if the destination cannot be written.
pub async fn extract(archive: &Path, destination: &Path) -> Result<(), Error> {
    let format = ArchiveFormat::from_path(archive)?;

    let size = tokio::fs::metadata(archive)
        .await
        .map_err(|e| Error::io_with_path(&e, archive))?
        .len();
    if size == 0 {
        return Err(corrupt(archive, "archive is empty"));
    }
    check_content(archive, format, &read_head(archive).await?)?;

    tokio::fs::create_dir_all(destination)
        .await
        .map_err(|e| Error::io_with_path(&e, destination))?;

    match format {
        ArchiveFormat::TarGz | ArchiveFormat::TarXz => {
            extract_compressed_tar(archive, format, destination).await
        }
        ArchiveFormat::Tar => {
            let archive = archive.to_path_buf();
            unpack_tar(archive.clone(), archive, destination.to_path_buf()).await
        }
        ArchiveFormat::Zip => extract_zip(archive.to_path_buf(), destination.to_path_buf()).await,
    }
}

/// Decompress to a temporary tar, then unpack it
async fn extract_compressed_tar(
    archive: &Path,
    format: ArchiveFormat,
    destination: &Path,
) -> Result<(), Error> {
    let temp_dir = tempfile::tempdir().map_err(|e| BuildError::ExtractionFailed {
        message: format!("Failed to create temp directory: {e}"),
    })?;
    let temp_path = temp_dir.path().join("archive.tar");

    {
        let input = tokio::fs::File::open(archive)
            .await
            .map_err(|e| Error::io_with_path(&e, archive))?;
        let reader = BufReader::new(input);
        let mut output = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::io_with_path(&e, &temp_path))?;

        match format {
            ArchiveFormat::TarGz => {
                decompress(archive, &mut GzipDecoder::new(reader), &mut output).await?;
            }
            _ => decompress(archive, &mut XzDecoder::new(reader), &mut output).await?,
        }
        output.flush().await?;
    }

    let result = unpack_tar(archive.to_path_buf(), temp_path, destination.to_path_buf()).await;

    // temp_dir is removed when it goes out of scope
    drop(temp_dir);

    result
}

/// Copy decoded bytes; read errors come from the compressed input
async fn decompress<R>(
    archive: &Path,
    decoder: &mut R,
    output: &mut tokio::fs::File,
) -> Result<(), Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let read = decoder
            .read(&mut buf)
            .await
            .map_err(|e| corrupt(archive, e.to_string()))?;
        if read == 0 {
            return Ok(());
        }
        output.write_all(&buf[..read]).await?;
    }
}

async fn unpack_tar(
    archive: PathBuf,
    tar_path: PathBuf,
    destination: PathBuf,
) -> Result<(), Error> {
    tokio::task::spawn_blocking(move || {
        let file =
            std::fs::File::open(&tar_path).map_err(|e| Error::io_with_path(&e, &tar_path))?;
        let mut tar = tar::Archive::new(file);
        tar.set_preserve_permissions(true);

        let entries = tar
            .entries()
            .map_err(|e| corrupt(&archive, e.to_string()))?;
        for entry in entries {
            let mut entry = entry.map_err(|e| corrupt(&archive, e.to_string()))?;
            entry.unpack_in(&destination).map_err(|e| {
                if is_corruption(e.kind()) {
                    corrupt(&archive, e.to_string())
                } else {
                    Error::io_with_path(&e, &destination)
                }
            })?;
        }
        Ok::<(), Error>(())
    })
    .await
    .map_err(|e| BuildError::ExtractionFailed {
        message: format!("Task join error: {e}"),
    })?
}

async fn extract_zip(archive: PathBuf, destination: PathBuf) -> Result<(), Error> {
    tokio::task::spawn_blocking(move || {
        let file =
            std::fs::File::open(&archive).map_err(|e| Error::io_with_path(&e, &archive))?;
        let mut zip =
            zip::ZipArchive::new(file).map_err(|e| zip_error(&archive, &destination, e))?;
        zip.extract(&destination)
            .map_err(|e| zip_error(&archive, &destination, e))
    })
    .await
    .map_err(|e| BuildError::ExtractionFailed {
        message: format!("Task join error: {e}"),
    })?
}

fn zip_error(archive: &Path, destination: &Path, err: zip::result::ZipError) -> Error {
    match err {
        zip::result::ZipError::Io(e) if !is_corruption(e.kind()) => {
            Error::io_with_path(&e, destination)
        }
        zip::result::ZipError::UnsupportedArchive(message) => BuildError::ExtractionFailed {
            message: format!("{}: {message}", file_label(archive)),
        }
        .into(),
        other => corrupt(archive, other.to_string()),
    }
}
