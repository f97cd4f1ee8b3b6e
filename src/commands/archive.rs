//! Archive compress/decompress commands.
//!
//! Pass-through wrappers over the archive codecs; never journaled.

use crate::commands::CommandOutcome;
use crate::error::ToolkitError;
use anyhow::Context as _;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Supported archive formats, selected by name or file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    TarBz2,
}

impl ArchiveFormat {
    /// Parse a format name as given to the compress command.
    pub fn from_name(name: &str) -> Result<Self, ToolkitError> {
        match name {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar" => Ok(ArchiveFormat::Tar),
            "gz" => Ok(ArchiveFormat::TarGz),
            "bz2" => Ok(ArchiveFormat::TarBz2),
            other => Err(ToolkitError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Detect a format from an archive file's extension.
    pub fn from_path(path: &Path) -> Result<Self, ToolkitError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::from_name(&ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "gz",
            ArchiveFormat::TarBz2 => "bz2",
        }
    }
}

/// Compress the existing entries of `paths` into `<output>.<ext>`. Files are
/// stored under their base name, directories recursively under theirs;
/// missing paths are silently skipped.
pub fn compress(paths: &[String], format: ArchiveFormat, output: &str) -> CommandOutcome {
    let archive_path = format!("{}.{}", output, format.extension());
    let result = match format {
        ArchiveFormat::Zip => write_zip(paths, &archive_path),
        ArchiveFormat::Tar | ArchiveFormat::TarGz | ArchiveFormat::TarBz2 => {
            write_tar(paths, &archive_path, format)
        }
    };
    match result {
        Ok(()) => {
            info!(archive = %archive_path, "archive written");
            CommandOutcome::Applied(format!("Compressed files into '{}'.", archive_path))
        }
        Err(err) => CommandOutcome::Failed(format!(
            "Failed to compress into '{}': {:#}",
            archive_path, err
        )),
    }
}

/// Extract an archive into a directory named after its file stem, next to
/// the archive itself.
pub fn decompress(archive_path: &str) -> CommandOutcome {
    let source = Path::new(archive_path);
    if !source.is_file() {
        return CommandOutcome::Failed(format!("'{}' is not a file.", archive_path));
    }
    let format = match ArchiveFormat::from_path(source) {
        Ok(format) => format,
        Err(err) => return CommandOutcome::Failed(err.to_string()),
    };
    let output_dir = source.with_extension("");

    let result = extract(source, format, &output_dir);
    match result {
        Ok(()) => CommandOutcome::Applied(format!(
            "Uncompressed '{}' into '{}'.",
            archive_path,
            output_dir.display()
        )),
        Err(err) => CommandOutcome::Failed(format!(
            "Failed to uncompress '{}': {:#}",
            archive_path, err
        )),
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn write_zip(paths: &[String], archive_path: &str) -> anyhow::Result<()> {
    use std::io::{Read as _, Write as _};
    use zip::write::SimpleFileOptions;

    let file = File::create(archive_path)
        .with_context(|| format!("failed to create {}", archive_path))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for path in paths {
        let source = Path::new(path);
        if source.is_file() {
            writer.start_file(base_name(source), options)?;
            let mut contents = Vec::new();
            File::open(source)
                .with_context(|| format!("failed to open {}", path))?
                .read_to_end(&mut contents)?;
            writer.write_all(&contents)?;
        } else if source.is_dir() {
            let base = base_name(source);
            for dir_entry in walkdir::WalkDir::new(source)
                .into_iter()
                .filter_map(Result::ok)
            {
                if !dir_entry.file_type().is_file() {
                    continue;
                }
                let relative = dir_entry
                    .path()
                    .strip_prefix(source)
                    .unwrap_or_else(|_| dir_entry.path());
                writer.start_file(
                    format!("{}/{}", base, relative.to_string_lossy()),
                    options,
                )?;
                let mut contents = Vec::new();
                File::open(dir_entry.path())?.read_to_end(&mut contents)?;
                writer.write_all(&contents)?;
            }
        }
    }
    writer.finish()?;
    Ok(())
}

fn append_paths<W: std::io::Write>(
    builder: &mut tar::Builder<W>,
    paths: &[String],
) -> anyhow::Result<()> {
    for path in paths {
        let source = Path::new(path);
        if source.is_file() {
            builder
                .append_path_with_name(source, base_name(source))
                .with_context(|| format!("failed to archive {}", path))?;
        } else if source.is_dir() {
            builder
                .append_dir_all(base_name(source), source)
                .with_context(|| format!("failed to archive {}", path))?;
        }
    }
    Ok(())
}

fn write_tar(paths: &[String], archive_path: &str, format: ArchiveFormat) -> anyhow::Result<()> {
    let file = File::create(archive_path)
        .with_context(|| format!("failed to create {}", archive_path))?;
    match format {
        ArchiveFormat::Tar => {
            let mut builder = tar::Builder::new(file);
            append_paths(&mut builder, paths)?;
            builder.into_inner()?;
        }
        ArchiveFormat::TarGz => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            let mut builder = tar::Builder::new(encoder);
            append_paths(&mut builder, paths)?;
            builder.into_inner()?.finish()?;
        }
        ArchiveFormat::TarBz2 => {
            let encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::best());
            let mut builder = tar::Builder::new(encoder);
            append_paths(&mut builder, paths)?;
            builder.into_inner()?.finish()?;
        }
        ArchiveFormat::Zip => unreachable!("zip handled by write_zip"),
    }
    Ok(())
}

fn extract(source: &Path, format: ArchiveFormat, output_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let file = File::open(source).with_context(|| format!("failed to open {}", source.display()))?;
    match format {
        ArchiveFormat::Zip => {
            let mut archive = zip::ZipArchive::new(file)?;
            archive.extract(output_dir)?;
        }
        ArchiveFormat::Tar => {
            tar::Archive::new(file).unpack(output_dir)?;
        }
        ArchiveFormat::TarGz => {
            tar::Archive::new(flate2::read::GzDecoder::new(file)).unpack(output_dir)?;
        }
        ArchiveFormat::TarBz2 => {
            tar::Archive::new(bzip2::read::BzDecoder::new(file)).unpack(output_dir)?;
        }
    }
    Ok(())
}
