// src/source/archive.rs

//! Source archive writing
//!
//! Exported archives are tarballs with a single `<name>-<version>/` top
//! directory. Entries are added in sorted order with normalised headers so
//! that exporting the same tree twice yields identical bytes.

use crate::error::{Error, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tar::{Builder, HeaderMode};
use tracing::debug;
use walkdir::WalkDir;
use xz2::write::XzEncoder;

/// VCS metadata directories never shipped in an archive
const SKIPPED_DIRS: &[&str] = &[".git", ".bzr"];

const XZ_LEVEL: u32 = 6;

/// Compression of exported archives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFormat {
    #[default]
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "tar.xz")]
    TarXz,
}

impl ArchiveFormat {
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
        }
    }
}

/// Pack `src` (a directory or a single file) into `dest` below `prefix/`
pub fn write_tree(src: &Path, dest: &Path, prefix: &str, format: ArchiveFormat) -> Result<()> {
    debug!("Packing {} into {}", src.display(), dest.display());

    with_encoder(dest, format, |out| {
        let mut builder = Builder::new(out);
        builder.mode(HeaderMode::Deterministic);
        builder.follow_symlinks(false);

        if src.is_file() {
            let name = src
                .file_name()
                .ok_or_else(|| Error::IoError(format!("no file name in {}", src.display())))?;
            let mut file = File::open(src)?;
            builder.append_file(Path::new(prefix).join(name), &mut file)?;
        } else {
            builder.append_dir(prefix, src)?;

            let walker = WalkDir::new(src)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    !e.file_name()
                        .to_str()
                        .is_some_and(|n| SKIPPED_DIRS.contains(&n))
                });

            for entry in walker {
                let entry = entry?;
                let rel = entry
                    .path()
                    .strip_prefix(src)
                    .map_err(|e| Error::IoError(e.to_string()))?;
                builder.append_path_with_name(entry.path(), Path::new(prefix).join(rel))?;
            }
        }

        builder.into_inner()?.flush()?;
        Ok(())
    })
}

/// Compress an uncompressed tar stream (e.g. `git archive` output) into `dest`
pub fn write_tar_stream(tar: &[u8], dest: &Path, format: ArchiveFormat) -> Result<()> {
    with_encoder(dest, format, |out| {
        out.write_all(tar)?;
        Ok(())
    })
}

/// Open `dest` behind the encoder for `format`, run `f`, then finish the
/// stream. A partially written file is removed on failure.
fn with_encoder<F>(dest: &Path, format: ArchiveFormat, f: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let result = (|| {
        let file = File::create(dest)?;
        match format {
            ArchiveFormat::TarGz => {
                let mut encoder = GzEncoder::new(file, Compression::default());
                f(&mut encoder)?;
                encoder.finish()?;
            }
            ArchiveFormat::TarXz => {
                let mut encoder = XzEncoder::new(file, XZ_LEVEL);
                f(&mut encoder)?;
                encoder.finish()?;
            }
        }
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(dest);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn entry_names(archive: &Path) -> Vec<String> {
        let file = File::open(archive).unwrap();
        let mut tar = tar::Archive::new(GzDecoder::new(file));
        tar.entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_write_tree_prefix_and_skip_vcs() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join(".git")).unwrap();
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join(".git/HEAD"), "ref: refs/heads/main").unwrap();
        fs::write(src.join("README"), "hello").unwrap();
        fs::write(src.join("lib/a.c"), "int a;").unwrap();

        let dest = temp.path().join("hello-1.0.tar.gz");
        write_tree(&src, &dest, "hello-1.0", ArchiveFormat::TarGz).unwrap();

        let names = entry_names(&dest);
        assert!(names.iter().all(|n| n.starts_with("hello-1.0")));
        assert!(names.contains(&"hello-1.0/README".to_string()));
        assert!(names.contains(&"hello-1.0/lib/a.c".to_string()));
        assert!(!names.iter().any(|n| n.contains(".git")));
    }

    #[test]
    fn test_write_tree_is_reproducible() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("b"), "b").unwrap();
        fs::write(src.join("a"), "a").unwrap();

        let first = temp.path().join("one.tar.gz");
        let second = temp.path().join("two.tar.gz");
        write_tree(&src, &first, "x-1", ArchiveFormat::TarGz).unwrap();
        write_tree(&src, &second, "x-1", ArchiveFormat::TarGz).unwrap();

        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
    }

    #[test]
    fn test_write_single_file_xz() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("data.txt");
        fs::write(&src, "payload").unwrap();

        let dest = temp.path().join("x-1.tar.xz");
        write_tree(&src, &dest, "x-1", ArchiveFormat::TarXz).unwrap();

        let mut tar = tar::Archive::new(xz2::read::XzDecoder::new(File::open(&dest).unwrap()));
        let mut entry = tar.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.path().unwrap().to_string_lossy(), "x-1/data.txt");
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "payload");
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(ArchiveFormat::default().extension(), "tar.gz");
        assert_eq!(ArchiveFormat::TarXz.extension(), "tar.xz");
    }
}
