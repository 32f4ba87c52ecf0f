// src/source/url.rs

//! Release archives downloaded from a URL

use super::{SourceContext, SourceOutcome, remove_path, require_orig};
use crate::error::{Error, Result};
use crate::version::{ArchivePattern, DEFAULT_ARCHIVE_PATTERN};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timeout for a whole download
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlConfig {
    /// Archive URL (`http://`, `https://` or `file://`)
    pub orig: String,

    /// Regex extracting the version from the archive filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Expected digest, `sha256:<hex>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// A single upstream release archive
///
/// The working copy is the downloaded file itself. Its version comes from
/// the filename, so it is known before anything is downloaded.
#[derive(Debug, Clone)]
pub struct UrlSource {
    config: UrlConfig,
    pattern: ArchivePattern,
    ctx: SourceContext,
}

impl UrlSource {
    pub fn new(config: UrlConfig, ctx: SourceContext) -> Result<Self> {
        require_orig("url", &config.orig)?;
        let pattern =
            ArchivePattern::new(config.pattern.as_deref().unwrap_or(DEFAULT_ARCHIVE_PATTERN))?;
        if let Some(checksum) = &config.checksum {
            parse_checksum(checksum)?;
        }
        Ok(Self {
            config,
            pattern,
            ctx,
        })
    }

    pub fn context(&self) -> &SourceContext {
        &self.ctx
    }

    pub fn origin(&self) -> Option<&str> {
        Some(&self.config.orig)
    }

    /// Last path segment of the URL, without query or fragment
    pub fn file_name(&self) -> &str {
        let orig = self.config.orig.as_str();
        let path = orig.split(['?', '#']).next().unwrap_or(orig);
        path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
    }

    pub fn working_copy(&self) -> PathBuf {
        self.ctx.dir.join(self.file_name())
    }

    pub fn get(&self) -> Result<SourceOutcome> {
        let dest = self.working_copy();
        if dest.exists() {
            info!("{} already downloaded", self.file_name());
            return Ok(SourceOutcome::AlreadyExists);
        }

        self.ctx.ensure_dir()?;
        download(&self.config.orig, &dest)?;

        if let Some(expected) = &self.config.checksum {
            if let Err(e) = verify_checksum(&dest, expected) {
                let _ = fs::remove_file(&dest);
                return Err(e);
            }
            debug!("Checksum of {} verified", dest.display());
        }

        Ok(SourceOutcome::Created)
    }

    pub fn update(&self) -> Result<SourceOutcome> {
        Ok(SourceOutcome::Unchanged)
    }

    /// Hand out the download under the package's archive name
    ///
    /// The downloaded file keeps its own compression; only the name is
    /// normalised to `<name>-<version><suffix>`.
    pub fn export(&self) -> Result<Option<PathBuf>> {
        let src = self.working_copy();
        let version = self.formatver()?;
        let dest = self.ctx.dir.join(format!(
            "{}{}",
            self.ctx.archive_prefix(&version),
            self.archive_suffix(&version)
        ));

        if dest.exists() && (self.ctx.keep || !src.exists()) {
            debug!("Reusing exported archive {}", dest.display());
            return Ok(Some(dest));
        }
        if !src.exists() {
            return Err(Error::SourceUnavailable(format!(
                "{} has not been downloaded",
                self.file_name()
            )));
        }

        if dest != src {
            fs::copy(&src, &dest)?;
            if !self.ctx.keep {
                remove_path(&src)?;
            }
        }
        info!("Exported {}", dest.display());
        Ok(Some(dest))
    }

    /// Text following the version token in the filename (`.tar.gz`, ...)
    fn archive_suffix(&self, version: &str) -> String {
        let name = self.file_name();
        name.rfind(version)
            .map(|idx| name[idx + version.len()..].to_string())
            .unwrap_or_default()
    }

    pub fn formatver(&self) -> Result<String> {
        self.pattern.version_of(self.file_name())
    }

    pub fn rev(&self) -> Option<String> {
        Some(self.file_name().to_string())
    }

    pub fn date(&self) -> Option<String> {
        None
    }

    pub fn verify(&self) -> Result<()> {
        self.formatver().map(|_| ()).map_err(|e| {
            Error::ConfigurationError(format!("url pattern does not fit orig: {}", e))
        })
    }
}

/// Fetch `url` into `dest` through a temporary file
fn download(url: &str, dest: &Path) -> Result<()> {
    info!("Downloading {} to {}", url, dest.display());
    let temp_path = dest.with_extension("part");

    let result = if let Some(path) = url.strip_prefix("file://") {
        fs::copy(path, &temp_path)
            .map(|_| ())
            .map_err(|e| Error::DownloadError(format!("cannot copy {}: {}", path, e)))
    } else {
        fetch_http(url, &temp_path)
    };

    match result {
        Ok(()) => {
            fs::rename(&temp_path, dest)?;
            info!("Successfully downloaded to {}", dest.display());
            Ok(())
        }
        Err(e) => {
            warn!("Download of {} failed: {}", url, e);
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

fn fetch_http(url: &str, dest: &Path) -> Result<()> {
    let client = Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::DownloadError(format!("failed to create HTTP client: {e}")))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| Error::DownloadError(format!("{url}: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::DownloadError(format!(
            "HTTP {} from {}",
            response.status(),
            url
        )));
    }

    let mut file = File::create(dest)?;
    io::copy(&mut response, &mut file)
        .map_err(|e| Error::DownloadError(format!("failed to write downloaded data: {e}")))?;
    Ok(())
}

/// Split `sha256:<hex>` into its digest
fn parse_checksum(expected: &str) -> Result<&str> {
    let (algorithm, digest) = expected.split_once(':').ok_or_else(|| {
        Error::ConfigurationError(format!("invalid checksum '{}', expected sha256:<hex>", expected))
    })?;

    if algorithm != "sha256" {
        return Err(Error::ConfigurationError(format!(
            "unsupported checksum algorithm '{}' (supported: sha256)",
            algorithm
        )));
    }
    if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::ConfigurationError(format!(
            "'{}' is not a sha256 digest",
            digest
        )));
    }
    Ok(digest)
}

fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    let digest = parse_checksum(expected)?;

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    let actual = hex::encode(hasher.finalize());

    if !actual.eq_ignore_ascii_case(digest) {
        return Err(Error::DownloadError(format!(
            "checksum mismatch for {}: expected {}, got {}",
            path.display(),
            digest,
            actual
        )));
    }
    Ok(())
}
