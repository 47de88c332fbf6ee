//! Package source resolution.
//!
//! A source locator can be a local path, a NIM resource name, or an
//! `http(s)://`/`ftp://` URL. Remote locators are downloaded into a
//! temporary file scoped to the reconciliation pass that requested them;
//! anything else is passed through verbatim and left to the filesystem (or
//! the NIM master) to judge.

use std::io::Write;

use reqwest::blocking::Client;
use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tempfile::{Builder as TempBuilder, NamedTempFile};
use tracing::{debug, info};
use url::Url;

use crate::reconcile::errors::ReconcileError;

/// Retrieval policy for remote locators.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Verify TLS certificates on https downloads.
    ///
    /// Off by default: AIX fix repositories routinely sit behind proxies
    /// with self-signed certificates, and the environments this reconciler
    /// targets have historically downloaded fixes without verification.
    /// Turn it on when the repository presents a proper chain.
    pub verify_tls: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions { verify_tls: false }
    }
}

/// A source locator resolved to something a backend tool can consume.
///
/// Holding the value keeps any downloaded temporary file alive; dropping
/// it at the end of the pass deletes the file, on every exit path.
#[derive(Debug)]
pub struct ResolvedSource {
    path: String,
    temp: Option<NamedTempFile>,
}

impl ResolvedSource {
    /// The local path (or verbatim locator) handed to backend tools.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// True when the source was downloaded rather than passed through.
    pub fn is_fetched(&self) -> bool {
        self.temp.is_some()
    }
}

/// Resolve a locator to a local path, downloading remote sources into a
/// pass-scoped temporary file named after the locator's final segment.
pub fn resolve_source(
    locator: &str,
    options: FetchOptions,
) -> Result<ResolvedSource, ReconcileError> {
    if !is_remote(locator) {
        return Ok(ResolvedSource {
            path: locator.to_string(),
            temp: None,
        });
    }

    info!("fetching {}", locator);
    let url = Url::parse(locator).map_err(|err| fetch_error(locator, err))?;
    let body = match url.scheme() {
        "ftp" => fetch_ftp(&url)?,
        _ => fetch_http(&url, options)?,
    };

    let mut file = temp_file_for(&url)?;
    file.write_all(&body)
        .and_then(|()| file.flush())
        .map_err(|err| fetch_error(locator, err))?;
    let path = file.path().to_string_lossy().into_owned();
    debug!("fetched {} byte(s) to {}", body.len(), path);

    Ok(ResolvedSource {
        path,
        temp: Some(file),
    })
}

fn is_remote(locator: &str) -> bool {
    locator.starts_with("http://")
        || locator.starts_with("https://")
        || locator.starts_with("ftp://")
}

fn fetch_error(locator: &str, err: impl std::fmt::Display) -> ReconcileError {
    ReconcileError::Fetch {
        locator: locator.to_string(),
        message: err.to_string(),
    }
}

fn fetch_http(url: &Url, options: FetchOptions) -> Result<Vec<u8>, ReconcileError> {
    let client = Client::builder()
        .danger_accept_invalid_certs(!options.verify_tls)
        .build()
        .map_err(|err| fetch_error(url.as_str(), err))?;
    let response = client
        .get(url.clone())
        .send()
        .map_err(|err| fetch_error(url.as_str(), err))?;
    if !response.status().is_success() {
        return Err(fetch_error(
            url.as_str(),
            format!("HTTP {}", response.status()),
        ));
    }
    let bytes = response
        .bytes()
        .map_err(|err| fetch_error(url.as_str(), err))?;
    Ok(bytes.to_vec())
}

fn fetch_ftp(url: &Url) -> Result<Vec<u8>, ReconcileError> {
    let host = url
        .host_str()
        .ok_or_else(|| fetch_error(url.as_str(), "no host in ftp URL"))?;
    let port = url.port().unwrap_or(21);

    let mut ftp = FtpStream::connect(format!("{host}:{port}"))
        .map_err(|err| fetch_error(url.as_str(), err))?;
    let user = if url.username().is_empty() {
        "anonymous"
    } else {
        url.username()
    };
    ftp.login(user, url.password().unwrap_or(""))
        .map_err(|err| fetch_error(url.as_str(), err))?;
    ftp.transfer_type(FileType::Binary)
        .map_err(|err| fetch_error(url.as_str(), err))?;
    let buffer = ftp
        .retr_as_buffer(url.path())
        .map_err(|err| fetch_error(url.as_str(), err))?;
    let _ = ftp.quit();
    Ok(buffer.into_inner())
}

/// A temporary file named after the locator's final path segment.
///
/// The segment goes at the end of the file name so that suffix-based
/// backend detection sees the same `.rpm`/`.epkg.Z`/`.bff` ending the
/// remote file had.
fn temp_file_for(url: &Url) -> Result<NamedTempFile, ReconcileError> {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("package");
    TempBuilder::new()
        .suffix(&format!("-{segment}"))
        .tempfile()
        .map_err(|err| fetch_error(url.as_str(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_paths_pass_through() {
        let resolved = resolve_source("/tmp/foo.bff", FetchOptions::default()).unwrap();
        assert_eq!(resolved.path(), "/tmp/foo.bff");
        assert!(!resolved.is_fetched());
    }

    #[test]
    fn test_nim_resource_names_pass_through() {
        // Unrecognized schemes degrade to "treat as filesystem path".
        let resolved = resolve_source("lpp_72TL4", FetchOptions::default()).unwrap();
        assert_eq!(resolved.path(), "lpp_72TL4");
        assert!(!resolved.is_fetched());
    }

    #[test]
    fn test_temp_file_named_after_final_segment() {
        let url = Url::parse("https://fixes.example.com/aix/IV12345s01.epkg.Z").unwrap();
        let file = temp_file_for(&url).unwrap();
        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-IV12345s01.epkg.Z"));
        assert!(name.ends_with(".epkg.Z"), "suffix detection must still work");
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://example.com/a.rpm"));
        assert!(is_remote("https://example.com/a.rpm"));
        assert!(is_remote("ftp://example.com/a.rpm"));
        assert!(!is_remote("/export/lpp/a.rpm"));
        assert!(!is_remote("nfs://example.com/a.rpm"));
    }
}
