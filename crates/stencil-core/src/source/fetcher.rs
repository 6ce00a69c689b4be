//! Remote module fetching over HTTP
//!
//! Remote sources are downloaded once per module instantiation:
//! - Zip payloads are extracted (a shared top-level folder is stripped)
//! - Any other payload is stored as a single file
//! - GitHub repository references are fetched as archive zips
//!
//! A `//subdir` suffix after the URL path selects a sub-directory of the
//! payload as the module root, e.g. `https://host/bundle.zip//modules/api`.

use super::progress::ProgressSink;
use crate::error::{ModuleError, ModuleResult};
use async_trait::async_trait;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use url::Url;
use zip::ZipArchive;

/// Local zip signature
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Fetches a remote module source into a local directory
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Populate `dest` with the contents of `uri`, reporting progress to `progress`
    async fn fetch(&self, uri: &str, dest: &Path, progress: &dyn ProgressSink) -> ModuleResult<()>;
}

/// HTTP(S) fetcher backed by reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a new fetcher with a custom user agent
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Split a `//subdir` suffix off a source URI
    ///
    /// The query string stays on the URL part and is never searched.
    pub fn split_subdir(uri: &str) -> (String, Option<String>) {
        let scheme_end = uri.find("://").map(|i| i + 3).unwrap_or(0);
        let query_start = uri[scheme_end..]
            .find('?')
            .map(|i| scheme_end + i)
            .unwrap_or(uri.len());
        let Some(idx) = uri[scheme_end..query_start].find("//") else {
            return (uri.to_string(), None);
        };
        let idx = scheme_end + idx;

        let (subdir, query) = match uri[idx + 2..].split_once('?') {
            Some((subdir, query)) => (subdir, Some(query)),
            None => (&uri[idx + 2..], None),
        };

        let mut url = uri[..idx].to_string();
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }

        let subdir = subdir.trim_matches('/');
        if subdir.is_empty() {
            (url, None)
        } else {
            (url, Some(subdir.to_string()))
        }
    }

    /// Resolve the URL to download for a (subdir-free) source URI
    pub fn download_url(uri: &str) -> ModuleResult<Url> {
        let stripped = uri
            .strip_prefix("http::")
            .or_else(|| uri.strip_prefix("https::"))
            .unwrap_or(uri);

        let url = Url::parse(stripped).map_err(|e| ModuleError::fetch(uri, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ModuleError::fetch(
                uri,
                format!("unsupported source scheme '{}'", url.scheme()),
            ));
        }

        Ok(Self::github_archive_url(&url).unwrap_or(url))
    }

    /// `https://github.com/<owner>/<repo>[?ref=<ref>]` -> archive zip URL
    fn github_archive_url(url: &Url) -> Option<Url> {
        if url.host_str() != Some("github.com") {
            return None;
        }

        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        let [owner, repo] = segments.as_slice() else {
            return None;
        };
        let repo = repo.strip_suffix(".git").unwrap_or(*repo);

        let git_ref = url
            .query_pairs()
            .find(|(key, _)| key == "ref")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_else(|| "HEAD".to_string());

        Url::parse(&format!(
            "https://github.com/{}/{}/archive/{}.zip",
            owner, repo, git_ref
        ))
        .ok()
    }

    async fn download(
        &self,
        uri: &str,
        url: &Url,
        progress: &dyn ProgressSink,
    ) -> ModuleResult<Vec<u8>> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ModuleError::fetch(uri, e))?;

        if !response.status().is_success() {
            return Err(ModuleError::fetch(
                uri,
                format!("HTTP {} from {}", response.status(), url),
            ));
        }

        let total = response.content_length().unwrap_or(0);
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ModuleError::fetch(uri, e))?
        {
            bytes.extend_from_slice(&chunk);
            progress.track_progress(uri, bytes.len() as u64, total);
        }

        Ok(bytes)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(concat!("stencil/", env!("CARGO_PKG_VERSION")))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, uri: &str, dest: &Path, progress: &dyn ProgressSink) -> ModuleResult<()> {
        let (source, subdir) = Self::split_subdir(uri);
        let url = Self::download_url(&source)?;

        tracing::info!(uri, %url, dest = %dest.display(), "fetching module");
        let bytes = self.download(uri, &url, progress).await?;

        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("download")
            .to_string();

        install_payload(&bytes, dest, subdir.as_deref(), &file_name)
            .map_err(|e| ModuleError::fetch(uri, e))?;

        tracing::debug!(uri, bytes = bytes.len(), "module fetched");
        Ok(())
    }
}

/// Write a downloaded payload into `dest`
///
/// The payload is staged next to `dest` and swapped in once complete, so an
/// interrupted extraction never leaves a half-populated cache directory.
pub fn install_payload(
    bytes: &[u8],
    dest: &Path,
    subdir: Option<&str>,
    file_name: &str,
) -> std::io::Result<()> {
    let staging = staging_dir(dest);
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;

    let result = if bytes.starts_with(ZIP_MAGIC) {
        extract_zip(bytes, &staging, subdir)
    } else {
        std::fs::File::create(staging.join(file_name)).and_then(|mut f| f.write_all(bytes))
    };

    if let Err(e) = result {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e);
    }

    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    std::fs::rename(&staging, dest)
}

fn staging_dir(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    dest.with_file_name(name)
}

/// Extract a zip archive into `dest`, optionally keeping only `subdir`
fn extract_zip(bytes: &[u8], dest: &Path, subdir: Option<&str>) -> std::io::Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(std::io::Error::other)?;

    let names: Vec<(PathBuf, bool)> = (0..archive.len())
        .filter_map(|i| {
            let file = archive.by_index(i).ok()?;
            Some((file.enclosed_name()?, file.is_dir()))
        })
        .collect();
    let root = common_root(&names);

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(std::io::Error::other)?;

        // Skip entries escaping the archive root
        let Some(name) = file.enclosed_name() else {
            continue;
        };

        let mut relative = match &root {
            Some(root) => name.strip_prefix(root).unwrap_or(name.as_path()).to_path_buf(),
            None => name.clone(),
        };
        if let Some(subdir) = subdir {
            match relative.strip_prefix(subdir) {
                Ok(inner) => relative = inner.to_path_buf(),
                Err(_) => continue,
            }
        }
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(&relative);
        if file.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(&target)?;
        std::io::copy(&mut file, &mut out)?;
    }

    Ok(())
}

/// Top-level folder shared by every entry, as found in GitHub archives
fn common_root(entries: &[(PathBuf, bool)]) -> Option<PathBuf> {
    let (first, _) = entries.first()?;
    let root = PathBuf::from(first.components().next()?.as_os_str());

    let shared = entries
        .iter()
        .all(|(path, is_dir)| path.starts_with(&root) && (*is_dir || path != &root));

    shared.then_some(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            for (name, content) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn test_split_subdir() {
        assert_eq!(
            HttpFetcher::split_subdir("https://host/bundle.zip//modules/api"),
            (
                "https://host/bundle.zip".to_string(),
                Some("modules/api".to_string())
            )
        );
        assert_eq!(
            HttpFetcher::split_subdir("https://github.com/acme/repo//api?ref=v1"),
            (
                "https://github.com/acme/repo?ref=v1".to_string(),
                Some("api".to_string())
            )
        );
        assert_eq!(
            HttpFetcher::split_subdir("https://host/bundle.zip"),
            ("https://host/bundle.zip".to_string(), None)
        );
        assert_eq!(
            HttpFetcher::split_subdir("https://host/m.zip?next=https://cdn/x"),
            ("https://host/m.zip?next=https://cdn/x".to_string(), None)
        );
    }

    #[test]
    fn test_github_archive_url() {
        let url = HttpFetcher::download_url("https://github.com/acme/module").unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/acme/module/archive/HEAD.zip"
        );

        let url = HttpFetcher::download_url("https://github.com/acme/module.git?ref=v1.2.0").unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/acme/module/archive/v1.2.0.zip"
        );
    }

    #[test]
    fn test_plain_url_kept() {
        let url = HttpFetcher::download_url("https::https://example.com/m.zip").unwrap();
        assert_eq!(url.as_str(), "https://example.com/m.zip");
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = HttpFetcher::download_url("git::ssh://git@github.com/acme/m.git").unwrap_err();
        assert!(matches!(err, ModuleError::Fetch { .. }));
    }

    #[test]
    fn test_extract_strips_shared_root() {
        let bytes = build_zip(&[
            ("module-main/zero-module.yml", "name: m"),
            ("module-main/templates/README.md", "# {{ name }}"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cache");

        install_payload(&bytes, &dest, None, "m.zip").unwrap();

        assert!(dest.join("zero-module.yml").exists());
        assert!(dest.join("templates/README.md").exists());
        assert!(!dir.path().join("cache.partial").exists());
    }

    #[test]
    fn test_extract_subdir() {
        let bytes = build_zip(&[
            ("repo/modules/api/zero-module.yml", "name: api"),
            ("repo/modules/web/zero-module.yml", "name: web"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cache");

        install_payload(&bytes, &dest, Some("modules/api"), "m.zip").unwrap();

        let content = std::fs::read_to_string(dest.join("zero-module.yml")).unwrap();
        assert_eq!(content, "name: api");
    }

    #[test]
    fn test_non_zip_payload_written_as_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cache");

        install_payload(b"name: single", &dest, None, "zero-module.yml").unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("zero-module.yml")).unwrap(),
            "name: single"
        );
    }

    #[test]
    fn test_refetch_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cache");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("stale.txt"), "old").unwrap();

        let bytes = build_zip(&[("zero-module.yml", "name: fresh")]);
        install_payload(&bytes, &dest, None, "m.zip").unwrap();

        assert!(!dest.join("stale.txt").exists());
        assert!(dest.join("zero-module.yml").exists());
    }
}
