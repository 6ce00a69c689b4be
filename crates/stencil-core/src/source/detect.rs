//! Canonicalisation of module source strings
//!
//! A source is either a URL (returned as-is), a well-known host shorthand
//! (rewritten to a URL), an object storage host (rewritten to a forced
//! `s3::` / `gcs::` URL), or a filesystem path (rewritten to `file://<abs>`).

use crate::error::{ModuleError, ModuleResult};
use std::path::Path;
use url::Url;

/// Prefixes forcing a particular transport, e.g. `git::https://...`
const FORCED_GETTERS: &[&str] = &["git::", "hg::", "http::", "https::", "s3::", "gcs::"];

/// Hosts that may be referenced without a scheme
const HOST_SHORTHANDS: &[&str] = &["github.com/", "gitlab.com/", "bitbucket.org/"];

/// Scheme prefix of canonical local sources
pub const FILE_SCHEME: &str = "file://";

/// Canonicalise `source` against `working_dir`
pub fn detect(source: &str, working_dir: &Path) -> ModuleResult<String> {
    if source.trim().is_empty() {
        return Err(configuration_error(source, "source is empty"));
    }

    if FORCED_GETTERS.iter().any(|getter| source.starts_with(getter)) {
        return Ok(source.to_string());
    }

    if has_scheme(source) {
        return Ok(source.to_string());
    }

    if HOST_SHORTHANDS.iter().any(|host| source.starts_with(host)) {
        return Ok(format!("https://{}", source));
    }

    if let Some(getter) = storage_getter(source) {
        return Ok(format!("{}https://{}", getter, source));
    }

    // git@github.com:owner/repo.git
    if let Some(rest) = source.strip_prefix("git@") {
        let (host, path) = rest
            .split_once(':')
            .ok_or_else(|| configuration_error(source, "missing ':' in SSH source"))?;
        return Ok(format!("git::ssh://git@{}/{}", host, path));
    }

    let path = Path::new(source);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        if working_dir.as_os_str().is_empty() {
            return Err(configuration_error(
                source,
                "relative path requires a working directory",
            ));
        }
        working_dir.join(path)
    };

    Ok(format!("{}{}", FILE_SCHEME, absolute.display()))
}

/// Whether a canonical URI refers to the local filesystem
pub fn is_file_uri(canonical: &str) -> bool {
    canonical.starts_with(FILE_SCHEME)
}

/// Object storage hosts referenced without a scheme
///
/// `bucket.s3.amazonaws.com/key` and `www.googleapis.com/storage/...`
fn storage_getter(source: &str) -> Option<&'static str> {
    let host = source.split_once('/')?.0;
    if host.ends_with(".amazonaws.com") && host.split('.').any(|label| label.starts_with("s3")) {
        Some("s3::")
    } else if host.ends_with("googleapis.com") && source[host.len()..].starts_with("/storage/") {
        Some("gcs::")
    } else {
        None
    }
}

fn has_scheme(source: &str) -> bool {
    // Single-letter schemes are Windows drive letters, not URLs
    Url::parse(source).is_ok_and(|url| url.scheme().len() > 1)
}

fn configuration_error(source: &str, reason: &str) -> ModuleError {
    ModuleError::Configuration {
        uri: source.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pwd() -> &'static Path {
        Path::new("/work/project")
    }

    #[test]
    fn test_urls_are_unchanged() {
        let uri = "https://example.com/modules/backend.zip";
        assert_eq!(detect(uri, pwd()).unwrap(), uri);
        assert_eq!(detect("file:///tmp/m", pwd()).unwrap(), "file:///tmp/m");
    }

    #[test]
    fn test_forced_getter_is_remote() {
        let uri = "git::https://github.com/acme/module.git";
        let detected = detect(uri, pwd()).unwrap();
        assert_eq!(detected, uri);
        assert!(!is_file_uri(&detected));
    }

    #[test]
    fn test_host_shorthand() {
        assert_eq!(
            detect("github.com/acme/module", pwd()).unwrap(),
            "https://github.com/acme/module"
        );
    }

    #[test]
    fn test_object_storage_hosts_are_remote() {
        let s3 = detect("acme-modules.s3.amazonaws.com/backend.zip", pwd()).unwrap();
        assert_eq!(s3, "s3::https://acme-modules.s3.amazonaws.com/backend.zip");
        assert!(!is_file_uri(&s3));

        let regional = detect("s3.eu-west-1.amazonaws.com/bucket/m.zip", pwd()).unwrap();
        assert!(regional.starts_with("s3::https://"));

        let gcs = detect("www.googleapis.com/storage/v1/acme/backend.zip", pwd()).unwrap();
        assert_eq!(
            gcs,
            "gcs::https://www.googleapis.com/storage/v1/acme/backend.zip"
        );
        assert!(!is_file_uri(&gcs));
    }

    #[test]
    fn test_ssh_shorthand() {
        assert_eq!(
            detect("git@github.com:acme/module.git", pwd()).unwrap(),
            "git::ssh://git@github.com/acme/module.git"
        );
    }

    #[test]
    fn test_relative_path_joined_with_working_dir() {
        assert_eq!(
            detect("modules/backend", pwd()).unwrap(),
            "file:///work/project/modules/backend"
        );
    }

    #[test]
    fn test_absolute_path() {
        let detected = detect("/opt/modules/backend", pwd()).unwrap();
        assert_eq!(detected, "file:///opt/modules/backend");
        assert!(is_file_uri(&detected));
    }

    #[test]
    fn test_relative_path_without_working_dir_fails() {
        let err = detect("modules/backend", Path::new("")).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_source_fails() {
        assert!(detect("", pwd()).is_err());
    }
}
