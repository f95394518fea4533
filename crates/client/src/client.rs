//! Repository service client.
//!
//! One `RepoClient` per target service instance. Capabilities are
//! resolved at connect time and drive the upload protocol: checksum-only
//! deploy for servers that support it, full-body upload otherwise, and
//! explicit checksum side-files for servers that predate header-derived
//! checksums.

use std::time::Duration;

use base64::Engine as _;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, info};
use wharf_build_info::BuildInfo;

use crate::details::{DeployDetails, Properties};
use crate::url::deployment_url;
use crate::version::{ServiceCapabilities, ServiceVersion};
use crate::{ClientError, is_blank};

/// Files below this size skip the checksum-deploy attempt; the extra
/// round trip outweighs the transfer savings.
pub const CHECKSUM_DEPLOY_MIN_FILE_SIZE: u64 = 10 * 1024;

const BUILD_REST_PATH: &str = "/api/build";
const SYSTEM_VERSION_PATH: &str = "/api/system/version";
const BUILD_INFO_CONTENT_TYPE: &str = "application/vnd.org.jfrog.artifactory+json";

const HEADER_CHECKSUM_SHA1: &str = "X-Checksum-Sha1";
const HEADER_CHECKSUM_MD5: &str = "X-Checksum-Md5";
const HEADER_CHECKSUM_DEPLOY: &str = "X-Checksum-Deploy";

/// Connection settings for [`RepoClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Connect and response timeout applied to every request.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Repository classes the service can enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoKind {
    Local,
    Remote,
    Virtual,
}

impl RepoKind {
    fn as_query(self) -> &'static str {
        match self {
            RepoKind::Local => "local",
            RepoKind::Remote => "remote",
            RepoKind::Virtual => "virtual",
        }
    }
}

/// How an artifact ended up on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadResult {
    /// The server materialized the artifact from bytes it already held;
    /// no file content was transmitted.
    ChecksumDeploy,
    /// The file body was uploaded in full.
    FullUpload,
}

/// Client for one artifact repository service.
#[derive(Debug)]
pub struct RepoClient {
    http: reqwest::Client,
    base_url: String,
    capabilities: ServiceCapabilities,
}

impl RepoClient {
    /// Connects to the service, resolves its capabilities and rejects
    /// servers older than the minimum supported version.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = build_http(config)?;
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        let version = fetch_version(&http, &base_url).await?;
        debug!(version = %version, "resolved service version");

        let capabilities = ServiceCapabilities::new(version);
        if !capabilities.is_supported() {
            return Err(ClientError::VersionIncompatible(format!(
                "server version {} is older than the minimum supported {}",
                capabilities.version,
                ServiceVersion::min_supported()
            )));
        }
        Ok(Self {
            http,
            base_url,
            capabilities,
        })
    }

    /// Builds a client with caller-provided capabilities, skipping the
    /// version probe. Used when the version is already known or pinned.
    pub fn with_capabilities(
        config: &ClientConfig,
        capabilities: ServiceCapabilities,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_http(config)?,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            capabilities,
        })
    }

    pub fn capabilities(&self) -> &ServiceCapabilities {
        &self.capabilities
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Enumerates repository keys of the given class.
    pub async fn list_repositories(&self, kind: RepoKind) -> Result<Vec<String>, ClientError> {
        let url = format!("{}/api/repositories", self.base_url);
        debug!(url = %url, kind = kind.as_query(), "listing repositories");

        let resp = self
            .http
            .get(&url)
            .query(&[("type", kind.as_query())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(status_error("failed to obtain list of repositories", status));
        }

        #[derive(Deserialize)]
        struct RepoEntry {
            key: String,
        }
        let entries: Vec<RepoEntry> = resp.json().await?;
        Ok(entries.into_iter().map(|e| e.key).collect())
    }

    /// Checks whether an artifact with the same file name already exists
    /// in the target repository.
    pub async fn has_duplicate(&self, details: &DeployDetails) -> Result<bool, ClientError> {
        let name = details.file_name();
        let url = format!("{}/api/search/artifact", self.base_url);
        debug!(repo = %details.target_repository, name = %name, "searching for existing artifact");

        let resp = self
            .http
            .get(&url)
            .query(&[("repos", details.target_repository.as_str()), ("name", name)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(status_error("failed to obtain list of duplicates", status));
        }

        #[derive(Deserialize)]
        struct SearchResults {
            #[serde(default)]
            results: Vec<serde_json::Value>,
        }
        let results: SearchResults = resp.json().await?;
        Ok(!results.results.is_empty())
    }

    /// Deploys one artifact: checksum deploy when worthwhile, full-body
    /// upload otherwise, plus checksum side-files for old servers.
    pub async fn deploy_artifact(
        &self,
        details: &DeployDetails,
    ) -> Result<UploadResult, ClientError> {
        let plain_url = deployment_url(
            &self.base_url,
            &details.target_repository,
            &details.artifact_path,
            &Properties::new(),
        );
        let full_url = deployment_url(
            &self.base_url,
            &details.target_repository,
            &details.artifact_path,
            &details.properties,
        );
        info!(url = %plain_url, "deploying artifact");

        let file_size = tokio::fs::metadata(&details.file).await?.len();
        let result = if self.try_checksum_deploy(details, &full_url, file_size).await {
            UploadResult::ChecksumDeploy
        } else {
            self.upload_file(details, &full_url).await?;
            UploadResult::FullUpload
        };

        // Servers predating header-derived checksums need the digests
        // deployed as explicit side-files.
        if !self.capabilities.derives_header_checksums() {
            self.upload_checksum_side_files(details, &plain_url).await?;
        }

        Ok(result)
    }

    /// Attempts a checksum-only deploy. Any rejection or transport
    /// failure falls back to the full-body upload.
    async fn try_checksum_deploy(
        &self,
        details: &DeployDetails,
        url: &str,
        file_size: u64,
    ) -> bool {
        if file_size < CHECKSUM_DEPLOY_MIN_FILE_SIZE {
            debug!(
                size = file_size,
                "file below checksum-deploy threshold, using full upload"
            );
            return false;
        }
        if !self.capabilities.supports_checksum_deploy() {
            debug!(
                version = %self.capabilities.version,
                "server version predates checksum deploy, using full upload"
            );
            return false;
        }

        let request = self
            .put_with_checksum_headers(url, details)
            .header(HEADER_CHECKSUM_DEPLOY, "true");
        match request.send().await {
            Ok(resp) => {
                let status = resp.status();
                if upload_success(status) {
                    debug!(sha1 = %details.sha1, "checksum deploy accepted");
                    true
                } else {
                    debug!(
                        status = status.as_u16(),
                        sha1 = %details.sha1,
                        "checksum deploy rejected, falling back to full upload"
                    );
                    false
                }
            }
            Err(e) => {
                debug!(error = %e, "checksum deploy attempt failed, falling back to full upload");
                false
            }
        }
    }

    async fn upload_file(&self, details: &DeployDetails, url: &str) -> Result<(), ClientError> {
        let body = tokio::fs::read(&details.file).await?;
        debug!(path = %details.file.display(), bytes = body.len(), "uploading file body");

        let resp = self
            .put_with_checksum_headers(url, details)
            .header(CONTENT_TYPE, "binary/octet-stream")
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        if !upload_success(status) {
            return Err(status_error(
                &format!("failed to deploy file {}", details.file.display()),
                status,
            ));
        }
        Ok(())
    }

    /// Uploads `<path>.sha1` and `<path>.md5` side-files. Blank digests
    /// are computed on demand, never skipped.
    async fn upload_checksum_side_files(
        &self,
        details: &DeployDetails,
        plain_url: &str,
    ) -> Result<(), ClientError> {
        let (sha1, md5) = if is_blank(&details.sha1) || is_blank(&details.md5) {
            let sums = wharf_checksum::compute(&details.file)?;
            (
                if is_blank(&details.sha1) {
                    sums.sha1
                } else {
                    details.sha1.clone()
                },
                if is_blank(&details.md5) {
                    sums.md5
                } else {
                    details.md5.clone()
                },
            )
        } else {
            (details.sha1.clone(), details.md5.clone())
        };

        let params = crate::url::matrix_params(&details.properties);
        for (ext, digest) in [("sha1", sha1), ("md5", md5)] {
            let url = format!("{plain_url}.{ext}{params}");
            debug!(url = %url, "uploading checksum side-file");

            let resp = self.http.put(&url).body(digest).send().await?;
            let status = resp.status();
            if !upload_success(status) {
                return Err(status_error(
                    &format!(
                        "failed to deploy {ext} checksum for {}",
                        details.file.display()
                    ),
                    status,
                ));
            }
        }
        Ok(())
    }

    /// Publishes the build-info document. The server answers 204 on
    /// success.
    pub async fn send_build_info(&self, build: &BuildInfo) -> Result<(), ClientError> {
        let json = self.build_info_json(build)?;
        let url = format!("{}{}", self.base_url, BUILD_REST_PATH);
        info!(url = %url, name = %build.name, number = %build.number, "publishing build info");

        let resp = self
            .http
            .put(&url)
            .header(CONTENT_TYPE, BUILD_INFO_CONTENT_TYPE)
            .body(json)
            .send()
            .await?;
        let status = resp.status();
        if status != StatusCode::NO_CONTENT {
            return Err(status_error("failed to send build info", status));
        }
        Ok(())
    }

    /// Serializes a build-info document the connected server can accept,
    /// applying version gates before any bytes go on the wire.
    pub fn build_info_json(&self, build: &BuildInfo) -> Result<String, ClientError> {
        let mut build = build.clone();
        // Servers below the minimum supported version also reject
        // unknown document fields; strip the parent linkage for them.
        if !self.capabilities.is_supported() {
            build.parent_name = None;
            build.parent_number = None;
        }
        if !self.capabilities.tolerates_flexible_build_numbers() {
            verify_numeric_build_number("build number", &build.number)?;
            if let Some(parent) = &build.parent_number {
                verify_numeric_build_number("parent build number", parent)?;
            }
        }
        Ok(serde_json::to_string_pretty(&build)?)
    }

    fn put_with_checksum_headers(
        &self,
        url: &str,
        details: &DeployDetails,
    ) -> reqwest::RequestBuilder {
        self.http
            .put(url)
            .header(HEADER_CHECKSUM_SHA1, details.sha1.as_str())
            .header(HEADER_CHECKSUM_MD5, details.md5.as_str())
    }
}

fn verify_numeric_build_number(what: &str, number: &str) -> Result<(), ClientError> {
    if number.parse::<i64>().is_err() {
        return Err(ClientError::VersionIncompatible(format!(
            "cannot handle {what} '{number}': non-numeric build numbers require server version {} or above",
            ServiceVersion::min_flexible_build_number()
        )));
    }
    Ok(())
}

async fn fetch_version(
    http: &reqwest::Client,
    base_url: &str,
) -> Result<ServiceVersion, ClientError> {
    let url = format!("{base_url}{SYSTEM_VERSION_PATH}");
    let resp = http.get(&url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(status_error("failed to obtain service version", status));
    }

    #[derive(Deserialize)]
    struct VersionInfo {
        version: String,
    }
    let info: VersionInfo = resp.json().await?;
    Ok(ServiceVersion::new(info.version))
}

fn build_http(config: &ClientConfig) -> Result<reqwest::Client, ClientError> {
    let mut headers = HeaderMap::new();
    if let Some(username) = &config.username {
        let token = base64::engine::general_purpose::STANDARD.encode(format!(
            "{username}:{}",
            config.password.as_deref().unwrap_or("")
        ));
        let mut value = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|_| ClientError::Validation("invalid credentials".into()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.timeout)
        .timeout(config.timeout)
        .build()?)
}

/// 200 and 201 are both accepted for compatibility with older servers.
fn upload_success(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

fn status_error(context: &str, status: StatusCode) -> ClientError {
    ClientError::Status {
        context: context.to_string(),
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wharf_build_info::BuildInfoBuilder;

    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        path: String,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    }

    impl Recorded {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
        }
    }

    /// Serves one scripted response per request; the last entry repeats.
    /// Every response closes the connection so each request is visible.
    async fn mock_server(
        responses: Vec<(u16, &str)>,
    ) -> (String, Arc<Mutex<Vec<Recorded>>>, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let responses: Vec<(u16, String)> =
            responses.into_iter().map(|(s, b)| (s, b.to_string())).collect();
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let recorded_clone = recorded.clone();

        let handle = tokio::spawn(async move {
            let mut served = 0usize;
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let Some(request) = read_request(&mut stream).await else {
                    continue;
                };
                recorded_clone.lock().unwrap().push(request);

                let (status, body) = responses[served.min(responses.len() - 1)].clone();
                served += 1;
                let reason = match status {
                    200 => "OK",
                    201 => "Created",
                    204 => "No Content",
                    403 => "Forbidden",
                    404 => "Not Found",
                    409 => "Conflict",
                    500 => "Internal Server Error",
                    _ => "Error",
                };
                let resp = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, recorded, handle)
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> Option<Recorded> {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut tmp).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&tmp[..n]);
            if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
                break pos;
            }
            if buf.len() > 64 * 1024 {
                return None;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.lines();
        let request_line = lines.next()?;
        let mut parts = request_line.split_whitespace();
        let method = parts.next()?.to_string();
        let path = parts.next()?.to_string();

        let mut headers = HashMap::new();
        for line in lines {
            if let Some((k, v)) = line.split_once(':') {
                headers.insert(k.trim().to_ascii_lowercase(), v.trim().to_string());
            }
        }

        let mut body = buf[header_end + 4..].to_vec();
        if let Some(len) = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
        {
            while body.len() < len {
                let n = stream.read(&mut tmp).await.ok()?;
                if n == 0 {
                    break;
                }
                body.extend_from_slice(&tmp[..n]);
            }
            body.truncate(len);
        }

        Some(Recorded {
            method,
            path,
            headers,
            body,
        })
    }

    fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn client(url: &str, version: &str) -> RepoClient {
        RepoClient::with_capabilities(
            &ClientConfig::new(url),
            ServiceCapabilities::new(ServiceVersion::new(version)),
        )
        .unwrap()
    }

    fn details_with_file(dir: impl AsRef<Path>, name: &str, size: usize) -> DeployDetails {
        let path = dir.as_ref().join(name);
        std::fs::write(&path, vec![b'J'; size]).unwrap();
        DeployDetails::builder()
            .target_repository("libs-release")
            .artifact_path(format!("lib/{name}"))
            .file(path)
            .sha1("1111111111111111111111111111111111111111")
            .md5("22222222222222222222222222222222")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn checksum_deploy_transmits_no_body() {
        let dir = tempfile::tempdir().unwrap();
        let details = details_with_file(&dir, "a-1.0.jar", 15 * 1024);
        let (url, recorded, handle) = mock_server(vec![(200, "")]).await;

        let result = client(&url, "2.6.0").deploy_artifact(&details).await.unwrap();
        assert_eq!(result, UploadResult::ChecksumDeploy);

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].header("x-checksum-deploy"), Some("true"));
        assert_eq!(
            requests[0].header("x-checksum-sha1"),
            Some("1111111111111111111111111111111111111111")
        );
        assert!(requests[0].body.is_empty(), "checksum deploy must send zero body bytes");

        handle.abort();
    }

    #[tokio::test]
    async fn small_file_goes_straight_to_full_upload() {
        let dir = tempfile::tempdir().unwrap();
        let details = details_with_file(&dir, "tiny.jar", 100);
        let (url, recorded, handle) = mock_server(vec![(201, "")]).await;

        let result = client(&url, "2.6.0").deploy_artifact(&details).await.unwrap();
        assert_eq!(result, UploadResult::FullUpload);

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 1, "no checksum-deploy attempt expected");
        assert_eq!(requests[0].header("x-checksum-deploy"), None);
        assert_eq!(requests[0].body.len(), 100);

        handle.abort();
    }

    #[tokio::test]
    async fn old_server_skips_checksum_deploy() {
        let dir = tempfile::tempdir().unwrap();
        let details = details_with_file(&dir, "a.jar", 15 * 1024);
        let (url, recorded, handle) = mock_server(vec![(201, "")]).await;

        // 2.4.0 is below the checksum-deploy minimum but new enough to
        // derive checksums from headers.
        let result = client(&url, "2.4.0").deploy_artifact(&details).await.unwrap();
        assert_eq!(result, UploadResult::FullUpload);

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("x-checksum-deploy"), None);
        assert_eq!(requests[0].body.len(), 15 * 1024);

        handle.abort();
    }

    #[tokio::test]
    async fn rejected_checksum_deploy_falls_back_to_full_upload() {
        let dir = tempfile::tempdir().unwrap();
        let details = details_with_file(&dir, "a.jar", 15 * 1024);
        let (url, recorded, handle) = mock_server(vec![(404, ""), (201, "")]).await;

        let result = client(&url, "2.6.0").deploy_artifact(&details).await.unwrap();
        assert_eq!(result, UploadResult::FullUpload);

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].body.is_empty());
        assert_eq!(requests[1].body.len(), 15 * 1024);
        assert_eq!(requests[1].header("x-checksum-deploy"), None);

        handle.abort();
    }

    #[tokio::test]
    async fn ancient_server_gets_checksum_side_files() {
        let dir = tempfile::tempdir().unwrap();
        let details = details_with_file(&dir, "a.jar", 64);
        let (url, recorded, handle) =
            mock_server(vec![(201, ""), (201, ""), (201, "")]).await;

        // 2.3.0 predates header-derived checksums.
        client(&url, "2.3.0").deploy_artifact(&details).await.unwrap();

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].path.ends_with("/libs-release/lib/a.jar"));
        assert!(requests[1].path.ends_with("/libs-release/lib/a.jar.sha1"));
        assert!(requests[2].path.ends_with("/libs-release/lib/a.jar.md5"));
        assert_eq!(
            requests[1].body,
            b"1111111111111111111111111111111111111111"
        );
        assert_eq!(requests[2].body, b"22222222222222222222222222222222");

        handle.abort();
    }

    #[tokio::test]
    async fn blank_digests_computed_on_demand_for_side_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jar");
        std::fs::write(&path, b"CONTENT").unwrap();
        let details = DeployDetails::builder()
            .target_repository("libs-release")
            .artifact_path("lib/a.jar")
            .file(&path)
            .build()
            .unwrap();
        let (url, recorded, handle) =
            mock_server(vec![(201, ""), (201, ""), (201, "")]).await;

        client(&url, "2.3.0").deploy_artifact(&details).await.unwrap();

        let sums = wharf_checksum::compute_bytes(b"CONTENT");
        let requests = recorded.lock().unwrap();
        assert_eq!(requests[1].body, sums.sha1.as_bytes());
        assert_eq!(requests[2].body, sums.md5.as_bytes());

        handle.abort();
    }

    #[tokio::test]
    async fn failed_upload_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let details = details_with_file(&dir, "a.jar", 64);
        let (url, _recorded, handle) = mock_server(vec![(500, "")]).await;

        let err = client(&url, "2.6.0").deploy_artifact(&details).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("500"), "error should carry the status: {msg}");

        handle.abort();
    }

    #[tokio::test]
    async fn matrix_properties_appended_to_upload_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jar");
        std::fs::write(&path, b"X").unwrap();
        let details = DeployDetails::builder()
            .target_repository("libs-release")
            .artifact_path("lib/a.jar")
            .file(&path)
            .add_property("build.name", "app")
            .add_property("build.number", "42")
            .build()
            .unwrap();
        let (url, recorded, handle) = mock_server(vec![(201, "")]).await;

        client(&url, "2.6.0").deploy_artifact(&details).await.unwrap();

        let requests = recorded.lock().unwrap();
        assert!(
            requests[0]
                .path
                .ends_with("/libs-release/lib/a.jar;build.name=app;build.number=42"),
            "unexpected path: {}",
            requests[0].path
        );

        handle.abort();
    }

    #[tokio::test]
    async fn duplicate_search_hits() {
        let dir = tempfile::tempdir().unwrap();
        let details = details_with_file(&dir, "y.jar", 10);
        let (url, recorded, handle) =
            mock_server(vec![(200, r#"{"results":[{"uri":"http://r/libs/y.jar"}]}"#)]).await;

        let found = client(&url, "2.6.0").has_duplicate(&details).await.unwrap();
        assert!(found);

        let requests = recorded.lock().unwrap();
        assert!(requests[0].path.starts_with("/api/search/artifact"));
        assert!(requests[0].path.contains("repos=libs-release"));
        assert!(requests[0].path.contains("name=y.jar"));

        handle.abort();
    }

    #[tokio::test]
    async fn duplicate_search_empty_results() {
        let dir = tempfile::tempdir().unwrap();
        let details = details_with_file(&dir, "x.jar", 10);
        let (url, _recorded, handle) = mock_server(vec![(200, r#"{"results":[]}"#)]).await;

        let found = client(&url, "2.6.0").has_duplicate(&details).await.unwrap();
        assert!(!found);

        handle.abort();
    }

    #[tokio::test]
    async fn duplicate_search_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let details = details_with_file(&dir, "x.jar", 10);
        let (url, _recorded, handle) = mock_server(vec![(500, "")]).await;

        let err = client(&url, "2.6.0").has_duplicate(&details).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 500, .. }));

        handle.abort();
    }

    #[tokio::test]
    async fn send_build_info_expects_204() {
        let build = BuildInfoBuilder::new("app", "42")
            .started("2026-08-08T09:00:00.000+0000")
            .build();
        let (url, recorded, handle) = mock_server(vec![(204, "")]).await;

        client(&url, "2.6.0").send_build_info(&build).await.unwrap();

        let requests = recorded.lock().unwrap();
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path, "/api/build");
        assert_eq!(
            requests[0].header("content-type"),
            Some("application/vnd.org.jfrog.artifactory+json")
        );
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("\"name\": \"app\""));

        handle.abort();
    }

    #[tokio::test]
    async fn send_build_info_rejects_non_204() {
        let build = BuildInfoBuilder::new("app", "42").build();
        let (url, _recorded, handle) = mock_server(vec![(200, "")]).await;

        let err = client(&url, "2.6.0").send_build_info(&build).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { .. }));

        handle.abort();
    }

    #[tokio::test]
    async fn list_repositories_parses_keys() {
        let (url, recorded, handle) = mock_server(vec![(
            200,
            r#"[{"key":"libs-release","type":"LOCAL"},{"key":"libs-snapshot"}]"#,
        )])
        .await;

        let repos = client(&url, "2.6.0")
            .list_repositories(RepoKind::Local)
            .await
            .unwrap();
        assert_eq!(repos, vec!["libs-release", "libs-snapshot"]);

        let requests = recorded.lock().unwrap();
        assert!(requests[0].path.contains("type=local"));

        handle.abort();
    }

    #[tokio::test]
    async fn connect_resolves_version() {
        let (url, recorded, handle) =
            mock_server(vec![(200, r#"{"version":"2.6.0"}"#)]).await;

        let client = RepoClient::connect(&ClientConfig::new(&url)).await.unwrap();
        assert!(client.capabilities().supports_checksum_deploy());

        let requests = recorded.lock().unwrap();
        assert_eq!(requests[0].path, "/api/system/version");

        handle.abort();
    }

    #[tokio::test]
    async fn connect_rejects_unsupported_server() {
        let (url, _recorded, handle) =
            mock_server(vec![(200, r#"{"version":"2.2.2"}"#)]).await;

        let err = RepoClient::connect(&ClientConfig::new(&url)).await.unwrap_err();
        assert!(matches!(err, ClientError::VersionIncompatible(_)));

        handle.abort();
    }

    #[tokio::test]
    async fn build_info_json_gates_non_numeric_numbers() {
        let build = BuildInfoBuilder::new("app", "1.0-beta").build();

        // Old server: non-numeric build number is rejected up front.
        let old = client("http://unused", "2.2.3");
        let err = old.build_info_json(&build).unwrap_err();
        assert!(matches!(err, ClientError::VersionIncompatible(_)));

        // New server: passes through.
        let new = client("http://unused", "2.6.0");
        assert!(new.build_info_json(&build).is_ok());
    }
}
