//! Contents-API backend over HTTPS
//!
//! Talks to `/repos/{owner}/{repo}/contents/{path}`. All error
//! discrimination happens here: HTTP status codes become typed
//! [`BackendError`] variants and response bodies are never forwarded
//! upward verbatim.

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{BackendError, ContentBackend, RawDocument, RawEntry};
use crate::version::VersionToken;

/// Connection settings for the contents API
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API token with contents read/write scope
    pub token: String,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch to read and commit against
    pub branch: String,
    /// API root, overridable for self-hosted deployments
    pub api_base: Url,
}

impl GithubConfig {
    pub fn new(token: String, owner: String, repo: String, branch: String) -> Self {
        Self {
            token,
            owner,
            repo,
            branch,
            // unwrap: statically valid URL
            api_base: Url::parse("https://api.github.com").unwrap(),
        }
    }
}

/// File or directory payload of a GET on the contents endpoint
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    File(FileResponse),
    Directory(Vec<DirEntryResponse>),
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    size: u64,
}

impl FileResponse {
    /// Decoded inline content, or `None` when the body must be fetched raw
    ///
    /// The contents endpoint only inlines base64 for files up to 1 MB;
    /// larger files report their `size` with empty content. Treating that
    /// shape as an empty document would silently truncate the payload.
    fn inline_bytes(&self) -> Result<Option<Vec<u8>>, BackendError> {
        // The API wraps base64 at 60 columns; strip whitespace first
        let cleaned: String = self.content.split_whitespace().collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| anyhow::anyhow!("invalid base64 content: {}", e))?;
        if bytes.is_empty() && self.size > 0 {
            return Ok(None);
        }
        Ok(Some(bytes))
    }
}

#[derive(Debug, Deserialize)]
struct DirEntryResponse {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

/// [`ContentBackend`] implementation against the real contents API
#[derive(Debug)]
pub struct GithubBackend {
    config: GithubConfig,
    http: reqwest::Client,
}

impl GithubBackend {
    pub fn new(config: GithubConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent("draftbox")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build http client: {}", e))?;
        Ok(Self { config, http })
    }

    fn contents_url(&self, path: &str) -> Result<Url, BackendError> {
        self.config
            .api_base
            .join(&format!(
                "repos/{}/{}/contents/{}",
                self.config.owner, self.config.repo, path
            ))
            .map_err(|e| anyhow::anyhow!("invalid contents path {:?}: {}", path, e).into())
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github+json")
    }

    async fn get_contents(&self, path: &str) -> Result<Option<ContentsResponse>, BackendError> {
        let url = self.contents_url(path)?;
        let response = self
            .auth(self.http.get(url))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("transport error: {}", e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response
                    .json::<ContentsResponse>()
                    .await
                    .map_err(|e| anyhow::anyhow!("malformed contents response: {}", e))?;
                Ok(Some(body))
            }
            status => Err(upstream(status, response).await),
        }
    }

    /// Re-fetch a file with the raw media type, bypassing the 1 MB inline
    /// base64 limit
    async fn fetch_raw(&self, path: &str, expected_len: u64) -> Result<Vec<u8>, BackendError> {
        let url = self.contents_url(path)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.token)
            .header("Accept", "application/vnd.github.raw+json")
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("transport error: {}", e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to read raw content: {}", e))?;
                if bytes.len() as u64 != expected_len {
                    return Err(anyhow::anyhow!(
                        "raw fetch of {:?} returned {} bytes, expected {}",
                        path,
                        bytes.len(),
                        expected_len
                    )
                    .into());
                }
                Ok(bytes.to_vec())
            }
            status => Err(upstream(status, response).await),
        }
    }
}

async fn upstream(status: StatusCode, response: reqwest::Response) -> BackendError {
    let detail = response.text().await.unwrap_or_default();
    BackendError::Upstream {
        status: status.as_u16(),
        detail,
    }
}

#[async_trait]
impl ContentBackend for GithubBackend {
    async fn fetch(&self, path: &str) -> Result<Option<RawDocument>, BackendError> {
        match self.get_contents(path).await? {
            None => Ok(None),
            Some(ContentsResponse::File(file)) => {
                let bytes = match file.inline_bytes()? {
                    Some(bytes) => bytes,
                    None => self.fetch_raw(path, file.size).await?,
                };
                Ok(Some(RawDocument {
                    bytes,
                    version: VersionToken::new(file.sha),
                }))
            }
            Some(ContentsResponse::Directory(_)) => {
                Err(anyhow::anyhow!("path {:?} is a directory, not a file", path).into())
            }
        }
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        message: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, BackendError> {
        let url = self.contents_url(path)?;
        let body = PutRequest {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(bytes),
            branch: &self.config.branch,
            sha: expected.map(|v| v.as_str()),
        };

        let response = self
            .auth(self.http.put(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("transport error: {}", e))?;

        match response.status() {
            // 409: sha mismatch; 422: create over an existing document
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(BackendError::Conflict)
            }
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            status if status.is_success() => {
                let body = response
                    .json::<PutResponse>()
                    .await
                    .map_err(|e| anyhow::anyhow!("malformed write response: {}", e))?;
                Ok(VersionToken::new(body.content.sha))
            }
            status => Err(upstream(status, response).await),
        }
    }

    async fn remove(
        &self,
        path: &str,
        message: &str,
        expected: &VersionToken,
    ) -> Result<(), BackendError> {
        let url = self.contents_url(path)?;
        let body = DeleteRequest {
            message,
            sha: expected.as_str(),
            branch: &self.config.branch,
        };

        let response = self
            .auth(self.http.delete(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("transport error: {}", e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            StatusCode::CONFLICT => Err(BackendError::Conflict),
            status if status.is_success() => Ok(()),
            status => Err(upstream(status, response).await),
        }
    }

    async fn list(&self, path: &str) -> Result<Option<Vec<RawEntry>>, BackendError> {
        match self.get_contents(path).await? {
            None => Ok(None),
            Some(ContentsResponse::Directory(entries)) => Ok(Some(
                entries
                    .into_iter()
                    .map(|e| RawEntry {
                        is_dir: e.kind == "dir",
                        name: e.name,
                    })
                    .collect(),
            )),
            Some(ContentsResponse::File(_)) => {
                Err(anyhow::anyhow!("path {:?} is a file, not a directory", path).into())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_inline_content_decodes() {
        let file: FileResponse =
            serde_json::from_str(r#"{"sha":"abc","content":"aGVs\nbG8=\n","size":5}"#).unwrap();
        assert_eq!(file.inline_bytes().unwrap().as_deref(), Some("hello".as_bytes()));
    }

    #[test]
    fn test_large_file_empty_content_defers_to_raw_fetch() {
        // Files over the 1 MB inline limit come back with empty content
        let file: FileResponse =
            serde_json::from_str(r#"{"sha":"abc","content":"","size":6291456}"#).unwrap();
        assert_eq!(file.inline_bytes().unwrap(), None);
    }

    #[test]
    fn test_genuinely_empty_file_stays_empty() {
        let file: FileResponse =
            serde_json::from_str(r#"{"sha":"abc","content":"","size":0}"#).unwrap();
        assert_eq!(file.inline_bytes().unwrap().as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let file: FileResponse =
            serde_json::from_str(r#"{"sha":"abc","content":"!!!","size":3}"#).unwrap();
        assert!(file.inline_bytes().is_err());
    }
}
