//! GitHub API backend
//!
//! Directories are listed through the Git Trees API, which returns a whole
//! tree in one response and flags truncation. The contents API caps a
//! directory listing at 1,000 entries without saying so. Files are still
//! read through the contents API.

use super::{EntryKind, RepoEntry, RepositoryBrowser, RepositoryConnector, join_path};
use crate::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// GitHub repository coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Repository owner
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name
    #[serde(default = "default_name")]
    pub name: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            owner: default_owner(),
            name: default_name(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_owner() -> String {
    "google".to_string()
}

fn default_name() -> String {
    "oss-fuzz".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Git tree of a single directory
#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    /// Name relative to the listed directory
    path: String,
    mode: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Git file mode of a symbolic link
const SYMLINK_MODE: &str = "120000";

impl TreeItem {
    fn entry_kind(&self) -> EntryKind {
        match self.kind.as_str() {
            "tree" => EntryKind::Dir,
            "blob" if self.mode != SYMLINK_MODE => EntryKind::File,
            _ => EntryKind::Other,
        }
    }
}

/// Contents API answer: an object for a file, an array for a directory
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    File(FileContents),
    Directory(#[allow(dead_code)] Vec<IgnoredAny>),
}

#[derive(Debug, Deserialize)]
struct FileContents {
    path: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Repository browser backed by the GitHub contents API
#[derive(Debug, Clone)]
pub struct GitHubRepository {
    client: Client,
    base_url: String,
    owner: String,
    name: String,
}

impl GitHubRepository {
    /// Create a client authenticated with `access_token`
    pub fn new(config: &GitHubConfig, access_token: &str) -> RepositoryResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| RepositoryError::InvalidAccessToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("buildsync/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            name: config.name.clone(),
        })
    }

    async fn get_contents(&self, path: &str) -> RepositoryResult<ContentsResponse> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            self.owner,
            self.name,
            path.trim_matches('/')
        );
        self.get_json(&url, path).await
    }

    async fn get_tree(&self, path: &str) -> RepositoryResult<TreeResponse> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/HEAD:{}",
            self.base_url,
            self.owner,
            self.name,
            path.trim_matches('/')
        );
        self.get_json(&url, path).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, path: &str) -> RepositoryResult<T> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else if status == StatusCode::NOT_FOUND {
            Err(RepositoryError::NotFound(path.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(RepositoryError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl RepositoryBrowser for GitHubRepository {
    async fn list_directory(&self, path: &str) -> RepositoryResult<Vec<RepoEntry>> {
        let tree = self.get_tree(path).await?;
        if tree.truncated {
            return Err(RepositoryError::Truncated(path.to_string()));
        }

        Ok(tree
            .tree
            .into_iter()
            .map(|item| RepoEntry {
                kind: item.entry_kind(),
                path: join_path(path, &item.path),
                name: item.path,
            })
            .collect())
    }

    async fn read_file(&self, path: &str) -> RepositoryResult<Vec<u8>> {
        let file = match self.get_contents(path).await? {
            ContentsResponse::File(file) if file.kind == EntryKind::File => file,
            _ => {
                return Err(RepositoryError::UnexpectedKind {
                    path: path.to_string(),
                    expected: "file",
                });
            }
        };

        match file.encoding.as_deref() {
            Some("base64") => {
                // GitHub wraps the payload at 60 columns
                let compact: String = file.content.split_whitespace().collect();
                STANDARD
                    .decode(compact)
                    .map_err(|e| RepositoryError::Decode(format!("{}: {}", file.path, e)))
            }
            other => Err(RepositoryError::Decode(format!(
                "{}: unsupported encoding {:?}",
                file.path, other
            ))),
        }
    }
}

/// Connects to GitHub with the token fetched for each sync pass
#[derive(Debug, Clone, Default)]
pub struct GitHubConnector {
    config: GitHubConfig,
}

impl GitHubConnector {
    pub fn new(config: GitHubConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RepositoryConnector for GitHubConnector {
    async fn connect(&self, access_token: &str) -> RepositoryResult<Box<dyn RepositoryBrowser>> {
        Ok(Box::new(GitHubRepository::new(&self.config, access_token)?))
    }
}
