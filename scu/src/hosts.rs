//! Clients for the code-hosting and pod registry APIs that publish latest
//! versions.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const GITHUB_API: &str = "https://api.github.com";
pub const GITLAB_API: &str = "https://gitlab.com/api/v4";
pub const COCOAPODS_TRUNK_API: &str = "https://trunk.cocoapods.org/api/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const USER_AGENT: &str = concat!(
    "swift-check-updates/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/folknor/swift-check-updates)"
);

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("No releases or tags published for {0}")]
    NoVersions(String),
}

/// Code host recognized in a repository URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoHost {
    GitHub,
    GitLab,
    Other(String),
}

impl RepoHost {
    fn from_host(host: &str) -> Self {
        let host = host.to_lowercase();
        match host.strip_prefix("www.").unwrap_or(&host) {
            "github.com" => RepoHost::GitHub,
            "gitlab.com" => RepoHost::GitLab,
            other => RepoHost::Other(other.to_string()),
        }
    }
}

/// Owner and repository parsed from a repository URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    pub host: RepoHost,
    pub owner: String,
    pub repo: String,
}

impl RepoLocation {
    /// Parse `https://host/owner/repo(.git)` or `git@host:owner/repo(.git)`
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        let (host, path) = match url.strip_prefix("git@") {
            Some(rest) => {
                let (host, path) = rest.split_once(':')?;
                (host.to_string(), path.to_string())
            }
            None => {
                let parsed = url::Url::parse(url).ok()?;
                (parsed.host_str()?.to_string(), parsed.path().to_string())
            }
        };

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let repo = segments.next()?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if repo.is_empty() {
            return None;
        }

        Some(Self {
            host: RepoHost::from_host(&host),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

fn http_client(headers: HeaderMap) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .default_headers(headers)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn auth_headers(name: reqwest::header::HeaderName, value: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = value
        && let Ok(mut value) = HeaderValue::from_str(value)
    {
        value.set_sensitive(true);
        headers.insert(name, value);
    }
    headers
}

async fn get_json<T: for<'de> Deserialize<'de>>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, HostError> {
    tracing::debug!("GET {url}");
    let response = client.get(url).send().await.map_err(|source| HostError::Request {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(HostError::Status {
            url: url.to_string(),
            status,
        });
    }

    response.json().await.map_err(|source| HostError::Request {
        url: url.to_string(),
        source,
    })
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Client for the GitHub REST API
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: Option<&str>) -> Self {
        let bearer = token.map(|t| format!("Bearer {t}"));
        Self {
            client: http_client(auth_headers(AUTHORIZATION, bearer.as_deref())),
            base_url: GITHUB_API.to_string(),
        }
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Latest release tag, falling back to the first listed tag
    pub async fn latest_version(&self, owner: &str, repo: &str) -> Result<String, HostError> {
        let release_url = format!("{}/repos/{owner}/{repo}/releases/latest", self.base_url);
        match get_json::<Release>(&self.client, &release_url).await {
            Ok(release) => return Ok(release.tag_name),
            Err(e) => tracing::debug!("no latest release: {e}"),
        }

        let tags_url = format!("{}/repos/{owner}/{repo}/tags", self.base_url);
        let tags: Vec<Tag> = get_json(&self.client, &tags_url).await?;
        tags.into_iter()
            .next()
            .map(|tag| tag.name)
            .ok_or_else(|| HostError::NoVersions(format!("{owner}/{repo}")))
    }
}

/// Client for the GitLab REST API
pub struct GitLabClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitLabClient {
    pub fn new(token: Option<&str>) -> Self {
        let name = reqwest::header::HeaderName::from_static("private-token");
        Self {
            client: http_client(auth_headers(name, token)),
            base_url: GITLAB_API.to_string(),
        }
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// First listed release, falling back to the first listed tag
    pub async fn latest_version(&self, owner: &str, repo: &str) -> Result<String, HostError> {
        let project = format!("{}/projects/{owner}%2F{repo}", self.base_url);

        let releases_url = format!("{project}/releases");
        match get_json::<Vec<Release>>(&self.client, &releases_url).await {
            Ok(releases) => {
                if let Some(release) = releases.into_iter().next() {
                    return Ok(release.tag_name);
                }
            }
            Err(e) => tracing::debug!("no releases: {e}"),
        }

        let tags_url = format!("{project}/repository/tags");
        let tags: Vec<Tag> = get_json(&self.client, &tags_url).await?;
        tags.into_iter()
            .next()
            .map(|tag| tag.name)
            .ok_or_else(|| HostError::NoVersions(format!("{owner}/{repo}")))
    }
}

#[derive(Debug, Deserialize)]
struct PodResponse {
    #[serde(default)]
    versions: Vec<PodVersion>,
}

#[derive(Debug, Deserialize)]
struct PodVersion {
    name: String,
    #[serde(default)]
    created_at: String,
}

/// Client for the CocoaPods trunk API
pub struct CocoaPodsClient {
    client: reqwest::Client,
    base_url: String,
}

impl CocoaPodsClient {
    pub fn new() -> Self {
        Self {
            client: http_client(HeaderMap::new()),
            base_url: COCOAPODS_TRUNK_API.to_string(),
        }
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Most recently pushed version of a pod
    pub async fn latest_version(&self, pod: &str) -> Result<String, HostError> {
        let url = format!("{}/pods/{pod}", self.base_url);
        let response: PodResponse = get_json(&self.client, &url).await?;

        response
            .versions
            .into_iter()
            .max_by(|a, b| a.created_at.cmp(&b.created_at))
            .map(|version| version.name)
            .ok_or_else(|| HostError::NoVersions(pod.to_string()))
    }
}

impl Default for CocoaPodsClient {
    fn default() -> Self {
        Self::new()
    }
}
