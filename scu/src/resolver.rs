use crate::cache::VersionCache;
use crate::config::Tokens;
use crate::hosts::{CocoaPodsClient, GitHubClient, GitLabClient, HostError, RepoHost, RepoLocation};
use scu_core::LatestVersion;

/// Cache key prefix for pod lookups
const POD_KEY_PREFIX: &str = "cocoapods:";

/// Whether lookups may reach the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Fresh cache entries first, then the hosting APIs
    Online,
    /// Cached entries of any age; never any network I/O
    CacheOnly,
}

/// Resolves the latest published version of dependencies, backed by the
/// version cache.
///
/// Lookups never fail: unsupported hosts and network errors come back as
/// [`LatestVersion::Unavailable`] and are not cached.
pub struct VersionResolver {
    mode: ResolveMode,
    cache: VersionCache,
    github: GitHubClient,
    gitlab: GitLabClient,
    cocoapods: CocoaPodsClient,
}

impl VersionResolver {
    pub fn new(mode: ResolveMode, cache: VersionCache, tokens: &Tokens) -> Self {
        Self::with_clients(
            mode,
            cache,
            GitHubClient::new(tokens.github.as_deref()),
            GitLabClient::new(tokens.gitlab.as_deref()),
            CocoaPodsClient::new(),
        )
    }

    pub fn with_clients(
        mode: ResolveMode,
        cache: VersionCache,
        github: GitHubClient,
        gitlab: GitLabClient,
        cocoapods: CocoaPodsClient,
    ) -> Self {
        Self {
            mode,
            cache,
            github,
            gitlab,
            cocoapods,
        }
    }

    /// Latest version published for a repository URL
    pub async fn latest_version(&mut self, url: &str) -> LatestVersion {
        if let Some(cached) = self.cached(url) {
            return cached;
        }

        let Some(location) = RepoLocation::parse(url) else {
            tracing::debug!("unrecognized repository URL: {url}");
            return LatestVersion::Unavailable;
        };

        let result = match &location.host {
            RepoHost::GitHub => {
                self.github
                    .latest_version(&location.owner, &location.repo)
                    .await
            }
            RepoHost::GitLab => {
                self.gitlab
                    .latest_version(&location.owner, &location.repo)
                    .await
            }
            RepoHost::Other(host) => {
                tracing::debug!("no version API for host {host}");
                return LatestVersion::Unavailable;
            }
        };

        self.record(url, result)
    }

    /// Latest version of a CocoaPods pod
    pub async fn latest_pod_version(&mut self, pod: &str) -> LatestVersion {
        let key = format!("{POD_KEY_PREFIX}{pod}");
        if let Some(cached) = self.cached(&key) {
            return cached;
        }

        let result = self.cocoapods.latest_version(pod).await;
        self.record(&key, result)
    }

    /// Answer from the cache when the mode allows it
    fn cached(&self, key: &str) -> Option<LatestVersion> {
        match self.mode {
            ResolveMode::CacheOnly => Some(match self.cache.get(key) {
                Some(entry) => LatestVersion::Found(entry.version.clone()),
                None => {
                    tracing::debug!("not cached: {key}");
                    LatestVersion::NotCached
                }
            }),
            ResolveMode::Online => self.cache.get_fresh(key).map(|entry| {
                tracing::debug!("cache hit: {key} -> {}", entry.version);
                LatestVersion::Found(entry.version.clone())
            }),
        }
    }

    fn record(&mut self, key: &str, result: Result<String, HostError>) -> LatestVersion {
        match result {
            Ok(version) => {
                if let Err(e) = self.cache.insert(key, &version) {
                    tracing::warn!("{e}");
                }
                LatestVersion::Found(version)
            }
            Err(e) => {
                tracing::warn!("Version lookup failed for {key}: {e}");
                LatestVersion::Unavailable
            }
        }
    }

    /// Flush and release the cache
    pub fn close(self) {
        if let Err(e) = self.cache.close() {
            tracing::warn!("{e}");
        }
    }
}
