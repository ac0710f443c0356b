//! Minimal GitHub API client for branch-based Pages deployment.
//!
//! Publishing is the Git Data API dance: one blob per file, one tree, one
//! commit, then a force-update of the target ref. No local git required.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

const API_BASE: &str = "https://api.github.com";

pub struct GithubClient {
    client: reqwest::Client,
    owner: String,
    repo: String,
}

/// GitHub error payload; most failures carry a `message`
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ShaObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: ShaObject,
}

/// Pages configuration for a repository
#[derive(Debug, Deserialize, Serialize)]
pub struct PagesInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PagesSource>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PagesSource {
    pub branch: String,
}

impl GithubClient {
    /// Create new GitHub API client
    pub fn new(token: &str, owner: &str, repo: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        // GitHub rejects requests without a user agent
        headers.insert(USER_AGENT, HeaderValue::from_static("docsite-kit"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", API_BASE, self.owner, self.repo, path)
    }

    async fn api_failure(response: reqwest::Response, what: &str) -> anyhow::Error {
        let status = response.status();
        let message = match response.json::<ApiError>().await {
            Ok(err) => err.message,
            Err(_) => "unknown error".to_string(),
        };
        anyhow::anyhow!("GitHub API error during {} ({}): {}", what, status, message)
    }

    /// Current head of a branch, or None if the branch does not exist
    pub async fn get_ref(&self, branch: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.url(&format!("git/ref/heads/{}", branch)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_failure(response, "ref lookup").await);
        }

        let git_ref: GitRef = response.json().await?;
        Ok(Some(git_ref.object.sha))
    }

    async fn create_blob(&self, content: &[u8]) -> Result<String> {
        let body = json!({
            "content": STANDARD.encode(content),
            "encoding": "base64",
        });

        let response = self
            .client
            .post(self.url("git/blobs"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_failure(response, "blob upload").await);
        }

        let blob: ShaObject = response.json().await?;
        Ok(blob.sha)
    }

    async fn create_tree(&self, entries: &[serde_json::Value]) -> Result<String> {
        let response = self
            .client
            .post(self.url("git/trees"))
            .json(&json!({ "tree": entries }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_failure(response, "tree creation").await);
        }

        let tree: ShaObject = response.json().await?;
        Ok(tree.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parent: Option<&str>,
    ) -> Result<String> {
        let parents: Vec<&str> = parent.into_iter().collect();
        let body = json!({
            "message": message,
            "tree": tree_sha,
            "parents": parents,
        });

        let response = self
            .client
            .post(self.url("git/commits"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_failure(response, "commit creation").await);
        }

        let commit: ShaObject = response.json().await?;
        Ok(commit.sha)
    }

    async fn set_ref(&self, branch: &str, sha: &str, exists: bool) -> Result<()> {
        let response = if exists {
            self.client
                .patch(self.url(&format!("git/refs/heads/{}", branch)))
                .json(&json!({ "sha": sha, "force": true }))
                .send()
                .await?
        } else {
            self.client
                .post(self.url("git/refs"))
                .json(&json!({ "ref": format!("refs/heads/{}", branch), "sha": sha }))
                .send()
                .await?
        };

        if !response.status().is_success() {
            return Err(Self::api_failure(response, "ref update").await);
        }
        Ok(())
    }

    /// Publish a file set as a single commit on `branch`, replacing whatever
    /// the branch held before. Returns the new commit sha.
    pub async fn publish(
        &self,
        branch: &str,
        message: &str,
        files: &[(String, Vec<u8>)],
    ) -> Result<String> {
        let parent = self.get_ref(branch).await?;

        let mut entries = Vec::with_capacity(files.len());
        for (path, content) in files {
            let sha = self
                .create_blob(content)
                .await
                .with_context(|| format!("Failed to upload '{}'", path))?;
            entries.push(json!({
                "path": path,
                "mode": "100644",
                "type": "blob",
                "sha": sha,
            }));
        }

        let tree_sha = self.create_tree(&entries).await?;
        let commit_sha = self
            .create_commit(message, &tree_sha, parent.as_deref())
            .await?;
        self.set_ref(branch, &commit_sha, parent.is_some()).await?;

        Ok(commit_sha)
    }

    /// Pages configuration, or None when Pages is not enabled for the repo
    pub async fn pages_info(&self) -> Result<Option<PagesInfo>> {
        let response = self.client.get(self.url("pages")).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_failure(response, "pages lookup").await);
        }

        Ok(Some(response.json().await?))
    }

    /// Delete a branch; succeeds quietly if the branch is already gone
    pub async fn delete_branch(&self, branch: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("git/refs/heads/{}", branch)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(Self::api_failure(response, "branch deletion").await)
    }
}
