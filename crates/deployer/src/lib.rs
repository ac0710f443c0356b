//! Deployment targets. GitHub Pages is the only implemented target; the
//! configuration's organization/project identifiers are its coordinates.

pub mod github;

use async_trait::async_trait;
use docsite_kit_core::Site;

pub struct DeploymentResult {
    pub site_url: String,
    pub commit_sha: String,
}

#[async_trait]
pub trait Deployer {
    async fn deploy(&self) -> anyhow::Result<DeploymentResult>;
}

/// Publishes a built site tree to the `gh-pages` branch of the repository
/// named by the site's organization/project pair.
pub struct GithubPagesDeployer {
    client: github::GithubClient,
    organization: String,
    project: String,
    branch: String,
    files: Vec<(String, Vec<u8>)>,
}

impl GithubPagesDeployer {
    pub fn for_site(
        site: &Site,
        token: &str,
        branch: impl Into<String>,
        files: Vec<(String, Vec<u8>)>,
    ) -> anyhow::Result<Self> {
        let client =
            github::GithubClient::new(token, &site.meta.organization, &site.meta.project)?;
        Ok(Self {
            client,
            organization: site.meta.organization.clone(),
            project: site.meta.project.clone(),
            branch: branch.into(),
            files,
        })
    }

    pub fn site_url(&self) -> String {
        format!("https://{}.github.io/{}/", self.organization, self.project)
    }
}

#[async_trait]
impl Deployer for GithubPagesDeployer {
    async fn deploy(&self) -> anyhow::Result<DeploymentResult> {
        let commit_sha = self
            .client
            .publish(&self.branch, "Deploy site", &self.files)
            .await?;

        Ok(DeploymentResult {
            site_url: self.site_url(),
            commit_sha,
        })
    }
}
