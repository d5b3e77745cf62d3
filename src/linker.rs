use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::providers::error::VstsError;
use crate::providers::vsts::VstsClient;
use crate::providers::{self, Provider};

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("VSTS is not configured: set account, project, username and personal_access_token")]
    NotConfigured,

    #[error("VSTS created the work item but returned no id")]
    MissingId,

    #[error(transparent)]
    Tracker(#[from] VstsError),
}

/// A work item opened from an error-tracker issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedIssue {
    pub id: String,
    pub url: String,
}

/// Turns error-tracker issues into tracker work items.
pub struct IssueLinker<P> {
    provider: P,
}

impl IssueLinker<VstsClient> {
    pub fn from_config(config: &AppConfig) -> Result<Self, LinkError> {
        providers::create_provider(config)
            .map(Self::new)
            .ok_or(LinkError::NotConfigured)
    }
}

impl<P: Provider> IssueLinker<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Open a work item and return its id. The id is only handed back when the
    /// tracker both accepted the item and reported one.
    pub async fn create_issue(
        &self,
        title: &str,
        description: &str,
        link: &str,
    ) -> Result<String, LinkError> {
        let resp = self
            .provider
            .create_work_item(title, description, link)
            .await
            .map_err(|err| {
                warn!(
                    provider = self.provider.name(),
                    kind = ?err.kind(),
                    status = ?err.status_code(),
                    "work item creation failed"
                );
                err
            })?;
        let id = resp.work_item_id().ok_or(LinkError::MissingId)?;
        info!(provider = self.provider.name(), %id, "work item created");
        Ok(id)
    }

    pub async fn link_issue(
        &self,
        title: &str,
        description: &str,
        link: &str,
    ) -> Result<LinkedIssue, LinkError> {
        let id = self.create_issue(title, description, link).await?;
        let url = self.issue_url(&id);
        Ok(LinkedIssue { id, url })
    }

    pub fn issue_url(&self, issue_id: &str) -> String {
        self.provider.issue_url(issue_id)
    }
}
