pub mod error;
pub mod response;
pub mod vsts;

use async_trait::async_trait;

use crate::config::AppConfig;
use error::VstsError;
use response::VstsResponse;
use vsts::VstsClient;

/// A remote tracker that can open work items.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    async fn create_work_item(
        &self,
        title: &str,
        description: &str,
        link: &str,
    ) -> Result<VstsResponse, VstsError>;
    /// Browser URL for an item this provider created.
    fn issue_url(&self, issue_id: &str) -> String;
}


/// Build a client from the `[vsts]` section, if every required field is set.
pub fn create_provider(config: &AppConfig) -> Option<VstsClient> {
    let cfg = config.vsts.as_ref().filter(|c| c.is_configured())?;
    Some(VstsClient::new(&cfg.connection()))
}
