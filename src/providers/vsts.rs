use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, error, warn};

use super::error::{VstsError, MESSAGE_LIMIT};
use super::response::VstsResponse;
use super::Provider;
use crate::model::work_item::{create_payload, PatchOperation};
use crate::util::text::truncate_chars;

pub const DEFAULT_SERVICE_DOMAIN: &str = "visualstudio.com";
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

const API_VERSION: &str = "3.0";
const WORK_ITEM_TYPE: &str = "Bug";
const JSON_PATCH: &str = "application/json-patch+json";

/// Where and as whom to talk to VSTS. Built fresh for every attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct VstsConnection {
    pub account: String,
    pub project: String,
    pub username: String,
    pub secret: String,
    pub service_domain: String,
}

impl VstsConnection {
    pub fn new(
        account: impl Into<String>,
        project: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            project: project.into(),
            username: username.into(),
            secret: secret.into(),
            service_domain: DEFAULT_SERVICE_DOMAIN.into(),
        }
    }

    pub fn with_service_domain(mut self, domain: impl Into<String>) -> Self {
        self.service_domain = domain.into();
        self
    }

    pub fn host_url(&self) -> String {
        format!("https://{}.{}", self.account, self.service_domain)
    }

    pub fn auth_header(&self) -> String {
        let creds = format!("{}:{}", self.username, self.secret);
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        format!("Basic {encoded}")
    }
}

impl fmt::Debug for VstsConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VstsConnection")
            .field("account", &self.account)
            .field("project", &self.project)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("service_domain", &self.service_domain)
            .finish()
    }
}

pub struct VstsClient {
    base_url: String,
    project: String,
    auth_header: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl VstsClient {
    pub fn new(conn: &VstsConnection) -> Self {
        Self {
            base_url: conn.host_url(),
            project: conn.project.clone(),
            auth_header: conn.auth_header(),
            timeout: HTTP_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Point the client somewhere other than `https://{account}.{domain}`.
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn route(&self) -> String {
        format!(
            "{}/{}/_apis/wit/workitems/${}?api-version={}",
            self.base_url,
            urlencoding::encode(&self.project),
            WORK_ITEM_TYPE,
            API_VERSION
        )
    }

    pub async fn create_work_item(
        &self,
        title: &str,
        description: &str,
        link: &str,
    ) -> Result<VstsResponse, VstsError> {
        let payload = create_payload(title, description, link);
        self.make_request(&payload).await
    }

    async fn make_request(&self, payload: &[PatchOperation]) -> Result<VstsResponse, VstsError> {
        let route = self.route();
        let body = serde_json::to_vec(payload).map_err(|e| internal_failure(&route, &e))?;

        debug!(%route, "sending work item patch");
        let sent = self
            .client
            .patch(&route)
            .header(AUTHORIZATION, &self.auth_header)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, JSON_PATCH)
            .timeout(self.timeout)
            .body(body)
            .send()
            .await;

        let resp = match sent {
            Ok(resp) => resp,
            Err(e) if is_send_failure(&e) => {
                warn!(%route, error = %e, "VSTS unreachable");
                return Err(VstsError::transport(e.to_string()));
            }
            Err(e) => return Err(internal_failure(&route, &e)),
        };

        let response = match VstsResponse::from_response(resp).await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(VstsError::transport(e.to_string())),
            Err(e) => return Err(internal_failure(&route, &e)),
        };

        let status = response.status_code;
        if status == 401 || !(200..300).contains(&status) {
            let err = VstsError::from_response(response);
            debug!(%route, status, body = err.text(), "VSTS rejected work item");
            return Err(err);
        }

        debug!(%route, status, "work item created");
        Ok(response)
    }
}

/// The request went out (or tried to) and no response came back: refused,
/// reset, closed early or timed out. Builder and redirect errors are not.
fn is_send_failure(err: &reqwest::Error) -> bool {
    err.status().is_none() && (err.is_connect() || err.is_timeout() || err.is_request())
}

fn internal_failure(route: &str, err: &dyn std::error::Error) -> VstsError {
    error!(
        route,
        error = %truncate_chars(&err.to_string(), MESSAGE_LIMIT),
        "error in request to VSTS"
    );
    VstsError::internal()
}

#[async_trait]
impl Provider for VstsClient {
    fn name(&self) -> &str {
        "VSTS"
    }

    async fn create_work_item(
        &self,
        title: &str,
        description: &str,
        link: &str,
    ) -> Result<VstsResponse, VstsError> {
        VstsClient::create_work_item(self, title, description, link).await
    }

    fn issue_url(&self, issue_id: &str) -> String {
        format!(
            "{}/{}/_workitems?id={}",
            self.base_url,
            urlencoding::encode(&self.project),
            issue_id
        )
    }
}
