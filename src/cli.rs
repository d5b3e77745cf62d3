use anyhow::{bail, Context, Result};

use crate::config::{self, AppConfig};
use crate::linker::{IssueLinker, LinkError};
use crate::providers::error::VstsError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateArgs {
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub group: Option<String>,
}

/// Parse CLI args for `vsts-bridge create` and open the work item.
pub async fn handle_create(args: &[String]) -> Result<()> {
    let args = parse_create_args(args)?;
    let config = config::load_config()?;
    let link = resolve_link(&args, &config)?;

    let linker = IssueLinker::from_config(&config)?;
    let description = args.description.as_deref().unwrap_or_default();
    let linked = match linker.link_issue(&args.title, description, &link).await {
        Ok(linked) => linked,
        Err(LinkError::Tracker(e)) => bail!("Failed to create VSTS work item: {}", describe_failure(&e)),
        Err(e) => return Err(e).context("Failed to create VSTS work item"),
    };

    println!("Created work item {}: {}", linked.id, args.title);
    println!("  {}", linked.url);
    Ok(())
}

pub fn handle_status() -> Result<()> {
    let config = config::load_config()?;
    match &config.vsts {
        Some(vsts) if vsts.is_configured() => {
            let conn = vsts.connection();
            println!("VSTS: configured ({} / {} as {})", conn.host_url(), conn.project, conn.username);
        }
        Some(_) => println!("VSTS: incomplete (account, project, username and personal_access_token are required)"),
        None => println!("VSTS: not configured"),
    }
    match &config.sentry {
        Some(sentry) => println!("Sentry: {}", sentry.project_url()),
        None => println!("Sentry: not configured (pass --link explicitly)"),
    }
    Ok(())
}

/// One-line explanation of a tracker failure, preferring the fault text of
/// an XML error body when VSTS sent one.
pub fn describe_failure(err: &VstsError) -> String {
    let detail = err
        .response()
        .and_then(|resp| resp.xml.as_ref())
        .and_then(|xml| xml.find("faultstring").or_else(|| xml.root()))
        .map(|el| el.text())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| err.to_string());
    match err {
        VstsError::Unauthorized(_) => format!("credentials rejected (401): {detail}"),
        VstsError::RequestFailed(resp) => {
            format!("request failed ({}): {detail}", resp.status_code)
        }
        VstsError::Transport { .. } => format!("could not reach VSTS: {detail}"),
        VstsError::Internal { .. } => detail,
    }
}

/// The hyperlink attached to the work item: `--link` wins, else one built
/// from `--group` and the `[sentry]` section.
pub fn resolve_link(args: &CreateArgs, config: &AppConfig) -> Result<String> {
    if let Some(link) = &args.link {
        return Ok(link.clone());
    }
    let Some(group) = &args.group else {
        bail!("A link is required: pass --link <url> or --group <short-id>");
    };
    let sentry = config
        .sentry
        .as_ref()
        .context("--group needs a [sentry] section with organization and project")?;
    Ok(sentry.issue_link(group))
}

/// Parse `create` arguments.
///
/// Supported forms:
///   vsts-bridge create "Crash in checkout" --link https://sentry.io/acme/web/issues/WEB-1
///   vsts-bridge create Crash in checkout -d "TypeError: x is undefined" -g WEB-1
pub fn parse_create_args(args: &[String]) -> Result<CreateArgs> {
    if args.is_empty() {
        bail!("Usage: vsts-bridge create <title> [-d <description>] [-l <link> | -g <short-id>]");
    }

    let mut title_parts: Vec<String> = Vec::new();
    let mut description: Option<String> = None;
    let mut link: Option<String> = None;
    let mut group: Option<String> = None;
    let mut i = 0;

    while i < args.len() {
        let slot = match args[i].as_str() {
            "-d" | "--desc" | "--description" => Some((&mut description, "-d/--desc")),
            "-l" | "--link" => Some((&mut link, "-l/--link")),
            "-g" | "--group" => Some((&mut group, "-g/--group")),
            _ => None,
        };
        match slot {
            Some((target, flag)) => {
                i += 1;
                match args.get(i) {
                    Some(value) => *target = Some(value.clone()),
                    None => bail!("Missing value for {flag} flag"),
                }
            }
            None => title_parts.push(args[i].clone()),
        }
        i += 1;
    }

    let title = title_parts.join(" ");
    if title.trim().is_empty() {
        bail!("Work item title cannot be empty");
    }

    Ok(CreateArgs {
        title,
        description,
        link,
        group,
    })
}

pub fn print_help() {
    println!("vsts-bridge — open VSTS work items from error-tracker issues\n");
    println!("USAGE:");
    println!("  vsts-bridge create <title>  Create a Bug work item linked to an issue");
    println!("  vsts-bridge status          Show configuration state");
    println!();
    println!("CREATE OPTIONS:");
    println!("  -d, --desc <text>      Work item description");
    println!("  -l, --link <url>       Link back to the originating issue");
    println!("  -g, --group <id>       Build the link from an issue short id and [sentry] config");
    println!();
    println!("CONFIG:");
    println!("  ~/.vsts-bridge/config.toml (override with $VSTS_BRIDGE_CONFIG)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SentryConfig;
    use crate::providers::response::VstsResponse;

    fn args(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_simple_title() {
        let parsed = parse_create_args(&args(&["Crash in checkout"])).unwrap();
        assert_eq!(parsed.title, "Crash in checkout");
        assert_eq!(parsed.description, None);
        assert_eq!(parsed.link, None);
    }

    #[test]
    fn parse_multi_word_title_with_flags() {
        let parsed = parse_create_args(&args(&[
            "Crash", "in", "checkout", "-d", "TypeError", "--link", "https://s/1",
        ]))
        .unwrap();
        assert_eq!(parsed.title, "Crash in checkout");
        assert_eq!(parsed.description.as_deref(), Some("TypeError"));
        assert_eq!(parsed.link.as_deref(), Some("https://s/1"));
    }

    #[test]
    fn parse_group_flag() {
        let parsed = parse_create_args(&args(&["Crash", "-g", "WEB-12"])).unwrap();
        assert_eq!(parsed.group.as_deref(), Some("WEB-12"));
    }

    #[test]
    fn parse_empty_args_fails() {
        assert!(parse_create_args(&args(&[])).is_err());
    }

    #[test]
    fn parse_only_flags_fails() {
        let err = parse_create_args(&args(&["-d", "desc"])).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn parse_missing_flag_value_fails() {
        let err = parse_create_args(&args(&["Crash", "--link"])).unwrap_err();
        assert!(err.to_string().contains("Missing value for -l/--link"));
    }

    #[test]
    fn explicit_link_wins() {
        let parsed = parse_create_args(&args(&["Crash", "-l", "https://x", "-g", "WEB-1"])).unwrap();
        let link = resolve_link(&parsed, &AppConfig::default()).unwrap();
        assert_eq!(link, "https://x");
    }

    #[test]
    fn group_link_uses_sentry_config() {
        let parsed = parse_create_args(&args(&["Crash", "-g", "WEB-1"])).unwrap();
        let config = AppConfig {
            vsts: None,
            sentry: Some(SentryConfig {
                root_url: "https://sentry.io/".into(),
                organization: "acme".into(),
                project: "web".into(),
            }),
        };
        assert_eq!(
            resolve_link(&parsed, &config).unwrap(),
            "https://sentry.io/acme/web/issues/WEB-1"
        );
    }

    #[test]
    fn group_without_sentry_config_fails() {
        let parsed = parse_create_args(&args(&["Crash", "-g", "WEB-1"])).unwrap();
        assert!(resolve_link(&parsed, &AppConfig::default()).is_err());
    }

    #[test]
    fn describe_unauthorized() {
        let err = VstsError::from_response(VstsResponse::new("Access Denied", 401));
        assert_eq!(describe_failure(&err), "credentials rejected (401): Access Denied");
    }

    #[test]
    fn describe_prefers_xml_fault() {
        let body = "<?xml version=\"1.0\"?><fault><faultstring>TF400813</faultstring></fault>";
        let err = VstsError::from_response(VstsResponse::new(body, 500));
        assert_eq!(describe_failure(&err), "request failed (500): TF400813");
    }

    #[test]
    fn describe_request_failed_carries_status() {
        let err = VstsError::from_response(VstsResponse::new("service unavailable", 503));
        assert_eq!(describe_failure(&err), "request failed (503): service unavailable");
    }

    #[test]
    fn describe_transport_and_internal() {
        let err = VstsError::transport("connection refused");
        assert_eq!(describe_failure(&err), "could not reach VSTS: connection refused");
        assert_eq!(describe_failure(&VstsError::internal()), "Internal error");
    }

    #[test]
    fn no_link_source_fails() {
        let parsed = parse_create_args(&args(&["Crash"])).unwrap();
        let err = resolve_link(&parsed, &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("link is required"));
    }
}
