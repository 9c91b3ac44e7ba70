//! The audit run: authenticate, list every group, report permissive ones.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use groupaudit_core::{AuditSummary, ReportFormat, format_finding};
use groupaudit_providers::google::{
    AuthOutcome, Authenticator, AuthorizedClient, GoogleConfig, GoogleWorkspace, OAuthCredentials,
};
use groupaudit_providers::{GroupDirectory, GroupLister, GroupSettingsSource, SettingsAuditor};

use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};

/// Validated settings for one audit run.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub customer_id: String,
    pub key_path: PathBuf,
    pub token_path: PathBuf,
    pub listen_addr: String,
    pub callback_timeout: Duration,
    pub timeout: Duration,
    pub open_browser: bool,
    pub format: ReportFormat,
}

impl AuditOptions {
    /// Validates the command line. Runs before anything touches the network.
    pub fn from_cli(cli: &Cli) -> ClientResult<Self> {
        let customer_id = cli
            .customer_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ClientError::Config("--customer_id is required".to_string()))?;

        if cli.callback_timeout == 0 {
            return Err(ClientError::Config(
                "--callback-timeout must be at least 1 second".to_string(),
            ));
        }
        if cli.timeout == 0 {
            return Err(ClientError::Config(
                "--timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(Self {
            customer_id: customer_id.to_string(),
            key_path: cli.key.clone(),
            token_path: cli.token.clone(),
            listen_addr: cli.listen.clone(),
            callback_timeout: Duration::from_secs(cli.callback_timeout),
            timeout: Duration::from_secs(cli.timeout),
            open_browser: cli.open_browser,
            format: if cli.json {
                ReportFormat::Json
            } else {
                ReportFormat::Text
            },
        })
    }
}

/// Runs a full audit against Google Workspace, printing findings to stdout.
pub async fn run(options: AuditOptions) -> ClientResult<AuditSummary> {
    let credentials = OAuthCredentials::from_file(&options.key_path)?;
    let config = GoogleConfig::new(credentials)
        .with_token_path(&options.token_path)
        .with_listen_addr(&options.listen_addr)
        .with_callback_timeout(options.callback_timeout)
        .with_timeout(options.timeout)
        .with_open_browser(options.open_browser);

    let authenticator = Authenticator::new(config.clone())?;
    let token = match authenticator.ensure_token().await? {
        AuthOutcome::Cached(token) => token,
        AuthOutcome::Authorized(token) => {
            info!("authorization successful");
            token
        }
    };

    let client = AuthorizedClient::new(
        token,
        authenticator.oauth_client().clone(),
        config.timeout,
        &config.user_agent,
    )?;
    let workspace = GoogleWorkspace::new(client);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    audit(
        &workspace,
        &workspace,
        &options.customer_id,
        options.format,
        &mut out,
    )
    .await
}

/// Lists every group page by page and audits each page as it arrives.
///
/// A directory error aborts the run; per-group settings errors are only
/// counted.
pub async fn audit<W: Write>(
    directory: &dyn GroupDirectory,
    settings: &dyn GroupSettingsSource,
    customer_id: &str,
    format: ReportFormat,
    out: &mut W,
) -> ClientResult<AuditSummary> {
    let mut lister = GroupLister::new(directory, customer_id);
    let auditor = SettingsAuditor::new(settings);
    let mut summary = AuditSummary::default();

    while let Some(groups) = lister.next_page().await? {
        let mut written = Ok(());
        let page_summary = auditor
            .audit_page(&groups, |finding| {
                if written.is_ok() {
                    written = format_finding(finding, format)
                        .map_err(std::io::Error::from)
                        .and_then(|line| writeln!(out, "{}", line));
                }
            })
            .await;
        written?;
        summary.merge(page_summary);
    }

    info!(pages = lister.pages_fetched(), "{}", summary);
    Ok(summary)
}
