//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// groupaudit - report Google Groups that anyone can join
#[derive(Debug, Parser)]
#[command(name = "groupaudit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Google Workspace customer ID whose groups are audited (e.g. `my_customer`)
    #[arg(
        long = "customer_id",
        visible_alias = "customer-id",
        env = "GROUPAUDIT_CUSTOMER_ID"
    )]
    pub customer_id: Option<String>,

    /// Path to the OAuth client secret JSON file
    #[arg(long, env = "GROUPAUDIT_KEY", default_value = "key.json")]
    pub key: PathBuf,

    /// Path of the cached OAuth token
    #[arg(long, env = "GROUPAUDIT_TOKEN", default_value = "token.json")]
    pub token: PathBuf,

    /// Address the authorization callback listener binds to
    #[arg(long, default_value = "localhost:8080")]
    pub listen: String,

    /// Seconds to wait for the browser to complete authorization
    #[arg(long, default_value_t = 300, value_name = "SECS")]
    pub callback_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub timeout: u64,

    /// Also open the authorization URL in the system browser
    #[arg(long)]
    pub open_browser: bool,

    /// Print findings as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["groupaudit", "--customer_id", "my_customer"]).unwrap();
        assert_eq!(cli.customer_id.as_deref(), Some("my_customer"));
        assert_eq!(cli.key, PathBuf::from("key.json"));
        assert_eq!(cli.token, PathBuf::from("token.json"));
        assert_eq!(cli.listen, "localhost:8080");
        assert_eq!(cli.callback_timeout, 300);
        assert_eq!(cli.timeout, 30);
        assert!(!cli.open_browser);
        assert!(!cli.json);
        assert!(!cli.debug);
    }

    #[test]
    fn dashed_alias_and_equals_form() {
        let cli = Cli::try_parse_from([
            "groupaudit",
            "--customer-id=C0123",
            "--key=/etc/groupaudit/key.json",
            "--json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.customer_id.as_deref(), Some("C0123"));
        assert_eq!(cli.key, PathBuf::from("/etc/groupaudit/key.json"));
        assert!(cli.json);
        assert!(cli.debug);
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        assert!(Cli::try_parse_from(["groupaudit", "--timeout", "soon"]).is_err());
    }
}
