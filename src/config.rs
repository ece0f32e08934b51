use anyhow::Result;
use clap::Parser;
use std::time::Duration;

use crate::{accounts::NameTable, logger::LogLevel};

const DEFAULT_ENDPOINT: &str = "https://api.bybit.com";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Clock skew tolerance reported to the exchange, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub recv_window: i64,

    #[arg(long, default_value = "UNIFIED")]
    pub account_type: String,

    #[arg(long, default_value = "balance.log")]
    pub log_file: String,

    /// TOML file with an [accounts] table mapping UIDs to display names
    #[arg(long)]
    pub accounts: Option<String>,

    /// Do not echo report lines to stdout
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    #[arg(long, default_value_t = false)]
    pub skip_telegram: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout: u64,
}

/// API credentials loaded from the environment, immutable for the run.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub endpoint: String,
    pub telegram_api_id: i64,
    pub telegram_api_hash: String,
    pub telegram_bot_token: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Lookup is injected so validation can be tested without touching the
    /// process environment.
    fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing: Vec<&str> = Vec::new();
        let mut required = |name: &'static str| match get(name) {
            Some(v) if !v.is_empty() => v,
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let telegram_api_id = required("TELEGRAM_API_ID");
        let telegram_api_hash = required("TELEGRAM_API_HASH");
        let telegram_bot_token = required("TELEGRAM_BOT_TOKEN");
        let api_key = required("BYBIT_API_KEY");
        let api_secret = required("BYBIT_API_SECRET");

        if !missing.is_empty() {
            anyhow::bail!("Missing environment variables: {}", missing.join(", "));
        }

        let telegram_api_id: i64 = telegram_api_id
            .parse()
            .map_err(|_| anyhow::format_err!("TELEGRAM_API_ID must be an integer, got '{telegram_api_id}'"))?;

        let endpoint = match get("BYBIT_ENDPOINT") {
            Some(raw) if !raw.is_empty() => normalize_endpoint(&raw),
            _ => DEFAULT_ENDPOINT.to_string(),
        };

        Ok(Credentials {
            api_key,
            api_secret,
            endpoint,
            telegram_api_id,
            telegram_api_hash,
            telegram_bot_token,
        })
    }
}

fn normalize_endpoint(raw: &str) -> String {
    let mut endpoint = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    while endpoint.ends_with('/') {
        endpoint.pop();
    }
    endpoint
}

#[derive(Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub log_level: LogLevel,
    pub recv_window: i64,
    pub account_type: String,
    pub log_file: String,
    pub quiet: bool,
    pub skip_telegram: bool,
    pub timeout: Duration,
    pub names: NameTable,
}

impl Config {
    pub fn load_from_args() -> Result<Self> {
        let cli = Cli::parse();
        let credentials = Credentials::from_env()?;

        let names = match &cli.accounts {
            Some(path) => NameTable::from_file(path)?,
            None => NameTable::default(),
        };

        Ok(Config {
            credentials,
            log_level: cli.log_level,
            recv_window: cli.recv_window,
            account_type: cli.account_type,
            log_file: cli.log_file,
            quiet: cli.quiet,
            skip_telegram: cli.skip_telegram,
            timeout: Duration::from_secs(cli.timeout),
            names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            ("TELEGRAM_API_ID", "12345"),
            ("TELEGRAM_API_HASH", "abcdef"),
            ("TELEGRAM_BOT_TOKEN", "123:token"),
            ("BYBIT_API_KEY", "key"),
            ("BYBIT_API_SECRET", "secret"),
        ])
    }

    #[test]
    fn all_missing_variables_are_named_in_one_error() {
        let err = Credentials::from_lookup(|_| None).unwrap_err();
        let msg = err.to_string();
        for var in [
            "TELEGRAM_API_ID",
            "TELEGRAM_API_HASH",
            "TELEGRAM_BOT_TOKEN",
            "BYBIT_API_KEY",
            "BYBIT_API_SECRET",
        ] {
            assert!(msg.contains(var), "'{msg}' should name {var}");
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut vars = full_env();
        vars.insert("BYBIT_API_KEY".to_string(), String::new());
        let err = Credentials::from_lookup(|name| vars.get(name).cloned()).unwrap_err();
        assert!(err.to_string().contains("BYBIT_API_KEY"));
        assert!(!err.to_string().contains("BYBIT_API_SECRET"));
    }

    #[test]
    fn endpoint_defaults_when_unset() {
        let vars = full_env();
        let creds = Credentials::from_lookup(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(creds.endpoint, "https://api.bybit.com");
        assert_eq!(creds.telegram_api_id, 12345);
    }

    #[test]
    fn endpoint_gains_scheme_and_loses_trailing_slash() {
        let mut vars = full_env();
        vars.insert("BYBIT_ENDPOINT".to_string(), "api-testnet.bybit.com/".to_string());
        let creds = Credentials::from_lookup(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(creds.endpoint, "https://api-testnet.bybit.com");

        vars.insert("BYBIT_ENDPOINT".to_string(), "http://localhost:8080".to_string());
        let creds = Credentials::from_lookup(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(creds.endpoint, "http://localhost:8080");
    }

    #[test]
    fn non_numeric_telegram_api_id_is_rejected() {
        let mut vars = full_env();
        vars.insert("TELEGRAM_API_ID".to_string(), "not-a-number".to_string());
        let err = Credentials::from_lookup(|name| vars.get(name).cloned()).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_API_ID"));
    }
}

// eof
