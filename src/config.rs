use std::net::{IpAddr, SocketAddr};

use anyhow::bail;
use clap::{Parser, builder::BoolishValueParser};

use crate::{dispatch::DEFAULT_TRIGGER, graph::GraphConfig};

/// Startup configuration, from flags or the environment.
#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "WEBHOOK_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(short, long, env = "WEBHOOK_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Shared secret configured on the GitHub App webhook.
    #[arg(
        short,
        long,
        env = "GITHUB_WEBHOOK_SECRET",
        default_value = "",
        hide_env_values = true
    )]
    pub secret: String,

    /// Check `X-Hub-Signature-256` on every delivery.
    #[arg(
        long = "validate-sig",
        env = "VALIDATE_SIG",
        default_value = "true",
        value_parser = BoolishValueParser::new(),
        action = clap::ArgAction::Set
    )]
    pub validate_signatures: bool,

    /// Comments must contain this to be acted on.
    #[arg(long, env = "WEBHOOK_TRIGGER", default_value = DEFAULT_TRIGGER)]
    pub trigger: String,

    /// Number of background workers running dispatch jobs.
    #[arg(short, long, env = "WEBHOOK_WORKERS", default_value_t = 4)]
    pub workers: usize,

    #[command(flatten)]
    pub graph: GraphConfig,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            bail!("port must be greater than 0");
        }
        if self.workers == 0 {
            bail!("workers must be greater than 0");
        }
        if self.trigger.trim().is_empty() {
            bail!("trigger must not be empty");
        }
        if self.graph.recursion_limit == 0 {
            bail!("recursion limit must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("mergehook").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--port",
            "9000",
            "--host",
            "127.0.0.1",
            "--secret",
            "hunter2",
            "--validate-sig",
            "false",
            "--trigger",
            "/bot",
            "--workers",
            "2",
            "--graph-url",
            "http://graph:2024",
            "--recursion-limit",
            "30",
        ]);

        assert_eq!(config.addr(), "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.secret, "hunter2");
        assert!(!config.validate_signatures);
        assert_eq!(config.trigger, "/bot");
        assert_eq!(config.workers, 2);
        assert_eq!(config.graph.url, "http://graph:2024");
        assert_eq!(config.graph.recursion_limit, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_sig_accepts_boolish_values() {
        assert!(parse(&["--validate-sig", "yes"]).validate_signatures);
        assert!(!parse(&["--validate-sig", "0"]).validate_signatures);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = parse(&["--port", "8080"]);
        config.port = 0;
        assert!(config.validate().is_err());

        let mut config = parse(&["--port", "8080"]);
        config.workers = 0;
        assert!(config.validate().is_err());

        let mut config = parse(&["--port", "8080"]);
        config.trigger = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = parse(&["--port", "8080"]);
        config.graph.recursion_limit = 0;
        assert!(config.validate().is_err());
    }
}
