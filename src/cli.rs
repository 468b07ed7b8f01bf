// Command line interface
// Flags map onto config keys and are applied above file and environment sources

use clap::Parser;
use std::path::PathBuf;

use crate::config::{ConfigOverride, DEFAULT_CONFIG_PATH};
use crate::http::cors::CorsMode;

#[derive(Debug, Parser)]
#[command(name = "spa-serve", version)]
#[command(
    about = "Serve a directory over HTTP with optional SPA fallback and CORS",
    long_about = None
)]
pub struct Cli {
    /// Config file path, extension optional
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Interface to bind
    #[arg(long)]
    pub host: Option<String>,

    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory to serve
    #[arg(short = 'd', long)]
    pub root: Option<PathBuf>,

    /// Serve the fallback document for routes without a file extension
    #[arg(long)]
    pub spa: bool,

    /// Document served by the SPA fallback, relative to the root
    #[arg(long, value_name = "FILE")]
    pub fallback: Option<String>,

    /// CORS headers to add; `--cors` alone means `full`
    #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "full")]
    pub cors: Option<CorsMode>,

    /// Return 404 instead of an HTML listing for directories without an index
    #[arg(long)]
    pub no_listing: bool,

    /// Tokio worker threads (defaults to CPU count)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Disable the access log
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Config overrides for every flag that was given
    pub fn overrides(&self) -> Vec<ConfigOverride> {
        let mut overrides: Vec<ConfigOverride> = Vec::new();

        if let Some(host) = &self.host {
            overrides.push(("server.host", host.as_str().into()));
        }
        if let Some(port) = self.port {
            overrides.push(("server.port", i64::from(port).into()));
        }
        if let Some(workers) = self.workers {
            overrides.push((
                "server.workers",
                i64::try_from(workers).unwrap_or(i64::MAX).into(),
            ));
        }
        if let Some(root) = &self.root {
            overrides.push(("site.root", root.to_string_lossy().into_owned().into()));
        }
        if self.spa {
            overrides.push(("site.spa_fallback", true.into()));
        }
        if let Some(fallback) = &self.fallback {
            overrides.push(("site.fallback_document", fallback.as_str().into()));
        }
        if let Some(cors) = self.cors {
            overrides.push(("http.cors", cors.as_str().into()));
        }
        if self.no_listing {
            overrides.push(("http.directory_listing", false.into()));
        }
        if self.quiet {
            overrides.push(("logging.access_log", false.into()));
        }

        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("spa-serve").chain(args.iter().copied())).unwrap()
    }

    fn keys(cli: &Cli) -> Vec<&'static str> {
        cli.overrides().into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_no_flags_no_overrides() {
        let cli = parse(&[]);
        assert_eq!(cli.config, DEFAULT_CONFIG_PATH);
        assert!(cli.overrides().is_empty());
    }

    #[test]
    fn test_bare_cors_means_full() {
        let cli = parse(&["--cors"]);
        assert_eq!(cli.cors, Some(CorsMode::Full));

        let cli = parse(&["--cors", "origin"]);
        assert_eq!(cli.cors, Some(CorsMode::Origin));

        assert!(Cli::try_parse_from(["spa-serve", "--cors", "sometimes"]).is_err());
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = parse(&["-p", "9000", "-d", "public", "--spa", "--no-listing", "--quiet"]);
        assert_eq!(
            keys(&cli),
            vec![
                "server.port",
                "site.root",
                "site.spa_fallback",
                "http.directory_listing",
                "logging.access_log"
            ]
        );
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let cli = parse(&[
            "--port",
            "9100",
            "--root",
            "build",
            "--spa",
            "--fallback",
            "app.html",
            "--cors",
            "--workers",
            "2",
        ]);

        let cfg = Config::load_from(missing.to_str().unwrap(), cli.overrides()).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.workers, Some(2));
        assert_eq!(cfg.site.root, PathBuf::from("build"));
        assert!(cfg.site.spa_fallback);
        assert_eq!(cfg.site.fallback_document, "app.html");
        assert_eq!(cfg.http.cors, CorsMode::Full);
        assert!(cfg.http.directory_listing);
    }
}
