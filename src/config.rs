use std::path::PathBuf;
use std::time::Duration;

use crate::checks::CheckSettings;
use crate::cli::Cli;
use crate::oracle::ssllabs::DEFAULT_API_URL;
use crate::oracle::{PollPolicy, ScanMode};
use crate::rc_config::RcConfig;

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_LANG: &str = "it";
const DEFAULT_POLL_SECS: u64 = 30;
const DEFAULT_MAX_WAIT_SECS: u64 = 30 * 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Everything a run needs, resolved from flags, environment and rc file.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Unset is not an error here; loading reports it.
    pub metadata: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub checks: CheckSettings,
    pub api_url: String,
    pub poll: PollPolicy,
    pub http_timeout: Duration,
    pub no_color: bool,
}

impl Settings {
    /// Flags and environment (already merged by clap) win over the rc file,
    /// which wins over built-in defaults.
    pub fn resolve(cli: &Cli, rc: RcConfig) -> Self {
        let skip_tls = cli.skip_tls || rc.skip_tls.unwrap_or(false);
        let force_new_scan = cli.force_new_scan || rc.force_new_scan.unwrap_or(false);

        let interval = cli
            .poll_interval
            .or(rc.poll_interval)
            .unwrap_or(DEFAULT_POLL_SECS);
        let cached_interval = cli
            .cached_poll_interval
            .or(rc.cached_poll_interval)
            .unwrap_or(interval);
        let max_wait = cli.max_wait.or(rc.max_wait).unwrap_or(DEFAULT_MAX_WAIT_SECS);
        let http_timeout = cli
            .http_timeout
            .or(rc.http_timeout)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            metadata: cli.metadata.clone().or(rc.metadata),
            data_dir: cli
                .data_dir
                .clone()
                .or(rc.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            checks: CheckSettings {
                lang: cli
                    .lang
                    .clone()
                    .or(rc.lang)
                    .unwrap_or_else(|| DEFAULT_LANG.to_string()),
                skip_tls,
                scan_mode: if force_new_scan {
                    ScanMode::Fresh
                } else {
                    ScanMode::Cached
                },
            },
            api_url: cli
                .api_url
                .clone()
                .or(rc.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            poll: PollPolicy {
                interval: Duration::from_secs(interval),
                cached_interval: Duration::from_secs(cached_interval),
                max_wait: Duration::from_secs(max_wait),
            },
            http_timeout: Duration::from_secs(http_timeout),
            no_color: cli.no_color || rc.no_color.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["spmetacheck"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let s = Settings::resolve(&cli(&["m.xml"]), RcConfig::default());
        assert_eq!(s.metadata, Some(PathBuf::from("m.xml")));
        assert_eq!(s.data_dir, PathBuf::from("./data"));
        assert_eq!(s.checks.lang, "it");
        assert!(!s.checks.skip_tls);
        assert_eq!(s.checks.scan_mode, ScanMode::Cached);
        assert_eq!(s.api_url, DEFAULT_API_URL);
        assert_eq!(s.poll, PollPolicy::default());
        assert_eq!(s.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn flags_override_rc_file() {
        let rc = RcConfig {
            lang: Some("en".into()),
            data_dir: Some("rc-data".into()),
            max_wait: Some(10),
            ..RcConfig::default()
        };
        let s = Settings::resolve(&cli(&["--lang", "de", "m.xml"]), rc);
        assert_eq!(s.checks.lang, "de");
        assert_eq!(s.data_dir, PathBuf::from("rc-data"));
        assert_eq!(s.poll.max_wait, Duration::from_secs(10));
    }

    #[test]
    fn rc_file_supplies_switches() {
        let rc = RcConfig {
            metadata: Some("from-rc.xml".into()),
            skip_tls: Some(true),
            force_new_scan: Some(true),
            ..RcConfig::default()
        };
        let s = Settings::resolve(&cli(&[]), rc);
        assert_eq!(s.metadata, Some(PathBuf::from("from-rc.xml")));
        assert!(s.checks.skip_tls);
        assert_eq!(s.checks.scan_mode, ScanMode::Fresh);
    }

    #[test]
    fn cached_interval_follows_poll_interval() {
        let s = Settings::resolve(&cli(&["--poll-interval", "5", "m.xml"]), RcConfig::default());
        assert_eq!(s.poll.interval, Duration::from_secs(5));
        assert_eq!(s.poll.cached_interval, Duration::from_secs(5));

        let s = Settings::resolve(
            &cli(&["--poll-interval", "5", "--cached-poll-interval", "2", "m.xml"]),
            RcConfig::default(),
        );
        assert_eq!(s.poll.cached_interval, Duration::from_secs(2));
    }
}
