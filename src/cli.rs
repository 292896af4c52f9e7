use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// SAML Service Provider metadata checker
#[derive(Parser, Debug)]
#[command(
    name = "spmetacheck",
    version,
    about = "Validate SAML Service Provider metadata",
    long_about = "Validates a SAML SP metadata document: entityID, SPSSODescriptor protocol \
                  support and signing requirements, Organization localization, RequestedAttribute \
                  name formats, and the TLS grade of every AssertionConsumerService and \
                  SingleLogoutService endpoint as assessed by SSL Labs. Writes a JSON report \
                  to <DATA_DIR>/sp-metadata-extra.json.",
    after_help = "\
EXAMPLES:
  spmetacheck metadata.xml                     Check a metadata file
  spmetacheck --skip-tls metadata.xml          Skip the SSL Labs assessment
  spmetacheck --force-new-scan metadata.xml    Ignore cached SSL Labs results
  SP_METADATA=metadata.xml spmetacheck         Take the file from the environment

EXIT CODES:
  0  All checks passed
  1  One or more checks failed (see the report)
  2  Tool failure (missing or malformed metadata, assessment service unreachable)

CONFIGURATION:
  Flags override environment variables, which override .spmetacheckrc
  (current directory, then $HOME)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// SAML SP metadata file to validate
    #[arg(value_name = "METADATA", env = "SP_METADATA")]
    pub metadata: Option<PathBuf>,

    /// Directory the JSON report is written to [default: ./data]
    #[arg(long, env = "DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Language the Organization block must be localized in [default: it]
    #[arg(long, env = "SP_METADATA_LANG", value_name = "CODE")]
    pub lang: Option<String>,

    /// Skip the TLS grade check
    #[arg(long, env = "SSLLABS_SKIP", value_parser = FalseyValueParser::new())]
    pub skip_tls: bool,

    /// Start new SSL Labs assessments instead of using cached results
    #[arg(long, env = "SSLLABS_FORCE_NEW", value_parser = FalseyValueParser::new())]
    pub force_new_scan: bool,

    /// SSL Labs API base URL [default: https://api.ssllabs.com/api/v2/]
    #[arg(long, env = "SSLLABS_API", value_name = "URL")]
    pub api_url: Option<String>,

    /// Seconds between polls of a new assessment [default: 30]
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Seconds between polls of a cached assessment [default: poll interval]
    #[arg(long, value_name = "SECS")]
    pub cached_poll_interval: Option<u64>,

    /// Give up on an endpoint after waiting this many seconds [default: 1800]
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    /// Timeout of a single SSL Labs request in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    pub http_timeout: Option<u64>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
