use std::path::PathBuf;

use aql_cdx::MatchScope;
use clap::{Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(name = "aql", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// TOML configuration file; `AQL_`-prefixed variables override it.
    #[arg(short, long, global = true, default_value = "aql.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "c", name = "captures", about = "Stream discovered captures as JSON Lines")]
    Captures(CapturesArg),
    #[command(alias = "a", name = "archive", about = "Archive every configured source")]
    Archive,
    #[command(alias = "r", name = "read", about = "Print one stored record")]
    Read(ReadArg),
}

#[derive(Clone, Debug, Args)]
pub struct CapturesArg {
    /// URL pattern; `*.host` implies domain scope, a trailing `*` prefix scope.
    pub url: String,
    #[arg(short, long)]
    pub scope: Option<MatchScope>,
    /// Earliest capture, `YYYY[MM[DD[hh[mm[ss]]]]]`.
    #[arg(long)]
    pub from: Option<String>,
    /// Latest capture, `YYYY[MM[DD[hh[mm[ss]]]]]`.
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct ReadArg {
    pub key:    String,
    pub offset: u64,
    pub length: u64,
    /// Print the whole WARC record instead of its content block.
    #[arg(long)]
    pub raw:    bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_consistent() { App::command().debug_assert(); }

    #[test]
    fn parses_captures_arguments() {
        let app = App::try_parse_from(["aql", "captures", "example.com/*", "--scope", "prefix", "--from", "2019"]).unwrap();
        let Commands::Captures(arg) = app.cmd else {
            panic!("expected captures");
        };
        assert_eq!(arg.scope, Some(MatchScope::Prefix));
        assert_eq!(arg.from.as_deref(), Some("2019"));
        assert_eq!(app.config, PathBuf::from("aql.toml"));
    }

    #[test]
    fn parses_read_location() {
        let app = App::try_parse_from(["aql", "-c", "other.toml", "read", "abc", "120", "4096"]).unwrap();
        let Commands::Read(arg) = app.cmd else {
            panic!("expected read");
        };
        assert_eq!((arg.key.as_str(), arg.offset, arg.length, arg.raw), ("abc", 120, 4096, false));
        assert_eq!(app.config, PathBuf::from("other.toml"));
    }
}
