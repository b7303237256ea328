use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::config::GraphConfig;
use crate::sources::synthetic::SyntheticArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Log file used while the terminal UI is running
    #[arg(long, env = "STREAMGRAPH_LOG", default_value = "streamgraph.log")]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Smallest visible window, in seconds
    #[arg(long, default_value = "30", value_parser = parse_secs)]
    pub min_span: Duration,

    /// Largest visible window, in seconds
    #[arg(long, default_value = "300", value_parser = parse_secs)]
    pub max_span: Duration,

    /// Number of segments the window is divided into
    #[arg(short, long, default_value_t = 60)]
    pub segments: usize,

    /// Number of time labels on the x axis
    #[arg(short, long, default_value_t = 6)]
    pub labels: usize,

    /// Refresh interval, in seconds
    #[arg(short, long, default_value = "1", value_parser = parse_secs)]
    pub tick: Duration,
}

impl GraphArgs {
    pub fn config(&self) -> Result<GraphConfig> {
        let config = GraphConfig::new(self.min_span, self.max_span, self.segments)
            .with_label_count(self.labels);
        config.validate()?;
        Ok(config)
    }
}

#[derive(Parser, Debug)]
pub enum Commands {
    /// Watch the curve in the terminal
    Watch(WatchArgs),
    /// Print the curve as JSON lines, one per tick
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Where samples come from
    #[command(subcommand)]
    pub source: SourceCommands,
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Stop after this many ticks
    #[arg(short = 'n', long)]
    pub ticks: Option<usize>,

    /// Where samples come from
    #[command(subcommand)]
    pub source: SourceCommands,
}

impl Commands {
    pub fn source(&self) -> &SourceCommands {
        match self {
            Commands::Watch(args) => &args.source,
            Commands::Export(args) => &args.source,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub enum SourceCommands {
    /// Generate a noisy sine wave of samples
    Synthetic(SyntheticArgs),
    /// Read `<frequency> [age_ms]` lines from stdin
    Stdin,
    /// Read `<frequency> [age_ms]` lines from a file
    File(FileArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct FileArgs {
    pub path: PathBuf,
}

fn parse_secs(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("{s:?} is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("1.5"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_secs("300"), Ok(Duration::from_secs(300)));
        assert!(parse_secs("-1").is_err());
        assert!(parse_secs("soon").is_err());
    }

    #[test]
    fn test_parse_export_args() {
        let args = Args::try_parse_from([
            "streamgraph",
            "--min-span",
            "10",
            "--segments",
            "20",
            "export",
            "-n",
            "5",
            "synthetic",
            "--rate",
            "100",
        ])
        .unwrap();

        let config = args.graph.config().unwrap();
        assert_eq!(config.min_span, Duration::from_secs(10));
        assert_eq!(config.max_span, Duration::from_secs(300));
        assert_eq!(config.segment_count, 20);
        assert_eq!(config.label_count, 6);

        match &args.command {
            Commands::Export(export) => assert_eq!(export.ticks, Some(5)),
            other => panic!("unexpected command {other:?}"),
        }
        match args.command.source() {
            SourceCommands::Synthetic(synthetic) => assert_eq!(synthetic.rate, 100),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_invalid_span_bounds() {
        let args =
            Args::try_parse_from(["streamgraph", "--min-span", "600", "watch", "stdin"]).unwrap();
        assert!(args.graph.config().is_err());
    }
}
