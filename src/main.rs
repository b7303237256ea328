use anyhow::Result;
use clap::Parser;
use streamgraph::cli::{Args, Commands};
use streamgraph::runner::SourceRunner;
use streamgraph::sources;
use streamgraph::telemetry;
use streamgraph::tui::Model;
use streamgraph::ui::{HeadlessMonitor, MonitorUI};
use tokio::sync::mpsc;

/// Samples buffered between the source task and the monitor
const CHANNEL_CAPACITY: usize = 10_000;

async fn run(args: Args) -> Result<()> {
    let config = args.graph.config()?;
    let source = sources::build(args.command.source()).await?;

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let runner = SourceRunner::new(source, tx);
    let mut model = Model::new(config);

    tracing::info!(
        min_span = ?config.min_span,
        max_span = ?config.max_span,
        segments = config.segment_count,
        "starting"
    );

    match args.command {
        Commands::Watch(_) => {
            let mut ui = MonitorUI::new(rx, args.graph.tick)?;
            ui.run(runner, &mut model).await?;
        }
        Commands::Export(export) => {
            let mut monitor =
                HeadlessMonitor::new(rx, args.graph.tick, export.ticks, std::io::stdout());
            monitor.run(runner, &mut model).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Hold the guard so buffered logs are flushed on exit.
    let _guard = match &args.command {
        Commands::Watch(_) => Some(telemetry::init_file(&args.log_file)?),
        Commands::Export(_) => {
            telemetry::init_stderr()?;
            None
        }
    };

    run(args).await
}
