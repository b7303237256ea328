use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::{cli::SourceCommands, events::Message};

pub mod lines;
pub mod synthetic;

use lines::LineSource;
use synthetic::Synthetic;

pub type BoxedSource = Box<dyn SampleSource + Send + 'static>;

/// A producer of samples.
///
/// Sources run on their own task and only talk to the graph through the
/// message channel.
#[async_trait]
pub trait SampleSource {
    fn name(&self) -> &str;

    async fn run(self: Box<Self>, tx: mpsc::Sender<Message>) -> Result<()>;
}

pub async fn build(command: &SourceCommands) -> Result<BoxedSource> {
    let source: BoxedSource = match command {
        SourceCommands::Synthetic(args) => Box::new(Synthetic::new(args.clone())),
        SourceCommands::Stdin => Box::new(LineSource::new(
            "stdin",
            BufReader::new(tokio::io::stdin()),
        )),
        SourceCommands::File(args) => {
            let file = tokio::fs::File::open(&args.path)
                .await
                .with_context(|| format!("opening {}", args.path.display()))?;
            Box::new(LineSource::new(
                args.path.display().to_string(),
                BufReader::new(file),
            ))
        }
    };

    Ok(source)
}
