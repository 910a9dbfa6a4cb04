use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

use etltrace::reader::EtlReader;
use etltrace::state::CurrentState;
use etltrace::symbols::NullEnumerator;

/// Decodes kernel trace files and prints the recovered state.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Trace files (.etl) to inspect.
    #[arg(required = true)]
    traces: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("ETL_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    for trace in &args.traces {
        let mut parser = etltrace::Parser::new(EtlReader::new());
        parser
            .add_trace_source(trace)
            .with_context(|| format!("could not add trace '{}'", trace.display()))?;

        let mut state = CurrentState::new(NullEnumerator);
        parser
            .parse(|event| state.on_event(event))
            .with_context(|| format!("could not parse trace '{}'", trace.display()))?;

        let mut counts: Vec<_> = state.event_counts().iter().collect();
        counts.sort();
        for ((category, operation), count) in counts {
            eprintln!("{category}/{operation} => {count}");
        }
        if parser.dropped_events() > 0 {
            eprintln!("dropped => {}", parser.dropped_events());
        }
        eprintln!("resolved stacks => {}", state.stacks().len());
    }

    Ok(())
}
