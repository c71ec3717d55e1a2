//! Minimal pipeline demo: a 30 Hz random source through a passthrough
//! processor into a collecting sink, with structured logging enabled.
//!
//! Run with `cargo run --example minimal_chain`; set `RUST_LOG=debug` for
//! verbose output.

use anyhow::Result;
use sensorpipe::modules::{random_source, ListSink, PassthroughProcessor};
use sensorpipe::{Direction, Pipeline};
use std::time::Duration;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut pipeline = Pipeline::new();

    let sink = ListSink::new();
    let frames = sink.handle();

    let src = pipeline.add_source(random_source(30.0));
    let pass = pipeline.add_processor(PassthroughProcessor::new());
    let out = pipeline.add_sink(sink);
    pipeline.connect(src, pass)?;
    pipeline.connect(pass, out)?;

    pipeline.start()?;
    std::thread::sleep(Duration::from_secs(2));
    pipeline.stop();
    pipeline.join()?;

    println!("collected {} frames", frames.len());
    for report in pipeline.stats() {
        let inbound = report.stats.rate(Direction::In, "random:int");
        let outbound = report.stats.rate(Direction::Out, "random:int");
        println!(
            "{:<14} {:<9} in: {:>6.1} Hz  out: {:>6.1} Hz",
            report.name,
            report.role.to_string(),
            inbound.map_or(0.0, |r| r.moving_rate),
            outbound.map_or(0.0, |r| r.moving_rate),
        );
    }
    Ok(())
}
