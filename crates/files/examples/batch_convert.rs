//! Batch example - convert every XML file in a directory to JSON

use files::{ConversionJob, ConverterConfig, FileConverter};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".to_string()));

    let mut jobs = Vec::new();
    let mut entries = tokio::fs::read_dir(&dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "xml") {
            let output = path.with_extension("json");
            jobs.push(ConversionJob::xml_to_json(path, output));
        }
    }

    let config = ConverterConfig {
        pretty_json: true,
        ..Default::default()
    };
    let converter = FileConverter::new(config);

    // Subscribe to events before starting
    let mut event_rx = converter.event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            println!("Event: {:?}", event);
        }
    });

    println!("Converting {} files in {}", jobs.len(), dir.display());
    for outcome in converter.convert_batch(jobs).await {
        match outcome.result {
            Ok(ignored) => println!("✓ {} ({} ignored tokens)", outcome.job.output.display(), ignored),
            Err(e) => println!("✗ {}: {}", outcome.job.input.display(), e),
        }
    }

    Ok(())
}
