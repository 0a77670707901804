use std::io::{stderr, stdout, BufWriter, Write};
use std::path::Path;
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use fraud_detection_engine::engine::FraudEngine;
use fraud_detection_engine::storage::FileArtifactStore;

#[tokio::main]
async fn main() -> Result<()> {
    //NOTE: If this grows more subcommands or flags it should move to the clap crate;
    //      two positional commands do not justify the dependency yet.
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: fraud-detection-engine <train|predict> [input].csv [model_dir:optional] [log_level:optional] > [output].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        exit(1);
    }

    let command = args[1].as_str();
    let path = Path::new(&args[2]);
    let model_dir = args.get(3).map(String::as_str).unwrap_or("models");
    let log_level = args.get(4)
        .map(|s| parse_log_level(s)).unwrap_or(LevelFilter::ERROR);

    setup_logging(log_level);

    let storage = Arc::new(FileArtifactStore::new(model_dir));
    let engine = FraudEngine::new(storage);

    let timer = Instant::now();

    match command {
        "train" => {
            let report = engine.train_from_csv(path).await?;
            info!("Trained in: {:?}", timer.elapsed());
            write_training_report(&report)?;
        }
        "predict" => {
            let report = engine.predict_from_csv(path).await?;
            info!("Predicted {} transactions in: {:?}", report.total_transactions, timer.elapsed());
            write_predictions_to_stdout(&report.predictions)?;
        }
        _ => {
            eprintln!("Unknown command '{command}', expected 'train' or 'predict'");
            exit(1);
        }
    }

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: Results go to stdout for redirection, so logging must stay on stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_training_report(report: &fraud_detection_engine::engine::TrainingReport) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    writeln!(output, "metric,value")?;
    writeln!(output, "accuracy,{}", report.metrics.accuracy)?;
    writeln!(output, "precision,{}", report.metrics.precision)?;
    writeln!(output, "recall,{}", report.metrics.recall)?;
    writeln!(output, "f1_score,{}", report.metrics.f1_score)?;
    writeln!(output, "fraud_rate,{}", report.metrics.fraud_rate)?;
    writeln!(output, "total_samples,{}", report.metrics.total_samples)?;
    writeln!(output, "fraud_samples,{}", report.metrics.fraud_samples)?;
    writeln!(output, "dataset_rows,{}", report.dataset_info.total_rows)?;
    writeln!(output, "dataset_fraud_count,{}", report.dataset_info.fraud_count)?;

    output.flush()?;

    Ok(())
}

fn write_predictions_to_stdout(predictions: &[u8]) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    writeln!(output, "row,prediction")?;

    for (row, prediction) in predictions.iter().enumerate() {
        writeln!(output, "{row},{prediction}")?;
    }

    output.flush()?;

    Ok(())
}
