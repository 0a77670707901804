use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Result};
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_cli_trains_on_sample_and_reports_metrics() -> Result<()> {
    let binary_path = env!("CARGO_BIN_EXE_fraud-detection-engine");
    let sample_path = Path::new("samples").join("sample.csv");
    let model_dir = tempdir()?;

    let output = Command::new(binary_path)
        .arg("train")
        .arg(&sample_path)
        .arg(model_dir.path())
        .output()?;

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let mut lines = stdout.lines();

    assert_eq!(lines.next(), Some("metric,value"));

    let mut metrics = HashMap::new();

    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 2);
        metrics.insert(fields[0].to_string(), fields[1].to_string());
    }

    let f1: f64 = metrics
        .get("f1_score")
        .ok_or_else(|| anyhow!("f1_score missing from output"))?
        .parse()?;
    assert!((0.0..=1.0).contains(&f1));

    let dataset_rows: usize = metrics
        .get("dataset_rows")
        .ok_or_else(|| anyhow!("dataset_rows missing from output"))?
        .parse()?;
    assert_eq!(dataset_rows, 300);

    assert!(model_dir.path().join("model.json").exists());
    assert!(model_dir.path().join("scaler.json").exists());

    Ok(())
}

#[test]
fn test_cli_predicts_after_training() -> Result<()> {
    let binary_path = env!("CARGO_BIN_EXE_fraud-detection-engine");
    let sample_path = Path::new("samples").join("sample.csv");
    let model_dir = tempdir()?;

    let train_output = Command::new(binary_path)
        .arg("train")
        .arg(&sample_path)
        .arg(model_dir.path())
        .output()?;
    assert!(train_output.status.success());

    let mut unlabeled = NamedTempFile::new()?;
    writeln!(
        unlabeled,
        "Transaction Amount,Merchant Category Code (MCC),Transaction Response Code,Card Type,Transaction Source"
    )?;
    writeln!(unlabeled, "25.50,5411,0,Visa,Online")?;
    writeln!(unlabeled, "980.00,7995,5,Prepaid,Online")?;
    writeln!(unlabeled, "64.10,5812,0,Amex,In-Store")?;

    let output = Command::new(binary_path)
        .arg("predict")
        .arg(unlabeled.path())
        .arg(model_dir.path())
        .output()?;

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let mut lines = stdout.lines();

    assert_eq!(lines.next(), Some("row,prediction"));

    let mut rows = 0;

    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 2);

        let _: usize = fields[0].parse()?;
        let prediction: u8 = fields[1].parse()?;
        assert!(prediction <= 1);

        rows += 1;
    }

    assert_eq!(rows, 3);

    Ok(())
}

#[test]
fn test_cli_rejects_unknown_commands() -> Result<()> {
    let binary_path = env!("CARGO_BIN_EXE_fraud-detection-engine");

    let output = Command::new(binary_path)
        .arg("retrain")
        .arg("missing.csv")
        .output()?;

    assert!(!output.status.success());

    Ok(())
}
