use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use pole_check_rs::markers::ModelOutput;
use pole_check_rs::{run_trial, Notification, NotificationKind, PoleCheckConfig, TrialInput};

#[derive(Parser, Debug)]
#[command(name = "pole_check")]
#[command(about = "Force plate COP check against an instrumented pole", long_about = None)]
struct Args {
    /// Trial export (.json or .json.gz)
    #[arg(value_name = "TRIAL")]
    trial: PathBuf,

    /// Rig configuration (JSON); built-in defaults if omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for the report and modelled markers
    #[arg(long, default_value = "pole_check_reports")]
    output_dir: PathBuf,

    /// Override the activation threshold (N, negative)
    #[arg(long, allow_hyphen_values = true)]
    force_threshold: Option<f64>,

    /// Override the pass tolerance (mm)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Override the tip distance beyond the low midpoint (mm)
    #[arg(long)]
    extra_length: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PoleCheckConfig::load(path)?,
        None => PoleCheckConfig::default(),
    };
    if let Some(threshold) = args.force_threshold {
        config.force_threshold = threshold;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(extra) = args.extra_length {
        config.extra_length = extra;
    }
    config.validate()?;

    let trial = TrialInput::load(&args.trial)?;
    log::info!(
        "Trial '{}' subject '{}' ({} frames)",
        trial.trial_name,
        trial.subject,
        trial.frame_count
    );

    let outcome = match run_trial(&trial, &config) {
        Ok(outcome) => outcome,
        Err(e) => {
            notify(&e.notification());
            std::process::exit(1);
        }
    };

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let markers_path = args
        .output_dir
        .join(format!("{}_model_outputs.json", file_stem(&trial.trial_name)));
    write_model_outputs(&markers_path, &outcome.model_outputs)?;

    if outcome.double_contact_samples > 0 {
        notify(&Notification {
            kind: NotificationKind::Warning,
            title: "WARNING".to_string(),
            message: format!(
                "{} plate samples loaded both plates and were attributed to FP1.",
                outcome.double_contact_samples
            ),
        });
    }

    if let Err(missing) = outcome.check() {
        for e in &missing {
            notify(&e.notification());
        }
        std::process::exit(1);
    }

    let report = outcome.report(&trial, &config, Utc::now().to_rfc3339());
    let report_path = args.output_dir.join(format!(
        "pole_check_{}_{}.json",
        file_stem(&trial.trial_name),
        ts_now_clean()
    ));
    fs::write(&report_path, report.to_json()?)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    println!("\n=== Pole Check: {} ===", trial.trial_name);
    println!(
        "Pole length: {:.1} mm (SD {:.2})",
        outcome.pole_length_mean, outcome.pole_length_std
    );
    for line in report.summary_lines() {
        println!("{}", line);
    }
    println!("Report: {}", report_path.display());

    Ok(())
}

fn notify(note: &Notification) {
    match note.kind {
        NotificationKind::Error => log::error!("{}: {}", note.title, note.message),
        NotificationKind::Warning => log::warn!("{}: {}", note.title, note.message),
    }
}

fn write_model_outputs(path: &Path, outputs: &[ModelOutput]) -> Result<()> {
    let json = serde_json::to_string_pretty(outputs)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {} modelled markers to {}", outputs.len(), path.display());
    Ok(())
}

fn file_stem(trial_name: &str) -> String {
    trial_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn ts_now_clean() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
