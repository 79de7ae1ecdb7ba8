//! `sgrid recon` — config-driven sensor reconciliation.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use sensorgrid_recon::model::{ComparisonVerdict, ReconResult, UnmatchedSummary};
use sensorgrid_recon::ReconConfig;

use crate::exit_codes::{
    failure_exit_code, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_LIMITS, EXIT_RECON_MISMATCH,
};
use crate::sources;
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  sgrid recon run parity.recon.toml
  sgrid recon run parity.recon.toml --json
  sgrid recon run parity.recon.toml --output result.json")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file (overrides [output] json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  sgrid recon validate parity.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, json, output } => cmd_recon_run(config, json, output),
        ReconCommands::Validate { config } => cmd_recon_validate(config),
    }
}

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = sources::read_text(config_path)?;
    ReconConfig::from_toml(&config_str)
        .map_err(|e| CliError::new(EXIT_RECON_INVALID_CONFIG, e.to_string()))
}

fn cmd_recon_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_dir(&config_path);

    let input = sources::load_input(&config, base_dir)?;

    let result = sensorgrid_recon::run(&config, &input)
        .map_err(|e| CliError::new(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;

    let output_path = output_file.or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p)));
    if let Some(ref path) = output_path {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::runtime(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else {
        print_summary(&result);
    }

    outcome(&result)
}

/// Directory of the config file. A bare file name has an empty parent, which
/// is not a valid working directory for the listing command.
fn config_dir(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Exit status for a finished run. Terminal failures take precedence over
/// the percentage verdict, which takes precedence over limits.
fn outcome(result: &ReconResult) -> Result<(), CliError> {
    let report = &result.report;

    if let Some(failure) = report.failure {
        return Err(CliError::new(failure_exit_code(failure), failure.reason()));
    }

    if !report.passed {
        return Err(CliError::new(
            EXIT_RECON_MISMATCH,
            format!(
                "match percentage {:.1}% below threshold {:.1}%",
                report.match_percentage, report.threshold_pct
            ),
        ));
    }

    if let Some(limits) = &result.limits {
        if !limits.passed {
            let reason = limits.reason.as_deref().unwrap_or("thermal limit check failed");
            return Err(CliError::new(EXIT_RECON_LIMITS, reason));
        }
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReconResult) {
    let report = &result.report;

    eprintln!(
        "recon '{}': {} structured, {} tabular sensors",
        result.meta.config_name, result.structured_count, result.tabular_count,
    );

    if let Some(failure) = report.failure {
        eprintln!("result: FAIL ({failure})");
    } else {
        for v in &report.verdicts {
            eprintln!("  {}", verdict_line(v, report.tolerance));
        }
        eprintln!(
            "matched {}/{} within ±{} ({:.1}%, threshold {:.1}%): {}",
            report.matched_count,
            report.total_compared,
            report.tolerance,
            report.match_percentage,
            report.threshold_pct,
            if report.passed { "PASS" } else { "FAIL" },
        );
    }

    print_unmatched("structured only", &report.structured_only);
    print_unmatched("tabular only", &report.tabular_only);

    if let Some(limits) = &result.limits {
        eprintln!(
            "limits: {} cpu sensors checked: {}",
            limits.sensors.len(),
            if limits.passed { "PASS" } else { "FAIL" },
        );
        if let Some(reason) = &limits.reason {
            eprintln!("  {reason}");
        }
    }
}

fn verdict_line(v: &ComparisonVerdict, tolerance: f64) -> String {
    let mark = if v.within_tolerance { "ok  " } else { "DIFF" };
    let value = |x: Option<f64>| x.map_or_else(|| "n/a".to_string(), |x| x.to_string());
    let diff = v
        .difference
        .map_or_else(|| "no data".to_string(), |d| format!("diff {d:.2}"));
    format!(
        "{mark} {} = {} vs {} = {} ({diff}, tol {tolerance})",
        v.structured_name,
        value(v.structured_value),
        v.tabular_name,
        value(v.tabular_value),
    )
}

fn print_unmatched(label: &str, summary: &UnmatchedSummary) {
    if summary.count == 0 {
        return;
    }
    let more = if summary.count > summary.preview.len() { ", ..." } else { "" };
    eprintln!("{label} ({}): {}{more}", summary.count, summary.preview.join(", "));
}

fn cmd_recon_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let settings = config
        .settings()
        .map_err(|e| CliError::new(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;

    eprintln!("valid: {}", config.name);
    eprintln!(
        "  keywords: {}",
        settings.keywords.iter().collect::<Vec<_>>().join(", ")
    );
    eprintln!(
        "  tolerance: ±{}  threshold: {}%",
        settings.tolerance, settings.min_match_pct
    );
    eprintln!(
        "  tabular source: {}",
        if config.sources.tabular.is_some() { "configured" } else { "none" }
    );
    let structured = &config.sources.structured;
    eprintln!(
        "  structured sources: thermal={} power={}",
        structured.thermal.is_some(),
        structured.power.is_some(),
    );
    if config.limits.is_some() {
        eprintln!("  thermal limit check: enabled");
    }
    Ok(())
}
