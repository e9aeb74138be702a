//! # vacation-batch
//!
//! Scheduled balance maintenance and reporting. Meant to run from cron:
//! `accrue-monthly` on the first of each month, `carry-over` on January 1st.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use hr_vacations::batch::{self, BatchOptions, BatchSummary, BalanceJob};
use hr_vacations::db;
use hr_vacations::report::{BalanceReport, ReportFormat};
use hr_vacations::telemetry;
use hr_vacations::vacation::calendar;

/// Vacation balance jobs.
#[derive(Parser, Debug)]
#[command(name = "vacation-batch", version, about)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Run as if today were this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Target {
    /// Only process this employee
    #[arg(long)]
    employee_id: Option<u64>,

    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recompute entitlements for all active employees.
    Recalculate {
        /// Also roll unused days into carry-over (once per year)
        #[arg(long)]
        annual_carry_over: bool,
        /// Also add this month's accrual (once per month)
        #[arg(long)]
        monthly_accrual: bool,
        #[command(flatten)]
        target: Target,
    },
    /// Year-boundary roll-over of unused days.
    CarryOver(Target),
    /// Add one month of accrual to carry-over.
    AccrueMonthly(Target),
    /// Reset used-days counters to zero.
    ResetUsed(Target),
    /// Tenure and balance report.
    Report {
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Only departments whose name contains this text
        #[arg(long)]
        department: Option<String>,
    },
}

fn print_summary(summary: &BatchSummary, dry_run: bool) {
    let verb = if dry_run { "would change" } else { "changed" };
    println!(
        "Processed {} active employees: {} {verb}, {} unchanged, {} failed",
        summary.processed,
        summary.changes.len(),
        summary.unchanged,
        summary.failed
    );
    for change in &summary.changes {
        println!(
            "  - {} ({}): entitlement {} -> {}, used {} -> {}, carry-over {} -> {}",
            change.name,
            change.employee_number,
            change.before.entitlement_days.normalize(),
            change.after.entitlement_days.normalize(),
            change.before.used_days,
            change.after.used_days,
            change.before.carry_over_days.normalize(),
            change.after.carry_over_days.normalize(),
        );
    }
}

async fn run_jobs(
    pool: &sqlx::MySqlPool,
    jobs: &[BalanceJob],
    target: Target,
    today: NaiveDate,
) -> anyhow::Result<bool> {
    let options = BatchOptions {
        today,
        employee_id: target.employee_id,
        dry_run: target.dry_run,
    };
    let summary = batch::run(pool, jobs, &options).await?;

    if let (Some(id), 0) = (target.employee_id, summary.processed) {
        anyhow::bail!("no active employee with id {id}");
    }

    print_summary(&summary, options.dry_run);
    Ok(summary.is_success())
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let pool = db::connect(&cli.database_url, 2)
        .await
        .context("failed to connect to database")?;
    let today = cli.as_of.unwrap_or_else(calendar::today);

    match cli.command {
        Commands::Recalculate {
            annual_carry_over,
            monthly_accrual,
            target,
        } => {
            let mut jobs = vec![BalanceJob::Recalculate];
            if annual_carry_over {
                jobs.push(BalanceJob::CarryOver);
            }
            if monthly_accrual {
                jobs.push(BalanceJob::MonthlyAccrual);
            }
            run_jobs(&pool, &jobs, target, today).await
        }
        Commands::CarryOver(target) => run_jobs(&pool, &[BalanceJob::CarryOver], target, today).await,
        Commands::AccrueMonthly(target) => {
            run_jobs(&pool, &[BalanceJob::MonthlyAccrual], target, today).await
        }
        Commands::ResetUsed(target) => run_jobs(&pool, &[BalanceJob::ResetUsed], target, today).await,
        Commands::Report {
            format,
            output,
            department,
        } => {
            let employees = db::employees::active_with_department(&pool, department.as_deref()).await?;
            let rendered = BalanceReport::new(employees, today).render(format);

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "Report written");
                    println!("Report saved to {}", path.display());
                }
                None => print!("{rendered}"),
            }
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    telemetry::init_stderr_logging(&cli.log_level);

    if run(cli).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_recalculate_flags() {
        let cli = Cli::try_parse_from([
            "vacation-batch",
            "--database-url",
            "mysql://localhost/hr",
            "recalculate",
            "--annual-carry-over",
            "--employee-id",
            "7",
        ])
        .unwrap();
        match cli.command {
            Commands::Recalculate {
                annual_carry_over,
                monthly_accrual,
                target,
            } => {
                assert!(annual_carry_over);
                assert!(!monthly_accrual);
                assert_eq!(target.employee_id, Some(7));
                assert!(!target.dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parses_report_options() {
        let cli = Cli::try_parse_from([
            "vacation-batch",
            "--database-url",
            "mysql://localhost/hr",
            "report",
            "--format",
            "csv",
            "--department",
            "sales",
            "--as-of",
            "2024-01-31",
        ])
        .unwrap();
        assert_eq!(cli.as_of, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert!(matches!(
            cli.command,
            Commands::Report { format: ReportFormat::Csv, .. }
        ));
    }
}
