//! Scheduled balance jobs run by the `vacation-batch` binary.
//!
//! Every employee is handled in its own transaction with the row locked, so
//! a failure only loses that employee's update and a concurrent HR approval
//! cannot interleave with a job.

use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::{debug, error, info};

use crate::db;
use crate::model::employee::VacationBalance;
use crate::vacation::accrual;

/// One step applied to an employee's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceJob {
    /// Recompute the entitlement from tenure.
    Recalculate,
    /// Year-boundary roll-over of unused days, once per calendar year.
    CarryOver,
    /// Add one month of accrual to carry-over, once per calendar month.
    MonthlyAccrual,
    /// Zero the used-days counter.
    ResetUsed,
}

impl BalanceJob {
    pub fn name(self) -> &'static str {
        match self {
            BalanceJob::Recalculate => "recalculate",
            BalanceJob::CarryOver => "carry-over",
            BalanceJob::MonthlyAccrual => "monthly-accrual",
            BalanceJob::ResetUsed => "reset-used",
        }
    }

    /// Applies the step in memory. Returns `true` if the balance changed.
    pub fn apply(
        self,
        balance: &mut VacationBalance,
        hire_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> bool {
        match self {
            BalanceJob::Recalculate => accrual::recalculate(balance, hire_date, today),
            BalanceJob::CarryOver => accrual::apply_year_boundary(balance, hire_date, today),
            BalanceJob::MonthlyAccrual => accrual::apply_monthly_accrual(balance, hire_date, today),
            BalanceJob::ResetUsed => {
                if balance.used_days == 0 {
                    return false;
                }
                balance.used_days = 0;
                true
            }
        }
    }
}

/// Applies `jobs` in order; `true` if any of them changed the balance.
pub fn apply_all(
    jobs: &[BalanceJob],
    balance: &mut VacationBalance,
    hire_date: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    jobs.iter()
        .fold(false, |changed, job| job.apply(balance, hire_date, today) || changed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub employee_id: u64,
    pub employee_number: String,
    pub name: String,
    pub before: VacationBalance,
    pub after: VacationBalance,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub changes: Vec<BalanceChange>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub today: NaiveDate,
    /// Limit the run to one employee
    pub employee_id: Option<u64>,
    /// Compute and report without writing
    pub dry_run: bool,
}

async fn process_employee(
    pool: &MySqlPool,
    employee_id: u64,
    jobs: &[BalanceJob],
    options: &BatchOptions,
) -> Result<Option<BalanceChange>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(employee) = db::employees::fetch_for_update(&mut tx, employee_id).await? else {
        return Ok(None);
    };

    let mut after = employee.balance.clone();
    if !apply_all(jobs, &mut after, employee.hire_date, options.today) {
        return Ok(None);
    }

    if options.dry_run {
        tx.rollback().await?;
    } else {
        db::employees::save_balance(&mut *tx, employee_id, &after).await?;
        tx.commit().await?;
    }

    Ok(Some(BalanceChange {
        employee_id,
        employee_number: employee.employee_number.clone(),
        name: employee.full_name(),
        before: employee.balance,
        after,
    }))
}

/// Runs `jobs` over every active employee (or just `options.employee_id`).
///
/// Failures are logged and counted; the run continues with the next
/// employee.
pub async fn run(
    pool: &MySqlPool,
    jobs: &[BalanceJob],
    options: &BatchOptions,
) -> Result<BatchSummary, sqlx::Error> {
    let job_names = jobs.iter().map(|j| j.name()).collect::<Vec<_>>().join(",");
    let ids = db::employees::active_ids(pool, options.employee_id).await?;
    info!(
        jobs = %job_names,
        employees = ids.len(),
        today = %options.today,
        dry_run = options.dry_run,
        "Batch started"
    );

    let mut summary = BatchSummary::default();
    for employee_id in ids {
        summary.processed += 1;
        match process_employee(pool, employee_id, jobs, options).await {
            Ok(Some(change)) => {
                debug!(employee_id, before = ?change.before, after = ?change.after, "Balance updated");
                summary.changes.push(change);
            }
            Ok(None) => summary.unchanged += 1,
            Err(e) => {
                error!(employee_id, error = %e, "Batch failed for employee");
                summary.failed += 1;
            }
        }
    }

    info!(
        jobs = %job_names,
        processed = summary.processed,
        changed = summary.changes.len(),
        failed = summary.failed,
        "Batch finished"
    );
    Ok(summary)
}
