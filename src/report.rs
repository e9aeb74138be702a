//! Tenure and balance report for active employees.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::employee::Employee;
use crate::vacation::calendar::tenure_years;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Text,
    Csv,
}

const NO_DEPARTMENT: &str = "No department";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<String>,
    pub job_title: String,
    pub hire_date: Option<NaiveDate>,
    pub tenure_years: u32,
    pub entitlement_days: Decimal,
    pub used_days: u32,
    pub carry_over_days: Decimal,
    pub available_days: Decimal,
}

impl ReportRow {
    pub fn new(employee: &Employee, department: Option<String>, today: NaiveDate) -> Self {
        Self {
            employee_number: employee.employee_number.clone(),
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            department,
            job_title: employee.job_title.clone(),
            hire_date: employee.hire_date,
            tenure_years: employee.hire_date.map_or(0, |h| tenure_years(h, today)),
            entitlement_days: employee.balance.entitlement_days,
            used_days: employee.balance.used_days,
            carry_over_days: employee.balance.carry_over_days,
            available_days: employee.balance.available_days(),
        }
    }

    /// At least one year of tenure, so the normal category is open.
    pub fn is_eligible(&self) -> bool {
        self.tenure_years >= 1
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub employees: usize,
    pub eligible: usize,
    pub with_days_available: usize,
    pub without_days_available: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    pub generated_on: NaiveDate,
    pub rows: Vec<ReportRow>,
}

impl BalanceReport {
    /// Rows are sorted by last name, then first name.
    pub fn new(employees: Vec<(Employee, Option<String>)>, today: NaiveDate) -> Self {
        let mut rows: Vec<ReportRow> = employees
            .into_iter()
            .map(|(employee, department)| ReportRow::new(&employee, department, today))
            .collect();
        rows.sort_by(|a, b| {
            (&a.last_name, &a.first_name, &a.employee_number).cmp(&(
                &b.last_name,
                &b.first_name,
                &b.employee_number,
            ))
        });
        Self {
            generated_on: today,
            rows,
        }
    }

    pub fn summary(&self) -> ReportSummary {
        let with_days = self
            .rows
            .iter()
            .filter(|r| r.available_days > Decimal::ZERO)
            .count();
        ReportSummary {
            employees: self.rows.len(),
            eligible: self.rows.iter().filter(|r| r.is_eligible()).count(),
            with_days_available: with_days,
            without_days_available: self.rows.len() - with_days,
        }
    }

    /// `(department, employees, eligible)` sorted by department name.
    pub fn by_department(&self) -> Vec<(String, usize, usize)> {
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for row in &self.rows {
            let entry = counts
                .entry(row.department.as_deref().unwrap_or(NO_DEPARTMENT))
                .or_default();
            entry.0 += 1;
            if row.is_eligible() {
                entry.1 += 1;
            }
        }
        counts
            .into_iter()
            .map(|(name, (total, eligible))| (name.to_string(), total, eligible))
            .collect()
    }

    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.render_text(),
            ReportFormat::Csv => self.render_csv(),
        }
    }

    pub fn render_text(&self) -> String {
        let summary = self.summary();
        let rule = "=".repeat(80);
        let thin = "-".repeat(80);
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "VACATION AND TENURE REPORT");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Generated on: {}", self.generated_on.format("%Y-%m-%d"));
        let _ = writeln!(out, "Total employees: {}", summary.employees);
        let _ = writeln!(out);

        let _ = writeln!(out, "SUMMARY");
        let _ = writeln!(out, "{}", "-".repeat(40));
        let _ = writeln!(out, "Eligible for normal vacations: {}", summary.eligible);
        let _ = writeln!(out, "With days available: {}", summary.with_days_available);
        let _ = writeln!(out, "Without days available: {}", summary.without_days_available);
        let _ = writeln!(out);

        let _ = writeln!(out, "BY DEPARTMENT");
        let _ = writeln!(out, "{}", "-".repeat(40));
        for (department, total, eligible) in self.by_department() {
            let _ = writeln!(out, "{department}: {total} employees ({eligible} eligible)");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "EMPLOYEES");
        let _ = writeln!(out, "{thin}");
        let _ = writeln!(
            out,
            "{:<25} {:<10} {:<15} {:<10} {:<10} Eligible",
            "Name", "Number", "Department", "Tenure", "Available"
        );
        let _ = writeln!(out, "{thin}");
        for row in &self.rows {
            let name = truncate(&format!("{} {}", row.first_name, row.last_name), 24);
            let department = truncate(row.department.as_deref().unwrap_or(NO_DEPARTMENT), 14);
            let _ = writeln!(
                out,
                "{:<25} {:<10} {:<15} {:<10} {:<10} {}",
                name,
                truncate(&row.employee_number, 9),
                department,
                format!("{} y", row.tenure_years),
                row.available_days.normalize().to_string(),
                if row.is_eligible() { "yes" } else { "no" },
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{rule}");
        out
    }

    pub fn render_csv(&self) -> String {
        let mut out = String::from(
            "first_name,last_name,employee_number,department,job_title,hire_date,tenure_years,\
             entitlement_days,used_days,carry_over_days,available_days,eligible\n",
        );
        for row in &self.rows {
            let fields = [
                csv_field(&row.first_name),
                csv_field(&row.last_name),
                csv_field(&row.employee_number),
                csv_field(row.department.as_deref().unwrap_or("")),
                csv_field(&row.job_title),
                row.hire_date.map(|d| d.to_string()).unwrap_or_default(),
                row.tenure_years.to_string(),
                row.entitlement_days.normalize().to_string(),
                row.used_days.to_string(),
                row.carry_over_days.normalize().to_string(),
                row.available_days.normalize().to_string(),
                if row.is_eligible() { "yes" } else { "no" }.to_string(),
            ];
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Quotes a field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::VacationBalance;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee(number: &str, first: &str, last: &str, hire: NaiveDate, used: u32) -> Employee {
        Employee {
            id: 1,
            employee_number: number.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: String::new(),
            job_title: "Clerk".to_string(),
            hire_date: Some(hire),
            department_id: None,
            supervisor_id: None,
            balance: VacationBalance {
                entitlement_days: Decimal::from(12),
                used_days: used,
                ..VacationBalance::default()
            },
            is_active: true,
        }
    }

    fn report() -> BalanceReport {
        BalanceReport::new(
            vec![
                (employee("EMP0002", "Zoe", "Ybarra", date(2020, 1, 1), 12), Some("Sales".to_string())),
                (employee("EMP0001", "Ana", "Alvarez", date(2024, 1, 1), 0), None),
                (employee("EMP0003", "Luis", "Mora, Jr.", date(2019, 6, 1), 2), Some("Sales".to_string())),
            ],
            date(2024, 6, 1),
        )
    }

    #[test]
    fn test_rows_sorted_by_last_name() {
        let numbers: Vec<_> = report().rows.iter().map(|r| r.employee_number.clone()).collect();
        assert_eq!(numbers, ["EMP0001", "EMP0003", "EMP0002"]);
    }

    #[test]
    fn test_summary_counts() {
        let summary = report().summary();
        assert_eq!(
            summary,
            ReportSummary {
                employees: 3,
                eligible: 2,
                with_days_available: 2,
                without_days_available: 1,
            }
        );
    }

    #[test]
    fn test_department_breakdown() {
        assert_eq!(
            report().by_department(),
            vec![
                (NO_DEPARTMENT.to_string(), 1, 0),
                ("Sales".to_string(), 2, 2),
            ]
        );
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = report().render_csv();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("Luis,\"Mora, Jr.\",EMP0003,Sales,Clerk,2019-06-01,5,12,2,0,10,yes"));
    }

    #[test]
    fn test_text_contains_sections() {
        let text = report().render(ReportFormat::Text);
        assert!(text.contains("Total employees: 3"));
        assert!(text.contains("Sales: 2 employees (2 eligible)"));
        assert!(text.contains("Ana Alvarez"));
    }

    #[test]
    fn test_csv_field_escapes_quotes() {
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }
}
