use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::io::Read;

use super::RowFailure;
use crate::store::{Department, Employee, Job};

const DEPARTMENT_COLUMNS: usize = 2;
const JOB_COLUMNS: usize = 2;
const EMPLOYEE_COLUMNS: usize = 5;

/// Outcome of scanning one headerless CSV payload: rows that parsed cleanly
/// (tagged with their 1-based file position) plus per-row failures, in file
/// order.
#[derive(Debug)]
pub(crate) struct ParsedRows<T> {
    pub(crate) rows: Vec<(usize, T)>,
    pub(crate) failures: Vec<RowFailure>,
}

impl<T> ParsedRows<T> {
    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.failures.is_empty()
    }
}

pub(crate) fn parse_departments<R: Read>(reader: R) -> ParsedRows<Department> {
    scan(reader, DEPARTMENT_COLUMNS, |record| {
        Ok(Department {
            id: required_id(&record[0])?,
            name: required_text(&record[1], "name")?,
        })
    })
}

pub(crate) fn parse_jobs<R: Read>(reader: R) -> ParsedRows<Job> {
    scan(reader, JOB_COLUMNS, |record| {
        Ok(Job {
            id: required_id(&record[0])?,
            title: required_text(&record[1], "title")?,
        })
    })
}

pub(crate) fn parse_employees<R: Read>(reader: R) -> ParsedRows<Employee> {
    scan(reader, EMPLOYEE_COLUMNS, |record| {
        Ok(Employee {
            id: required_id(&record[0])?,
            name: optional_text(&record[1]),
            hired_at: optional_datetime(&record[2], "hired_at")?,
            department_id: optional_id(&record[3], "department_id")?,
            job_id: optional_id(&record[4], "job_id")?,
        })
    })
}

/// Walk every record, validating the column count before handing the record
/// to the row mapper. Failures never abort the scan; row indices are 1-based.
fn scan<R, T, F>(reader: R, expected_columns: usize, map_row: F) -> ParsedRows<T>
where
    R: Read,
    F: Fn(&StringRecord) -> Result<T, String>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut failures = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let row = index + 1;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                failures.push(RowFailure {
                    row,
                    reason: format!("unreadable row: {err}"),
                });
                continue;
            }
        };

        if record.len() != expected_columns {
            failures.push(RowFailure {
                row,
                reason: format!(
                    "expected {expected_columns} columns, found {}",
                    record.len()
                ),
            });
            continue;
        }

        match map_row(&record) {
            Ok(parsed) => rows.push((row, parsed)),
            Err(reason) => failures.push(RowFailure { row, reason }),
        }
    }

    ParsedRows { rows, failures }
}

fn required_id(value: &str) -> Result<i64, String> {
    if value.is_empty() {
        return Err("id must not be empty".to_string());
    }
    value
        .parse::<i64>()
        .map_err(|_| format!("id: invalid integer '{value}'"))
}

fn required_text(value: &str, label: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err(format!("{label} must not be empty"));
    }
    Ok(value.to_string())
}

fn optional_text(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn optional_id(value: &str, label: &str) -> Result<Option<i64>, String> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| format!("{label}: invalid integer '{value}'"))
}

fn optional_datetime(value: &str, label: &str) -> Result<Option<NaiveDateTime>, String> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_datetime(value)
        .map(Some)
        .ok_or_else(|| format!("{label}: unrecognized timestamp '{value}'"))
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}
