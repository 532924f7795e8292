use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::Serialize;

use crate::store::{HiringStore, StoreError};

/// One pivoted row of the hires-by-quarter report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarterlyHiresRow {
    pub department: String,
    pub job: String,
    pub q1: u32,
    pub q2: u32,
    pub q3: u32,
    pub q4: u32,
}

/// One row of the above-mean departments report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AboveMeanRow {
    pub id: i64,
    pub department: String,
    pub hired: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("reporting year must be positive, got {0}")]
    InvalidYear(i32),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Hires for the given year grouped by (department, job, quarter-of-hire)
/// and pivoted into four quarter columns. Combinations with no hires in a
/// quarter report zero; employees that cannot be attributed to both a
/// department and a job are left out. Rows come back ordered by department
/// name, then job title.
pub fn hires_by_quarter<S: HiringStore>(
    store: &S,
    year: i32,
) -> Result<Vec<QuarterlyHiresRow>, ReportError> {
    if year <= 0 {
        return Err(ReportError::InvalidYear(year));
    }

    let mut names = NameCache::default();
    let mut pivot: BTreeMap<(String, String), [u32; 4]> = BTreeMap::new();

    for employee in store.hired_in_year(year)? {
        let (Some(department_id), Some(job_id), Some(hired_at)) =
            (employee.department_id, employee.job_id, employee.hired_at)
        else {
            continue;
        };
        let Some(department) = names.department(store, department_id)? else {
            continue;
        };
        let Some(job) = names.job(store, job_id)? else {
            continue;
        };

        let quarter = hired_at.month0() as usize / 3;
        pivot.entry((department, job)).or_insert([0; 4])[quarter] += 1;
    }

    Ok(pivot
        .into_iter()
        .map(|((department, job), quarters)| QuarterlyHiresRow {
            department,
            job,
            q1: quarters[0],
            q2: quarters[1],
            q3: quarters[2],
            q4: quarters[3],
        })
        .collect())
}

/// Departments whose hire count for the given year strictly exceeds the
/// mean of per-department counts across departments with at least one hire.
/// Ordered by count descending, ties by department name ascending.
pub fn above_mean_departments<S: HiringStore>(
    store: &S,
    year: i32,
) -> Result<Vec<AboveMeanRow>, ReportError> {
    if year <= 0 {
        return Err(ReportError::InvalidYear(year));
    }

    let mut counts: HashMap<i64, u32> = HashMap::new();
    for employee in store.hired_in_year(year)? {
        if let Some(department_id) = employee.department_id {
            *counts.entry(department_id).or_default() += 1;
        }
    }

    if counts.is_empty() {
        return Ok(Vec::new());
    }

    let mean = counts.values().map(|count| f64::from(*count)).sum::<f64>() / counts.len() as f64;

    let mut rows = Vec::new();
    for (department_id, hired) in counts {
        if f64::from(hired) <= mean {
            continue;
        }
        let Some(department) = store.department(department_id)? else {
            continue;
        };
        rows.push(AboveMeanRow {
            id: department_id,
            department: department.name,
            hired,
        });
    }

    rows.sort_by(|a, b| {
        b.hired
            .cmp(&a.hired)
            .then_with(|| a.department.cmp(&b.department))
    });

    Ok(rows)
}

/// Point lookups against the store are cheap but chatty; remember names for
/// ids the scan has already resolved.
#[derive(Default)]
struct NameCache {
    departments: HashMap<i64, Option<String>>,
    jobs: HashMap<i64, Option<String>>,
}

impl NameCache {
    fn department<S: HiringStore>(
        &mut self,
        store: &S,
        id: i64,
    ) -> Result<Option<String>, StoreError> {
        if let Some(cached) = self.departments.get(&id) {
            return Ok(cached.clone());
        }
        let name = store.department(id)?.map(|department| department.name);
        self.departments.insert(id, name.clone());
        Ok(name)
    }

    fn job<S: HiringStore>(&mut self, store: &S, id: i64) -> Result<Option<String>, StoreError> {
        if let Some(cached) = self.jobs.get(&id) {
            return Ok(cached.clone());
        }
        let title = store.job(id)?.map(|job| job.title);
        self.jobs.insert(id, title.clone());
        Ok(title)
    }
}
