mod parser;

use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::store::{Employee, HiringStore, StoreError};

/// Entity kind accepted by the CSV upload surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadModel {
    Departments,
    Jobs,
    Employees,
}

impl UploadModel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Departments => "departments",
            Self::Jobs => "jobs",
            Self::Employees => "employees",
        }
    }
}

impl FromStr for UploadModel {
    type Err = UploadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "departments" => Ok(Self::Departments),
            "jobs" => Ok(Self::Jobs),
            "employees" => Ok(Self::Employees),
            other => Err(UploadError::UnknownModel(other.to_string())),
        }
    }
}

/// One rejected row: 1-based position in the uploaded file plus the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row: usize,
    pub reason: String,
}

/// Result of one upload batch. `processed` counts rows that reached the
/// store; `failures` lists every rejected row without aborting the batch.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub model: UploadModel,
    pub processed: usize,
    pub failures: Vec<RowFailure>,
}

/// Whole-request upload failures. Row-level problems never surface here;
/// they ride along inside [`UploadSummary::failures`].
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("unknown upload model '{0}': expected departments, jobs, or employees")]
    UnknownModel(String),
    #[error("uploaded file contains no rows")]
    EmptyUpload,
    #[error("upload does not include a csv file field")]
    MissingFile,
    #[error("unreadable multipart upload: {0}")]
    UnreadableUpload(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Maps uploaded CSV batches onto the relational schema. Every row is
/// validated before any write, then the surviving rows are upserted in one
/// batch, later rows superseding earlier ones with the same id.
pub struct CsvIngestor<S> {
    store: Arc<S>,
}

impl<S: HiringStore> CsvIngestor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn ingest<R: Read>(
        &self,
        model: UploadModel,
        reader: R,
    ) -> Result<UploadSummary, UploadError> {
        match model {
            UploadModel::Departments => self.ingest_departments(reader),
            UploadModel::Jobs => self.ingest_jobs(reader),
            UploadModel::Employees => self.ingest_employees(reader),
        }
    }

    fn ingest_departments<R: Read>(&self, reader: R) -> Result<UploadSummary, UploadError> {
        let parsed = parser::parse_departments(reader);
        if parsed.is_empty() {
            return Err(UploadError::EmptyUpload);
        }

        let rows: Vec<_> = parsed.rows.into_iter().map(|(_, row)| row).collect();
        let processed = rows.len();
        self.store.upsert_departments(rows)?;

        Ok(UploadSummary {
            model: UploadModel::Departments,
            processed,
            failures: parsed.failures,
        })
    }

    fn ingest_jobs<R: Read>(&self, reader: R) -> Result<UploadSummary, UploadError> {
        let parsed = parser::parse_jobs(reader);
        if parsed.is_empty() {
            return Err(UploadError::EmptyUpload);
        }

        let rows: Vec<_> = parsed.rows.into_iter().map(|(_, row)| row).collect();
        let processed = rows.len();
        self.store.upsert_jobs(rows)?;

        Ok(UploadSummary {
            model: UploadModel::Jobs,
            processed,
            failures: parsed.failures,
        })
    }

    fn ingest_employees<R: Read>(&self, reader: R) -> Result<UploadSummary, UploadError> {
        let parsed = parser::parse_employees(reader);
        if parsed.is_empty() {
            return Err(UploadError::EmptyUpload);
        }

        let mut failures = parsed.failures;
        let mut accepted = Vec::with_capacity(parsed.rows.len());

        // Referential checks run against the store before any write; a row
        // referencing an absent department or job fails alone.
        for (row, employee) in parsed.rows {
            match self.reference_failure(&employee)? {
                Some(reason) => failures.push(RowFailure { row, reason }),
                None => accepted.push(employee),
            }
        }

        failures.sort_by_key(|failure| failure.row);

        let processed = accepted.len();
        if processed > 0 {
            self.store.upsert_employees(accepted)?;
        }

        Ok(UploadSummary {
            model: UploadModel::Employees,
            processed,
            failures,
        })
    }

    fn reference_failure(&self, employee: &Employee) -> Result<Option<String>, UploadError> {
        if let Some(department_id) = employee.department_id {
            if !self.store.department_exists(department_id)? {
                return Ok(Some(format!("department {department_id} not found")));
            }
        }
        if let Some(job_id) = employee.job_id {
            if !self.store.job_exists(job_id)? {
                return Ok(Some(format!("job {job_id} not found")));
            }
        }
        Ok(None)
    }
}
