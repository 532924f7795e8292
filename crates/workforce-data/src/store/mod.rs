pub mod memory;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub use memory::InMemoryHiringStore;

/// Organizational unit referenced by employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

/// Job title referenced by employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
}

/// Hired employee. References are optional but must resolve when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: Option<String>,
    pub hired_at: Option<NaiveDateTime>,
    pub department_id: Option<i64>,
    pub job_id: Option<i64>,
}

/// Storage seam for the relational schema. Upserts take whole batches so a
/// single upload maps to one storage transaction; lookups and scans are the
/// standard query operations the ingestor and report engine rely on.
pub trait HiringStore: Send + Sync {
    fn upsert_departments(&self, batch: Vec<Department>) -> Result<(), StoreError>;
    fn upsert_jobs(&self, batch: Vec<Job>) -> Result<(), StoreError>;
    fn upsert_employees(&self, batch: Vec<Employee>) -> Result<(), StoreError>;

    fn department(&self, id: i64) -> Result<Option<Department>, StoreError>;
    fn job(&self, id: i64) -> Result<Option<Job>, StoreError>;
    fn employee(&self, id: i64) -> Result<Option<Employee>, StoreError>;

    fn departments(&self, offset: usize, limit: usize) -> Result<Vec<Department>, StoreError>;
    fn jobs(&self, offset: usize, limit: usize) -> Result<Vec<Job>, StoreError>;
    fn employees(&self, offset: usize, limit: usize) -> Result<Vec<Employee>, StoreError>;

    fn department_exists(&self, id: i64) -> Result<bool, StoreError>;
    fn job_exists(&self, id: i64) -> Result<bool, StoreError>;

    /// Employees whose hire timestamp falls inside the given calendar year.
    fn hired_in_year(&self, year: i32) -> Result<Vec<Employee>, StoreError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("storage constraint violated: {0}")]
    Constraint(String),
}
