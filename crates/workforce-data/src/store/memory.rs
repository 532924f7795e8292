use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Datelike;

use super::{Department, Employee, HiringStore, Job, StoreError};

/// Reference store backing the served process and the test suites. Tables
/// are ordered by id so paged listings are deterministic.
#[derive(Default, Clone)]
pub struct InMemoryHiringStore {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    departments: BTreeMap<i64, Department>,
    jobs: BTreeMap<i64, Job>,
    employees: BTreeMap<i64, Employee>,
}

impl HiringStore for InMemoryHiringStore {
    fn upsert_departments(&self, batch: Vec<Department>) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        for department in batch {
            tables.departments.insert(department.id, department);
        }
        Ok(())
    }

    fn upsert_jobs(&self, batch: Vec<Job>) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        for job in batch {
            tables.jobs.insert(job.id, job);
        }
        Ok(())
    }

    fn upsert_employees(&self, batch: Vec<Employee>) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        for employee in &batch {
            if let Some(department_id) = employee.department_id {
                if !tables.departments.contains_key(&department_id) {
                    return Err(StoreError::Constraint(format!(
                        "employee {} references missing department {department_id}",
                        employee.id
                    )));
                }
            }
            if let Some(job_id) = employee.job_id {
                if !tables.jobs.contains_key(&job_id) {
                    return Err(StoreError::Constraint(format!(
                        "employee {} references missing job {job_id}",
                        employee.id
                    )));
                }
            }
        }
        for employee in batch {
            tables.employees.insert(employee.id, employee);
        }
        Ok(())
    }

    fn department(&self, id: i64) -> Result<Option<Department>, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.departments.get(&id).cloned())
    }

    fn job(&self, id: i64) -> Result<Option<Job>, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.jobs.get(&id).cloned())
    }

    fn employee(&self, id: i64) -> Result<Option<Employee>, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.employees.get(&id).cloned())
    }

    fn departments(&self, offset: usize, limit: usize) -> Result<Vec<Department>, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .departments
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn jobs(&self, offset: usize, limit: usize) -> Result<Vec<Job>, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.jobs.values().skip(offset).take(limit).cloned().collect())
    }

    fn employees(&self, offset: usize, limit: usize) -> Result<Vec<Employee>, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .employees
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn department_exists(&self, id: i64) -> Result<bool, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.departments.contains_key(&id))
    }

    fn job_exists(&self, id: i64) -> Result<bool, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.jobs.contains_key(&id))
    }

    fn hired_in_year(&self, year: i32) -> Result<Vec<Employee>, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .employees
            .values()
            .filter(|employee| {
                employee
                    .hired_at
                    .map(|hired_at| hired_at.year() == year)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hired(year: i32, month: u32) -> Option<chrono::NaiveDateTime> {
        NaiveDate::from_ymd_opt(year, month, 15).and_then(|date| date.and_hms_opt(9, 30, 0))
    }

    fn employee(id: i64, year: i32, month: u32) -> Employee {
        Employee {
            id,
            name: Some(format!("employee-{id}")),
            hired_at: hired(year, month),
            department_id: Some(1),
            job_id: Some(1),
        }
    }

    fn seeded() -> InMemoryHiringStore {
        let store = InMemoryHiringStore::default();
        store
            .upsert_departments(vec![Department {
                id: 1,
                name: "Engineering".to_string(),
            }])
            .expect("departments upsert");
        store
            .upsert_jobs(vec![Job {
                id: 1,
                title: "Engineer".to_string(),
            }])
            .expect("jobs upsert");
        store
    }

    #[test]
    fn upsert_overwrites_existing_rows() {
        let store = seeded();
        store
            .upsert_departments(vec![Department {
                id: 1,
                name: "Platform Engineering".to_string(),
            }])
            .expect("second upsert");
        let department = store.department(1).expect("lookup").expect("present");
        assert_eq!(department.name, "Platform Engineering");
    }

    #[test]
    fn employee_upsert_enforces_references() {
        let store = seeded();
        let mut dangling = employee(7, 2021, 3);
        dangling.department_id = Some(99);
        let err = store.upsert_employees(vec![dangling]).unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
        assert!(store.employee(7).expect("lookup").is_none());
    }

    #[test]
    fn hired_in_year_filters_by_hire_timestamp() {
        let store = seeded();
        let mut unhired = employee(3, 2021, 6);
        unhired.hired_at = None;
        store
            .upsert_employees(vec![employee(1, 2021, 2), employee(2, 2020, 11), unhired])
            .expect("employees upsert");
        let hires = store.hired_in_year(2021).expect("scan");
        assert_eq!(hires.len(), 1);
        assert_eq!(hires[0].id, 1);
    }

    #[test]
    fn listings_page_in_id_order() {
        let store = seeded();
        store
            .upsert_departments(vec![
                Department {
                    id: 3,
                    name: "Support".to_string(),
                },
                Department {
                    id: 2,
                    name: "Sales".to_string(),
                },
            ])
            .expect("departments upsert");
        let page = store.departments(1, 2).expect("listing");
        let ids: Vec<i64> = page.iter().map(|department| department.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
