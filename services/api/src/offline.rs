use clap::Args;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use workforce_data::error::AppError;
use workforce_data::ingest::{CsvIngestor, UploadModel, UploadSummary};
use workforce_data::reports::{above_mean_departments, hires_by_quarter};
use workforce_data::store::InMemoryHiringStore;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Calendar year to report on
    #[arg(long)]
    pub(crate) year: i32,
    /// Departments CSV export (id,name; no header row)
    #[arg(long)]
    pub(crate) departments_csv: Option<PathBuf>,
    /// Jobs CSV export (id,title; no header row)
    #[arg(long)]
    pub(crate) jobs_csv: Option<PathBuf>,
    /// Employees CSV export (id,name,hired_at,department_id,job_id; no header row)
    #[arg(long)]
    pub(crate) employees_csv: Option<PathBuf>,
}

pub(crate) fn run_quarters_report(args: ReportArgs) -> Result<(), AppError> {
    let year = args.year;
    let store = hydrate_store(args)?;
    let rows = hires_by_quarter(store.as_ref(), year)?;

    println!("Hires by quarter, {year}");
    if rows.is_empty() {
        println!("- no attributable hires");
        return Ok(());
    }
    for row in rows {
        println!(
            "- {} | {} | Q1 {} | Q2 {} | Q3 {} | Q4 {}",
            row.department, row.job, row.q1, row.q2, row.q3, row.q4
        );
    }
    Ok(())
}

pub(crate) fn run_above_mean_report(args: ReportArgs) -> Result<(), AppError> {
    let year = args.year;
    let store = hydrate_store(args)?;
    let rows = above_mean_departments(store.as_ref(), year)?;

    println!("Departments hiring above the {year} mean");
    if rows.is_empty() {
        println!("- none");
        return Ok(());
    }
    for row in rows {
        println!("- {} (id {}): {} hires", row.department, row.id, row.hired);
    }
    Ok(())
}

/// Load whichever exports were provided, catalog tables first so employee
/// references can resolve. Row-level failures are printed, not fatal.
fn hydrate_store(args: ReportArgs) -> Result<Arc<InMemoryHiringStore>, AppError> {
    let store = Arc::new(InMemoryHiringStore::default());
    let ingestor = CsvIngestor::new(store.clone());

    let uploads = [
        (UploadModel::Departments, args.departments_csv),
        (UploadModel::Jobs, args.jobs_csv),
        (UploadModel::Employees, args.employees_csv),
    ];

    for (model, path) in uploads {
        let Some(path) = path else { continue };
        let file = File::open(&path)?;
        let summary = ingestor.ingest(model, file)?;
        render_summary(&path, &summary);
    }

    Ok(store)
}

fn render_summary(path: &PathBuf, summary: &UploadSummary) {
    println!(
        "Loaded {} row(s) from {} into {}",
        summary.processed,
        path.display(),
        summary.model.as_str()
    );
    for failure in &summary.failures {
        println!("  row {}: {}", failure.row, failure.reason);
    }
}
