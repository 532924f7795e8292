mod cli;
mod infra;
mod offline;
mod routes;
mod server;

use workforce_data::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
