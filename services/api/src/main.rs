#[tokio::main]
async fn main() {
    if let Err(err) = workforce_data_api::run().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}
