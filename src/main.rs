use clap::Parser;
use hotel_desk::cli::{Args, init_logging, open_database, run_command};
use hotel_desk::{HttpBackend, SessionStore};
use tracing::error;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let backend = HttpBackend::new(args.api_url.clone());
    let mut store = match SessionStore::initialize(db, backend).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Failed to load session");
            std::process::exit(1);
        }
    };

    let today = chrono::Local::now().date_naive();
    let result = run_command(&mut store, args.command, today).await;
    store.dispose().await;

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!(error = ?e, "Command failed");
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
