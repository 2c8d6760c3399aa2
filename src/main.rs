// src/main.rs

use jobdag::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("jobdag error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(err) => {
            eprintln!("jobdag error: {err}");
            std::process::exit(err.exit_code());
        }
    }
}
