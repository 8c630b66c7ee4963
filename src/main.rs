use clap::Parser;
use std::env;
use std::path::Path;
use std::process::ExitCode;

use helpp::cli::Cli;

fn program_name() -> String {
    env::args()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    helpp::logging::init();

    let cli = Cli::parse();
    let code = match helpp::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err:#}", program_name());
            ExitCode::FAILURE
        }
    };
    helpp::logging::shutdown();
    code
}
