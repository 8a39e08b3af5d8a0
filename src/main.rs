use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use reqtree::cli::{self, Args};
use reqtree::status::ExitStatus;
use reqtree::{logging, signals};

/// Entry point: Ctrl+C cancels the running chain, a second one exits.
#[tokio::main]
async fn main() -> ExitStatus {
    let args = Args::parse();
    logging::init(args.verbose, args.debug);

    let cancel = CancellationToken::new();
    if let Err(e) = signals::install_handler(cancel.clone()) {
        warn!(error = %e, "Could not install Ctrl+C handler");
    }

    let status = cli::run(args, cancel).await;

    if signals::was_interrupted() {
        return ExitStatus::Interrupted;
    }

    status
}
