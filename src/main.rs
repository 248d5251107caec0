use std::env;

use electricity_etl::{cli, logging};

fn main() {
    logging::init_tracing();
    let args: Vec<String> = env::args().collect();
    std::process::exit(cli::run_with_args(&args));
}
