use clap::Parser;
use routegen::cli::{run_cli, Cli};
use routegen::logging::{init_logging_with_config, LogConfig};

fn main() {
    if let Err(err) = init_logging_with_config(&LogConfig::from_env()) {
        eprintln!("warning: {err:#}");
    }

    if let Err(err) = run_cli(Cli::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
