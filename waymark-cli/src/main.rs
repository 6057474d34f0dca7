//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = waymark_cli::init_logging() {
        eprintln!("waymark: logging disabled: {err}");
    }
    if let Err(err) = waymark_cli::run() {
        eprintln!("waymark: {:?}", eyre::Report::new(err));
        std::process::exit(1);
    }
}
