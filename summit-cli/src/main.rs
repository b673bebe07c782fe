//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    pretty_env_logger::init();
    if let Err(err) = summit_cli::run() {
        eprintln!("summit: {err}");
        std::process::exit(1);
    }
}
