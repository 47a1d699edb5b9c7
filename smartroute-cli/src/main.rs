//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    let _logger = match smartroute_cli::init_logging() {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("smartroute: {err}");
            None
        }
    };
    if let Err(err) = smartroute_cli::run() {
        eprintln!("smartroute: {err}");
        std::process::exit(1);
    }
}
