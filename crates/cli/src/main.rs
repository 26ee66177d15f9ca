use std::process::ExitCode;

fn main() -> ExitCode {
    promo_cli::run()
}
