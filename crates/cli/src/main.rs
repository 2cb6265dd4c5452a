use std::process::ExitCode;

fn main() -> ExitCode {
    devisio_cli::run()
}
