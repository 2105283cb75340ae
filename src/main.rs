use std::process::ExitCode;

fn main() -> ExitCode {
    midibench_lib::run()
}
