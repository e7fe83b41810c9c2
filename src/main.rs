//! Binary entrypoint for the health assistant server.

use std::process::ExitCode;

use health_assistant::start_health_assistant;

fn main() -> ExitCode {
    start_health_assistant::run()
}
