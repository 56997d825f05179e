//! `build` command.

use std::process::ExitCode;

use anyhow::Result;

use crate::config::BuildConfig;
use crate::log;
use crate::pipeline::run_pipeline;

/// Run every stage and print the summary.
///
/// Failed stages are reported but only change the exit status in strict mode.
pub fn build(config: &BuildConfig) -> Result<ExitCode> {
    log!(
        "build";
        "{} -> {}",
        config.source.display(),
        config.output.display()
    );

    let report = run_pipeline(config)?;
    report.print();

    if report.is_complete() {
        log!("done"; "{}", report);
        return Ok(ExitCode::SUCCESS);
    }

    log!("error"; "{}", report);
    Ok(if config.strict {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
