//! Command: format the package files.
use anyhow::Result;

use crate::cli::{FormatOpts, GlobalOpts};
use crate::formatter::{FileOutcome, FileReport, PackageFormatOptions, format_package};
use crate::logging::{FileStatus, Logger};

/// Run the format command.
///
/// # Errors
///
/// Returns an error if the package cannot be loaded, a file fails to
/// format, or, with `--check`, a file is not formatted.
pub fn run(global: &GlobalOpts, opts: &FormatOpts, log: &Logger) -> Result<()> {
    let setup = super::CommandSetup::init(global, log)?;
    let settings = &setup.config.settings.format;
    let options = PackageFormatOptions {
        check: opts.check,
        parallel: global.parallel && settings.parallel,
        skip_dirs: settings.skip_dirs.clone(),
    };

    log.stage(if opts.check {
        "Checking formatting"
    } else {
        "Formatting files"
    });
    let reports = format_package(setup.root(), &options)?;
    log.info(&format!("{} files processed", reports.len()));
    record_reports(log, &reports, opts.check);
    log.print_summary();

    let failed = log.failure_count();
    if failed > 0 {
        anyhow::bail!("{failed} file(s) failed to format");
    }
    let pending = log.count(FileStatus::Reformatted);
    if pending > 0 {
        let paths: Vec<String> = reports
            .iter()
            .filter(|r| r.outcome == FileOutcome::Reformatted)
            .map(|r| r.path.display().to_string())
            .collect();
        anyhow::bail!(
            "{pending} file(s) are not formatted: {}",
            paths.join(", ")
        );
    }
    Ok(())
}

fn record_reports(log: &Logger, reports: &[FileReport], check: bool) {
    for report in reports {
        match &report.outcome {
            FileOutcome::Unchanged => {
                log.record_file(&report.path, FileStatus::Unchanged, None);
            }
            FileOutcome::Reformatted if check => {
                log.warn(&format!("{} is not formatted", report.path.display()));
                log.record_file(&report.path, FileStatus::Reformatted, None);
            }
            FileOutcome::Reformatted => {
                log.debug(&format!("formatted {}", report.path.display()));
                log.record_file(&report.path, FileStatus::Written, None);
            }
            FileOutcome::Failed(message) => {
                log.error(&format!("{}: {message}", report.path.display()));
                log.record_file(&report.path, FileStatus::Failed, Some(message));
            }
        }
    }
}
