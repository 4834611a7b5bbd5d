use chrono::NaiveDate;
use grantlens_core::{AppError, AppResult};
use grantlens_domain::{REPORT_HEADER, ReportRow};

/// Renders the report rows as a CSV byte stream with the fixed header row.
/// The header is written even when there are no rows.
pub(super) fn render_report(report_rows: &[ReportRow]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(REPORT_HEADER)
        .map_err(|error| AppError::Internal(format!("failed to write report header: {error}")))?;
    for row in report_rows {
        writer
            .write_record(row.cells())
            .map_err(|error| AppError::Internal(format!("failed to write report row: {error}")))?;
    }

    writer
        .into_inner()
        .map_err(|error| AppError::Internal(format!("failed to finish report file: {error}")))
}

/// Date-stamped name of the report artifact.
pub(super) fn report_file_name(date: NaiveDate) -> String {
    format!("access-report-{}.csv", date.format("%Y%m%d"))
}

/// Body of the completion notification.
pub(super) fn notification_body(location: &str) -> String {
    format!(
        "Analysis of users and their granted permission policies has completed. \
         The report is stored at '{location}'."
    )
}
