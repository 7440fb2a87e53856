// src/utils/report.rs

use chrono::{FixedOffset, Utc};

use crate::{error::AppError, models::submission::Submission};

pub const CSV_HEADER: [&str; 4] = ["Name", "Telegram", "Score", "Date"];

/// Formats epoch milliseconds as `dd.mm.yyyy, HH:MM:SS` in the given offset.
pub fn format_local_datetime(millis: i64, offset: FixedOffset) -> String {
    chrono::DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| {
            dt.with_timezone(&offset)
                .format("%d.%m.%Y, %H:%M:%S")
                .to_string()
        })
        .unwrap_or_default()
}

/// Renders submissions as CSV in the order given.
pub fn export_csv(submissions: &[Submission], offset: FixedOffset) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let write_err = |e: csv::Error| AppError::InternalServerError(e.to_string());

    writer.write_record(CSV_HEADER).map_err(write_err)?;
    for s in submissions {
        let score = format!("{}/{}", s.score, s.total_questions);
        let date = format_local_datetime(s.submitted_at, offset);
        writer
            .write_record([
                s.student_name.as_str(),
                s.telegram_handle.as_str(),
                score.as_str(),
                date.as_str(),
            ])
            .map_err(write_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::InternalServerError(e.to_string()))
}
