//! Maps a submission object from the API into a notification text.
use serde_json::Value;

use crate::error::FieldError;
use crate::model::{HomeworkStatus, Submission};

fn non_empty_str<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Extract name and status from one element of the `homeworks` list.
pub fn parse_submission(homework: &Value) -> Result<Submission, FieldError> {
    let obj = homework.as_object().ok_or(FieldError::NotAnObject)?;
    let name = non_empty_str(obj, "homework_name").ok_or(FieldError::MissingName)?;
    let raw_status = non_empty_str(obj, "status").ok_or(FieldError::MissingStatus)?;
    let status = HomeworkStatus::parse(raw_status)
        .ok_or_else(|| FieldError::UnknownStatus(raw_status.to_string()))?;
    Ok(Submission {
        name: name.to_string(),
        status,
    })
}

/// Compose `Changed review status of "{name}". {verdict}` for a submission.
pub fn parse_status(homework: &Value) -> Result<String, FieldError> {
    parse_submission(homework).map(|submission| submission.message())
}
