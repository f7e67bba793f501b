use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One attendance submission. All fields travel as text; `date` and `time`
/// are conventionally `YYYY-MM-DD` and `HH:MM` but are not validated.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct AttendanceRecord {
    pub student_name: String,
    pub roll_no: String,
    pub lecture_name: String,
    pub date: String,
    pub time: String,
}

impl AttendanceRecord {
    pub fn new(
        student_name: impl Into<String>,
        roll_no: impl Into<String>,
        lecture_name: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            student_name: student_name.into(),
            roll_no: roll_no.into(),
            lecture_name: lecture_name.into(),
            date: date.into(),
            time: time.into(),
        }
    }

    /// Deterministic record id: SHA-256 of the canonical field array,
    /// lowercase hex.
    pub fn id(&self) -> String {
        let canonical = serde_json::json!([
            self.student_name,
            self.roll_no,
            self.lecture_name,
            self.date,
            self.time,
        ])
        .to_string();

        let mut hasher = Sha256::new();
        hasher.update(canonical);
        hex::encode(hasher.finalize())
    }

    /// The one-line rendering used by attendance boards.
    pub fn board_line(&self) -> String {
        format!("{} ({})", self.student_name, self.roll_no)
    }
}
