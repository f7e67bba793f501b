use serde::{Deserialize, Serialize};

use crate::record::AttendanceRecord;

/// Scopes a subscription to one lecture session. The filter is only active
/// when all three fields are set; otherwise every record passes.
#[derive(Debug, Serialize, Deserialize, Clone, Default, Eq, PartialEq)]
pub struct SessionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecture_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl SessionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lecture_name(mut self, lecture_name: impl Into<String>) -> Self {
        self.lecture_name = Some(lecture_name.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.lecture_name.is_some() && self.date.is_some() && self.time.is_some()
    }

    /// Accept iff the filter is inactive or all three fields match exactly.
    pub fn accepts(&self, record: &AttendanceRecord) -> bool {
        match (&self.lecture_name, &self.date, &self.time) {
            (Some(lecture_name), Some(date), Some(time)) => {
                *lecture_name == record.lecture_name
                    && *date == record.date
                    && *time == record.time
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionFilter;
    use crate::record::AttendanceRecord;

    fn record() -> AttendanceRecord {
        AttendanceRecord::new("Ana", "7", "Algorithms101", "2024-05-01", "10:00")
    }

    fn session() -> SessionFilter {
        SessionFilter::new()
            .lecture_name("Algorithms101")
            .date("2024-05-01")
            .time("10:00")
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = SessionFilter::new();
        assert!(!filter.is_active());
        assert!(filter.accepts(&record()));
    }

    #[test]
    fn partial_filter_is_inactive_and_accepts() {
        let filter = SessionFilter::new()
            .lecture_name("Algorithms101")
            .date("2024-05-01");
        assert!(!filter.is_active());

        let mut other_lecture = record();
        other_lecture.lecture_name = "Databases202".to_string();
        assert!(filter.accepts(&other_lecture));
    }

    #[test]
    fn full_match_accepted() {
        assert!(session().accepts(&record()));
    }

    #[test]
    fn any_single_mismatch_rejected() {
        let filter = session();

        let mut wrong_lecture = record();
        wrong_lecture.lecture_name = "Databases202".to_string();
        assert!(!filter.accepts(&wrong_lecture));

        let mut wrong_date = record();
        wrong_date.date = "2024-05-02".to_string();
        assert!(!filter.accepts(&wrong_date));

        let mut wrong_time = record();
        wrong_time.time = "11:00".to_string();
        assert!(!filter.accepts(&wrong_time));
    }
}
