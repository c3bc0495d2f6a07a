//! Serialisable session records. Building one is pure; storing it is the caller's job.

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::qc::QualityFlags;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRecord {
    pub id: String,
    pub task: String,
    pub created_at: String,
    pub metrics: serde_json::Value,
    pub qc: QualityFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SummaryRecord {
    pub fn new(task: &str, metrics: serde_json::Value, qc: QualityFlags) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task: task.to_string(),
            created_at: now_rfc3339(),
            metrics,
            qc,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn created_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.created_at, &Rfc3339).ok()
    }

    /// Decode the stored metrics back into a task's metrics type.
    pub fn metrics_as<M>(&self) -> Option<M>
    where
        M: for<'de> Deserialize<'de>,
    {
        serde_json::from_value(self.metrics.clone()).ok()
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_record_has_id_and_parseable_timestamp() {
        let record = SummaryRecord::new("stroop", json!({ "inhibition_score": 91 }), QualityFlags::pristine());
        assert_eq!(record.task, "stroop");
        assert!(uuid::Uuid::parse_str(&record.id).is_ok());
        assert!(record.created_at().is_some());
        assert!(record.notes.is_none());
    }

    #[test]
    fn notes_are_skipped_when_absent() {
        let record = SummaryRecord::new("nback", json!({}), QualityFlags::pristine());
        let encoded = serde_json::to_value(&record).unwrap();
        assert!(encoded.get("notes").is_none());

        let annotated = record.with_notes("practice run");
        let encoded = serde_json::to_value(&annotated).unwrap();
        assert_eq!(encoded["notes"], "practice run");
    }
}
