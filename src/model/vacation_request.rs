use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::model::mysql_string_enum;

/// Lifecycle of a vacation request.
///
/// Requests start in `PendingSupervisor`; the supervisor stage moves them to
/// `PendingHr` or `RejectedBySupervisor`; the HR stage ends in `ApprovedByHr`
/// or `RejectedByHr`. The owner can cancel any request that is not yet in a
/// terminal state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    PendingSupervisor,
    /// Recorded by older rows; supervisor approval now moves straight to `PendingHr`.
    ApprovedBySupervisor,
    RejectedBySupervisor,
    PendingHr,
    ApprovedByHr,
    RejectedByHr,
    Cancelled,
}

mysql_string_enum!(RequestStatus);

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::ApprovedByHr
                | RequestStatus::RejectedBySupervisor
                | RequestStatus::RejectedByHr
                | RequestStatus::Cancelled
        )
    }

    /// Position along the workflow; transitions never decrease it.
    pub fn stage(self) -> u8 {
        match self {
            RequestStatus::PendingSupervisor => 0,
            RequestStatus::ApprovedBySupervisor => 1,
            RequestStatus::PendingHr => 2,
            RequestStatus::RejectedBySupervisor
            | RequestStatus::ApprovedByHr
            | RequestStatus::RejectedByHr
            | RequestStatus::Cancelled => 3,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VacationCategory {
    Normal,
    Extraordinary,
    Emergency,
}

mysql_string_enum!(VacationCategory);

/// One employee's request for a contiguous date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct VacationRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 12)]
    pub employee_id: u64,
    #[schema(example = "2026-11-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-11-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Days in the range, Sundays excluded
    #[schema(example = 6)]
    pub requested_days: u32,
    pub category: VacationCategory,
    #[schema(example = "Family trip")]
    pub reason: String,
    pub status: RequestStatus,

    /// Employee who took the supervisor decision
    #[schema(example = 7, nullable = true)]
    pub supervisor_id: Option<u64>,
    #[schema(nullable = true)]
    pub supervisor_comment: Option<String>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub supervisor_decided_at: Option<DateTime<Utc>>,

    /// HR employee who took the final decision
    #[schema(example = 3, nullable = true)]
    pub hr_id: Option<u64>,
    #[schema(nullable = true)]
    pub hr_comment: Option<String>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub hr_decided_at: Option<DateTime<Utc>>,

    #[schema(format = "date-time", value_type = Option<String>)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[schema(example = "2026-10-17T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

pub const VACATION_REQUEST_COLUMNS: &str = "id, employee_id, start_date, end_date, requested_days, \
     category, reason, status, supervisor_id, supervisor_comment, supervisor_decided_at, hr_id, \
     hr_comment, hr_decided_at, cancelled_at, created_at";

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_column_names() {
        assert_eq!(RequestStatus::PendingSupervisor.as_ref(), "PENDING_SUPERVISOR");
        assert_eq!(RequestStatus::ApprovedByHr.as_ref(), "APPROVED_BY_HR");
        assert_eq!(
            RequestStatus::from_str("REJECTED_BY_SUPERVISOR").unwrap(),
            RequestStatus::RejectedBySupervisor
        );
        assert!(RequestStatus::from_str("APROBADO_RH").is_err());
    }

    #[test]
    fn test_terminal_states_are_last_stage() {
        for status in RequestStatus::iter() {
            assert_eq!(status.is_terminal(), status.stage() == 3, "{status}");
        }
    }

    #[test]
    fn test_category_serde_and_column_forms() {
        assert_eq!(
            serde_json::to_string(&VacationCategory::Emergency).unwrap(),
            "\"emergency\""
        );
        assert_eq!(VacationCategory::Extraordinary.as_ref(), "EXTRAORDINARY");
        assert_eq!(
            VacationCategory::from_str("NORMAL").unwrap(),
            VacationCategory::Normal
        );
    }
}
