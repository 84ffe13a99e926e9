//! Advisory record models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dated recommendation shown to a farmer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryRecord {
    pub id: Uuid,
    pub farm_id: Uuid,
    /// Subject crop; the farm's first crop for farm-wide triggers
    pub crop_id: Uuid,
    pub advisory_type: AdvisoryType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: AdvisoryStatus,
    pub created_at: DateTime<Utc>,
}

/// An advisory produced by the generator, not yet persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAdvisory {
    pub farm_id: Uuid,
    pub crop_id: Uuid,
    pub advisory_type: AdvisoryType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: AdvisoryStatus,
}

impl NewAdvisory {
    pub fn new(
        farm_id: Uuid,
        crop_id: Uuid,
        advisory_type: AdvisoryType,
        priority: Priority,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            farm_id,
            crop_id,
            advisory_type,
            title: title.into(),
            description: description.into(),
            priority,
            status: AdvisoryStatus::Pending,
        }
    }
}

/// Kind of advisory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryType {
    Irrigation,
    Fertilizer,
    General,
}

/// Urgency of an advisory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Workflow state of an advisory; changed outside the advisory core
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryStatus {
    #[default]
    Pending,
    Applied,
    Dismissed,
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $label),+
                }
            }

            pub fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

text_enum!(AdvisoryType {
    Irrigation => "irrigation",
    Fertilizer => "fertilizer",
    General => "general",
});

text_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

text_enum!(AdvisoryStatus {
    Pending => "pending",
    Applied => "applied",
    Dismissed => "dismissed",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_advisory_starts_pending() {
        let advisory = NewAdvisory::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            AdvisoryType::General,
            Priority::Medium,
            "High Wind Warning",
            "Wind speed is 20.0 km/h.",
        );
        assert_eq!(advisory.status, AdvisoryStatus::Pending);
    }

    #[test]
    fn test_labels_round_trip() {
        for priority in [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent] {
            assert_eq!(Priority::from_label(priority.as_str()), Some(priority));
        }
        assert_eq!(AdvisoryType::from_label("pest_control"), None);
    }
}
