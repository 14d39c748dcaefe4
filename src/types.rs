// =============================================================================
// Shared types used across the market board
// =============================================================================

use serde::{Deserialize, Serialize};

/// Whether the published board reflects the latest successful live poll.
///
/// Starts at `None`; after the first fetch outcome it only ever moves between
/// `UpToDate` and `Outdated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessStatus {
    None,
    UpToDate,
    Outdated,
}

impl Default for FreshnessStatus {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for FreshnessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::UpToDate => write!(f, "up-to-date"),
            Self::Outdated => write!(f, "outdated"),
        }
    }
}

/// Exchange platform flag as reported by `GET /platform/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformStatus {
    Maintenance,
    Operative,
}

impl PlatformStatus {
    /// Map the numeric wire code (`0` / `1`) onto a status.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Maintenance),
            1 => Some(Self::Operative),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Maintenance => write!(f, "Maintenance"),
            Self::Operative => write!(f, "Operative"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_defaults_to_none() {
        assert_eq!(FreshnessStatus::default(), FreshnessStatus::None);
    }

    #[test]
    fn freshness_serialises_snake_case() {
        let json = serde_json::to_string(&FreshnessStatus::UpToDate).unwrap();
        assert_eq!(json, "\"up_to_date\"");
    }

    #[test]
    fn platform_status_codes() {
        assert_eq!(PlatformStatus::from_code(1), Some(PlatformStatus::Operative));
        assert_eq!(PlatformStatus::from_code(0), Some(PlatformStatus::Maintenance));
        assert_eq!(PlatformStatus::from_code(7), None);
    }
}
