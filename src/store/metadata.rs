use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Version stamped into every metadata record.
pub const GENERATOR_VERSION: &str = "1.2.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub last_updated: String,
    pub total_regions: usize,
    pub generator_version: String,
}

impl RunMetadata {
    pub fn new(generated_at: &str, total_regions: usize) -> Self {
        RunMetadata {
            last_updated: generated_at.to_string(),
            total_regions,
            generator_version: GENERATOR_VERSION.to_string(),
        }
    }
}

/// RFC 3339 with microseconds and an explicit `+00:00` offset.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 5).unwrap();
        assert_eq!(format_timestamp(at), "2024-06-01T12:30:05.000000+00:00");
    }

    #[test]
    fn test_metadata_serialization() {
        let metadata = RunMetadata::new("2024-06-01T12:30:05.000000+00:00", 42);
        let json = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["last_updated"], "2024-06-01T12:30:05.000000+00:00");
        assert_eq!(json["total_regions"], 42);
        assert_eq!(json["generator_version"], "1.2.0");
    }
}
