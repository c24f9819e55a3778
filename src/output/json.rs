//! JSON serialization for benchmark reports.

use crate::result::BenchReport;

/// Serialize a BenchReport to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for BenchReport).
pub fn to_json(report: &BenchReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a BenchReport to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for BenchReport).
pub fn to_json_pretty(report: &BenchReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::result::SyncReport;
    use crate::statistics::StatsResult;
    use crate::sync::SyncKind;

    fn make_report() -> BenchReport {
        let stats = StatsResult {
            mean: Duration::from_micros(120),
            std_dev_us: 2.5,
            outliers: 1,
        };
        BenchReport {
            num_images: 4,
            timer_resolution_ns: 30,
            sync: vec![SyncReport {
                kind: SyncKind::Critical,
                neighbours: 1,
                reference: stats,
                real: stats,
                sync_time_us: 0.0,
                error_us: 9.8,
                per_sync_us: 0.0,
                per_sync_error_us: 0.049,
            }],
            ..BenchReport::default()
        }
    }

    #[test]
    fn test_json_serialization() {
        let json = to_json(&make_report()).unwrap();
        assert!(json.contains("\"num_images\":4"));
        assert!(json.contains("\"Critical\""));
    }

    #[test]
    fn test_json_roundtrip() {
        let json = to_json_pretty(&make_report()).unwrap();
        let parsed: BenchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.num_images, 4);
        assert_eq!(parsed.sync[0].kind, SyncKind::Critical);
        assert_eq!(parsed.sync[0].real.mean, Duration::from_micros(120));
    }
}
