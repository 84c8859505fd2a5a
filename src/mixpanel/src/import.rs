use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

/// Events older than this must go through the historical-import
/// endpoint and require an access key.
pub fn import_horizon() -> Duration {
    Duration::days(5)
}

/// True when the event is too old for the real-time endpoint.
pub fn should_import(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - timestamp > import_horizon()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_exclusive() {
        let now = Utc::now();
        let horizon = import_horizon();

        assert!(!should_import(now - horizon + Duration::seconds(1), now));
        assert!(should_import(now - horizon - Duration::seconds(1), now));
        assert!(!should_import(now, now));
        // future timestamps stay on the real-time endpoint
        assert!(!should_import(now + Duration::days(30), now));
    }
}
