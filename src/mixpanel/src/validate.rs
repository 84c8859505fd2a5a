use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::error::MixpanelError;
use crate::error::Result;
use crate::import;
use crate::settings::Settings;

/// Mixpanel drops events older than this outright.
pub fn max_age() -> Duration {
    Duration::days(365 * 5)
}

/// Pre-flight checks run before any network call. `historical_needs_key`
/// is set for the event types whose import routing demands an access
/// key (track and screen).
pub fn preflight(
    settings: &Settings,
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
    historical_needs_key: bool,
) -> Result<()> {
    if settings.token.is_empty() {
        return Err(MixpanelError::InvalidConfiguration(
            "token is a required setting".to_string(),
        ));
    }

    let age = now - timestamp;
    if age > max_age() {
        return Err(MixpanelError::InvalidConfiguration(format!(
            "event is older than 5 years ({} days) and would be rejected",
            age.num_days()
        )));
    }

    if historical_needs_key && settings.api_key.is_none() && import::should_import(timestamp, now)
    {
        return Err(MixpanelError::InvalidConfiguration(
            "apiKey is required to import events older than 5 days".to_string(),
        ));
    }

    Ok(())
}
