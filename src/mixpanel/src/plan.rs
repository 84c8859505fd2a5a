use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::MixpanelError;
use crate::error::Result;
use crate::event::Alias;
use crate::event::Group;
use crate::event::Identify;
use crate::event::PageView;
use crate::event::Surface;
use crate::event::Track;
use crate::import;
use crate::payload::identify as identify_payload;
use crate::payload::page;
use crate::payload::people;
use crate::payload::track as track_payload;
use crate::settings::Settings;
use crate::ua::UserAgentInfo;
use crate::value::Props;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Real-time event ingestion.
    Track,
    /// Historical import for events older than the horizon.
    Import,
    /// People-profile updates.
    Engage,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Track => "/track",
            Endpoint::Import => "/import",
            Endpoint::Engage => "/engage",
        }
    }
}

/// One HTTP call of an operation. Steps run in order; the first failure
/// aborts whatever comes after it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestStep {
    pub endpoint: Endpoint,
    pub payload: Props,
    /// Attach the destination access key to the query string.
    pub with_api_key: bool,
}

impl RequestStep {
    fn engage(payload: Props) -> Self {
        RequestStep {
            endpoint: Endpoint::Engage,
            payload,
            with_api_key: false,
        }
    }
}

/// Identify fans out to a `$set` call and, when a push token is around,
/// a `$union` device call. People support off means no calls at all.
pub fn identify_plan(
    identify: &Identify,
    ua: Option<&UserAgentInfo>,
    settings: &Settings,
) -> Result<Vec<RequestStep>> {
    if !settings.people {
        debug!("people support disabled, planning no identify calls");
        return Ok(Vec::new());
    }

    let mut steps = vec![RequestStep::engage(identify_payload::set_payload(
        identify, ua, settings,
    )?)];
    if let Some(payload) = identify_payload::union_devices_payload(identify, settings) {
        steps.push(RequestStep::engage(payload));
    }
    Ok(steps)
}

/// Track fans out to at most three calls: counter increments, the
/// primary event post and a revenue append.
pub fn track_plan(
    track: &Track,
    ua: Option<&UserAgentInfo>,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<Vec<RequestStep>> {
    let mut steps = Vec::new();

    if settings.people
        && settings.increments_event(&track.event)
        && track.common.distinct_id().is_some()
    {
        let (add, set) = people::increment_payloads(track, settings);
        steps.push(RequestStep::engage(add));
        steps.push(RequestStep::engage(set));
    }

    let historical = import::should_import(track.common.timestamp(), now);
    steps.push(RequestStep {
        endpoint: if historical {
            Endpoint::Import
        } else {
            Endpoint::Track
        },
        payload: track_payload::event_payload(track, ua, settings)?,
        with_api_key: historical,
    });

    if let Some(revenue) = track.revenue().filter(|r| *r != Decimal::ZERO) {
        steps.push(RequestStep::engage(people::revenue_payload(
            track, revenue, settings,
        )));
    }

    debug!(
        event = track.event.as_str(),
        steps = steps.len(),
        historical,
        "planned track calls"
    );
    Ok(steps)
}

/// Every page/screen call the settings ask for, each dispatched like a
/// plain track call.
pub fn page_plan(
    view: &PageView,
    surface: Surface,
    ua: Option<&UserAgentInfo>,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<Vec<RequestStep>> {
    let mut steps = Vec::new();
    for track in page::track_events(view, surface, settings) {
        steps.extend(track_plan(&track, ua, settings, now)?);
    }
    Ok(steps)
}

/// A `$create_alias` call is pointless without a new id to alias to, so
/// a missing user id fails before anything is issued.
pub fn alias_plan(alias: &Alias, settings: &Settings) -> Result<Vec<RequestStep>> {
    if alias.common.distinct_id().is_none() {
        return Err(MixpanelError::InvalidConfiguration(
            "alias requires a userId or anonymousId".to_string(),
        ));
    }
    Ok(vec![RequestStep {
        endpoint: Endpoint::Track,
        payload: track_payload::alias_payload(alias, settings),
        with_api_key: true,
    }])
}

/// Group is two dependent engage calls: the group profile upsert, then
/// the user-profile union. The driver's ordering gives step two its
/// dependency on step one.
pub fn group_plan(group: &Group, settings: &Settings) -> Result<Vec<RequestStep>> {
    Ok(vec![
        RequestStep::engage(people::group_set_payload(group, settings)?),
        RequestStep::engage(people::group_union_payload(group, settings)),
    ])
}
