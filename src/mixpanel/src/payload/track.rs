use rust_decimal::Decimal;

use crate::error::Result;
use crate::event::Alias;
use crate::event::Common;
use crate::event::Context;
use crate::event::Track;
use crate::payload::device_properties;
use crate::payload::format_traits;
use crate::payload::library_tag;
use crate::settings::Settings;
use crate::ua::UserAgentInfo;
use crate::value;
use crate::value::PropValue;
use crate::value::Props;

/// The primary event payload: `{event, properties}` with the full
/// semantic property set merged in.
pub fn event_payload(
    track: &Track,
    ua: Option<&UserAgentInfo>,
    settings: &Settings,
) -> Result<Props> {
    let mut payload = Props::new();
    payload.insert("event".to_string(), PropValue::from(track.event.as_str()));
    payload.insert(
        "properties".to_string(),
        PropValue::Object(format_properties(track, ua, settings)?),
    );
    Ok(payload)
}

fn format_properties(
    track: &Track,
    ua: Option<&UserAgentInfo>,
    settings: &Settings,
) -> Result<Props> {
    let common = &track.common;
    let context = &common.context;
    let mut props = track.properties.clone();

    // grab values that come back under reserved names, then drop the
    // stale originals
    let username = props.get("username").cloned();
    let search_engine = props.get("searchEngine").cloned();
    let referrer = context
        .page
        .as_ref()
        .and_then(|p| p.referrer.clone())
        .map(PropValue::String)
        .or_else(|| props.get("referrer").cloned());
    props.remove("username");
    props.remove("searchEngine");
    props.remove("referrer");

    if let Some(id) = common.distinct_id() {
        props.insert("distinct_id".to_string(), PropValue::from(id));
    }
    if let Some(ip) = &context.ip {
        props.insert("ip".to_string(), PropValue::from(ip.as_str()));
    }
    props.insert("token".to_string(), PropValue::from(settings.token.as_str()));
    props.insert(
        "time".to_string(),
        PropValue::Number(Decimal::from(common.timestamp().timestamp())),
    );
    props.insert("mp_lib".to_string(), PropValue::String(library_tag(context)));

    if let Some(campaign) = &context.campaign {
        let utm = [
            ("utm_campaign", &campaign.name),
            ("utm_source", &campaign.source),
            ("utm_medium", &campaign.medium),
            ("utm_term", &campaign.term),
            ("utm_content", &campaign.content),
        ];
        for (key, value) in utm {
            if let Some(v) = value {
                props.insert(key.to_string(), PropValue::from(v.as_str()));
            }
        }
    }

    if let Some(v) = username {
        props.insert("$username".to_string(), v);
    }
    if let Some(v) = search_engine {
        props.insert("$search_engine".to_string(), v);
    }
    if let Some(v) = referrer {
        props.insert("$referrer".to_string(), v);
    }

    for (k, v) in device_properties(context, ua) {
        props.insert(k, v);
    }

    if let Some(tag) = name_tag(common) {
        props.insert("mp_name_tag".to_string(), PropValue::String(tag));
    }

    for (k, v) in super_properties(context, settings)? {
        props.insert(k, v);
    }

    value::strip_nulls(&mut props);
    value::stringify_nested(&mut props)?;
    Ok(props)
}

/// Identify traits carried on the event context, formatted like people
/// traits and merged onto every event call.
pub fn super_properties(context: &Context, settings: &Settings) -> Result<Props> {
    let traits = format_traits(&context.traits, settings)?;
    if !settings.legacy_super_properties {
        return Ok(traits);
    }
    Ok(traits
        .into_iter()
        .map(|(k, v)| {
            if k.starts_with('$') {
                (k, v)
            } else {
                (format!("${k}"), v)
            }
        })
        .collect())
}

/// Profile name shown next to the event, first non-empty of: trait name,
/// trait email, userId, anonymousId.
fn name_tag(common: &Common) -> Option<String> {
    let context = &common.context;
    context
        .trait_name()
        .or_else(|| context.trait_email().map(str::to_string))
        .or_else(|| common.distinct_id().map(str::to_string))
}

/// A `$create_alias` call against the event endpoint.
pub fn alias_payload(alias: &Alias, settings: &Settings) -> Props {
    let mut inner = Props::new();
    inner.insert(
        "distinct_id".to_string(),
        PropValue::from(alias.previous_id.as_str()),
    );
    if let Some(id) = alias.common.distinct_id() {
        inner.insert("alias".to_string(), PropValue::from(id));
    }
    inner.insert("token".to_string(), PropValue::from(settings.token.as_str()));

    let mut payload = Props::new();
    payload.insert("event".to_string(), PropValue::from("$create_alias"));
    payload.insert("properties".to_string(), PropValue::Object(inner));
    payload
}
