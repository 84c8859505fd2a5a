use rust_decimal::Decimal;

use crate::error::Result;
use crate::event::Common;
use crate::event::Identify;
use crate::payload::device_properties;
use crate::payload::format_traits;
use crate::payload::library_tag;
use crate::settings::Settings;
use crate::ua::UserAgentInfo;
use crate::value::PropValue;
use crate::value::Props;

/// Fields shared by every engage call made for one identify event.
pub fn engage_base(common: &Common, settings: &Settings) -> Props {
    let context = &common.context;
    let ignore_ip = context.ignore_ip().unwrap_or(false);
    let ignore_time = context.ignore_time().unwrap_or(!common.active());

    let mut payload = Props::new();
    if let Some(id) = common.distinct_id() {
        payload.insert("$distinct_id".to_string(), PropValue::from(id));
    }
    payload.insert("$token".to_string(), PropValue::from(settings.token.as_str()));
    payload.insert(
        "$time".to_string(),
        PropValue::Number(Decimal::from(common.timestamp().timestamp_millis())),
    );
    let ip = match (&context.ip, ignore_ip) {
        (Some(ip), false) => PropValue::from(ip.as_str()),
        _ => PropValue::from(0),
    };
    payload.insert("$ip".to_string(), ip);
    payload.insert("$ignore_time".to_string(), PropValue::from(ignore_time));
    payload.insert("mp_lib".to_string(), PropValue::String(library_tag(context)));
    payload
}

/// The `$set` profile update: formatted traits plus derived device, OS
/// and browser facts.
pub fn set_payload(
    identify: &Identify,
    ua: Option<&UserAgentInfo>,
    settings: &Settings,
) -> Result<Props> {
    let mut traits = format_traits(&identify.traits, settings)?;
    for (k, v) in device_properties(&identify.common.context, ua) {
        traits.insert(k, v);
    }

    let mut payload = engage_base(&identify.common, settings);
    payload.insert("$set".to_string(), PropValue::Object(traits));
    Ok(payload)
}

/// Optional follow-up call registering the device push token.
pub fn union_devices_payload(identify: &Identify, settings: &Settings) -> Option<Props> {
    let token = identify
        .common
        .context
        .device
        .as_ref()
        .and_then(|d| d.token.clone())?;

    let mut union = Props::new();
    union.insert(
        "$ios_devices".to_string(),
        PropValue::List(vec![PropValue::String(token)]),
    );
    let mut payload = engage_base(&identify.common, settings);
    payload.insert("$union".to_string(), PropValue::Object(union));
    Some(payload)
}
