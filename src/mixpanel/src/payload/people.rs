use rust_decimal::Decimal;

use crate::error::Result;
use crate::event::Group;
use crate::event::Track;
use crate::payload::format_date;
use crate::payload::format_traits;
use crate::payload::profile_skeleton;
use crate::settings::Settings;
use crate::value::PropValue;
use crate::value::Props;

/// Counter bump for an allow-listed event: one `$add` call and one
/// `$set` call recording when it last happened.
pub fn increment_payloads(track: &Track, settings: &Settings) -> (Props, Props) {
    let skeleton = profile_skeleton(&track.common, settings);

    let mut counter = Props::new();
    counter.insert(track.event.clone(), PropValue::from(1));
    let mut add = skeleton.clone();
    add.insert("$add".to_string(), PropValue::Object(counter));

    let mut last = Props::new();
    last.insert(
        format!("Last {}", track.event),
        PropValue::String(format_date(track.common.timestamp())),
    );
    let mut set = skeleton;
    set.insert("$set".to_string(), PropValue::Object(last));

    (add, set)
}

/// Transaction append for an event carrying revenue.
pub fn revenue_payload(track: &Track, revenue: Decimal, settings: &Settings) -> Props {
    let context = &track.common.context;
    // revenue calls suppress the ip unless an override says otherwise
    let ignore_ip = context.ignore_ip().unwrap_or(true);

    let mut transaction = Props::new();
    transaction.insert(
        "$time".to_string(),
        PropValue::String(format_date(track.common.timestamp())),
    );
    transaction.insert("$amount".to_string(), PropValue::Number(revenue));

    let mut append = Props::new();
    append.insert("$transactions".to_string(), PropValue::Object(transaction));

    let mut payload = Props::new();
    if let Some(id) = track.common.distinct_id() {
        payload.insert("$distinct_id".to_string(), PropValue::from(id));
    }
    payload.insert("$token".to_string(), PropValue::from(settings.token.as_str()));
    let ip = match (&context.ip, ignore_ip) {
        (Some(ip), false) => PropValue::from(ip.as_str()),
        _ => PropValue::from(0),
    };
    payload.insert("$ip".to_string(), ip);
    payload.insert("$append".to_string(), PropValue::Object(append));
    payload
}

/// Step one of a group call: upsert the synthetic group profile.
pub fn group_set_payload(group: &Group, settings: &Settings) -> Result<Props> {
    let mut traits = format_traits(&group.traits, settings)?;
    traits.insert("isGroup".to_string(), PropValue::from(true));

    let mut payload = Props::new();
    payload.insert("$token".to_string(), PropValue::from(settings.token.as_str()));
    payload.insert("$distinct_id".to_string(), PropValue::String(group.group_key()));
    // group profiles always update last-seen
    payload.insert("$ignore_time".to_string(), PropValue::from(false));
    payload.insert("$set".to_string(), PropValue::Object(traits));
    Ok(payload)
}

/// Step two: attach the group key to the originating user profile. Only
/// issued after step one succeeds.
pub fn group_union_payload(group: &Group, settings: &Settings) -> Props {
    let mut groups = Props::new();
    groups.insert(
        "groups".to_string(),
        PropValue::List(vec![PropValue::String(group.group_key())]),
    );

    let mut payload = Props::new();
    payload.insert("$token".to_string(), PropValue::from(settings.token.as_str()));
    if let Some(id) = group.common.distinct_id() {
        payload.insert("$distinct_id".to_string(), PropValue::from(id));
    }
    payload.insert("$union".to_string(), PropValue::Object(groups));
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase() -> Track {
        serde_json::from_str(
            r#"{"userId": "u1", "timestamp": "2024-03-04T05:06:07Z",
                "context": {"ip": "1.2.3.4"},
                "event": "Purchased", "properties": {"revenue": 9.99}}"#,
        )
        .unwrap()
    }

    #[test]
    fn increment_builds_add_and_last_set() {
        let track = purchase();
        let (add, set) = increment_payloads(&track, &Settings::with_token("tok"));

        assert_eq!(add["$distinct_id"].as_str(), Some("u1"));
        let counter = match &add["$add"] {
            PropValue::Object(c) => c,
            other => panic!("$add is not an object: {other:?}"),
        };
        assert_eq!(counter["Purchased"].as_number(), Some(Decimal::from(1)));

        let last = match &set["$set"] {
            PropValue::Object(l) => l,
            other => panic!("$set is not an object: {other:?}"),
        };
        assert_eq!(last["Last Purchased"].as_str(), Some("2024-03-04T05:06:07"));
    }

    #[test]
    fn revenue_suppresses_ip_by_default() {
        let track = purchase();
        let revenue = track.revenue().unwrap();
        let payload = revenue_payload(&track, revenue, &Settings::with_token("tok"));

        assert_eq!(payload["$ip"].as_number(), Some(Decimal::from(0)));
        let append = match &payload["$append"] {
            PropValue::Object(a) => a,
            other => panic!("$append is not an object: {other:?}"),
        };
        let transactions = match &append["$transactions"] {
            PropValue::Object(t) => t,
            other => panic!("$transactions is not an object: {other:?}"),
        };
        assert_eq!(transactions["$amount"].as_number().unwrap().to_string(), "9.99");
        assert_eq!(transactions["$time"].as_str(), Some("2024-03-04T05:06:07"));
    }

    #[test]
    fn revenue_keeps_ip_on_explicit_override() {
        let track: Track = serde_json::from_str(
            r#"{"userId": "u1", "timestamp": "2024-03-04T05:06:07Z",
                "context": {"ip": "1.2.3.4", "Mixpanel": {"ignoreIp": false}},
                "event": "Purchased", "properties": {"revenue": 9.99}}"#,
        )
        .unwrap();
        let payload = revenue_payload(&track, track.revenue().unwrap(), &Settings::with_token("tok"));
        assert_eq!(payload["$ip"].as_str(), Some("1.2.3.4"));
    }

    #[test]
    fn group_profile_renames_name_and_marks_group() {
        let group: Group = serde_json::from_str(
            r#"{"userId": "u1", "groupId": "acme",
                "traits": {"name": "Acme Inc", "plan": "enterprise"}}"#,
        )
        .unwrap();
        let payload = group_set_payload(&group, &Settings::with_token("tok")).unwrap();

        assert_eq!(payload["$distinct_id"].as_str(), Some("group.acme"));
        assert_eq!(payload["$ignore_time"], PropValue::Bool(false));
        let set = match &payload["$set"] {
            PropValue::Object(s) => s,
            other => panic!("$set is not an object: {other:?}"),
        };
        assert_eq!(set["$name"].as_str(), Some("Acme Inc"));
        assert!(!set.contains_key("name"));
        assert_eq!(set["isGroup"], PropValue::Bool(true));
        assert_eq!(set["plan"].as_str(), Some("enterprise"));
    }

    #[test]
    fn group_union_targets_the_user_profile() {
        let group: Group = serde_json::from_str(
            r#"{"userId": "u1", "groupId": "acme", "traits": {}}"#,
        )
        .unwrap();
        let payload = group_union_payload(&group, &Settings::with_token("tok"));

        assert_eq!(payload["$distinct_id"].as_str(), Some("u1"));
        let union = match &payload["$union"] {
            PropValue::Object(u) => u,
            other => panic!("$union is not an object: {other:?}"),
        };
        assert_eq!(
            union["groups"],
            PropValue::List(vec![PropValue::String("group.acme".to_string())])
        );
    }
}
