use chrono::DateTime;
use chrono::Utc;

use crate::error::Result;
use crate::event::Common;
use crate::event::Context;
use crate::settings::Settings;
use crate::ua::UserAgentInfo;
use crate::value;
use crate::value::PropValue;
use crate::value::Props;

pub mod identify;
pub mod page;
pub mod people;
pub mod track;

/// Generic trait names and the reserved Mixpanel property each one maps
/// to. Process-wide immutable data.
pub const TRAIT_ALIASES: &[(&str, &str)] = &[
    ("firstName", "$first_name"),
    ("lastName", "$last_name"),
    ("email", "$email"),
    ("phone", "$phone"),
    ("username", "$username"),
    ("created", "$created"),
    ("createdAt", "$created"),
    ("name", "$name"),
    ("token", "trait_token"),
];

/// Key form used for duplicate detection: characters outside
/// `[A-Za-z0-9.$]` are stripped and the rest lowercased, so `firstName`,
/// `first_name` and `first name` all collide.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '$')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Date rendering used everywhere a date travels as a profile value.
pub fn format_date(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub fn library_tag(context: &Context) -> String {
    format!("Segment: {}", context.library_name())
}

/// Applies the alias table to a raw trait set: reserved names are
/// written, every generic spelling is deleted, `$created` is rendered as
/// a date string, nested values are stringified and the allow-list
/// filter is applied last.
pub fn format_traits(raw: &Props, settings: &Settings) -> Result<Props> {
    let mut out = raw.clone();

    for (from, to) in TRAIT_ALIASES {
        let from_norm = normalize_key(from);
        let found = out
            .iter()
            .find(|(k, _)| normalize_key(k) == from_norm)
            .map(|(_, v)| v.clone());
        if let Some(v) = found {
            out.insert(to.to_string(), v);
        }
        out.retain(|k, _| normalize_key(k) != from_norm);
    }

    if let Some(created) = out.get("$created").and_then(|v| v.as_date()) {
        out.insert("$created".to_string(), PropValue::String(format_date(created)));
    }

    value::stringify_nested(&mut out)?;

    if !settings.set_all_traits_by_default {
        let mut allowed: Vec<String> = settings
            .people_properties
            .iter()
            .map(|p| normalize_key(p))
            .collect();
        for (from, to) in TRAIT_ALIASES {
            if allowed.contains(&normalize_key(from)) {
                allowed.push(normalize_key(to));
            }
        }
        out.retain(|k, _| allowed.contains(&normalize_key(k)));
    }

    Ok(out)
}

/// Browser, OS and mobile facts merged into traits and event properties.
pub fn device_properties(context: &Context, ua: Option<&UserAgentInfo>) -> Props {
    let mut out = Props::new();

    if let Some(ua) = ua {
        if let Some(v) = &ua.browser_name {
            out.insert("$browser".to_string(), PropValue::from(v.as_str()));
        }
        if let Some(v) = &ua.browser_version {
            out.insert("$browser_version".to_string(), PropValue::from(v.as_str()));
        }
    }

    // the mobile context wins over the parsed user agent for OS facts
    let os_name = context
        .os
        .as_ref()
        .and_then(|os| os.name.clone())
        .or_else(|| ua.and_then(|ua| ua.os_name.clone()));
    if let Some(v) = os_name {
        out.insert("$os".to_string(), PropValue::String(v));
    }
    let os_version = context
        .os
        .as_ref()
        .and_then(|os| os.version.clone())
        .or_else(|| ua.and_then(|ua| ua.os_version.clone()));
    if let Some(v) = os_version {
        out.insert("$os_version".to_string(), PropValue::String(v));
    }

    if let Some(device) = &context.device {
        if let Some(v) = &device.manufacturer {
            out.insert("$manufacturer".to_string(), PropValue::from(v.as_str()));
        }
        if let Some(v) = &device.model {
            out.insert("$model".to_string(), PropValue::from(v.as_str()));
        }
        if let Some(v) = &device.brand {
            out.insert("$brand".to_string(), PropValue::from(v.as_str()));
        }
    }
    if let Some(network) = &context.network {
        if let Some(v) = &network.carrier {
            out.insert("$carrier".to_string(), PropValue::from(v.as_str()));
        }
        if let Some(v) = network.wifi {
            out.insert("$wifi".to_string(), PropValue::from(v));
        }
    }
    if let Some(screen) = &context.screen {
        if let Some(v) = screen.width {
            out.insert("$screen_width".to_string(), PropValue::from(v));
        }
        if let Some(v) = screen.height {
            out.insert("$screen_height".to_string(), PropValue::from(v));
        }
    }
    if let Some(app) = &context.app {
        if let Some(v) = &app.version {
            out.insert("$app_version".to_string(), PropValue::from(v.as_str()));
        }
    }

    out
}

/// Minimal engage payload shared by increment and union calls.
pub fn profile_skeleton(common: &Common, settings: &Settings) -> Props {
    let mut payload = Props::new();
    if let Some(id) = common.distinct_id() {
        payload.insert("$distinct_id".to_string(), PropValue::from(id));
    }
    payload.insert("$token".to_string(), PropValue::from(settings.token.as_str()));
    payload.insert("mp_lib".to_string(), PropValue::String(library_tag(&common.context)));
    payload
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn traits(json: &str) -> Props {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn every_alias_is_renamed_and_generic_key_removed() {
        let raw = traits(
            r#"{
                "firstName": "Jo", "lastName": "Dell", "email": "jo@dell.com",
                "phone": "555", "username": "jodell", "created": "2020-01-02T03:04:05Z",
                "name": "Jo Dell", "token": "secret"
            }"#,
        );
        let out = format_traits(&raw, &Settings::with_token("tok")).unwrap();

        for (from, to) in TRAIT_ALIASES {
            assert!(!out.contains_key(*from), "generic key {from} left behind");
            if *from != "createdAt" {
                assert!(out.contains_key(*to), "missing aliased key {to}");
            }
        }
        assert_eq!(out["$first_name"].as_str(), Some("Jo"));
        assert_eq!(out["trait_token"].as_str(), Some("secret"));
    }

    #[test]
    fn deletion_is_path_normalized() {
        let raw = traits(r#"{"first_name": "Jo", "Email": "jo@dell.com"}"#);
        let out = format_traits(&raw, &Settings::with_token("tok")).unwrap();

        assert!(!out.contains_key("first_name"));
        assert!(!out.contains_key("Email"));
        assert_eq!(out["$first_name"].as_str(), Some("Jo"));
        assert_eq!(out["$email"].as_str(), Some("jo@dell.com"));
    }

    #[test]
    fn created_is_rendered_as_date_string() {
        let raw = traits(r#"{"createdAt": "2020-01-02T03:04:05Z"}"#);
        let out = format_traits(&raw, &Settings::with_token("tok")).unwrap();
        assert_eq!(out["$created"].as_str(), Some("2020-01-02T03:04:05"));
    }

    #[test]
    fn nested_traits_are_stringified_one_level() {
        let raw = traits(r#"{"plan": {"tier": "pro"}}"#);
        let out = format_traits(&raw, &Settings::with_token("tok")).unwrap();
        assert_eq!(out["plan"].as_str(), Some(r#"{"tier":"pro"}"#));
    }

    #[test]
    fn allow_list_filters_after_alias_resolution() {
        let raw = traits(r#"{"email": "jo@dell.com", "plan": "pro", "seats": 4}"#);
        let mut settings = Settings::with_token("tok");
        settings.set_all_traits_by_default = false;
        settings.people_properties = vec!["Email".to_string(), "plan".to_string()];

        let out = format_traits(&raw, &settings).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.contains_key("$email"));
        assert!(out.contains_key("plan"));
        assert!(!out.contains_key("seats"));
    }

    #[test]
    fn format_date_is_second_precision() {
        let dt = Utc.with_ymd_and_hms(2021, 7, 8, 9, 10, 11).unwrap();
        assert_eq!(format_date(dt), "2021-07-08T09:10:11");
    }
}
