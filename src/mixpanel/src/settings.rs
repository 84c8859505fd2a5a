use serde::Deserialize;

/// Per-destination settings handed down with every event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Mixpanel project token. Required.
    pub token: String,
    /// Access key, required for historical imports and aliases.
    pub api_key: Option<String>,
    /// Enables people-profile side calls.
    pub people: bool,
    /// Event names that bump a per-profile counter.
    pub increments: Vec<String>,
    /// Allow-list of trait keys sent to people profiles.
    pub people_properties: Vec<String>,
    /// Bypasses the allow-list above.
    pub set_all_traits_by_default: bool,
    /// Compatibility toggle: prefix super-property keys with `$`.
    pub legacy_super_properties: bool,
    pub track_all_pages: bool,
    pub track_categorized_pages: bool,
    pub track_named_pages: bool,
    pub consolidated_page_calls: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            token: String::new(),
            api_key: None,
            people: false,
            increments: Vec::new(),
            people_properties: Vec::new(),
            set_all_traits_by_default: true,
            legacy_super_properties: false,
            track_all_pages: false,
            track_categorized_pages: true,
            track_named_pages: true,
            consolidated_page_calls: false,
        }
    }
}

impl Settings {
    pub fn with_token(token: &str) -> Self {
        Settings {
            token: token.to_string(),
            ..Default::default()
        }
    }

    /// Case-insensitive membership in the increments list.
    pub fn increments_event(&self, event: &str) -> bool {
        crate::value::lowercase_all(&self.increments).contains(&event.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{"token": "tok", "people": true, "increments": ["Logged In"]}"#,
        )
        .unwrap();
        assert_eq!(settings.token, "tok");
        assert!(settings.people);
        assert!(settings.set_all_traits_by_default);
        assert!(settings.track_named_pages);
        assert!(!settings.consolidated_page_calls);
    }

    #[test]
    fn increments_match_is_case_insensitive() {
        let mut settings = Settings::with_token("tok");
        settings.increments = vec!["logged in".to_string()];
        assert!(settings.increments_event("Logged In"));
        assert!(!settings.increments_event("Signed Up"));
    }
}
