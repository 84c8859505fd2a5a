use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::value::PropValue;
use crate::value::Props;

/// Fields shared by every event variant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Common {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub anonymous_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub context: Context,
}

impl Common {
    /// The destination's primary key for a user profile: userId, else
    /// anonymousId. Empty strings do not count.
    pub fn distinct_id(&self) -> Option<&str> {
        non_empty(self.user_id.as_deref()).or_else(|| non_empty(self.anonymous_id.as_deref()))
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_else(Utc::now)
    }

    /// Whether this event should update the profile's last-seen marker.
    pub fn active(&self) -> bool {
        self.context.active.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Context {
    pub library: Option<Library>,
    pub device: Option<Device>,
    pub os: Option<Os>,
    pub app: Option<App>,
    pub network: Option<Network>,
    pub screen: Option<Screen>,
    pub campaign: Option<Campaign>,
    pub page: Option<PageInfo>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub active: Option<bool>,
    pub ignore_ip: Option<bool>,
    pub ignore_time: Option<bool>,
    pub traits: Props,
    #[serde(rename = "Mixpanel")]
    pub mixpanel: Option<Overrides>,
}

impl Context {
    pub fn library_name(&self) -> &str {
        self.library
            .as_ref()
            .map(|lib| lib.name.as_str())
            .unwrap_or("unknown")
    }

    /// Destination-specific override wins over the generic context flag.
    pub fn ignore_ip(&self) -> Option<bool> {
        self.mixpanel
            .as_ref()
            .and_then(|o| o.ignore_ip)
            .or(self.ignore_ip)
    }

    pub fn ignore_time(&self) -> Option<bool> {
        self.mixpanel
            .as_ref()
            .and_then(|o| o.ignore_time)
            .or(self.ignore_time)
    }

    pub fn trait_str(&self, key: &str) -> Option<&str> {
        self.traits.get(key).and_then(|v| v.as_str())
    }

    /// Display name from the attached identify traits: `name`, else
    /// first and last name joined.
    pub fn trait_name(&self) -> Option<String> {
        if let Some(name) = non_empty(self.trait_str("name")) {
            return Some(name.to_string());
        }
        match (
            non_empty(self.trait_str("firstName")),
            non_empty(self.trait_str("lastName")),
        ) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            _ => None,
        }
    }

    pub fn trait_email(&self) -> Option<&str> {
        non_empty(self.trait_str("email"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Device {
    pub token: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Os {
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct App {
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Network {
    pub carrier: Option<String>,
    pub wifi: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Screen {
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Campaign {
    pub name: Option<String>,
    pub source: Option<String>,
    pub medium: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInfo {
    pub path: Option<String>,
    pub referrer: Option<String>,
    pub search: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Per-destination context overrides, sent under `context.Mixpanel`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Overrides {
    pub ignore_ip: Option<bool>,
    pub ignore_time: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    #[serde(flatten)]
    pub common: Common,
    #[serde(default)]
    pub traits: Props,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(flatten)]
    pub common: Common,
    pub event: String,
    #[serde(default)]
    pub properties: Props,
}

impl Track {
    pub fn revenue(&self) -> Option<Decimal> {
        self.properties.get("revenue").and_then(|v| v.as_number())
    }
}

/// Page and screen calls share one body; the surface kind decides the
/// default event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Page,
    Screen,
}

impl Surface {
    pub fn noun(&self) -> &'static str {
        match self {
            Surface::Page => "Page",
            Surface::Screen => "Screen",
        }
    }

    pub fn generic_event(&self) -> &'static str {
        match self {
            Surface::Page => "Loaded a Page",
            Surface::Screen => "Loaded a Screen",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    #[serde(flatten)]
    pub common: Common,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub properties: Props,
}

impl PageView {
    pub fn name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    pub fn category(&self) -> Option<&str> {
        non_empty(self.category.as_deref())
    }

    pub fn full_name(&self) -> Option<String> {
        match (self.category(), self.name()) {
            (Some(category), Some(name)) => Some(format!("{category} {name}")),
            (Some(category), None) => Some(category.to_string()),
            (None, Some(name)) => Some(name.to_string()),
            (None, None) => None,
        }
    }

    /// The event name used when every page/screen call is tracked.
    pub fn default_event(&self, surface: Surface) -> String {
        match self.full_name() {
            Some(full) => format!("Viewed {full} {}", surface.noun()),
            None => surface.generic_event().to_string(),
        }
    }

    /// Rebuilds the view as a plain track call under the given name.
    pub fn to_track(&self, event: String) -> Track {
        let mut properties = self.properties.clone();
        if let Some(name) = self.name() {
            properties.insert("name".to_string(), PropValue::from(name));
        }
        if let Some(category) = self.category() {
            properties.insert("category".to_string(), PropValue::from(category));
        }
        Track {
            common: self.common.clone(),
            event,
            properties,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alias {
    #[serde(flatten)]
    pub common: Common,
    pub previous_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(flatten)]
    pub common: Common,
    pub group_id: String,
    #[serde(default)]
    pub traits: Props,
}

impl Group {
    /// Synthetic profile key for the group entity.
    pub fn group_key(&self) -> String {
        format!("group.{}", self.group_id)
    }
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.is_empty())
}
