use uaparser::Parser;
use uaparser::UserAgentParser;

/// Browser and OS facts extracted from a raw user-agent string. The
/// parser itself is a black box; payload builders only see this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
}

pub fn parse(parser: &UserAgentParser, ua: &str) -> UserAgentInfo {
    let client = parser.parse(ua);

    let browser_name = Some(client.user_agent.family.to_string());
    let browser_version = join_version(&[
        client.user_agent.major.as_deref(),
        client.user_agent.minor.as_deref(),
        client.user_agent.patch.as_deref(),
    ]);
    let os_name = Some(client.os.family.to_string());
    let os_version = join_version(&[
        client.os.major.as_deref(),
        client.os.minor.as_deref(),
        client.os.patch.as_deref(),
        client.os.patch_minor.as_deref(),
    ]);

    UserAgentInfo {
        browser_name,
        browser_version,
        os_name,
        os_version,
    }
}

/// Joins dotted version segments up to the first missing one.
fn join_version(segments: &[Option<&str>]) -> Option<String> {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Some(v) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(v);
            }
            None => break,
        }
    }
    if out.is_empty() { None } else { Some(out) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_version_stops_at_gap() {
        assert_eq!(
            join_version(&[Some("10"), Some("11"), None, Some("2")]),
            Some("10.11".to_string())
        );
        assert_eq!(join_version(&[None]), None);
    }
}
