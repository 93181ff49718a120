//! Site listings

use serde::Deserialize;
use serde_json::Value;

/// A site as listed by the controller, normalized across API shapes.
///
/// The session API lists `{"name": "default", "desc": "Default"}`, where
/// `name` is the identifier used in paths. The integration API lists
/// `{"id": "<uuid>", "name": "Default"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSummary {
    pub id: String,
    pub display_name: String,
}

#[derive(Deserialize)]
struct SessionSite {
    name: String,
    #[serde(default)]
    desc: Option<String>,
}

#[derive(Deserialize)]
struct IntegrationSite {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

impl SiteSummary {
    /// Normalize one listed site from either API shape.
    pub fn from_value(item: &Value) -> Option<Self> {
        if item.get("id").is_some() {
            let site: IntegrationSite = serde_json::from_value(item.clone()).ok()?;
            let display_name = site.name.unwrap_or_else(|| site.id.clone());
            return Some(Self {
                id: site.id,
                display_name,
            });
        }
        let site: SessionSite = serde_json::from_value(item.clone()).ok()?;
        let display_name = site.desc.unwrap_or_else(|| site.name.clone());
        Some(Self {
            id: site.name,
            display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_site() {
        let site = SiteSummary::from_value(&json!({"_id": "5f", "name": "default", "desc": "Default"}))
            .unwrap();
        assert_eq!(site.id, "default");
        assert_eq!(site.display_name, "Default");
    }

    #[test]
    fn test_integration_site() {
        let site = SiteSummary::from_value(&json!({
            "id": "88f7af54-98f8-306a-a1c7-c9349722b1f6",
            "name": "Main Office"
        }))
        .unwrap();
        assert_eq!(site.id, "88f7af54-98f8-306a-a1c7-c9349722b1f6");
        assert_eq!(site.display_name, "Main Office");
    }

    #[test]
    fn test_unrecognized_site() {
        assert!(SiteSummary::from_value(&json!({"foo": 1})).is_none());
    }
}
