use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prefs::Preferences;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed: body is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("feed: {0}")]
    Shape(&'static str),
}

/// Declared content type of a link. Unknown or absent `type` strings decode
/// to `Plain`; inferring a type from the source's extension is the
/// presenter's job, not the decoder's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Youtube,
    Image,
    Iframe,
    Redirect,
    #[default]
    #[serde(other)]
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: LinkType,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_number: Option<i64>,
}

/// Links sharing one date label, in the order the server listed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateGroup {
    pub date: String,
    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

#[derive(Debug, Clone)]
pub struct Feed {
    pub groups: Vec<DateGroup>,
    pub fetched_at: DateTime<Utc>,
}

/// Holds the last successfully loaded feed so preference toggles can
/// re-filter without another fetch.
#[derive(Debug, Default)]
pub struct FeedStore {
    current: Option<Feed>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a fetched body and replaces the cached feed wholesale. A body
    /// that is not a JSON array of date-group objects is rejected and the
    /// previously loaded feed stays untouched.
    pub fn load(&mut self, raw: &str) -> Result<&Feed, FeedError> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(FeedError::Json)?;
        let items = match value {
            serde_json::Value::Array(items) => items,
            _ => return Err(FeedError::Shape("expected an array of date groups")),
        };
        let groups = items
            .into_iter()
            .map(|item| serde_json::from_value::<DateGroup>(item).map_err(FeedError::Json))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.current.insert(Feed {
            groups,
            fetched_at: Utc::now(),
        }))
    }

    pub fn feed(&self) -> Option<&Feed> {
        self.current.as_ref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.current.as_ref().map(|feed| feed.fetched_at)
    }

    /// Filtered view of the cached feed. Groups keep their position even
    /// when every link in them is filtered out; the date header still
    /// renders with zero items.
    pub fn visible_groups(&self, prefs: &Preferences) -> Vec<DateGroup> {
        let Some(feed) = self.current.as_ref() else {
            return Vec::new();
        };
        feed.groups
            .iter()
            .map(|group| DateGroup {
                date: group.date.clone(),
                links: group
                    .links
                    .iter()
                    .filter(|link| !(prefs.hide_nsfw && link.nsfw))
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> &'static str {
        r#"[
            {"date": "Idag", "links": [
                {"title": "Cat picture", "type": "image", "src": "https://example.com/cat.png", "icon": "Bild", "nsfw": false},
                {"title": "Late night", "type": "redirect", "src": "https://example.com/adult", "icon": "Hemsida", "nsfw": true}
            ]},
            {"date": "2026-08-29", "links": [
                {"title": "Only for grownups", "type": "iframe", "src": "https://example.com/x", "icon": "Hemsida", "nsfw": true, "comment_url": "t/123", "comment_number": 7}
            ]}
        ]"#
    }

    #[test]
    fn load_keeps_server_order() {
        let mut store = FeedStore::new();
        let feed = store.load(sample_body()).unwrap();
        assert_eq!(feed.groups.len(), 2);
        assert_eq!(feed.groups[0].date, "Idag");
        assert_eq!(feed.groups[0].links[0].title, "Cat picture");
        assert_eq!(feed.groups[0].links[1].title, "Late night");
    }

    #[test]
    fn hide_nsfw_filters_and_toggle_restores_without_refetch() {
        let mut store = FeedStore::new();
        store.load(sample_body()).unwrap();

        let mut prefs = Preferences::default();
        assert!(prefs.hide_nsfw);
        let visible = store.visible_groups(&prefs);
        assert_eq!(visible[0].links.len(), 1);
        assert!(visible.iter().all(|g| g.links.iter().all(|l| !l.nsfw)));

        prefs.hide_nsfw = false;
        let visible = store.visible_groups(&prefs);
        assert_eq!(visible[0].links.len(), 2);
        assert_eq!(visible[1].links.len(), 1);
    }

    #[test]
    fn fully_filtered_group_still_emits_its_header() {
        let mut store = FeedStore::new();
        store.load(sample_body()).unwrap();
        let visible = store.visible_groups(&Preferences::default());
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[1].date, "2026-08-29");
        assert!(visible[1].links.is_empty());
    }

    #[test]
    fn malformed_body_leaves_previous_feed_in_place() {
        let mut store = FeedStore::new();
        store.load(sample_body()).unwrap();
        let before = store.fetched_at().unwrap();

        assert!(matches!(
            store.load(r#"{"date": "Idag"}"#),
            Err(FeedError::Shape(_))
        ));
        assert!(matches!(store.load("not json"), Err(FeedError::Json(_))));
        assert!(matches!(
            store.load(r#"[{"links": []}]"#),
            Err(FeedError::Json(_))
        ));

        assert_eq!(store.fetched_at().unwrap(), before);
        assert_eq!(store.feed().unwrap().groups.len(), 2);
    }

    #[test]
    fn load_on_empty_store_reports_error_and_stays_empty() {
        let mut store = FeedStore::new();
        assert!(store.load("[1, 2]").is_err());
        assert!(store.feed().is_none());
        assert!(store.visible_groups(&Preferences::default()).is_empty());
    }

    #[test]
    fn missing_or_unknown_type_decodes_as_plain() {
        let mut store = FeedStore::new();
        let feed = store
            .load(r#"[{"date": "Idag", "links": [{"title": "a", "src": "x"}, {"title": "b", "type": "hologram", "src": "y"}]}]"#)
            .unwrap();
        assert_eq!(feed.groups[0].links[0].kind, LinkType::Plain);
        assert_eq!(feed.groups[0].links[1].kind, LinkType::Plain);
    }

    #[test]
    fn comment_metadata_is_optional() {
        let mut store = FeedStore::new();
        let feed = store.load(sample_body()).unwrap();
        assert_eq!(feed.groups[0].links[0].comment_url, None);
        assert_eq!(feed.groups[1].links[0].comment_url.as_deref(), Some("t/123"));
        assert_eq!(feed.groups[1].links[0].comment_number, Some(7));
    }
}
