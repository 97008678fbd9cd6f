//! Destination page properties built from topic metadata.

use serde_json::{Value, json};

use bookport_source::{Bookmark, SourceTopic};

/// Build the property payload for a created database page.
pub fn build_properties(topic: &SourceTopic, bookmark: &Bookmark) -> Value {
    let title = if topic.title.is_empty() {
        "Untitled".to_string()
    } else {
        topic.title.clone()
    };

    let mut properties = json!({
        "Title": { "title": [{ "text": { "content": title } }] },
        "URL": { "url": topic.url },
        "Category": {
            "rich_text": [{ "text": { "content": category_label(topic) } }]
        },
        "Tags": {
            "multi_select": topic.tags.iter().map(|t| json!({ "name": t })).collect::<Vec<_>>()
        },
        "Author": {
            "rich_text": [{ "text": { "content": topic.author } }]
        },
        "Posts": { "number": topic.posts_count },
        "Views": { "number": topic.views },
        "Likes": { "number": topic.like_count },
    });

    // Date-typed property wants the date portion only.
    if let Some(created) = &bookmark.created_at {
        let day = created.split('T').next().unwrap_or(created);
        properties["Bookmarked"] = json!({ "date": { "start": day } });
    }

    properties
}

fn category_label(topic: &SourceTopic) -> String {
    topic
        .category_id
        .map(|id| format!("category {id}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic() -> SourceTopic {
        SourceTopic {
            id: 42,
            title: "A great thread".into(),
            url: "https://forum.example.com/t/42".into(),
            category_id: Some(7),
            tags: vec!["tools".into(), "news".into()],
            author: "op_user".into(),
            created_at: Some("2025-05-01T00:00:00Z".into()),
            posts_count: 12,
            like_count: 3,
            views: 450,
        }
    }

    fn bookmark() -> Bookmark {
        serde_json::from_value(json!({
            "topic_id": 42,
            "title": "A great thread",
            "created_at": "2025-06-15T08:30:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn properties_cover_topic_metadata() {
        let props = build_properties(&topic(), &bookmark());

        assert_eq!(
            props["Title"]["title"][0]["text"]["content"],
            "A great thread"
        );
        assert_eq!(props["URL"]["url"], "https://forum.example.com/t/42");
        assert_eq!(props["Author"]["rich_text"][0]["text"]["content"], "op_user");
        assert_eq!(props["Tags"]["multi_select"][0]["name"], "tools");
        assert_eq!(props["Posts"]["number"], 12);
        assert_eq!(props["Views"]["number"], 450);
        assert_eq!(props["Likes"]["number"], 3);
        assert_eq!(props["Category"]["rich_text"][0]["text"]["content"], "category 7");
    }

    #[test]
    fn bookmarked_date_keeps_day_only() {
        let props = build_properties(&topic(), &bookmark());
        assert_eq!(props["Bookmarked"]["date"]["start"], "2025-06-15");
    }

    #[test]
    fn missing_bookmark_date_omits_the_property() {
        let bare: Bookmark = serde_json::from_value(json!({ "topic_id": 42 })).unwrap();
        let props = build_properties(&topic(), &bare);
        assert!(props.get("Bookmarked").is_none());
    }

    #[test]
    fn empty_title_falls_back() {
        let mut t = topic();
        t.title = String::new();
        let props = build_properties(&t, &bookmark());
        assert_eq!(props["Title"]["title"][0]["text"]["content"], "Untitled");
    }
}
