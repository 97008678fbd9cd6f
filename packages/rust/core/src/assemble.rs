//! Per-topic block assembly: posts become captioned container blocks.

use tracing::debug;

use bookport_blocks::{Block, ConvertOptions, RichTextRun, convert_document};
use bookport_source::{SourcePost, SourceTopic};

/// Icon on the leading source-reference callout.
const SOURCE_ICON: &str = "📌";
/// Icon for posts written by the topic author.
const AUTHOR_ICON: &str = "🏠";
/// Icon for every other post.
const REPLY_ICON: &str = "💬";

/// Assemble the full block list for one topic: a leading source callout,
/// then one captioned container per post.
pub fn assemble_topic_blocks(
    topic: &SourceTopic,
    posts: &[&SourcePost],
    opts: &ConvertOptions,
) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(posts.len() + 1);

    blocks.push(Block::Callout {
        icon: SOURCE_ICON.into(),
        rich_text: vec![RichTextRun::plain(format!("Source: {}", topic.url))],
        children: vec![],
    });

    for post in posts {
        blocks.push(post_block(topic, post, opts));
    }

    blocks
}

/// One post as a captioned callout owning its converted content.
fn post_block(topic: &SourceTopic, post: &SourcePost, opts: &ConvertOptions) -> Block {
    let is_author = post.username == topic.author;

    let mut children = Vec::new();
    if let Some(reply_to) = post.reply_to_post_number {
        children.push(Block::paragraph(format!("↩ reply to #{reply_to}")));
    }
    children.extend(convert_document(&post.cooked, opts));

    if children.is_empty() {
        // Unparseable or empty content degrades to a placeholder, never a failure.
        debug!(post = post.post_number, "post converted to no blocks, inserting placeholder");
        children.push(Block::paragraph("(empty or unparseable content)"));
    }

    Block::Callout {
        icon: if is_author { AUTHOR_ICON } else { REPLY_ICON }.into(),
        rich_text: vec![RichTextRun::plain(post_caption(topic, post, is_author))],
        children,
    }
}

/// Caption: post number, author, topic-author marker, and date.
fn post_caption(_topic: &SourceTopic, post: &SourcePost, is_author: bool) -> String {
    let who = post
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(&post.username);
    let who = if who.is_empty() { "anonymous" } else { who };

    let mut caption = format!("#{} {}", post.post_number, who);
    if is_author {
        caption.push_str(" (topic author)");
    }
    if let Some(created) = &post.created_at {
        let day = created.split('T').next().unwrap_or(created);
        caption.push_str(" · ");
        caption.push_str(day);
    }
    caption
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookport_blocks::MediaRef;
    use bookport_shared::MediaMode;

    fn topic() -> SourceTopic {
        SourceTopic {
            id: 9,
            title: "topic".into(),
            url: "https://forum.example.com/t/9".into(),
            category_id: None,
            tags: vec![],
            author: "op".into(),
            created_at: None,
            posts_count: 2,
            like_count: 0,
            views: 0,
        }
    }

    fn post(number: u32, username: &str, cooked: &str) -> SourcePost {
        SourcePost {
            id: number as u64,
            post_number: number,
            username: username.into(),
            name: None,
            cooked: cooked.into(),
            created_at: Some("2025-06-01T12:00:00Z".into()),
            reply_to_post_number: None,
        }
    }

    fn caption_of(block: &Block) -> String {
        match block {
            Block::Callout { rich_text, .. } => {
                rich_text.iter().map(|r| r.content.as_str()).collect()
            }
            _ => panic!("expected callout"),
        }
    }

    #[test]
    fn leading_source_callout_then_posts() {
        let topic = topic();
        let p1 = post(1, "op", "<p>opening</p>");
        let p2 = post(2, "guest", "<p>reply</p>");
        let posts = vec![&p1, &p2];

        let blocks = assemble_topic_blocks(&topic, &posts, &ConvertOptions::default());

        assert_eq!(blocks.len(), 3);
        assert_eq!(caption_of(&blocks[0]), "Source: https://forum.example.com/t/9");
        assert_eq!(caption_of(&blocks[1]), "#1 op (topic author) · 2025-06-01");
        assert_eq!(caption_of(&blocks[2]), "#2 guest · 2025-06-01");

        // Author posts carry the author icon
        assert!(matches!(&blocks[1], Block::Callout { icon, .. } if icon == "🏠"));
        assert!(matches!(&blocks[2], Block::Callout { icon, .. } if icon == "💬"));
    }

    #[test]
    fn reply_marker_precedes_content() {
        let topic = topic();
        let mut p = post(3, "guest", "<p>agreed</p>");
        p.reply_to_post_number = Some(1);
        let posts = vec![&p];

        let blocks = assemble_topic_blocks(&topic, &posts, &ConvertOptions::default());
        let children = blocks[1].children();
        assert_eq!(children.len(), 2);
        assert_eq!(
            children[0],
            Block::paragraph("↩ reply to #1")
        );
    }

    #[test]
    fn empty_post_gets_placeholder() {
        let topic = topic();
        let p = post(4, "guest", "");
        let posts = vec![&p];

        let blocks = assemble_topic_blocks(&topic, &posts, &ConvertOptions::default());
        assert_eq!(
            blocks[1].children(),
            &[Block::paragraph("(empty or unparseable content)")]
        );
    }

    #[test]
    fn display_name_preferred_over_username() {
        let topic = topic();
        let mut p = post(5, "guest", "<p>x</p>");
        p.name = Some("Guest User".into());
        let posts = vec![&p];

        let blocks = assemble_topic_blocks(&topic, &posts, &ConvertOptions::default());
        assert!(caption_of(&blocks[1]).starts_with("#5 Guest User"));
    }

    #[test]
    fn media_mode_flows_into_conversion() {
        let topic = topic();
        let p = post(6, "op", r#"<p><img src="https://cdn.example.com/a.png"></p>"#);
        let posts = vec![&p];

        let opts = ConvertOptions {
            media_mode: MediaMode::Upload,
            base_url: None,
        };
        let blocks = assemble_topic_blocks(&topic, &posts, &opts);
        assert!(blocks[1].children().iter().any(|b| matches!(
            b,
            Block::Image { media: MediaRef::Pending { needs_relay: true, .. } }
        )));
    }
}
