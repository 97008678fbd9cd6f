//! Inclusion filters applied to a topic's posts before conversion.

use bookport_shared::ExportDefaultsConfig;
use bookport_source::{SourcePost, SourceTopic};

/// Which posts of a topic are exported.
#[derive(Debug, Clone)]
pub struct PostFilters {
    /// Lowest post number to include.
    pub range_start: u32,
    /// Highest post number to include.
    pub range_end: u32,
    /// Keep only the opening post.
    pub first_post_only: bool,
    /// Keep only posts written by the topic author.
    pub author_only: bool,
}

impl Default for PostFilters {
    fn default() -> Self {
        Self {
            range_start: 1,
            range_end: 999_999,
            first_post_only: false,
            author_only: false,
        }
    }
}

impl From<&ExportDefaultsConfig> for PostFilters {
    fn from(config: &ExportDefaultsConfig) -> Self {
        Self {
            range_start: config.range_start,
            range_end: config.range_end,
            first_post_only: config.first_post_only,
            author_only: config.author_only,
        }
    }
}

/// Apply every configured filter, preserving post order.
pub fn filter_posts<'a>(
    posts: &'a [SourcePost],
    topic: &SourceTopic,
    filters: &PostFilters,
) -> Vec<&'a SourcePost> {
    posts
        .iter()
        .filter(|post| {
            if post.post_number < filters.range_start || post.post_number > filters.range_end {
                return false;
            }
            if filters.first_post_only && post.post_number != 1 {
                return false;
            }
            if filters.author_only && post.username != topic.author {
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic() -> SourceTopic {
        SourceTopic {
            id: 1,
            title: "t".into(),
            url: "https://forum.example.com/t/1".into(),
            category_id: None,
            tags: vec![],
            author: "op".into(),
            created_at: None,
            posts_count: 0,
            like_count: 0,
            views: 0,
        }
    }

    fn post(number: u32, username: &str) -> SourcePost {
        SourcePost {
            id: number as u64,
            post_number: number,
            username: username.into(),
            name: None,
            cooked: String::new(),
            created_at: None,
            reply_to_post_number: None,
        }
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let posts = vec![post(1, "op"), post(2, "a"), post(3, "b"), post(4, "c")];
        let filters = PostFilters {
            range_start: 2,
            range_end: 3,
            ..Default::default()
        };
        let kept = filter_posts(&posts, &topic(), &filters);
        let numbers: Vec<u32> = kept.iter().map(|p| p.post_number).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn first_post_only() {
        let posts = vec![post(1, "op"), post(2, "a")];
        let filters = PostFilters {
            first_post_only: true,
            ..Default::default()
        };
        let kept = filter_posts(&posts, &topic(), &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].post_number, 1);
    }

    #[test]
    fn author_only_keeps_topic_author_posts() {
        let posts = vec![post(1, "op"), post(2, "guest"), post(3, "op")];
        let filters = PostFilters {
            author_only: true,
            ..Default::default()
        };
        let kept = filter_posts(&posts, &topic(), &filters);
        let numbers: Vec<u32> = kept.iter().map(|p| p.post_number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn default_filters_keep_everything() {
        let posts = vec![post(1, "op"), post(2, "guest")];
        assert_eq!(filter_posts(&posts, &topic(), &PostFilters::default()).len(), 2);
    }
}
