//! Enforcement of the destination's per-request size ceilings.
//!
//! Two independent limits apply: a parent block may carry at most 100
//! children, and a top-level creation call accepts at most 100 inline
//! blocks (the remainder is appended afterward).

use tracing::debug;

use crate::block::Block;
use crate::rich_text::RichTextRun;

/// Destination ceiling on a children array, and on inline creation blocks.
pub const MAX_CHILDREN: usize = 100;

/// Icon carried by continuation blocks.
const CONTINUATION_ICON: &str = "📎";

/// Recursively split any block whose children exceed [`MAX_CHILDREN`] into
/// sibling continuation blocks of at most 100 children each.
///
/// The first sibling keeps the semantic caption; continuations carry a
/// generic marker icon and a "part X/N" label.
pub fn enforce_child_limit(blocks: Vec<Block>) -> Vec<Block> {
    blocks.into_iter().flat_map(split_block).collect()
}

fn split_block(block: Block) -> Vec<Block> {
    match block {
        Block::Callout {
            icon,
            rich_text,
            children,
        } => {
            // Children first, so an over-full grandchild cannot survive.
            let children = enforce_child_limit(children);

            if children.len() <= MAX_CHILDREN {
                return vec![Block::Callout {
                    icon,
                    rich_text,
                    children,
                }];
            }

            let caption: String = rich_text.iter().map(|r| r.content.as_str()).collect();
            let total = children.len().div_ceil(MAX_CHILDREN);
            debug!(children = children.len(), parts = total, "splitting over-full container");

            let mut chunks: Vec<Vec<Block>> = Vec::with_capacity(total);
            let mut rest = children;
            while rest.len() > MAX_CHILDREN {
                let tail = rest.split_off(MAX_CHILDREN);
                chunks.push(std::mem::replace(&mut rest, tail));
            }
            chunks.push(rest);

            chunks
                .into_iter()
                .enumerate()
                .map(|(i, chunk)| {
                    if i == 0 {
                        Block::Callout {
                            icon: icon.clone(),
                            rich_text: rich_text.clone(),
                            children: chunk,
                        }
                    } else {
                        Block::Callout {
                            icon: CONTINUATION_ICON.into(),
                            rich_text: vec![RichTextRun::plain(format!(
                                "{} (part {}/{})",
                                caption,
                                i + 1,
                                total
                            ))],
                            children: chunk,
                        }
                    }
                })
                .collect()
        }
        other => vec![other],
    }
}

/// Split a top-level block list into the inline creation slice (≤100) and
/// the remainder to append in later calls.
pub fn split_for_creation(mut blocks: Vec<Block>) -> (Vec<Block>, Vec<Block>) {
    if blocks.len() <= MAX_CHILDREN {
        return (blocks, Vec::new());
    }
    let remainder = blocks.split_off(MAX_CHILDREN);
    (blocks, remainder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callout(caption: &str, children: Vec<Block>) -> Block {
        Block::Callout {
            icon: "💬".into(),
            rich_text: vec![RichTextRun::plain(caption)],
            children,
        }
    }

    fn paragraphs(n: usize) -> Vec<Block> {
        (0..n).map(|i| Block::paragraph(format!("p{i}"))).collect()
    }

    fn max_children(block: &Block) -> usize {
        block
            .children()
            .iter()
            .map(max_children)
            .max()
            .unwrap_or(0)
            .max(block.children().len())
    }

    #[test]
    fn under_limit_is_untouched() {
        let input = vec![callout("post #1", paragraphs(100))];
        let out = enforce_child_limit(input.clone());
        assert_eq!(out, input);
    }

    #[test]
    fn two_hundred_fifty_children_split_100_100_50() {
        let out = enforce_child_limit(vec![callout("post #7", paragraphs(250))]);
        assert_eq!(out.len(), 3);

        let sizes: Vec<usize> = out.iter().map(|b| b.children().len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);

        // First part keeps the caption, continuations are labeled
        let captions: Vec<String> = out
            .iter()
            .map(|b| match b {
                Block::Callout { rich_text, .. } => {
                    rich_text.iter().map(|r| r.content.as_str()).collect()
                }
                _ => panic!("expected callout"),
            })
            .collect();
        assert_eq!(captions[0], "post #7");
        assert_eq!(captions[1], "post #7 (part 2/3)");
        assert_eq!(captions[2], "post #7 (part 3/3)");

        // Continuations carry the generic marker icon
        assert!(matches!(&out[0], Block::Callout { icon, .. } if icon == "💬"));
        assert!(matches!(&out[1], Block::Callout { icon, .. } if icon == "📎"));
    }

    #[test]
    fn split_preserves_child_order() {
        let out = enforce_child_limit(vec![callout("c", paragraphs(150))]);
        let texts: Vec<String> = out
            .iter()
            .flat_map(|b| b.children())
            .map(|b| match b {
                Block::Paragraph { rich_text } => rich_text[0].content.clone(),
                _ => panic!("expected paragraph"),
            })
            .collect();
        let expected: Vec<String> = (0..150).map(|i| format!("p{i}")).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn no_block_exceeds_limit_after_chunking() {
        let nested = callout("outer", vec![callout("inner", paragraphs(205))]);
        let out = enforce_child_limit(vec![nested, callout("big", paragraphs(101))]);
        for block in &out {
            assert!(max_children(block) <= MAX_CHILDREN);
        }
    }

    #[test]
    fn non_container_blocks_pass_through() {
        let input = paragraphs(3);
        assert_eq!(enforce_child_limit(input.clone()), input);
    }

    #[test]
    fn creation_split_at_100() {
        let (inline, rest) = split_for_creation(paragraphs(100));
        assert_eq!(inline.len(), 100);
        assert!(rest.is_empty());

        let (inline, rest) = split_for_creation(paragraphs(230));
        assert_eq!(inline.len(), 100);
        assert_eq!(rest.len(), 130);

        // Order preserved across the split
        assert!(matches!(&inline[0], Block::Paragraph { rich_text } if rich_text[0].content == "p0"));
        assert!(matches!(&rest[0], Block::Paragraph { rich_text } if rich_text[0].content == "p100"));
    }
}
