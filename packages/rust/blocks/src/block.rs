//! The destination block model and its wire representation.

use serde_json::{Value, json};

use crate::rich_text::RichTextRun;

/// Reference to the media carried by an image block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// Not yet resolved; `needs_relay` marks it for download-and-reupload.
    Pending {
        original_url: String,
        needs_relay: bool,
    },
    /// Re-uploaded into the destination workspace.
    Uploaded { file_id: String },
    /// Linked directly to the origin URL.
    External { url: String },
}

impl MediaRef {
    /// The origin URL, for pending and external references.
    pub fn original_url(&self) -> Option<&str> {
        match self {
            Self::Pending { original_url, .. } => Some(original_url),
            Self::External { url } => Some(url),
            Self::Uploaded { .. } => None,
        }
    }
}

/// One row of a table block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<Vec<RichTextRun>>,
}

/// A structured content unit in the destination's document model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph {
        rich_text: Vec<RichTextRun>,
    },
    /// Heading level is always 1–3; deeper source headings are clamped.
    Heading {
        level: u8,
        rich_text: Vec<RichTextRun>,
    },
    Quote {
        rich_text: Vec<RichTextRun>,
    },
    Code {
        language: String,
        rich_text: Vec<RichTextRun>,
    },
    BulletedListItem {
        rich_text: Vec<RichTextRun>,
    },
    NumberedListItem {
        rich_text: Vec<RichTextRun>,
    },
    Table {
        width: usize,
        has_header: bool,
        rows: Vec<TableRow>,
    },
    Image {
        media: MediaRef,
    },
    /// The container variant: a captioned callout owning ordered children.
    Callout {
        icon: String,
        rich_text: Vec<RichTextRun>,
        children: Vec<Block>,
    },
}

impl Block {
    /// Shorthand for a paragraph holding one plain run.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            rich_text: vec![RichTextRun::plain(text)],
        }
    }

    /// Child blocks, for container variants.
    pub fn children(&self) -> &[Block] {
        match self {
            Self::Callout { children, .. } => children,
            _ => &[],
        }
    }

    /// Mutable child blocks, for container variants.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Self::Callout { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Serialize into the destination API's JSON shape.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Paragraph { rich_text } => json!({
                "type": "paragraph",
                "paragraph": { "rich_text": runs_to_wire(rich_text) },
            }),
            Self::Heading { level, rich_text } => {
                let key = format!("heading_{level}");
                let mut wire = json!({ "type": key });
                wire[key.as_str()] = json!({ "rich_text": runs_to_wire(rich_text) });
                wire
            }
            Self::Quote { rich_text } => json!({
                "type": "quote",
                "quote": { "rich_text": runs_to_wire(rich_text) },
            }),
            Self::Code {
                language,
                rich_text,
            } => json!({
                "type": "code",
                "code": {
                    "rich_text": runs_to_wire(rich_text),
                    "language": language,
                },
            }),
            Self::BulletedListItem { rich_text } => json!({
                "type": "bulleted_list_item",
                "bulleted_list_item": { "rich_text": runs_to_wire(rich_text) },
            }),
            Self::NumberedListItem { rich_text } => json!({
                "type": "numbered_list_item",
                "numbered_list_item": { "rich_text": runs_to_wire(rich_text) },
            }),
            Self::Table {
                width,
                has_header,
                rows,
            } => json!({
                "type": "table",
                "table": {
                    "table_width": width,
                    "has_column_header": has_header,
                    "has_row_header": false,
                    "children": rows
                        .iter()
                        .map(|row| json!({
                            "type": "table_row",
                            "table_row": {
                                "cells": row.cells.iter().map(|c| runs_to_wire(c)).collect::<Vec<_>>(),
                            },
                        }))
                        .collect::<Vec<_>>(),
                },
            }),
            Self::Image { media } => match media {
                MediaRef::Uploaded { file_id } => json!({
                    "type": "image",
                    "image": {
                        "type": "file_upload",
                        "file_upload": { "id": file_id },
                    },
                }),
                // Pending serializes as an external link so an unrelayed
                // block still commits cleanly.
                MediaRef::Pending { original_url, .. } => json!({
                    "type": "image",
                    "image": {
                        "type": "external",
                        "external": { "url": original_url },
                    },
                }),
                MediaRef::External { url } => json!({
                    "type": "image",
                    "image": {
                        "type": "external",
                        "external": { "url": url },
                    },
                }),
            },
            Self::Callout {
                icon,
                rich_text,
                children,
            } => {
                let mut callout = json!({
                    "icon": { "type": "emoji", "emoji": icon },
                    "rich_text": runs_to_wire(rich_text),
                });
                if !children.is_empty() {
                    callout["children"] =
                        Value::Array(children.iter().map(Block::to_wire).collect());
                }
                json!({ "type": "callout", "callout": callout })
            }
        }
    }
}

/// Serialize a run list into the wire rich-text array.
fn runs_to_wire(runs: &[RichTextRun]) -> Value {
    Value::Array(runs.iter().map(run_to_wire).collect())
}

fn run_to_wire(run: &RichTextRun) -> Value {
    let mut text = json!({ "content": run.content });
    if let Some(link) = &run.link {
        text["link"] = json!({ "url": link });
    }
    let mut wire = json!({ "type": "text", "text": text });
    if run.annotations != Default::default() {
        let a = &run.annotations;
        wire["annotations"] = json!({
            "bold": a.bold,
            "italic": a.italic,
            "strikethrough": a.strikethrough,
            "code": a.code,
        });
    }
    wire
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rich_text::Annotations;

    #[test]
    fn paragraph_wire_shape() {
        let block = Block::paragraph("hello");
        let wire = block.to_wire();
        assert_eq!(wire["type"], "paragraph");
        assert_eq!(wire["paragraph"]["rich_text"][0]["text"]["content"], "hello");
        // Plain runs carry no annotations object
        assert!(wire["paragraph"]["rich_text"][0].get("annotations").is_none());
    }

    #[test]
    fn heading_wire_uses_leveled_key() {
        let block = Block::Heading {
            level: 3,
            rich_text: vec![RichTextRun::plain("deep")],
        };
        let wire = block.to_wire();
        assert_eq!(wire["type"], "heading_3");
        assert_eq!(wire["heading_3"]["rich_text"][0]["text"]["content"], "deep");
    }

    #[test]
    fn annotated_linked_run_wire() {
        let run = RichTextRun {
            content: "docs".into(),
            annotations: Annotations {
                bold: true,
                ..Default::default()
            },
            link: Some("https://example.com/docs".into()),
        };
        let wire = run_to_wire(&run);
        assert_eq!(wire["annotations"]["bold"], true);
        assert_eq!(wire["annotations"]["code"], false);
        assert_eq!(wire["text"]["link"]["url"], "https://example.com/docs");
    }

    #[test]
    fn image_wire_by_media_ref() {
        let pending = Block::Image {
            media: MediaRef::Pending {
                original_url: "https://cdn.example.com/a.png".into(),
                needs_relay: true,
            },
        };
        assert_eq!(
            pending.to_wire()["image"]["external"]["url"],
            "https://cdn.example.com/a.png"
        );

        let uploaded = Block::Image {
            media: MediaRef::Uploaded {
                file_id: "f-123".into(),
            },
        };
        assert_eq!(uploaded.to_wire()["image"]["file_upload"]["id"], "f-123");
    }

    #[test]
    fn table_wire_shape() {
        let block = Block::Table {
            width: 2,
            has_header: true,
            rows: vec![TableRow {
                cells: vec![
                    vec![RichTextRun::plain("Name")],
                    vec![RichTextRun::plain("Value")],
                ],
            }],
        };
        let wire = block.to_wire();
        assert_eq!(wire["table"]["table_width"], 2);
        assert_eq!(wire["table"]["has_column_header"], true);
        assert_eq!(wire["table"]["has_row_header"], false);
        assert_eq!(
            wire["table"]["children"][0]["table_row"]["cells"][0][0]["text"]["content"],
            "Name"
        );
    }

    #[test]
    fn callout_children_omitted_when_empty() {
        let empty = Block::Callout {
            icon: "📌".into(),
            rich_text: vec![RichTextRun::plain("caption")],
            children: vec![],
        };
        assert!(empty.to_wire()["callout"].get("children").is_none());

        let full = Block::Callout {
            icon: "📌".into(),
            rich_text: vec![RichTextRun::plain("caption")],
            children: vec![Block::paragraph("inner")],
        };
        assert_eq!(
            full.to_wire()["callout"]["children"][0]["paragraph"]["rich_text"][0]["text"]["content"],
            "inner"
        );
    }
}
