//! Document-tree → block-list conversion.
//!
//! Walks a parsed element tree depth-first and emits an ordered block list.
//! Unknown containers recurse into their children, so any fragment degrades
//! to the blocks of whatever it contains rather than failing the document.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use bookport_shared::MediaMode;

use crate::block::{Block, MediaRef, TableRow};
use crate::language::normalize_language;
use crate::rich_text::{RichTextRun, absolute_url, segment_rich_text};

/// Language from a highlight class such as `lang-rust` or `language-rust`.
static LANG_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)lang(?:uage)?-([a-z0-9_+-]+)").expect("valid regex"));

static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("valid selector"));
static CODE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("code").expect("valid selector"));
static BLOCKQUOTE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("blockquote").expect("valid selector"));
static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static TR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));

/// Options for one document conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// How embedded images are carried.
    pub media_mode: MediaMode,
    /// Page URL used to resolve relative references.
    pub base_url: Option<Url>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            media_mode: MediaMode::Upload,
            base_url: None,
        }
    }
}

/// Convert rendered document HTML into an ordered block list.
pub fn convert_document(html: &str, opts: &ConvertOptions) -> Vec<Block> {
    let doc = Html::parse_fragment(html);
    let mut blocks = Vec::new();

    for child in doc.root_element().child_elements() {
        convert_element(child, opts, &mut blocks);
    }

    debug!(blocks = blocks.len(), "document converted");
    blocks
}

fn convert_element(el: ElementRef<'_>, opts: &ConvertOptions, blocks: &mut Vec<Block>) {
    // Post metadata chrome is not content.
    if has_class(el, "meta") {
        return;
    }

    // Image wrapper containers produced by the source's lightbox markup.
    if has_class(el, "lightbox-wrapper") || has_class(el, "image-wrapper") {
        if let Some(img) = el.select(&IMG_SEL).next() {
            let src = img.attr("src").or_else(|| img.attr("data-src")).unwrap_or_default();
            if let Some(block) = image_block(src, opts) {
                blocks.push(block);
            }
        }
        return;
    }

    let tag = el.value().name();

    // Quote containers wrap the quoted fragment in a blockquote.
    if tag == "aside" && has_class(el, "quote") {
        if let Some(inner) = el.select(&BLOCKQUOTE_SEL).next() {
            let rich_text = segment_rich_text(inner, opts.base_url.as_ref());
            if !rich_text.is_empty() {
                blocks.push(Block::Quote { rich_text });
            }
        }
        return;
    }

    match tag {
        "p" => {
            let rich_text = segment_rich_text(el, opts.base_url.as_ref());
            if !rich_text.is_empty() {
                blocks.push(Block::Paragraph { rich_text });
            }
            // Inline images are promoted to sibling image blocks.
            for img in el.select(&IMG_SEL) {
                let src = img.attr("src").unwrap_or_default();
                if let Some(block) = image_block(src, opts) {
                    blocks.push(block);
                }
            }
        }
        "pre" => {
            let code_el = el.select(&CODE_SEL).next();
            let raw_lang = code_el
                .and_then(|c| c.attr("class"))
                .and_then(|class| LANG_CLASS_RE.captures(class))
                .map(|caps| caps[1].to_string());
            let text: String = code_el.map_or_else(|| el.text().collect(), |c| c.text().collect());

            blocks.push(Block::Code {
                language: normalize_language(raw_lang.as_deref()),
                rich_text: crate::rich_text::split_long_text(&text, Default::default()),
            });
        }
        "blockquote" => {
            let rich_text = segment_rich_text(el, opts.base_url.as_ref());
            if !rich_text.is_empty() {
                blocks.push(Block::Quote { rich_text });
            }
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            // The destination supports three heading levels.
            let level = tag[1..].parse::<u8>().unwrap_or(3).min(3);
            let rich_text = segment_rich_text(el, opts.base_url.as_ref());
            if !rich_text.is_empty() {
                blocks.push(Block::Heading { level, rich_text });
            }
        }
        "ul" | "ol" => {
            for li in el.child_elements() {
                if li.value().name() != "li" {
                    continue;
                }
                let rich_text = segment_rich_text(li, opts.base_url.as_ref());
                if rich_text.is_empty() {
                    continue;
                }
                blocks.push(if tag == "ul" {
                    Block::BulletedListItem { rich_text }
                } else {
                    Block::NumberedListItem { rich_text }
                });
            }
        }
        "table" => {
            if let Some(block) = convert_table(el, opts) {
                blocks.push(block);
            }
        }
        "img" => {
            let src = el.attr("src").unwrap_or_default();
            if let Some(block) = image_block(src, opts) {
                blocks.push(block);
            }
        }
        _ => {
            // Wrapped tables keep their own dispatch path.
            if has_class(el, "md-table") {
                if let Some(table) = el.select(&TABLE_SEL).next() {
                    if let Some(block) = convert_table(table, opts) {
                        blocks.push(block);
                    }
                }
                return;
            }
            for child in el.child_elements() {
                convert_element(child, opts, blocks);
            }
        }
    }
}

/// Build a table block: width is the widest row, the header flag comes from
/// a `<thead>` section, and empty cells get a single empty placeholder run.
fn convert_table(table: ElementRef<'_>, opts: &ConvertOptions) -> Option<Block> {
    let mut rows: Vec<TableRow> = Vec::new();
    let mut has_header = false;

    for tr in table.select(&TR_SEL) {
        let in_header = tr
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| a.value().name() == "thead");
        has_header |= in_header;

        let cells: Vec<Vec<RichTextRun>> = tr
            .select(&CELL_SEL)
            .map(|cell| {
                let runs = segment_rich_text(cell, opts.base_url.as_ref());
                if runs.is_empty() {
                    vec![RichTextRun::plain("")]
                } else {
                    runs
                }
            })
            .collect();

        if !cells.is_empty() {
            rows.push(TableRow { cells });
        }
    }

    if rows.is_empty() {
        return None;
    }

    let width = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
    Some(Block::Table {
        width,
        has_header,
        rows,
    })
}

fn image_block(src: &str, opts: &ConvertOptions) -> Option<Block> {
    if src.is_empty() || src.contains("/images/emoji/") {
        return None;
    }
    let url = absolute_url(src, opts.base_url.as_ref());
    match opts.media_mode {
        MediaMode::Skip => None,
        mode => Some(Block::Image {
            media: MediaRef::Pending {
                original_url: url,
                needs_relay: mode == MediaMode::Upload,
            },
        }),
    }
}

fn has_class(el: ElementRef<'_>, name: &str) -> bool {
    el.attr("class")
        .is_some_and(|c| c.split_whitespace().any(|t| t == name))
}
