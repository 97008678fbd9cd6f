//! Rich-text segmentation: formatted inline content → bounded annotated runs.

use std::sync::LazyLock;

use regex::Regex;
use ego_tree::NodeRef;
use scraper::{ElementRef, Node};
use url::Url;

use crate::emoji;

/// Destination ceiling on the length of a single rich-text run.
pub const MAX_RUN_LEN: usize = 2000;

/// Emoji images on the source render as `/images/emoji/<set>/<name>.png`.
static EMOJI_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/images/emoji/(?:twemoji|apple|google|twitter)/([^/.]+)\.png")
        .expect("valid regex")
});

/// Annotation set shared by every character of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
}

/// A contiguous text span sharing one annotation set plus an optional link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichTextRun {
    pub content: String,
    pub annotations: Annotations,
    pub link: Option<String>,
}

impl RichTextRun {
    /// An unannotated, unlinked run.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            annotations: Annotations::default(),
            link: None,
        }
    }
}

/// Split `text` into runs of at most [`MAX_RUN_LEN`] characters, all
/// carrying the same annotations.
///
/// A run of L chars yields ceil(L / 2000) runs whose concatenation equals
/// the input. The boundary is a `char` index; splitting inside a combining
/// sequence is accepted here.
pub fn split_long_text(text: &str, annotations: Annotations) -> Vec<RichTextRun> {
    let mut runs = Vec::new();
    let mut buf = String::new();
    let mut count = 0usize;

    for ch in text.chars() {
        buf.push(ch);
        count += 1;
        if count == MAX_RUN_LEN {
            runs.push(RichTextRun {
                content: std::mem::take(&mut buf),
                annotations,
                link: None,
            });
            count = 0;
        }
    }

    if !buf.is_empty() || runs.is_empty() {
        runs.push(RichTextRun {
            content: buf,
            annotations,
            link: None,
        });
    }

    runs
}

/// Resolve a possibly-relative `src`/`href` against the page it came from.
pub fn absolute_url(raw: &str, base: Option<&Url>) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_string();
    }
    match base {
        Some(base) => base
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    }
}

/// Walk the inline content of `el` depth-first, emitting runs that inherit
/// the annotations of every enclosing formatting tag.
pub fn segment_rich_text(el: ElementRef<'_>, base: Option<&Url>) -> Vec<RichTextRun> {
    let mut runs = Vec::new();
    for child in el.children() {
        walk_inline(child, Annotations::default(), base, &mut runs);
    }
    runs
}

fn walk_inline(
    node: NodeRef<'_, Node>,
    annotations: Annotations,
    base: Option<&Url>,
    out: &mut Vec<RichTextRun>,
) {
    match node.value() {
        Node::Text(text) => {
            let content: &str = &text.text;
            if !content.is_empty() {
                out.extend(split_long_text(content, annotations));
            }
        }
        Node::Element(element) => {
            let Some(el) = ElementRef::wrap(node) else {
                return;
            };
            match element.name() {
                // Emoji images become a literal glyph run; other inline
                // images are handled at block level.
                "img" => {
                    let src = el.attr("src").unwrap_or_default();
                    if let Some(caps) = EMOJI_URL_RE.captures(src) {
                        let name = &caps[1];
                        let glyph = emoji::glyph(name)
                            .map(str::to_string)
                            .or_else(|| el.attr("alt").map(str::to_string))
                            .unwrap_or_else(|| format!(":{name}:"));
                        out.push(RichTextRun {
                            content: glyph,
                            annotations,
                            link: None,
                        });
                    }
                }
                "a" => {
                    let href = el.attr("href").unwrap_or_default();
                    // Internal fragment anchors unwrap to plain runs.
                    if href.starts_with('#') {
                        for child in node.children() {
                            walk_inline(child, annotations, base, out);
                        }
                        return;
                    }
                    let link = absolute_url(href, base);
                    let label = {
                        let text: String = el.text().collect();
                        if text.is_empty() { link.clone() } else { text }
                    };
                    if !link.is_empty() {
                        for mut run in split_long_text(&label, annotations) {
                            run.link = Some(link.clone());
                            out.push(run);
                        }
                    }
                }
                "strong" | "b" => {
                    let nested = Annotations {
                        bold: true,
                        ..annotations
                    };
                    for child in node.children() {
                        walk_inline(child, nested, base, out);
                    }
                }
                "em" | "i" => {
                    let nested = Annotations {
                        italic: true,
                        ..annotations
                    };
                    for child in node.children() {
                        walk_inline(child, nested, base, out);
                    }
                }
                "s" | "del" => {
                    let nested = Annotations {
                        strikethrough: true,
                        ..annotations
                    };
                    for child in node.children() {
                        walk_inline(child, nested, base, out);
                    }
                }
                "code" => {
                    let text: String = el.text().collect();
                    if !text.is_empty() {
                        out.extend(split_long_text(
                            &text,
                            Annotations {
                                code: true,
                                ..annotations
                            },
                        ));
                    }
                }
                _ => {
                    for child in node.children() {
                        walk_inline(child, annotations, base, out);
                    }
                }
            }
        }
        _ => {}
    }
}
