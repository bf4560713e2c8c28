/// Block layout of a document subtree at a fixed width.
///
/// Every element is a block stacked vertically inside its parent; text runs
/// wrap on a fixed character grid. This is enough to give captures stable
/// geometry without a full CSS engine.

use crate::dom::{Document, NodeData, NodeId};
use crate::rendering::paint::{parse_color, Rgb};

/// Horizontal advance of one character at scale 1
pub const CHAR_WIDTH: u32 = 8;
/// Height of one text line at scale 1
pub const LINE_HEIGHT: u32 = 10;

/// Elements that never produce boxes
const NON_RENDERED: &[&str] = &["head", "title", "meta", "link", "script", "style", "template", "noscript"];

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxKind {
    /// An element box; only painted when it has a background
    Block { background: Option<Rgb> },
    /// Wrapped text lines
    Text { lines: Vec<String>, scale: u32, color: Rgb },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub node: NodeId,
    pub lb: LayoutBox,
    pub kind: BoxKind,
}

/// Result of laying out one subtree
#[derive(Debug, Clone)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub nodes: Vec<LayoutNode>,
}

/// Inputs that stay fixed for a whole layout pass
pub struct LayoutParams<'a> {
    /// Total layout width in pixels
    pub width: u32,
    /// Padding applied around the root box
    pub padding: u32,
    /// Text color used when no ancestor sets one
    pub foreground: Rgb,
    /// Nodes for which this returns true are left out together with their subtree
    pub exclude: &'a dyn Fn(&Document, NodeId) -> bool,
}

/// Lay out `root` and its descendants.
///
/// The root is always laid out even if it matches `exclude`; descendants
/// that match are skipped, as are elements whose inline display is `none`.
pub fn layout_subtree(doc: &Document, root: NodeId, params: &LayoutParams<'_>) -> Layout {
    let mut nodes = Vec::new();
    let inner_width = params.width.saturating_sub(params.padding.saturating_mul(2));
    let used = layout_node(
        doc,
        root,
        params,
        Cursor {
            x: offset(0, params.padding),
            y: offset(0, params.padding),
            width: inner_width,
            scale: 1,
            color: params.foreground,
        },
        true,
        &mut nodes,
    );
    Layout {
        width: params.width,
        height: used.saturating_add(params.padding.saturating_mul(2)).max(1),
        nodes,
    }
}

/// `base + by`, saturating instead of wrapping
fn offset(base: i32, by: u32) -> i32 {
    base.saturating_add(i32::try_from(by).unwrap_or(i32::MAX))
}

#[derive(Clone, Copy)]
struct Cursor {
    x: i32,
    y: i32,
    width: u32,
    scale: u32,
    color: Rgb,
}

fn layout_node(
    doc: &Document,
    id: NodeId,
    params: &LayoutParams<'_>,
    at: Cursor,
    is_root: bool,
    out: &mut Vec<LayoutNode>,
) -> u32 {
    match doc.data(id) {
        Some(NodeData::Text(text)) => layout_text(id, text, at, out),
        Some(NodeData::Element(el)) => {
            if NON_RENDERED.contains(&el.tag.as_str()) || doc.is_hidden(id) {
                return 0;
            }
            if !is_root && (params.exclude)(doc, id) {
                return 0;
            }

            let (default_margin, scale) = match el.tag.as_str() {
                "h1" => (8, 3),
                "h2" | "h3" => (6, 2),
                "p" | "li" | "h4" | "h5" | "h6" => (6, at.scale),
                _ => (0, at.scale),
            };
            let margin = el.style.get("margin").and_then(parse_px).unwrap_or(default_margin);
            let background = el
                .style
                .get("background-color")
                .or_else(|| el.style.get("background"))
                .and_then(parse_color);
            let padding = el
                .style
                .get("padding")
                .and_then(parse_px)
                .unwrap_or(if background.is_some() { 8 } else { 0 });
            let color = el.style.get("color").and_then(parse_color).unwrap_or(at.color);
            let fixed_height = el.style.get("height").and_then(parse_px);

            let box_x = offset(at.x, margin);
            let box_y = offset(at.y, margin);
            let box_width = at.width.saturating_sub(margin.saturating_mul(2));
            let slot = out.len();
            out.push(LayoutNode {
                node: id,
                lb: LayoutBox {
                    rect: Rect { x: box_x, y: box_y, width: box_width, height: 0 },
                    box_model: BoxModel { margin, border: 0, padding },
                },
                kind: BoxKind::Block { background },
            });

            let inner = Cursor {
                x: offset(box_x, padding),
                y: offset(box_y, padding),
                width: box_width.saturating_sub(padding.saturating_mul(2)),
                scale,
                color,
            };
            let mut content_height = 0u32;
            for child in doc.children(id) {
                let child_at = Cursor { y: offset(inner.y, content_height), ..inner };
                let used = layout_node(doc, *child, params, child_at, false, out);
                content_height = content_height.saturating_add(used);
            }

            let box_height =
                fixed_height.unwrap_or_else(|| content_height.saturating_add(padding.saturating_mul(2)));
            out[slot].lb.rect.height = box_height;
            box_height.saturating_add(margin.saturating_mul(2))
        }
        None => 0,
    }
}

fn layout_text(id: NodeId, text: &str, at: Cursor, out: &mut Vec<LayoutNode>) -> u32 {
    let advance = CHAR_WIDTH * at.scale;
    let chars_per_line = if at.width >= advance { (at.width / advance) as usize } else { 1 };
    let lines = wrap_words(text, chars_per_line);
    if lines.is_empty() {
        return 0;
    }
    let height = u32::try_from(lines.len())
        .unwrap_or(u32::MAX)
        .saturating_mul(LINE_HEIGHT * at.scale);
    out.push(LayoutNode {
        node: id,
        lb: LayoutBox {
            rect: Rect { x: at.x, y: at.y, width: at.width, height },
            box_model: BoxModel { margin: 0, border: 0, padding: 0 },
        },
        kind: BoxKind::Text { lines, scale: at.scale, color: at.color },
    });
    height
}

/// Greedy word wrap; words longer than a line are split.
pub fn wrap_words(text: &str, chars_per_line: usize) -> Vec<String> {
    let chars_per_line = chars_per_line.max(1);
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > chars_per_line {
            if !cur.is_empty() {
                lines.push(std::mem::take(&mut cur));
            }
            let rest = word.split_off(chars_per_line);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let cur_len = cur.chars().count();
        if !cur.is_empty() && cur_len + 1 + word.chars().count() > chars_per_line {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(&word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

/// Parse a `Npx` (or bare number) length; only the first value of a shorthand is used.
pub fn parse_px(value: &str) -> Option<u32> {
    let first = value.split_whitespace().next()?;
    let num = first.strip_suffix("px").unwrap_or(first);
    let n: f64 = num.parse().ok()?;
    if n.is_finite() && n >= 0.0 {
        Some(n.round() as u32)
    } else {
        None
    }
}
