//! Block/inline layout of a document subtree into paint operations.
//!
//! Only the inline CSS the templates emit is understood: box sizes, padding, margin,
//! borders, backgrounds, font properties, `text-align`, `display: flex` rows, `gap`
//! and `overflow`. Everything is measured in CSS px.

use crate::export::dom::{Element, Node};
use crate::export::font_metrics::{FontFamily, MetricTables, TextMeasure};
use crate::export::style::{parse_hex_color, parse_length_px, InlineStyle};

/// Width the browser preview used for an A4 sheet (210mm at 96dpi).
pub const A4_WIDTH_PX: f32 = 794.0;

const DEFAULT_FONT_SIZE: f32 = 14.0;
const DEFAULT_LINE_HEIGHT: f32 = 1.4;
const LIST_INDENT: f32 = 18.0;

pub type Rgb = [u8; 3];

pub const BLACK: Rgb = [0, 0, 0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// A single-line run of text sharing one style.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    /// Top of the line box the run sits in.
    pub top: f32,
    pub line_height: f32,
    pub size: f32,
    pub bold: bool,
    pub color: Rgb,
    pub font: FontFamily,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    Fill { rect: Rect, color: Rgb },
    Text(TextRun),
}

impl PaintOp {
    fn bottom(&self) -> f32 {
        match self {
            PaintOp::Fill { rect, .. } => rect.bottom(),
            PaintOp::Text(run) => run.top + run.line_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub width: f32,
    /// Full rendered height: the scroll height unless the root clips its overflow.
    pub height: f32,
    pub ops: Vec<PaintOp>,
}

/// Lays out `root` as if it were rendered in a viewport `viewport_width` px wide,
/// measuring text with the static advance tables.
pub fn layout(root: &Element, viewport_width: f32) -> LayoutResult {
    layout_with(root, viewport_width, &MetricTables)
}

/// Like [`layout`], but words are measured by `measure`. A painter should pass
/// the measurer of the face it draws with so wrapped lines fit their boxes.
pub fn layout_with(root: &Element, viewport_width: f32, measure: &dyn TextMeasure) -> LayoutResult {
    let width = root
        .style
        .get("width")
        .and_then(|w| resolve_width(w, viewport_width))
        .unwrap_or(viewport_width);
    let mut ops = Vec::new();
    let extent = layout_block(
        root,
        0.0,
        0.0,
        width,
        &TextStyle::default(),
        None,
        true,
        measure,
        &mut ops,
    );

    let height = if clips_overflow(&root.style) && root.style.length_px("height").is_some() {
        extent
    } else {
        ops.iter().map(PaintOp::bottom).fold(extent, f32::max)
    };

    LayoutResult { width, height, ops }
}

// ────────────────────────────────────────────────────────────────────────────
// Inherited text style
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone)]
struct TextStyle {
    font: FontFamily,
    size: f32,
    bold: bool,
    color: Rgb,
    line_height: f32,
    align: Align,
    uppercase: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: FontFamily::Sans,
            size: DEFAULT_FONT_SIZE,
            bold: false,
            color: BLACK,
            line_height: DEFAULT_LINE_HEIGHT,
            align: Align::Left,
            uppercase: false,
        }
    }
}

impl TextStyle {
    fn inherit(&self, el: &Element) -> TextStyle {
        let mut ts = self.clone();
        match el.tag.as_str() {
            "h1" => (ts.size, ts.bold) = (24.0, true),
            "h2" => (ts.size, ts.bold) = (18.0, true),
            "h3" => (ts.size, ts.bold) = (15.0, true),
            "h4" | "strong" | "b" | "th" => ts.bold = true,
            "small" => ts.size *= 0.85,
            _ => {}
        }
        let style = &el.style;
        if let Some(size) = style.length_px("font-size") {
            ts.size = size;
        }
        if let Some(weight) = style.get("font-weight") {
            ts.bold = match weight {
                "bold" | "bolder" => true,
                "normal" | "lighter" => false,
                n => n.parse::<u16>().map(|w| w >= 600).unwrap_or(ts.bold),
            };
        }
        if let Some(color) = style.get("color").and_then(parse_color) {
            ts.color = color;
        }
        if let Some(family) = style.get("font-family") {
            ts.font = FontFamily::from_css(family);
        }
        if let Some(lh) = style.get("line-height") {
            if let Some(px) = lh.strip_suffix("px").and_then(|v| v.trim().parse::<f32>().ok()) {
                ts.line_height = px / ts.size;
            } else if let Ok(factor) = lh.trim().parse::<f32>() {
                ts.line_height = factor;
            }
        }
        match style.get("text-align") {
            Some("center") => ts.align = Align::Center,
            Some("right") => ts.align = Align::Right,
            Some("left") => ts.align = Align::Left,
            _ => {}
        }
        if let Some(transform) = style.get("text-transform") {
            ts.uppercase = transform == "uppercase";
        }
        ts
    }

    fn line_box(&self) -> f32 {
        self.size * self.line_height
    }
}

fn parse_color(raw: &str) -> Option<Rgb> {
    match raw.trim() {
        "white" | "#fff" => Some([255, 255, 255]),
        "black" => Some(BLACK),
        "transparent" | "none" => None,
        other => parse_hex_color(other),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Box model helpers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Sides {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

fn sides(style: &InlineStyle, prop: &str) -> Sides {
    let mut s = style.get(prop).map(parse_shorthand).unwrap_or_default();
    for (suffix, slot) in [
        ("top", &mut s.top),
        ("right", &mut s.right),
        ("bottom", &mut s.bottom),
        ("left", &mut s.left),
    ] {
        if let Some(v) = style.length_px(&format!("{prop}-{suffix}")) {
            *slot = v;
        }
    }
    s
}

fn parse_shorthand(raw: &str) -> Sides {
    let v: Vec<f32> = raw
        .split_whitespace()
        .map(|p| parse_length_px(p).unwrap_or(0.0))
        .collect();
    match v.as_slice() {
        [a] => Sides { top: *a, right: *a, bottom: *a, left: *a },
        [a, b] => Sides { top: *a, right: *b, bottom: *a, left: *b },
        [a, b, c] => Sides { top: *a, right: *b, bottom: *c, left: *b },
        [a, b, c, d, ..] => Sides { top: *a, right: *b, bottom: *c, left: *d },
        [] => Sides::default(),
    }
}

fn padding_of(el: &Element) -> Sides {
    let mut p = sides(&el.style, "padding");
    let list = el.tag == "ul" || el.tag == "ol";
    if list && el.style.get("padding").is_none() && el.style.get("padding-left").is_none() {
        p.left = LIST_INDENT;
    }
    p
}

/// Border edge: width and color.
#[derive(Debug, Clone, Copy, Default)]
struct Edge {
    width: f32,
    color: Option<Rgb>,
}

fn parse_border(raw: &str) -> Edge {
    if raw.trim() == "none" {
        return Edge::default();
    }
    let mut edge = Edge {
        width: 0.0,
        color: Some(BLACK),
    };
    for token in raw.split_whitespace() {
        if let Some(c) = parse_color(token) {
            if token.starts_with('#') || token == "black" || token == "white" {
                edge.color = Some(c);
                continue;
            }
        }
        if let Some(w) = parse_length_px(token) {
            edge.width = w;
        }
    }
    edge
}

struct Borders {
    top: Edge,
    bottom: Edge,
    left: Edge,
    right: Edge,
}

fn borders(style: &InlineStyle) -> Borders {
    let all = style.get("border").map(parse_border).unwrap_or_default();
    let pick = |side: &str| {
        style
            .get(&format!("border-{side}"))
            .map(parse_border)
            .unwrap_or(all)
    };
    Borders {
        top: pick("top"),
        bottom: pick("bottom"),
        left: pick("left"),
        right: pick("right"),
    }
}

fn resolve_width(raw: &str, avail: f32) -> Option<f32> {
    match raw.trim().strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok().map(|p| avail * p / 100.0),
        None => parse_length_px(raw),
    }
}

fn clips_overflow(style: &InlineStyle) -> bool {
    matches!(style.get("overflow"), Some("hidden") | Some("clip"))
}

fn is_flex_row(el: &Element) -> bool {
    el.style.get("display") == Some("flex")
        && !matches!(el.style.get("flex-direction"), Some("column"))
}

// ────────────────────────────────────────────────────────────────────────────
// Block layout
// ────────────────────────────────────────────────────────────────────────────

/// Lays out one element as a block box at (`x`, `y`) within `avail_w`.
/// When `sized` is set the caller already resolved the element's own width into
/// `avail_w`. Returns the vertical space consumed in the parent's flow, margins included.
#[allow(clippy::too_many_arguments)]
fn layout_block(
    el: &Element,
    x: f32,
    y: f32,
    avail_w: f32,
    parent: &TextStyle,
    marker: Option<String>,
    sized: bool,
    measure: &dyn TextMeasure,
    ops: &mut Vec<PaintOp>,
) -> f32 {
    if el.style.get("display") == Some("none") {
        return 0.0;
    }
    let ts = parent.inherit(el);
    let margin = sides(&el.style, "margin");
    let padding = padding_of(el);
    let border = borders(&el.style);

    let outer_w = (avail_w - margin.left - margin.right).max(0.0);
    let mut box_w = if sized {
        outer_w
    } else {
        el.style
            .get("width")
            .and_then(|w| resolve_width(w, avail_w))
            .unwrap_or(outer_w)
    };
    if let Some(max_w) = el.style.get("max-width").and_then(|w| resolve_width(w, avail_w)) {
        box_w = box_w.min(max_w);
    }
    let centered = el.style.get("margin").is_some_and(|m| m.contains("auto"));
    let box_x = if centered && box_w < avail_w {
        x + (avail_w - box_w) / 2.0
    } else {
        x + margin.left
    };
    let box_y = y + margin.top;

    let content_x = box_x + border.left.width + padding.left;
    let content_y = box_y + border.top.width + padding.top;
    let content_w =
        (box_w - padding.left - padding.right - border.left.width - border.right.width).max(0.0);

    let background = el.style.get("background").or(el.style.get("background-color"));
    let bg_slot = background.and_then(parse_color).map(|color| {
        ops.push(PaintOp::Fill {
            rect: Rect { x: box_x, y: box_y, w: box_w, h: 0.0 },
            color,
        });
        ops.len() - 1
    });

    let start = ops.len();
    let content_h = if is_flex_row(el) {
        layout_flex_row(el, content_x, content_y, content_w, &ts, measure, ops)
    } else {
        layout_flow(el, content_x, content_y, content_w, &ts, marker, measure, ops)
    };

    let natural_h = border.top.width + padding.top + content_h + padding.bottom + border.bottom.width;
    let fixed_h = el.style.length_px("height");
    let mut box_h = fixed_h.unwrap_or(natural_h);
    if let Some(min_h) = el.style.length_px("min-height") {
        box_h = box_h.max(min_h);
    }

    if fixed_h.is_some() && clips_overflow(&el.style) {
        clip_ops(ops, start, box_y + box_h);
    }

    if let Some(slot) = bg_slot {
        if let PaintOp::Fill { rect, .. } = &mut ops[slot] {
            rect.h = box_h;
        }
    }
    push_edges(ops, &border, Rect { x: box_x, y: box_y, w: box_w, h: box_h });

    margin.top + box_h + margin.bottom
}

fn push_edges(ops: &mut Vec<PaintOp>, border: &Borders, b: Rect) {
    let edges = [
        (border.top, Rect { x: b.x, y: b.y, w: b.w, h: border.top.width }),
        (
            border.bottom,
            Rect { x: b.x, y: b.bottom() - border.bottom.width, w: b.w, h: border.bottom.width },
        ),
        (border.left, Rect { x: b.x, y: b.y, w: border.left.width, h: b.h }),
        (
            border.right,
            Rect { x: b.x + b.w - border.right.width, y: b.y, w: border.right.width, h: b.h },
        ),
    ];
    for (edge, rect) in edges {
        if let (Some(color), true) = (edge.color, edge.width > 0.0) {
            ops.push(PaintOp::Fill { rect, color });
        }
    }
}

/// Drops text lines that start below `bottom` and trims fills to it.
fn clip_ops(ops: &mut Vec<PaintOp>, start: usize, bottom: f32) {
    let mut kept = Vec::with_capacity(ops.len() - start);
    for op in ops.drain(start..) {
        match op {
            PaintOp::Text(run) if run.top + run.line_height > bottom => {}
            PaintOp::Fill { rect, .. } if rect.y >= bottom => {}
            PaintOp::Fill { mut rect, color } => {
                rect.h = rect.h.min(bottom - rect.y);
                kept.push(PaintOp::Fill { rect, color });
            }
            other => kept.push(other),
        }
    }
    ops.extend(kept);
}

#[allow(clippy::too_many_arguments)]
fn layout_flow(
    el: &Element,
    x: f32,
    y: f32,
    w: f32,
    ts: &TextStyle,
    marker: Option<String>,
    measure: &dyn TextMeasure,
    ops: &mut Vec<PaintOp>,
) -> f32 {
    let gap = el.style.length_px("gap").or(el.style.length_px("row-gap")).unwrap_or(0.0);
    let mut cursor = y;
    let mut inline: Vec<InlineItem> = Vec::new();
    if let Some(m) = marker {
        inline.push(InlineItem::Word(m, ts.clone()));
    }
    let mut blocks_seen = 0usize;
    let mut list_index = 0usize;

    for child in &el.children {
        match child {
            Node::Text(t) => push_words(t, ts, &mut inline),
            Node::Element(c) if c.tag == "br" => inline.push(InlineItem::Break),
            Node::Element(c) if !c.is_block() => collect_inline(c, ts, &mut inline),
            Node::Element(c) => {
                cursor += flush_inline(&mut inline, x, cursor, w, ts, measure, ops);
                if blocks_seen > 0 {
                    cursor += gap;
                }
                blocks_seen += 1;
                let child_marker = if c.tag == "li" {
                    list_index += 1;
                    match el.tag.as_str() {
                        "ol" => Some(format!("{list_index}.")),
                        "ul" => Some("•".to_string()),
                        _ => None,
                    }
                } else {
                    None
                };
                cursor += layout_block(c, x, cursor, w, ts, child_marker, false, measure, ops);
            }
        }
    }
    cursor += flush_inline(&mut inline, x, cursor, w, ts, measure, ops);
    cursor - y
}

fn layout_flex_row(
    el: &Element,
    x: f32,
    y: f32,
    w: f32,
    ts: &TextStyle,
    measure: &dyn TextMeasure,
    ops: &mut Vec<PaintOp>,
) -> f32 {
    let items: Vec<&Element> = el
        .child_elements()
        .filter(|c| c.style.get("display") != Some("none"))
        .collect();
    if items.is_empty() {
        return 0.0;
    }
    let gap = el.style.length_px("gap").or(el.style.length_px("column-gap")).unwrap_or(0.0);
    let avail = (w - gap * (items.len() - 1) as f32).max(0.0);

    let grow: Vec<f32> = items
        .iter()
        .map(|c| {
            c.style
                .get("flex")
                .and_then(|f| f.split_whitespace().next())
                .and_then(|f| f.parse::<f32>().ok())
                .unwrap_or(0.0)
        })
        .collect();
    let mut widths: Vec<f32> = items
        .iter()
        .zip(&grow)
        .map(|(c, g)| match c.style.get("width").and_then(|v| resolve_width(v, w)) {
            Some(fixed) => fixed,
            None if *g > 0.0 => 0.0,
            None => max_content_width(c, ts, measure),
        })
        .collect();

    let used: f32 = widths.iter().sum();
    let total_grow: f32 = grow.iter().sum();
    if used > avail {
        let scale = avail / used;
        widths.iter_mut().for_each(|v| *v *= scale);
    } else if total_grow > 0.0 {
        let free = avail - used;
        for (v, g) in widths.iter_mut().zip(&grow) {
            *v += free * g / total_grow;
        }
    }

    let used: f32 = widths.iter().sum();
    let free = (avail - used).max(0.0);
    let (mut cursor_x, spacing) = match el.style.get("justify-content") {
        Some("space-between") if items.len() > 1 => (x, gap + free / (items.len() - 1) as f32),
        Some("center") => (x + free / 2.0, gap),
        Some("flex-end") | Some("end") => (x + free, gap),
        _ => (x, gap),
    };

    let mut height = 0.0_f32;
    for (item, item_w) in items.iter().zip(widths) {
        let h = layout_block(item, cursor_x, y, item_w, ts, None, true, measure, ops);
        height = height.max(h);
        cursor_x += item_w + spacing;
    }
    height
}

/// Width of the content laid out on a single line, plus horizontal padding and margins.
fn max_content_width(el: &Element, parent: &TextStyle, measure: &dyn TextMeasure) -> f32 {
    let ts = parent.inherit(el);
    let padding = padding_of(el);
    let margin = sides(&el.style, "margin");
    let extra = padding.left + padding.right + margin.left + margin.right;
    if let Some(w) = el.style.length_px("width") {
        return w + margin.left + margin.right;
    }
    let flex = is_flex_row(el);
    let mut widest = 0.0_f32;
    let mut line = 0.0_f32;
    for child in &el.children {
        match child {
            Node::Text(t) => {
                let joined = t.split_whitespace().collect::<Vec<_>>().join(" ");
                line += measure.measure(&joined, ts.font, ts.size, ts.bold);
            }
            Node::Element(c) if c.tag == "br" => {
                widest = widest.max(line);
                line = 0.0;
            }
            Node::Element(c) if flex || !c.is_block() => line += max_content_width(c, &ts, measure),
            Node::Element(c) => {
                widest = widest.max(line).max(max_content_width(c, &ts, measure));
                line = 0.0;
            }
        }
    }
    widest.max(line) + extra
}

// ────────────────────────────────────────────────────────────────────────────
// Inline formatting
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum InlineItem {
    Word(String, TextStyle),
    Break,
}

fn push_words(text: &str, ts: &TextStyle, out: &mut Vec<InlineItem>) {
    for word in text.split_whitespace() {
        let word = if ts.uppercase {
            word.to_uppercase()
        } else {
            word.to_string()
        };
        out.push(InlineItem::Word(word, ts.clone()));
    }
}

fn collect_inline(el: &Element, parent: &TextStyle, out: &mut Vec<InlineItem>) {
    if el.style.get("display") == Some("none") {
        return;
    }
    let ts = parent.inherit(el);
    for child in &el.children {
        match child {
            Node::Text(t) => push_words(t, &ts, out),
            Node::Element(c) if c.tag == "br" => out.push(InlineItem::Break),
            Node::Element(c) => collect_inline(c, &ts, out),
        }
    }
}

/// Wraps the pending inline items into lines and emits their runs.
/// Returns the height of the produced line boxes.
fn flush_inline(
    items: &mut Vec<InlineItem>,
    x: f32,
    y: f32,
    w: f32,
    block: &TextStyle,
    measure: &dyn TextMeasure,
    ops: &mut Vec<PaintOp>,
) -> f32 {
    if items.iter().all(|i| matches!(i, InlineItem::Break)) {
        items.clear();
        return 0.0;
    }

    let mut lines: Vec<Vec<(String, TextStyle, f32)>> = vec![Vec::new()];
    let mut line_w = 0.0_f32;
    for item in items.drain(..) {
        match item {
            InlineItem::Break => {
                lines.push(Vec::new());
                line_w = 0.0;
            }
            InlineItem::Word(word, ts) => {
                let word_w = measure.measure(&word, ts.font, ts.size, ts.bold);
                let space_w = measure.measure(" ", ts.font, ts.size, ts.bold);
                let current = lines.last_mut().map(|l| !l.is_empty()).unwrap_or(false);
                if current && line_w + space_w + word_w > w {
                    lines.push(Vec::new());
                    line_w = 0.0;
                }
                let advance = if line_w > 0.0 { space_w + word_w } else { word_w };
                line_w += advance;
                if let Some(line) = lines.last_mut() {
                    line.push((word, ts, word_w));
                }
            }
        }
    }

    let mut cursor = y;
    for line in lines {
        let line_h = line
            .iter()
            .map(|(_, ts, _)| ts.line_box())
            .fold(0.0_f32, f32::max)
            .max(if line.is_empty() { block.line_box() } else { 0.0 });
        emit_line(&line, x, cursor, w, line_h, block.align, measure, ops);
        cursor += line_h;
    }
    cursor - y
}

#[allow(clippy::too_many_arguments)]
fn emit_line(
    words: &[(String, TextStyle, f32)],
    x: f32,
    top: f32,
    w: f32,
    line_h: f32,
    align: Align,
    measure: &dyn TextMeasure,
    ops: &mut Vec<PaintOp>,
) {
    if words.is_empty() {
        return;
    }
    let space = |ts: &TextStyle| measure.measure(" ", ts.font, ts.size, ts.bold);
    let total: f32 = words
        .iter()
        .enumerate()
        .map(|(i, (_, ts, ww))| if i == 0 { *ww } else { ww + space(ts) })
        .sum();
    let mut pen = match align {
        Align::Left => x,
        Align::Center => x + ((w - total) / 2.0).max(0.0),
        Align::Right => x + (w - total).max(0.0),
    };

    let mut run: Option<TextRun> = None;
    for (i, (word, ts, ww)) in words.iter().enumerate() {
        let lead = if i == 0 { 0.0 } else { space(ts) };
        let same_style = run.as_ref().is_some_and(|r| {
            r.size == ts.size && r.bold == ts.bold && r.color == ts.color && r.font == ts.font
        });
        if same_style {
            if let Some(r) = run.as_mut() {
                r.text.push(' ');
                r.text.push_str(word);
            }
        } else {
            if let Some(done) = run.take() {
                ops.push(PaintOp::Text(done));
            }
            run = Some(TextRun {
                x: pen + lead,
                top,
                line_height: line_h,
                size: ts.size,
                bold: ts.bold,
                color: ts.color,
                font: ts.font,
                text: word.clone(),
            });
        }
        pen += lead + ww;
    }
    if let Some(done) = run {
        ops.push(PaintOp::Text(done));
    }
}
