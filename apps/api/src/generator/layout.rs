//! Line-by-line text-to-page layout for generated documents.
//!
//! Each input line is classified (blank, header, signature or body) and
//! turned into draw operations on US-letter pages. Body and header text is
//! word-wrapped against the static font metrics; a new page starts whenever
//! the next line would cross the bottom margin.

use crate::generator::font_metrics::{get_metrics, FontFace};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
pub const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 16.0;
const HEADER_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;
const LINE_SPACING: f32 = 1.4;
const BLANK_SPACE: f32 = 8.0;
const SIGNATURE_RULE_WIDTH: f32 = 220.0;
const LOGO_GAP: f32 = 12.0;

pub const MAX_HEADER_CHARS: usize = 60;
pub const MIN_SIGNATURE_UNDERSCORES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Header(&'a str),
    /// Label is whatever precedes the underscore run; may be empty.
    Signature { label: &'a str },
    Body(&'a str),
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }

    let label = trimmed.trim_end_matches('_');
    let underscores = trimmed.len() - label.len();
    if underscores >= MIN_SIGNATURE_UNDERSCORES || trimmed.starts_with("Signature:") {
        return LineKind::Signature {
            label: label.trim_end(),
        };
    }

    if is_header(trimmed) {
        LineKind::Header(trimmed)
    } else {
        LineKind::Body(trimmed)
    }
}

fn is_header(line: &str) -> bool {
    line.chars().count() <= MAX_HEADER_CHARS
        && line.chars().any(char::is_alphabetic)
        && !line.chars().any(char::is_lowercase)
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        size: f32,
        face: FontFace,
        text: String,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
    },
    /// `y` is the bottom edge of the image.
    Logo {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn at_top(&self) -> bool {
        self.y >= PAGE_HEIGHT - MARGIN
    }

    /// Moves down by `height`, breaking the page first if it would not fit.
    fn advance(&mut self, height: f32) -> f32 {
        if self.y - height < MARGIN && !self.at_top() {
            self.pages.push(Page::default());
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.y -= height;
        self.y
    }

    fn skip(&mut self, height: f32) {
        if !self.at_top() {
            self.y = (self.y - height).max(MARGIN);
        }
    }

    fn draw(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn text_lines(&mut self, text: &str, face: FontFace, size: f32, centered: bool) {
        let metrics = get_metrics(face);
        for line in metrics.wrap(text, TEXT_WIDTH / size) {
            let y = self.advance(size * LINE_SPACING);
            let x = if centered {
                MARGIN + ((TEXT_WIDTH - metrics.width_pt(&line, size)) / 2.0).max(0.0)
            } else {
                MARGIN
            };
            self.draw(DrawOp::Text {
                x,
                y,
                size,
                face,
                text: line,
            });
        }
    }

    fn signature(&mut self, label: &str) {
        // Two lines of room so there is space to sign above the rule.
        let y = self.advance(BODY_SIZE * LINE_SPACING * 2.0);
        let mut rule_start = MARGIN;
        if !label.is_empty() {
            let metrics = get_metrics(FontFace::Helvetica);
            rule_start += metrics.width_pt(label, BODY_SIZE) + 4.0;
            self.draw(DrawOp::Text {
                x: MARGIN,
                y,
                size: BODY_SIZE,
                face: FontFace::Helvetica,
                text: label.to_string(),
            });
        }
        let rule_end = (rule_start + SIGNATURE_RULE_WIDTH).min(PAGE_WIDTH - MARGIN);
        self.draw(DrawOp::Rule {
            x1: rule_start.min(rule_end),
            x2: rule_end,
            y: y - 2.0,
        });
    }
}

/// Lays out `title` and `content`. The logo, if any, goes top-left on page one.
pub fn layout_document(title: &str, content: &str, logo: Option<(f32, f32)>) -> Vec<Page> {
    let mut cursor = Cursor::new();

    if let Some((width, height)) = logo {
        let top = PAGE_HEIGHT - MARGIN;
        cursor.draw(DrawOp::Logo {
            x: MARGIN,
            y: top - height,
            width,
            height,
        });
        cursor.y = top - height - LOGO_GAP;
    }

    let title = title.trim();
    let mut lines = content.lines().peekable();
    if !title.is_empty() {
        cursor.text_lines(title, FontFace::HelveticaBold, TITLE_SIZE, true);
        cursor.skip(BLANK_SPACE);
        // Generated text usually repeats the title as its first line.
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }
        if lines.peek().is_some_and(|l| l.trim().eq_ignore_ascii_case(title)) {
            lines.next();
        }
    }

    for line in lines {
        match classify_line(line) {
            LineKind::Blank => cursor.skip(BLANK_SPACE),
            LineKind::Header(text) => {
                cursor.skip(BLANK_SPACE / 2.0);
                cursor.text_lines(text, FontFace::HelveticaBold, HEADER_SIZE, false);
            }
            LineKind::Signature { label } => cursor.signature(label),
            LineKind::Body(text) => cursor.text_lines(text, FontFace::Helvetica, BODY_SIZE, false),
        }
    }

    cursor.pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_line_rules() {
        assert_eq!(classify_line("   "), LineKind::Blank);
        assert_eq!(classify_line("1. PAYMENT TERMS"), LineKind::Header("1. PAYMENT TERMS"));
        assert_eq!(classify_line("The tenant shall pay."), LineKind::Body("The tenant shall pay."));
        assert_eq!(classify_line("__________"), LineKind::Signature { label: "" });
        assert_eq!(
            classify_line("Signature: ______________"),
            LineKind::Signature { label: "Signature:" }
        );
        assert_eq!(
            classify_line("Signature: Jane Roe"),
            LineKind::Signature { label: "Signature: Jane Roe" }
        );
    }

    #[test]
    fn test_header_needs_a_letter_and_at_most_60_chars() {
        assert_eq!(classify_line("2026"), LineKind::Body("2026"));
        let long = "A".repeat(61);
        assert_eq!(classify_line(&long), LineKind::Body(long.as_str()));
        assert_eq!(classify_line("___"), LineKind::Body("___"));
    }

    #[test]
    fn test_body_text_wraps_within_text_width() {
        let paragraph = "The Contractor shall deliver all work product on time. ".repeat(10);
        let pages = layout_document("", &paragraph, None);
        let metrics = get_metrics(FontFace::Helvetica);

        let texts: Vec<_> = pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, size, .. } => Some((text.clone(), *size)),
                _ => None,
            })
            .collect();
        assert!(texts.len() > 1);
        for (text, size) in texts {
            assert!(metrics.width_pt(&text, size) <= TEXT_WIDTH + 0.01);
        }
    }

    #[test]
    fn test_long_content_breaks_pages_and_stays_inside_margins() {
        let content = "Clause text.\n".repeat(200);
        let pages = layout_document("LONG DOCUMENT", &content, None);

        assert!(pages.len() > 1);
        for page in &pages {
            for op in &page.ops {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y >= MARGIN && *y <= PAGE_HEIGHT - MARGIN);
                }
            }
        }
    }

    #[test]
    fn test_logo_only_on_first_page_and_title_below_it() {
        let content = "Line.\n".repeat(200);
        let pages = layout_document("NDA", &content, Some((120.0, 60.0)));

        let logos = |page: &Page| {
            page.ops
                .iter()
                .filter(|op| matches!(op, DrawOp::Logo { .. }))
                .count()
        };
        assert_eq!(logos(&pages[0]), 1);
        assert!(pages[1..].iter().all(|p| logos(p) == 0));

        match &pages[0].ops[1] {
            DrawOp::Text { y, text, .. } => {
                assert_eq!(text, "NDA");
                assert!(*y < PAGE_HEIGHT - MARGIN - 60.0);
            }
            other => panic!("expected title text, got {other:?}"),
        }
    }

    #[test]
    fn test_repeated_title_line_is_not_drawn_twice() {
        let pages = layout_document("Lease Agreement", "\nLEASE AGREEMENT\n\nBody.", None);
        let titles = pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { text, .. } if text.eq_ignore_ascii_case("lease agreement")))
            .count();
        assert_eq!(titles, 1);
    }

    #[test]
    fn test_signature_draws_label_and_rule() {
        let pages = layout_document("", "Signature: ________", None);
        assert!(matches!(&pages[0].ops[0], DrawOp::Text { text, .. } if text == "Signature:"));
        match pages[0].ops[1] {
            DrawOp::Rule { x1, x2, .. } => assert!(x1 > MARGIN && x2 > x1),
            ref other => panic!("expected rule, got {other:?}"),
        }
    }
}
