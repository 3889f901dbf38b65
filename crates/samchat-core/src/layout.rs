//! Bubble geometry.
//!
//! Layout is a pure function of `(text, max_width, speaker)` plus the metrics
//! and text measure the engine was built with. The measure comes from the
//! rendering backend; the terminal front end uses [`CellMeasure`].

use std::sync::Arc;

use unicode_width::UnicodeWidthStr;

use crate::state::Speaker;

/// Share of the viewport a bubble's text may occupy
pub const MAX_WIDTH_PERCENT: u16 = 80;

/// Measures text in the backend's units
pub trait TextMeasure: Send + Sync {
    /// Width of a single line of text
    fn text_width(&self, text: &str) -> u16;

    /// Height of one wrapped line
    fn line_height(&self) -> u16;
}

/// Terminal cells: display width per line, one row per line
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMeasure;

impl TextMeasure for CellMeasure {
    fn text_width(&self, text: &str) -> u16 {
        u16::try_from(text.width()).unwrap_or(u16::MAX)
    }

    fn line_height(&self) -> u16 {
        1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl From<Speaker> for Side {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => Side::Right,
            Speaker::Bot => Side::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMetrics {
    pub padding_x: u16,
    pub padding_y: u16,
    pub corner_radius: u16,
}

impl LayoutMetrics {
    /// Border plus one space of air on each side, rounded corners
    pub fn terminal() -> Self {
        Self {
            padding_x: 2,
            padding_y: 1,
            corner_radius: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleGeometry {
    pub width: u16,
    pub height: u16,
    pub side: Side,
    pub corner_radius: u16,
}

/// Geometry plus the wrapped lines it was measured from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleLayout {
    pub geometry: BubbleGeometry,
    pub lines: Vec<String>,
}

#[derive(Clone)]
pub struct BubbleLayoutEngine {
    metrics: LayoutMetrics,
    measure: Arc<dyn TextMeasure>,
}

impl BubbleLayoutEngine {
    pub fn new(metrics: LayoutMetrics, measure: Arc<dyn TextMeasure>) -> Self {
        Self { metrics, measure }
    }

    pub fn terminal() -> Self {
        Self::new(LayoutMetrics::terminal(), Arc::new(CellMeasure))
    }

    /// Text width allowed for a viewport of the given width
    pub fn max_width_for(&self, viewport_width: u16) -> u16 {
        let scaled = u32::from(viewport_width) * u32::from(MAX_WIDTH_PERCENT) / 100;
        u16::try_from(scaled).unwrap_or(u16::MAX).max(1)
    }

    pub fn layout(&self, text: &str, max_width: u16, speaker: Speaker) -> BubbleLayout {
        let max_width = max_width.max(1);
        let lines = self.wrap(text, max_width);

        let text_width = lines
            .iter()
            .map(|line| self.measure.text_width(line))
            .max()
            .unwrap_or(0);
        let line_count = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        let text_height = line_count.saturating_mul(self.measure.line_height());

        let width = text_width.saturating_add(self.metrics.padding_x.saturating_mul(2));
        let height = text_height.saturating_add(self.metrics.padding_y.saturating_mul(2));
        let corner_radius = self.metrics.corner_radius.min(height / 2).min(width / 2);

        BubbleLayout {
            geometry: BubbleGeometry {
                width,
                height,
                side: Side::from(speaker),
                corner_radius,
            },
            lines,
        }
    }

    /// Greedy word wrap. Newlines always break; a word wider than
    /// `max_width` is split at character boundaries.
    fn wrap(&self, text: &str, max_width: u16) -> Vec<String> {
        let space = self.measure.text_width(" ");
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let mut line = String::new();
            let mut line_width: u16 = 0;

            for word in paragraph.split_whitespace() {
                let word_width = self.measure.text_width(word);

                if !line.is_empty() {
                    let candidate = line_width.saturating_add(space).saturating_add(word_width);
                    if candidate <= max_width {
                        line.push(' ');
                        line.push_str(word);
                        line_width = candidate;
                        continue;
                    }
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }

                if word_width <= max_width {
                    line.push_str(word);
                    line_width = word_width;
                } else {
                    let mut pieces = self.split_word(word, max_width);
                    // The tail stays open so following words can join it
                    if let Some(tail) = pieces.pop() {
                        lines.extend(pieces);
                        line_width = self.measure.text_width(&tail);
                        line = tail;
                    }
                }
            }

            lines.push(line);
        }

        lines
    }

    fn split_word(&self, word: &str, max_width: u16) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut piece = String::new();

        for ch in word.chars() {
            piece.push(ch);
            if self.measure.text_width(&piece) > max_width && piece.chars().count() > 1 {
                piece.pop();
                pieces.push(std::mem::take(&mut piece));
                piece.push(ch);
            }
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pixel-like measure: every char is 8 wide, lines are 20 tall
    struct FixedMeasure;

    impl TextMeasure for FixedMeasure {
        fn text_width(&self, text: &str) -> u16 {
            (text.chars().count() * 8) as u16
        }

        fn line_height(&self) -> u16 {
            20
        }
    }

    fn pixel_engine() -> BubbleLayoutEngine {
        BubbleLayoutEngine::new(
            LayoutMetrics {
                padding_x: 10,
                padding_y: 5,
                corner_radius: 45,
            },
            Arc::new(FixedMeasure),
        )
    }

    const PROSE: &str = "The quick brown fox jumps over the lazy dog while the \
                         patient tortoise keeps walking toward the distant finish line";

    #[test]
    fn test_short_text_clamps_radius() {
        let layout = pixel_engine().layout("hi", 400, Speaker::User);

        assert_eq!(layout.lines, vec!["hi"]);
        assert_eq!(layout.geometry.width, 16 + 20);
        assert_eq!(layout.geometry.height, 20 + 10);
        // min(45, 30 / 2, 36 / 2)
        assert_eq!(layout.geometry.corner_radius, 15);
        assert_eq!(layout.geometry.side, Side::Right);
    }

    #[test]
    fn test_narrow_tall_bubble_clamps_radius_to_width() {
        let layout = pixel_engine().layout("a b c d", 8, Speaker::Bot);

        assert_eq!(layout.lines, vec!["a", "b", "c", "d"]);
        assert_eq!(layout.geometry.width, 8 + 20);
        assert_eq!(layout.geometry.height, 4 * 20 + 10);
        // min(45, 90 / 2, 28 / 2)
        assert_eq!(layout.geometry.corner_radius, 14);
    }

    #[test]
    fn test_side_follows_speaker() {
        let engine = BubbleLayoutEngine::terminal();
        assert_eq!(engine.layout("x", 10, Speaker::User).geometry.side, Side::Right);
        assert_eq!(engine.layout("x", 10, Speaker::Bot).geometry.side, Side::Left);
    }

    #[test]
    fn test_greedy_wrap_in_cells() {
        let engine = BubbleLayoutEngine::terminal();
        let layout = engine.layout("aaa bbb ccc dd", 7, Speaker::Bot);

        assert_eq!(layout.lines, vec!["aaa bbb", "ccc dd"]);
        assert_eq!(layout.geometry.width, 7 + 4);
        assert_eq!(layout.geometry.height, 2 + 2);
        assert_eq!(layout.geometry.corner_radius, 1);
    }

    #[test]
    fn test_newlines_are_kept() {
        let engine = BubbleLayoutEngine::terminal();
        let layout = engine.layout("first\n\nthird", 40, Speaker::User);
        assert_eq!(layout.lines, vec!["first", "", "third"]);
    }

    #[test]
    fn test_long_word_is_broken() {
        let engine = BubbleLayoutEngine::terminal();
        let layout = engine.layout("abcdefghij k", 4, Speaker::Bot);
        assert_eq!(layout.lines, vec!["abcd", "efgh", "ij k"]);
        assert!(layout
            .lines
            .iter()
            .all(|line| CellMeasure.text_width(line) <= 4));
    }

    #[test]
    fn test_wide_characters_use_display_width() {
        let engine = BubbleLayoutEngine::terminal();
        let layout = engine.layout("日本語 日本", 6, Speaker::Bot);
        assert_eq!(layout.lines, vec!["日本語", "日本"]);
        assert_eq!(layout.geometry.width, 6 + 4);
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        let layout = BubbleLayoutEngine::terminal().layout("", 10, Speaker::Bot);
        assert_eq!(layout.lines, vec![""]);
        assert_eq!(layout.geometry.width, 4);
        assert_eq!(layout.geometry.height, 3);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let engine = pixel_engine();
        let first = engine.layout(PROSE, 160, Speaker::Bot);
        let second = engine.layout(PROSE, 160, Speaker::Bot);
        assert_eq!(first, second);
    }

    #[test]
    fn test_wider_never_taller() {
        let engine = BubbleLayoutEngine::terminal();
        let mut previous = u16::MAX;
        for max_width in 1..=120 {
            let height = engine.layout(PROSE, max_width, Speaker::User).geometry.height;
            assert!(
                height <= previous,
                "height grew from {} to {} at width {}",
                previous,
                height,
                max_width
            );
            previous = height;
        }
    }

    #[test]
    fn test_max_width_is_eighty_percent() {
        let engine = BubbleLayoutEngine::terminal();
        assert_eq!(engine.max_width_for(100), 80);
        assert_eq!(engine.max_width_for(1000), 800);
        assert_eq!(engine.max_width_for(0), 1);
    }
}
