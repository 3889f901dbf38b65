//! Append-only list of bubbles with a viewport pinned to the newest one.

use crate::layout::{BubbleLayout, BubbleLayoutEngine};
use crate::state::{Speaker, Turn};

/// Blank rows between consecutive bubbles
pub const BUBBLE_SPACING: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub sequence: u64,
    pub speaker: Speaker,
    pub text: String,
    pub layout: BubbleLayout,
}

#[derive(Debug, Default)]
pub struct ScrollingMessageView {
    bubbles: Vec<Bubble>,
    viewport_width: u16,
    viewport_height: u16,
    scroll_offset: u16,
}

impl ScrollingMessageView {
    pub fn new(viewport_width: u16, viewport_height: u16) -> Self {
        Self {
            viewport_width,
            viewport_height,
            ..Self::default()
        }
    }

    /// Add a bubble after every existing one and scroll to the bottom
    pub fn append(&mut self, turn: &Turn, layout: BubbleLayout) {
        self.bubbles.push(Bubble {
            sequence: turn.sequence,
            speaker: turn.speaker,
            text: turn.text.clone(),
            layout,
        });
        self.scroll_to_bottom();
    }

    /// Re-measure every bubble for a new viewport. Order and sides never change.
    pub fn on_resize(&mut self, width: u16, height: u16, engine: &BubbleLayoutEngine) {
        if width == self.viewport_width && height == self.viewport_height {
            return;
        }
        let pinned = self.is_at_bottom();
        self.viewport_width = width;
        self.viewport_height = height;

        let max_width = engine.max_width_for(width);
        for bubble in &mut self.bubbles {
            bubble.layout = engine.layout(&bubble.text, max_width, bubble.speaker);
        }

        if pinned {
            self.scroll_to_bottom();
        } else {
            self.scroll_offset = self.scroll_offset.min(self.max_scroll());
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(rows).min(self.max_scroll());
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll_offset >= self.max_scroll()
    }

    /// Total rows taken by all bubbles and the gaps between them
    pub fn content_height(&self) -> u16 {
        let bubbles: u16 = self
            .bubbles
            .iter()
            .fold(0u16, |acc, b| acc.saturating_add(b.layout.geometry.height));
        let gaps = u16::try_from(self.bubbles.len().saturating_sub(1))
            .unwrap_or(u16::MAX)
            .saturating_mul(BUBBLE_SPACING);
        bubbles.saturating_add(gaps)
    }

    pub fn max_scroll(&self) -> u16 {
        self.content_height().saturating_sub(self.viewport_height)
    }

    pub fn scroll_offset(&self) -> u16 {
        self.scroll_offset
    }

    pub fn viewport(&self) -> (u16, u16) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Bubbles with the content row each one starts at
    pub fn positioned(&self) -> impl Iterator<Item = (u16, &Bubble)> {
        let mut top = 0u16;
        self.bubbles.iter().map(move |bubble| {
            let start = top;
            top = top
                .saturating_add(bubble.layout.geometry.height)
                .saturating_add(BUBBLE_SPACING);
            (start, bubble)
        })
    }
}
