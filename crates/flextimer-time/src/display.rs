//! Display seam
//!
//! The engine owns its display exclusively and hands it a `Reading` on init,
//! on start and on every tick. How the reading is drawn is up to the sink.

use std::sync::Arc;

use flextimer_core::{format_reading, DisplayOptions, Reading};
use parking_lot::Mutex;

/// Rendering target for one engine
pub trait DisplaySink {
    /// Whether the target can be drawn to. A detached target is a
    /// configuration error at construction.
    fn is_attached(&self) -> bool {
        true
    }

    fn render(&mut self, reading: &Reading, options: &DisplayOptions);
}

/// Discards every reading
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn render(&mut self, _reading: &Reading, _options: &DisplayOptions) {}
}

#[derive(Debug, Default)]
struct TextBuffer {
    text: String,
    last: Option<Reading>,
    renders: u64,
}

/// Keeps the formatted text of the latest reading.
/// Clones share the same buffer, so a host can keep a view while the engine
/// owns the sink.
#[derive(Clone, Debug)]
pub struct TextDisplay {
    buffer: Arc<Mutex<TextBuffer>>,
    attached: bool,
}

impl TextDisplay {
    pub fn new() -> Self {
        TextDisplay {
            buffer: Arc::new(Mutex::new(TextBuffer::default())),
            attached: true,
        }
    }

    /// A target that was never attached; engines refuse it
    pub fn detached() -> Self {
        TextDisplay {
            attached: false,
            ..Self::new()
        }
    }

    pub fn text(&self) -> String {
        self.buffer.lock().text.clone()
    }

    pub fn last_reading(&self) -> Option<Reading> {
        self.buffer.lock().last
    }

    /// Number of renders so far
    pub fn renders(&self) -> u64 {
        self.buffer.lock().renders
    }
}

impl Default for TextDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for TextDisplay {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn render(&mut self, reading: &Reading, options: &DisplayOptions) {
        let mut buffer = self.buffer.lock();
        buffer.text = format_reading(reading, options);
        buffer.last = Some(*reading);
        buffer.renders += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flextimer_core::TimeBreakdown;

    #[test]
    fn test_text_display_shares_buffer() {
        let mut display = TextDisplay::new();
        let view = display.clone();

        let reading = Reading::Span(TimeBreakdown::from_millis(61_000.0));
        display.render(&reading, &DisplayOptions::default());

        assert_eq!(view.text(), "00 Days 00 Hours 01 Minutes 01 Seconds");
        assert_eq!(view.last_reading(), Some(reading));
        assert_eq!(view.renders(), 1);
    }

    #[test]
    fn test_attachment() {
        assert!(TextDisplay::new().is_attached());
        assert!(!TextDisplay::detached().is_attached());
        assert!(NullDisplay.is_attached());
    }
}
