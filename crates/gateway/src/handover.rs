//! In-band control signals of a live response stream.
//!
//! The voice model asks for a transfer by emitting `[HANDOVER: Name]` in its
//! text output, and the backend reports a moderation veto with a marker
//! string. Either may arrive split across any number of chunks, so the
//! scanner keeps a small carry-over between pushes.

use std::sync::Arc;

use contact_router_core::{traits::ModerationDetector, types::StreamSignal};

/// Opening delimiter of a handover marker.
pub const OPEN_TOKEN: &str = "[HANDOVER:";
/// Closing delimiter of a handover marker.
pub const CLOSE_TOKEN: char = ']';
/// Longest text kept while waiting for a marker's closing delimiter.
/// Longer runs are not a marker and are discarded.
pub const MAX_PENDING_MARKER: usize = 256;

/// Marker the backend emits when a moderation policy intervened.
pub const DEFAULT_MODERATION_MARKER: &str = "guardrail_intervention";

/// Substring match on a fixed intervention marker.
#[derive(Debug, Clone)]
pub struct MarkerModerationDetector {
    marker: String,
}

impl MarkerModerationDetector {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for MarkerModerationDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MODERATION_MARKER)
    }
}

impl ModerationDetector for MarkerModerationDetector {
    fn is_intervention(&self, window: &str) -> bool {
        !self.marker.is_empty() && window.contains(&self.marker)
    }

    fn lookback(&self) -> usize {
        self.marker.len()
    }
}

/// Incremental decoder turning stream chunks into [`StreamSignal`]s.
///
/// Once a terminal signal was produced every later push repeats it.
pub struct HandoverScanner {
    detector: Arc<dyn ModerationDetector>,
    buffer: String,
    carry: usize,
    terminal: Option<StreamSignal>,
}

impl HandoverScanner {
    pub fn new(detector: Arc<dyn ModerationDetector>) -> Self {
        let carry = detector.lookback().max(OPEN_TOKEN.len()).saturating_sub(1);
        Self {
            detector,
            buffer: String::new(),
            carry,
            terminal: None,
        }
    }

    /// Feed the next chunk.
    pub fn push(&mut self, chunk: &str) -> StreamSignal {
        if let Some(signal) = &self.terminal {
            return signal.clone();
        }

        self.buffer.push_str(chunk);

        let signal = self.scan();
        if signal.is_terminal() {
            self.buffer.clear();
            self.terminal = Some(signal.clone());
        }
        signal
    }

    /// Bytes currently carried over to the next push.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn scan(&mut self) -> StreamSignal {
        // A veto wins over a handover in the same window.
        if self.detector.is_intervention(&self.buffer) {
            return StreamSignal::ModerationBlocked;
        }

        loop {
            let Some(start) = self.buffer.find(OPEN_TOKEN) else {
                self.keep_tail(self.carry);
                return StreamSignal::Continue;
            };

            let body = &self.buffer[start + OPEN_TOKEN.len()..];
            if let Some(end) = body.find(CLOSE_TOKEN) {
                return StreamSignal::HandoverRequested {
                    destination_name: body[..end].trim().to_string(),
                };
            }

            if self.buffer.len() - start <= MAX_PENDING_MARKER {
                self.buffer.drain(..start);
                return StreamSignal::Continue;
            }

            tracing::debug!(
                pending = self.buffer.len() - start,
                "Discarding unterminated handover marker"
            );
            self.buffer.drain(..start + OPEN_TOKEN.len());
        }
    }

    /// Keep at most `keep` trailing bytes, cut on a char boundary.
    fn keep_tail(&mut self, keep: usize) {
        let mut cut = self.buffer.len().saturating_sub(keep);
        while !self.buffer.is_char_boundary(cut) {
            cut += 1;
        }
        self.buffer.drain(..cut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> HandoverScanner {
        HandoverScanner::new(Arc::new(MarkerModerationDetector::default()))
    }

    fn handover(name: &str) -> StreamSignal {
        StreamSignal::HandoverRequested {
            destination_name: name.to_string(),
        }
    }

    #[test]
    fn test_plain_text_continues() {
        let mut scanner = scanner();
        assert_eq!(scanner.push("Hello, how can I help?"), StreamSignal::Continue);
        assert_eq!(scanner.push(" Our hours are 9 to 5."), StreamSignal::Continue);
    }

    #[test]
    fn test_marker_in_one_chunk() {
        let mut scanner = scanner();
        assert_eq!(scanner.push("One moment. [HANDOVER: Sales] Bye"), handover("Sales"));
    }

    #[test]
    fn test_marker_split_across_chunks() {
        let mut scanner = scanner();
        assert_eq!(scanner.push("Sure, [HAN"), StreamSignal::Continue);
        assert_eq!(scanner.push("DOVER: Sa"), StreamSignal::Continue);
        assert_eq!(scanner.push("les"), StreamSignal::Continue);
        assert_eq!(scanner.push("] goodbye"), handover("Sales"));
    }

    #[test]
    fn test_marker_split_one_byte_at_a_time() {
        let mut scanner = scanner();
        let text = "ok [HANDOVER:  Billing Team ]";
        let mut last = StreamSignal::Continue;
        for c in text.chars() {
            last = scanner.push(&c.to_string());
        }
        assert_eq!(last, handover("Billing Team"));
    }

    #[test]
    fn test_moderation_wins_over_handover() {
        let mut scanner = scanner();
        assert_eq!(
            scanner.push("[HANDOVER: Sales] guardrail_intervention"),
            StreamSignal::ModerationBlocked
        );
    }

    #[test]
    fn test_split_moderation_marker() {
        let mut scanner = scanner();
        assert_eq!(scanner.push("text guardrail_inter"), StreamSignal::Continue);
        assert_eq!(scanner.push("vention more"), StreamSignal::ModerationBlocked);
    }

    #[test]
    fn test_terminal_signal_repeats() {
        let mut scanner = scanner();
        assert_eq!(scanner.push("[HANDOVER: Sales]"), handover("Sales"));
        assert_eq!(scanner.push("guardrail_intervention"), handover("Sales"));
    }

    #[test]
    fn test_carry_over_is_bounded() {
        let mut scanner = scanner();
        for _ in 0..100 {
            assert_eq!(scanner.push("lorem ipsum dolor sit amet "), StreamSignal::Continue);
        }
        assert!(scanner.pending() < DEFAULT_MODERATION_MARKER.len());
    }

    #[test]
    fn test_unterminated_marker_is_discarded() {
        let mut scanner = scanner();
        assert_eq!(scanner.push("[HANDOVER: "), StreamSignal::Continue);
        assert_eq!(scanner.push(&"x".repeat(MAX_PENDING_MARKER)), StreamSignal::Continue);
        assert!(scanner.pending() < MAX_PENDING_MARKER);
        assert_eq!(scanner.push("]"), StreamSignal::Continue);
        assert_eq!(scanner.push("[HANDOVER: Support]"), handover("Support"));
    }

    #[test]
    fn test_multibyte_text_is_trimmed_safely() {
        let mut scanner = scanner();
        for _ in 0..50 {
            assert_eq!(scanner.push("héllo wörld ñ 日本語 "), StreamSignal::Continue);
        }
        assert_eq!(scanner.push("[HANDOVER: Ventes]"), handover("Ventes"));
    }

    #[test]
    fn test_empty_marker_name() {
        let mut scanner = scanner();
        assert_eq!(scanner.push("[HANDOVER:]"), handover(""));
    }
}
