//! Per-stream extraction state.
//!
//! [`ExtractionSession`] consumes fragments in arrival order and reports what
//! happened as [`ExtractionEvent`]s. It performs no I/O and never waits; the
//! caller decides how to pace and deliver the events.

use super::batcher::{LINE_BATCH_THRESHOLD, LineBatcher};
use super::fence::{CLOSING_DELIMITER, DelimiterScanner, OPENING_DELIMITER};

/// Where the session is relative to the fenced block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FencePhase {
    /// Opening delimiter not seen yet.
    AwaitingOpen,
    /// Opening delimiter seen; reading the rest of its line.
    InfoLine,
    /// Inside the block, accepting lines.
    Collecting,
    /// Closing delimiter seen. Further input only grows the raw text.
    Closed,
}

/// Something the caller has to act on, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionEvent {
    /// The opening delimiter was found.
    Opened,
    /// Buffered lines were appended; `payload` is everything accepted so far.
    Flushed { payload: String },
    /// The closing delimiter was found; `payload` is final.
    Closed { payload: String },
}

/// How a stream ended, as seen by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    /// No opening delimiter in the whole stream.
    NoDiagram,
    /// Opening delimiter seen but the stream ended before the closing one.
    Unterminated,
}

#[derive(Debug, Clone)]
pub struct ExtractionSession {
    raw: String,
    pending: String,
    phase: FencePhase,
    opener: DelimiterScanner,
    closer: DelimiterScanner,
    batcher: LineBatcher,
}

impl Default for ExtractionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionSession {
    pub fn new() -> Self {
        Self::with_threshold(LINE_BATCH_THRESHOLD)
    }

    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            raw: String::new(),
            pending: String::new(),
            phase: FencePhase::AwaitingOpen,
            opener: DelimiterScanner::new(OPENING_DELIMITER),
            closer: DelimiterScanner::new(CLOSING_DELIMITER),
            batcher: LineBatcher::new(threshold),
        }
    }

    /// Consumes one fragment and returns the resulting events in order.
    pub fn feed(&mut self, fragment: &str) -> Vec<ExtractionEvent> {
        self.raw.push_str(fragment);
        if self.phase == FencePhase::Closed {
            return Vec::new();
        }
        self.pending.push_str(fragment);

        let mut events = Vec::new();
        loop {
            let advanced = match self.phase {
                FencePhase::AwaitingOpen => self.scan_opening(&mut events),
                FencePhase::InfoLine => self.scan_info_line(),
                FencePhase::Collecting => self.scan_body(&mut events),
                FencePhase::Closed => false,
            };
            if !advanced {
                break;
            }
        }
        events
    }

    /// Classifies the stream once no more fragments will arrive.
    pub fn finish(&self) -> StreamOutcome {
        match self.phase {
            FencePhase::Closed => StreamOutcome::Completed,
            FencePhase::AwaitingOpen => StreamOutcome::NoDiagram,
            FencePhase::InfoLine | FencePhase::Collecting => StreamOutcome::Unterminated,
        }
    }

    fn scan_opening(&mut self, events: &mut Vec<ExtractionEvent>) -> bool {
        match self.opener.find(&self.pending) {
            Some(at) => {
                self.pending.drain(..at + OPENING_DELIMITER.len());
                self.phase = FencePhase::InfoLine;
                events.push(ExtractionEvent::Opened);
                true
            }
            None => {
                // Only a possible delimiter prefix is worth keeping.
                let keep_from = self.opener.overlap_start(&self.pending);
                self.pending.drain(..keep_from);
                self.opener.rebase(keep_from);
                false
            }
        }
    }

    /// A blank info line is dropped. Anything else on it is the first line
    /// of the diagram, as in "```mermaid graph TD".
    fn scan_info_line(&mut self) -> bool {
        let Some(newline) = self.pending.find('\n') else {
            return false;
        };
        let info: String = self.pending.drain(..=newline).collect();
        let text = info[..newline].trim_start();
        if !text.trim_end().is_empty() {
            self.batcher.push_lines([text]);
        }
        self.closer.reset();
        self.phase = FencePhase::Collecting;
        true
    }

    fn scan_body(&mut self, events: &mut Vec<ExtractionEvent>) -> bool {
        if let Some(at) = self.closer.find(&self.pending) {
            let body: String = self.pending.drain(..at).collect();
            self.pending.clear();

            let mut lines: Vec<&str> = body.split('\n').collect();
            if lines.last().is_some_and(|tail| tail.is_empty()) {
                lines.pop();
            }
            self.batcher.push_lines(lines);
            if self.batcher.flush() {
                events.push(ExtractionEvent::Flushed {
                    payload: self.batcher.payload().to_string(),
                });
            }

            self.phase = FencePhase::Closed;
            events.push(ExtractionEvent::Closed {
                payload: self.batcher.payload().to_string(),
            });
            return false;
        }

        if let Some(last_newline) = self.pending.rfind('\n') {
            let complete: String = self.pending.drain(..=last_newline).collect();
            self.closer.rebase(complete.len());
            let lines = complete[..complete.len() - 1].split('\n');
            if self.batcher.push_lines(lines) && self.batcher.flush() {
                events.push(ExtractionEvent::Flushed {
                    payload: self.batcher.payload().to_string(),
                });
            }
        }
        false
    }

    /// All fragments received so far, including text outside the fence.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Unconsumed tail: a partial delimiter or a partial line.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Lines accepted so far.
    pub fn payload(&self) -> &str {
        self.batcher.payload()
    }

    pub fn buffered_lines(&self) -> &[String] {
        self.batcher.buffered()
    }

    pub fn phase(&self) -> FencePhase {
        self.phase
    }

    /// True between the opening and the closing delimiter.
    pub fn is_collecting(&self) -> bool {
        matches!(self.phase, FencePhase::InfoLine | FencePhase::Collecting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_A: [&str; 3] = [
        "prefix ```mermaid\ngraph TD\n",
        "A-->B\n",
        "B-->C\n```suffix",
    ];

    fn run(fragments: &[&str]) -> (ExtractionSession, Vec<ExtractionEvent>) {
        let mut session = ExtractionSession::new();
        let mut events = Vec::new();
        for fragment in fragments {
            events.extend(session.feed(fragment));
        }
        (session, events)
    }

    #[test]
    fn scenario_a_extracts_fenced_lines() {
        let (session, events) = run(&SCENARIO_A);

        assert_eq!(session.payload(), "graph TD\nA-->B\nB-->C\n");
        assert_eq!(session.finish(), StreamOutcome::Completed);
        assert_eq!(
            events,
            vec![
                ExtractionEvent::Opened,
                ExtractionEvent::Flushed {
                    payload: "graph TD\nA-->B\n".to_string()
                },
                ExtractionEvent::Flushed {
                    payload: "graph TD\nA-->B\nB-->C\n".to_string()
                },
                ExtractionEvent::Closed {
                    payload: "graph TD\nA-->B\nB-->C\n".to_string()
                },
            ]
        );
        assert_eq!(session.raw(), SCENARIO_A.concat());
    }

    #[test]
    fn no_opening_delimiter_yields_no_events() {
        let (session, events) = run(&["just some prose\n", "and more ``` of it\n"]);
        assert!(events.is_empty());
        assert_eq!(session.finish(), StreamOutcome::NoDiagram);
        assert!(!session.is_collecting());
        assert!(session.pending().len() < OPENING_DELIMITER.len());
    }

    #[test]
    fn unterminated_block_keeps_collecting() {
        let (session, events) = run(&["```mermaid\n", "graph TD\nA-->B\n", "B-->C\n"]);
        assert!(session.is_collecting());
        assert_eq!(session.finish(), StreamOutcome::Unterminated);
        assert!(!events.iter().any(|e| matches!(e, ExtractionEvent::Closed { .. })));
        assert_eq!(session.buffered_lines(), ["B-->C".to_string()]);
    }

    #[test]
    fn unterminated_final_line_before_closer_is_accepted() {
        let (session, _) = run(&["```mermaid\ngraph TD\nA-->B```"]);
        assert_eq!(session.payload(), "graph TD\nA-->B\n");
    }

    #[test]
    fn closing_flush_may_carry_a_single_line() {
        let (_, events) = run(&["```mermaid\ngraph TD\nA-->B\nB-->C\n```"]);
        let flushes: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ExtractionEvent::Flushed { payload } => Some(payload.clone()),
                _ => None,
            })
            .collect();
        // One fragment: all three lines arrive together with the closer.
        assert_eq!(flushes, vec!["graph TD\nA-->B\nB-->C\n".to_string()]);
    }

    #[test]
    fn every_non_final_flush_carries_at_least_threshold_lines() {
        let text = "```mermaid\nl1\nl2\nl3\nl4\nl5\n```";
        let mut session = ExtractionSession::new();
        let mut previous_lines = 0;
        let mut events = Vec::new();
        for ch in text.chars() {
            events.extend(session.feed(&ch.to_string()));
        }
        let closed_at = events
            .iter()
            .position(|e| matches!(e, ExtractionEvent::Closed { .. }))
            .unwrap();
        for (index, event) in events.iter().enumerate() {
            if let ExtractionEvent::Flushed { payload } = event {
                let lines = payload.lines().count();
                let is_final_flush = index + 1 == closed_at;
                if !is_final_flush {
                    assert!(lines - previous_lines >= LINE_BATCH_THRESHOLD);
                }
                previous_lines = lines;
            }
        }
        assert_eq!(session.payload(), "l1\nl2\nl3\nl4\nl5\n");
    }

    #[test]
    fn payload_is_independent_of_fragmentation() {
        let text = SCENARIO_A.concat();
        let (reference, _) = run(&[text.as_str()]);
        let expected = reference.payload().to_string();

        // Every two-way split, including inside both delimiters.
        for split in 0..=text.len() {
            let (session, _) = run(&[&text[..split], &text[split..]]);
            assert_eq!(session.payload(), expected, "split at {split}");
        }

        // Every three-way split.
        for first in 0..=text.len() {
            for second in first..=text.len() {
                let (session, _) = run(&[&text[..first], &text[first..second], &text[second..]]);
                assert_eq!(session.payload(), expected, "splits at {first},{second}");
                assert_eq!(session.finish(), StreamOutcome::Completed);
            }
        }

        // One character at a time.
        let chars: Vec<String> = text.chars().map(String::from).collect();
        let pieces: Vec<&str> = chars.iter().map(String::as_str).collect();
        let (session, _) = run(&pieces);
        assert_eq!(session.payload(), expected);
    }

    #[test]
    fn multibyte_content_survives_any_char_split() {
        let text = "説明:\n```mermaid\ngraph TD\nA[開始]-->B[終了]\n```\n以上";
        let (reference, _) = run(&[text]);
        assert_eq!(reference.payload(), "graph TD\nA[開始]-->B[終了]\n");

        let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        for split in boundaries {
            let (session, _) = run(&[&text[..split], &text[split..]]);
            assert_eq!(session.payload(), reference.payload());
        }
    }

    #[test]
    fn replaying_the_same_stream_is_deterministic() {
        let (first, first_events) = run(&SCENARIO_A);
        let (second, second_events) = run(&SCENARIO_A);
        assert_eq!(first.payload(), second.payload());
        assert_eq!(first_events, second_events);
    }

    #[test]
    fn text_after_closer_is_ignored_but_recorded() {
        let mut session = ExtractionSession::new();
        session.feed("```mermaid\ngraph TD\n```");
        let later = session.feed("\n```mermaid\nX-->Y\n```");
        assert!(later.is_empty());
        assert_eq!(session.payload(), "graph TD\n");
        assert!(session.raw().ends_with("X-->Y\n```"));
    }

    #[test]
    fn blank_info_line_is_discarded() {
        let (session, _) = run(&["```mermaid  \r", "\ngraph LR\nA-->B\n```"]);
        assert_eq!(session.payload(), "graph LR\nA-->B\n");
    }

    #[test]
    fn text_on_opener_line_is_first_payload_line() {
        let (session, events) = run(&["```mermaid graph TD\nA-->B\n```"]);
        assert_eq!(session.payload(), "graph TD\nA-->B\n");
        assert_eq!(
            events.last(),
            Some(&ExtractionEvent::Closed {
                payload: "graph TD\nA-->B\n".to_string()
            })
        );
    }

    #[test]
    fn opener_line_text_split_across_fragments() {
        let (session, _) = run(&["```mermaid gra", "ph LR", "\nA-->B\n```"]);
        assert_eq!(session.payload(), "graph LR\nA-->B\n");
        assert_eq!(session.finish(), StreamOutcome::Completed);
    }

    #[test]
    fn empty_block_closes_with_empty_payload() {
        let (session, events) = run(&["```mermaid\n```"]);
        assert_eq!(
            events,
            vec![
                ExtractionEvent::Opened,
                ExtractionEvent::Closed {
                    payload: String::new()
                }
            ]
        );
        assert_eq!(session.finish(), StreamOutcome::Completed);
    }
}
