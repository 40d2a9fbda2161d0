//! Line batching inside the fenced region.

/// Number of complete lines that triggers a partial flush.
pub const LINE_BATCH_THRESHOLD: usize = 2;

/// Groups complete lines and appends them to the authoritative payload in
/// batches, so that partial snapshots go out at a readable cadence instead of
/// once per line.
#[derive(Debug, Clone)]
pub struct LineBatcher {
    threshold: usize,
    buffer: Vec<String>,
    payload: String,
    line_count: usize,
}

impl Default for LineBatcher {
    fn default() -> Self {
        Self::new(LINE_BATCH_THRESHOLD)
    }
}

impl LineBatcher {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            buffer: Vec::new(),
            payload: String::new(),
            line_count: 0,
        }
    }

    /// Buffers complete lines. Returns `true` when the buffer reached the
    /// threshold and the caller should [`flush`](Self::flush).
    pub fn push_lines<I, S>(&mut self, lines: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buffer.extend(lines.into_iter().map(Into::into));
        self.buffer.len() >= self.threshold
    }

    /// Moves all buffered lines into the payload, newline-joined with a
    /// trailing newline. Returns `false` if there was nothing to flush.
    pub fn flush(&mut self) -> bool {
        if self.buffer.is_empty() {
            return false;
        }
        self.line_count += self.buffer.len();
        self.payload.push_str(&self.buffer.join("\n"));
        self.payload.push('\n');
        self.buffer.clear();
        true
    }

    pub fn buffered(&self) -> &[String] {
        &self.buffer
    }

    /// Everything accepted so far. Only ever grows.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}
