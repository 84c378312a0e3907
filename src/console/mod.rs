//! Console panel model.
//!
//! The console is an append-only list of text chunks fed by the running
//! child process. Rendering may join chunks visually, but the data model
//! never merges or rewrites them.

mod decoder;

pub use decoder::OutputDecoder;

/// Append-only, show/hide-able text surface for merged process output.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    chunks: Vec<String>,
    visible: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every chunk. Calling it twice is the same as calling it once.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Append `text` as the newest chunk.
    pub fn append(&mut self, text: impl Into<String>) {
        self.chunks.push(text.into());
    }

    /// Chunks in arrival order.
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// All chunks joined for display.
    pub fn text(&self) -> String {
        self.chunks.concat()
    }

    /// The last `count` lines, without their newlines. A final newline does
    /// not start an extra empty line.
    ///
    /// Chunks are visited newest first and only until `count` complete lines
    /// are known, so the cost does not grow with the whole history.
    pub fn tail_lines(&self, count: usize) -> Vec<String> {
        if count == 0 {
            return Vec::new();
        }

        let mut first = self.chunks.len();
        let mut newlines = 0;
        while first > 0 && newlines <= count {
            first -= 1;
            newlines += self.chunks[first].bytes().filter(|&b| b == b'\n').count();
        }

        let tail = self.chunks[first..].concat();
        if tail.is_empty() {
            return Vec::new();
        }
        let body = tail.strip_suffix('\n').unwrap_or(&tail);
        let lines: Vec<&str> = body.split('\n').collect();
        // with chunks left unvisited the first line may be partial; it is
        // never among the last `count`
        let start = lines.len().saturating_sub(count);
        lines[start..].iter().map(|l| l.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_preserves_call_order() {
        let mut console = ConsoleSink::new();
        for chunk in ["one", "two", "", "three\n", "two"] {
            console.append(chunk);
        }
        assert_eq!(console.chunks(), ["one", "two", "", "three\n", "two"]);
    }

    #[test]
    fn test_clear_then_append_leaves_only_new_chunk() {
        let mut console = ConsoleSink::new();
        console.append("old output");
        console.append("more old output");

        console.clear();
        console.append("fresh");

        assert_eq!(console.chunks(), ["fresh"]);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut console = ConsoleSink::new();
        console.append("x");
        console.clear();
        console.clear();
        assert!(console.is_empty());
    }

    #[test]
    fn test_visibility_is_independent_of_content() {
        let mut console = ConsoleSink::new();
        assert!(!console.is_visible());

        console.append("hello");
        console.show();
        assert!(console.is_visible());

        console.hide();
        assert!(!console.is_visible());
        assert_eq!(console.text(), "hello");

        console.toggle();
        assert!(console.is_visible());
    }

    #[test]
    fn test_tail_lines_across_chunks() {
        let mut console = ConsoleSink::new();
        console.append("first\nsec");
        console.append("ond\nthi");
        console.append("rd\n");

        assert_eq!(console.tail_lines(2), ["second", "third"]);
        assert_eq!(console.tail_lines(10), ["first", "second", "third"]);
        assert!(console.tail_lines(0).is_empty());

        console.append("partial");
        assert_eq!(console.tail_lines(2), ["third", "partial"]);
    }

    #[test]
    fn test_tail_lines_keeps_blank_lines() {
        let mut console = ConsoleSink::new();
        assert!(console.tail_lines(3).is_empty());

        console.append("a\n\n");
        assert_eq!(console.tail_lines(3), ["a", ""]);
    }

    #[test]
    fn test_tail_lines_of_long_history() {
        let mut console = ConsoleSink::new();
        let mut chunk = String::new();
        for i in 0..200_000 {
            chunk.push_str(&format!("line {i}\n"));
            if chunk.len() > 8192 {
                console.append(std::mem::take(&mut chunk));
            }
        }
        console.append(chunk);

        assert_eq!(console.tail_lines(3), ["line 199997", "line 199998", "line 199999"]);
    }

    #[test]
    fn test_text_concatenates_without_separators() {
        let mut console = ConsoleSink::new();
        console.append("Collecting foo\n");
        console.append("Installing");
        console.append(" foo\n");
        assert_eq!(console.text(), "Collecting foo\nInstalling foo\n");
    }
}
