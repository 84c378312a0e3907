//! Byte-to-text decoding for child process output.
//!
//! Pipe reads can split a multi-byte UTF-8 character, or a terminal escape
//! sequence, across two reads. A short byte tail is carried into the next
//! call and the escape parser keeps its state between calls. Invalid bytes
//! are replaced, and escape sequences are removed since the console shows
//! plain text.

/// Longest incomplete UTF-8 sequence that can be pending between reads.
const MAX_UTF8_CARRY: usize = 3;

#[derive(Debug, Default)]
pub struct OutputDecoder {
    carry: Vec<u8>,
    escape: EscapeState,
}

impl OutputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one read's worth of bytes. May return an empty string when the
    /// whole read is the start of a character or an escape still in flight.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut data = std::mem::take(&mut self.carry);
        data.extend_from_slice(bytes);

        let split = incomplete_tail_start(&data);
        self.carry = data.split_off(split);

        self.strip_ansi_codes(&String::from_utf8_lossy(&data))
    }

    /// Flush whatever is still carried once the stream has ended. An
    /// unterminated escape sequence is dropped.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.carry);
        let text = self.strip_ansi_codes(&String::from_utf8_lossy(&rest));
        self.escape = EscapeState::Ground;
        text
    }

    /// Strip ANSI escape codes from text.
    /// Removes color codes, cursor movements, and OSC sequences.
    fn strip_ansi_codes(&mut self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());

        for ch in text.chars() {
            self.escape = match (self.escape, ch) {
                (EscapeState::Ground, '\x1b') => EscapeState::Escape,
                (EscapeState::Ground, _) => {
                    result.push(ch);
                    EscapeState::Ground
                }
                (EscapeState::Escape, '[') => EscapeState::Csi,
                (EscapeState::Escape, ']') => EscapeState::Osc,
                // two-character escape such as ESC =
                (EscapeState::Escape, _) => EscapeState::Ground,
                // CSI ends at the first byte in 0x40..=0x7e
                (EscapeState::Csi, '\x40'..='\x7e') => EscapeState::Ground,
                (EscapeState::Csi, _) => EscapeState::Csi,
                // OSC ends at BEL or ST (ESC \)
                (EscapeState::Osc, '\x07') => EscapeState::Ground,
                (EscapeState::Osc, '\x1b') => EscapeState::OscEscape,
                (EscapeState::Osc, _) => EscapeState::Osc,
                (EscapeState::OscEscape, '\\') => EscapeState::Ground,
                (EscapeState::OscEscape, _) => EscapeState::Osc,
            };
        }

        result
    }
}

/// Where the escape parser is within the stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum EscapeState {
    #[default]
    Ground,
    /// Saw ESC.
    Escape,
    /// Inside `ESC [`.
    Csi,
    /// Inside `ESC ]`.
    Osc,
    /// Saw ESC inside an OSC, possibly the start of ST.
    OscEscape,
}

/// Index where a trailing, not-yet-complete UTF-8 sequence begins, or
/// `data.len()` if the buffer ends on a boundary.
fn incomplete_tail_start(data: &[u8]) -> usize {
    let window = data.len().saturating_sub(MAX_UTF8_CARRY);
    for start in (window..data.len()).rev() {
        let byte = data[start];
        if byte & 0b1100_0000 == 0b1000_0000 {
            // continuation byte, keep looking for the lead byte
            continue;
        }
        let needed = match byte {
            b if b & 0b1110_0000 == 0b1100_0000 => 2,
            b if b & 0b1111_0000 == 0b1110_0000 => 3,
            b if b & 0b1111_1000 == 0b1111_0000 => 4,
            _ => return data.len(),
        };
        return if data.len() - start < needed {
            start
        } else {
            data.len()
        };
    }
    data.len()
}
