//! Line assembly: turns a byte stream into command lines.
//!
//! Bytes are processed one at a time, so a line may arrive spread over any
//! number of transport reads. Handled bytes:
//! - CR (0x0D) / LF (0x0A) - complete the current line
//! - BS (0x08) / DEL (0x7F) - erase the last byte
//! - anything else - append and echo, or drop when the buffer is full

use crate::LINE_CAPACITY;
use heapless::Vec;

pub const BACKSPACE: u8 = 0x08;
pub const DELETE: u8 = 0x7F;
/// Erases one character on the terminal: backspace, space, backspace.
pub const ERASE_SEQUENCE: &[u8] = b"\x08 \x08";

/// A completed line, terminator excluded.
pub type Line<const N: usize = LINE_CAPACITY> = Vec<u8, N>;

/// Bounded line storage. Holds at most `N - 1` bytes; the last slot is kept
/// free the same way a C string keeps room for its terminator.
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineBuffer<const N: usize = LINE_CAPACITY> {
    bytes: Vec<u8, N>,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Number of bytes the buffer accepts before dropping input.
    pub const fn usable_capacity() -> usize {
        N.saturating_sub(1)
    }

    /// Returns false, leaving the buffer untouched, when it is full.
    pub fn append(&mut self, byte: u8) -> bool {
        if self.bytes.len() >= Self::usable_capacity() {
            return false;
        }
        self.bytes.push(byte).is_ok()
    }

    pub fn pop_last(&mut self) -> Option<u8> {
        self.bytes.pop()
    }

    pub fn take_and_clear(&mut self) -> Line<N> {
        core::mem::take(&mut self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Outcome of feeding one byte to the [`LineAssembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event<const N: usize = LINE_CAPACITY> {
    /// CR or LF arrived; carries the line, which may be empty.
    LineComplete(Line<N>),
    /// The last byte was removed.
    Erased,
    /// Erase requested on an empty line.
    Ignored,
    /// The byte was stored.
    Appended(u8),
    /// The buffer was full; the byte was discarded.
    Dropped,
}

impl<const N: usize> Event<N> {
    /// Bytes to send back to the terminal for this event.
    pub fn echo(&self) -> &[u8] {
        match self {
            Event::Appended(byte) => core::slice::from_ref(byte),
            Event::Erased => ERASE_SEQUENCE,
            Event::LineComplete(_) | Event::Ignored | Event::Dropped => &[],
        }
    }
}

#[derive(Debug, Default)]
pub struct LineAssembler<const N: usize = LINE_CAPACITY> {
    buffer: LineBuffer<N>,
}

impl<const N: usize> LineAssembler<N> {
    pub const fn new() -> Self {
        Self {
            buffer: LineBuffer::new(),
        }
    }

    pub fn feed(&mut self, byte: u8) -> Event<N> {
        match byte {
            b'\r' | b'\n' => Event::LineComplete(self.buffer.take_and_clear()),
            BACKSPACE | DELETE => match self.buffer.pop_last() {
                Some(_) => Event::Erased,
                None => Event::Ignored,
            },
            _ => {
                if self.buffer.append(byte) {
                    Event::Appended(byte)
                } else {
                    trace!("line full, dropping {=u8:#x}", byte);
                    Event::Dropped
                }
            }
        }
    }

    /// Discards any partially typed line.
    pub fn reset(&mut self) {
        self.buffer.take_and_clear();
    }

    pub fn pending(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all<const N: usize>(asm: &mut LineAssembler<N>, data: &[u8]) -> std::vec::Vec<Event<N>> {
        data.iter().map(|&b| asm.feed(b)).collect()
    }

    #[test]
    fn test_appends_and_echoes() {
        let mut asm: LineAssembler = LineAssembler::new();
        let event = asm.feed(b'a');
        assert_eq!(event, Event::Appended(b'a'));
        assert_eq!(event.echo(), b"a");
        assert_eq!(asm.pending(), b"a");
    }

    #[test]
    fn test_line_complete_on_cr_and_lf() {
        let mut asm: LineAssembler = LineAssembler::new();
        feed_all(&mut asm, b"ping");
        let event = asm.feed(b'\r');
        assert_eq!(event, Event::LineComplete(Line::from_slice(b"ping").unwrap()));
        assert!(event.echo().is_empty());
        assert!(asm.is_empty());

        feed_all(&mut asm, b"help");
        assert_eq!(
            asm.feed(b'\n'),
            Event::LineComplete(Line::from_slice(b"help").unwrap())
        );
    }

    #[test]
    fn test_single_completion_without_terminator_in_text() {
        let mut asm: LineAssembler = LineAssembler::new();
        let events = feed_all(&mut asm, b"abc def\r");
        let lines: std::vec::Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::LineComplete(line) => Some(line.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(&lines[0][..], b"abc def");
    }

    #[test]
    fn test_crlf_yields_second_empty_line() {
        let mut asm: LineAssembler = LineAssembler::new();
        feed_all(&mut asm, b"ping");
        assert_eq!(
            asm.feed(b'\r'),
            Event::LineComplete(Line::from_slice(b"ping").unwrap())
        );
        assert_eq!(asm.feed(b'\n'), Event::LineComplete(Line::new()));
    }

    #[test]
    fn test_erase_on_empty_is_ignored() {
        let mut asm: LineAssembler = LineAssembler::new();
        for _ in 0..5 {
            assert_eq!(asm.feed(BACKSPACE), Event::Ignored);
            assert_eq!(asm.feed(DELETE), Event::Ignored);
            assert_eq!(asm.len(), 0);
        }
        assert!(Event::<LINE_CAPACITY>::Ignored.echo().is_empty());
    }

    #[test]
    fn test_erase_removes_last_byte() {
        let mut asm: LineAssembler = LineAssembler::new();
        feed_all(&mut asm, b"pinx");
        let event = asm.feed(DELETE);
        assert_eq!(event, Event::Erased);
        assert_eq!(event.echo(), ERASE_SEQUENCE);
        assert_eq!(asm.pending(), b"pin");
        asm.feed(b'g');
        assert_eq!(
            asm.feed(b'\r'),
            Event::LineComplete(Line::from_slice(b"ping").unwrap())
        );
    }

    #[test]
    fn test_append_then_erase_round_trip() {
        let mut asm: LineAssembler = LineAssembler::new();
        let mut echo = std::vec::Vec::new();
        for event in feed_all(&mut asm, b"hello") {
            echo.extend_from_slice(event.echo());
        }
        for _ in 0..5 {
            echo.extend_from_slice(asm.feed(BACKSPACE).echo());
        }
        assert!(asm.is_empty());

        let mut expected = b"hello".to_vec();
        for _ in 0..5 {
            expected.extend_from_slice(ERASE_SEQUENCE);
        }
        assert_eq!(echo, expected);
    }

    #[test]
    fn test_overflow_drops_without_echo() {
        let mut asm: LineAssembler<128> = LineAssembler::new();
        let input = [b'x'; 200];
        let events = feed_all(&mut asm, &input);

        let appended = events.iter().filter(|e| matches!(e, Event::Appended(_))).count();
        let dropped = events.iter().filter(|e| matches!(e, Event::Dropped)).count();
        assert_eq!(appended, 127);
        assert_eq!(dropped, 73);
        assert!(events[127..].iter().all(|e| e.echo().is_empty()));

        match asm.feed(b'\r') {
            Event::LineComplete(line) => assert_eq!(&line[..], &input[..127]),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_erase_after_overflow_frees_a_slot() {
        let mut asm: LineAssembler<4> = LineAssembler::new();
        feed_all(&mut asm, b"abc");
        assert_eq!(asm.feed(b'd'), Event::Dropped);
        assert_eq!(asm.feed(BACKSPACE), Event::Erased);
        assert_eq!(asm.feed(b'd'), Event::Appended(b'd'));
        assert_eq!(asm.pending(), b"abd");
    }

    #[test]
    fn test_length_bounded_for_arbitrary_input() {
        let mut asm: LineAssembler<16> = LineAssembler::new();
        let mut state: u32 = 0x1234_5678;
        for _ in 0..10_000 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let byte = (state >> 16) as u8;
            // Keep terminators rare so the buffer actually fills up.
            let byte = if (byte == b'\r' || byte == b'\n') && state & 0x300 != 0 {
                b'z'
            } else {
                byte
            };
            asm.feed(byte);
            assert!(asm.len() <= 15);
        }
    }

    #[test]
    fn test_reset_discards_partial_line() {
        let mut asm: LineAssembler = LineAssembler::new();
        feed_all(&mut asm, b"cle");
        asm.reset();
        assert!(asm.is_empty());
        assert_eq!(asm.feed(b'\n'), Event::LineComplete(Line::new()));
    }

    #[test]
    fn test_line_buffer_operations() {
        let mut buf: LineBuffer<3> = LineBuffer::new();
        assert_eq!(LineBuffer::<3>::usable_capacity(), 2);
        assert!(buf.append(b'a'));
        assert!(buf.append(b'b'));
        assert!(!buf.append(b'c'));
        assert_eq!(buf.pop_last(), Some(b'b'));
        assert_eq!(&buf.take_and_clear()[..], b"a");
        assert!(buf.is_empty());
        assert_eq!(buf.pop_last(), None);
    }
}
