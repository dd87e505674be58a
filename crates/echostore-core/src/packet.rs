//! Delimiter-terminated packet assembly
//!
//! One `PacketAssembler` per connection. Bytes arrive in arbitrary chunks;
//! a logical packet is complete exactly when the accumulated buffer ends
//! with the delimiter. A delimiter in the middle of a chunk does **not**
//! split the packet; only the tail byte is inspected, so a client that
//! sends `"a\nb"` in one write has not yet finished a packet.

use crate::protocol::DELIMITER;

/// Accumulates bytes from one connection into complete packets.
///
/// The internal buffer grows amortized (plain `Vec` append); completing a
/// packet hands the buffer to the caller and leaves the assembler empty for
/// the next one.
#[derive(Debug, Default)]
pub struct PacketAssembler {
    buf: Vec<u8>,
}

impl PacketAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of received bytes.
    ///
    /// Returns the completed packet (delimiter included) when the buffer
    /// now ends with the delimiter, `None` while the packet is incomplete.
    ///
    /// A zero-length chunk signals end-of-stream: any accumulated bytes
    /// that never saw their delimiter are discarded, not committed.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<Vec<u8>> {
        if bytes.is_empty() {
            // Peer is gone; a partial packet must not reach the store.
            self.buf.clear();
            return None;
        }

        self.buf.extend_from_slice(bytes);

        if self.buf.last() == Some(&DELIMITER) {
            Some(std::mem::take(&mut self.buf))
        } else {
            None
        }
    }

    /// Number of bytes waiting for a delimiter.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chunk_packet() {
        let mut asm = PacketAssembler::new();
        assert_eq!(asm.feed(b"hello\n"), Some(b"hello\n".to_vec()));
        assert_eq!(asm.pending(), 0);
    }

    #[test]
    fn test_packet_split_across_chunks() {
        let mut asm = PacketAssembler::new();
        assert_eq!(asm.feed(b"hel"), None);
        assert_eq!(asm.feed(b"lo"), None);
        assert_eq!(asm.pending(), 5);
        assert_eq!(asm.feed(b"!\n"), Some(b"hello!\n".to_vec()));
    }

    #[test]
    fn test_mid_chunk_delimiter_does_not_split() {
        // Only the tail byte decides completion.
        let mut asm = PacketAssembler::new();
        assert_eq!(asm.feed(b"a\nb"), None);
        assert_eq!(asm.feed(b"c\n"), Some(b"a\nbc\n".to_vec()));
    }

    #[test]
    fn test_eof_discards_partial() {
        let mut asm = PacketAssembler::new();
        assert_eq!(asm.feed(b"half a packet"), None);
        assert_eq!(asm.feed(b""), None);
        assert_eq!(asm.pending(), 0);
    }

    #[test]
    fn test_back_to_back_packets() {
        let mut asm = PacketAssembler::new();
        assert_eq!(asm.feed(b"one\n"), Some(b"one\n".to_vec()));
        assert_eq!(asm.feed(b"two\n"), Some(b"two\n".to_vec()));
    }

    #[test]
    fn test_delimiter_only_packet() {
        let mut asm = PacketAssembler::new();
        assert_eq!(asm.feed(b"\n"), Some(b"\n".to_vec()));
    }
}
