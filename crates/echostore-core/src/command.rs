//! Embedded seek-command recognition and parsing
//!
//! A packet whose payload starts with [`SEEK_PREFIX`](crate::protocol::SEEK_PREFIX)
//! followed by `:<index>,<offset>` asks the server to reposition the store's
//! read cursor instead of appending. Parsing is deliberately permissive:
//! number tokens convert like C's `atoi`, skipping leading whitespace and
//! taking the digit run while ignoring any suffix. A packet that *looks* like a command but
//! fails to parse is not an error at this layer; the caller stores it as
//! ordinary payload.

use core::fmt;

use crate::protocol::SEEK_PREFIX;

/// Result of parsing a seek command: which stored record to move to, and
/// the byte offset within it. Consumed immediately by a reposition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekCommand {
    /// Index of the previously stored record.
    pub record: u32,
    /// Byte offset within that record.
    pub offset: u32,
}

/// Why a recognized packet failed to parse as a seek command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Packet does not carry the seek prefix at all
    NotRecognized,

    /// No `:` separator (or nothing) after the prefix
    MissingIndex,

    /// No `,` separator, or an empty index/offset token
    MissingOffset,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NotRecognized => write!(f, "packet is not a seek command"),
            CommandError::MissingIndex => write!(f, "seek command missing record index"),
            CommandError::MissingOffset => write!(f, "seek command missing byte offset"),
        }
    }
}

impl std::error::Error for CommandError {}

impl SeekCommand {
    /// True iff the packet begins with the seek-command prefix.
    ///
    /// Recognition is only about the prefix; a recognized packet can still
    /// fail [`parse`](Self::parse).
    #[inline]
    pub fn recognize(packet: &[u8]) -> bool {
        packet.len() >= SEEK_PREFIX.len() && packet.starts_with(SEEK_PREFIX)
    }

    /// Parse a recognized packet into a command.
    ///
    /// Expects `PREFIX:<index>,<offset>`. Empty or absent tokens fail;
    /// token *content* is converted permissively (`"10\n"` is 10,
    /// `"abc"` is 0), matching the original wire tolerance.
    pub fn parse(packet: &[u8]) -> Result<Self, CommandError> {
        let rest = packet
            .strip_prefix(SEEK_PREFIX)
            .ok_or(CommandError::NotRecognized)?;
        let rest = rest
            .strip_prefix(b":")
            .ok_or(CommandError::MissingIndex)?;

        let comma = rest
            .iter()
            .position(|&b| b == b',')
            .ok_or(CommandError::MissingOffset)?;
        let (index_tok, offset_tok) = (&rest[..comma], &rest[comma + 1..]);

        if index_tok.is_empty() {
            return Err(CommandError::MissingIndex);
        }
        if offset_tok.is_empty() {
            return Err(CommandError::MissingOffset);
        }

        Ok(SeekCommand {
            record: permissive_u32(index_tok),
            offset: permissive_u32(offset_tok),
        })
    }
}

/// `atoi`-style conversion: skip leading ASCII whitespace, take the leading
/// digit run, ignore whatever follows. Saturates instead of wrapping so an
/// absurd index cannot alias a small one.
fn permissive_u32(token: &[u8]) -> u32 {
    let mut value: u32 = 0;
    for &b in token.iter().skip_while(|b| b.is_ascii_whitespace()) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value
            .saturating_mul(10)
            .saturating_add(u32::from(b - b'0'));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognize_prefix() {
        assert!(SeekCommand::recognize(b"AESDCHAR_IOCSEEKTO:3,10\n"));
        assert!(SeekCommand::recognize(b"AESDCHAR_IOCSEEKTOgarbage"));
        assert!(!SeekCommand::recognize(b"AESDCHAR_IOCSEEK"));
        assert!(!SeekCommand::recognize(b"hello\n"));
        assert!(!SeekCommand::recognize(b""));
    }

    #[test]
    fn test_parse_well_formed() {
        let cmd = SeekCommand::parse(b"AESDCHAR_IOCSEEKTO:3,10\n").unwrap();
        assert_eq!(cmd, SeekCommand { record: 3, offset: 10 });
    }

    #[test]
    fn test_parse_without_trailing_delimiter() {
        let cmd = SeekCommand::parse(b"AESDCHAR_IOCSEEKTO:0,0").unwrap();
        assert_eq!(cmd, SeekCommand { record: 0, offset: 0 });
    }

    #[test]
    fn test_parse_missing_colon() {
        assert_eq!(
            SeekCommand::parse(b"AESDCHAR_IOCSEEKTO 3,10\n"),
            Err(CommandError::MissingIndex)
        );
    }

    #[test]
    fn test_parse_missing_comma() {
        assert_eq!(
            SeekCommand::parse(b"AESDCHAR_IOCSEEKTO:3\n"),
            Err(CommandError::MissingOffset)
        );
    }

    #[test]
    fn test_parse_empty_tokens() {
        assert_eq!(
            SeekCommand::parse(b"AESDCHAR_IOCSEEKTO:,10\n"),
            Err(CommandError::MissingIndex)
        );
        assert_eq!(
            SeekCommand::parse(b"AESDCHAR_IOCSEEKTO:3,"),
            Err(CommandError::MissingOffset)
        );
    }

    #[test]
    fn test_parse_is_permissive_about_token_content() {
        // atoi semantics: junk converts to 0, suffixes are ignored.
        let cmd = SeekCommand::parse(b"AESDCHAR_IOCSEEKTO:abc,def\n").unwrap();
        assert_eq!(cmd, SeekCommand { record: 0, offset: 0 });

        let cmd = SeekCommand::parse(b"AESDCHAR_IOCSEEKTO: 7,2xyz\n").unwrap();
        assert_eq!(cmd, SeekCommand { record: 7, offset: 2 });
    }

    #[test]
    fn test_permissive_u32_saturates() {
        assert_eq!(permissive_u32(b"99999999999999999999"), u32::MAX);
        assert_eq!(permissive_u32(b"42"), 42);
        assert_eq!(permissive_u32(b""), 0);
    }
}
