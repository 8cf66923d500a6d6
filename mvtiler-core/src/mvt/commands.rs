use crate::{TilerError, TilerResult};

/// Geometry command ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a new part at the given point
    MoveTo = 1,
    /// Extend the current part
    LineTo = 2,
    /// Close the current ring, takes no parameters
    ClosePath = 7,
}

impl Command {
    /// Pack this command with its repeat count
    #[must_use]
    pub fn integer(self, count: u32) -> u32 {
        (self as u32 & 0x7) | (count << 3)
    }

    /// Split a command integer into its command and repeat count
    pub fn parse(value: u32) -> TilerResult<(Self, u32)> {
        let cmd = match value & 0x7 {
            1 => Self::MoveTo,
            2 => Self::LineTo,
            7 => Self::ClosePath,
            id => return Err(TilerError::UnknownCommand(id)),
        };
        Ok((cmd, value >> 3))
    }
}

/// Map a signed integer to an unsigned one, keeping small magnitudes small
#[must_use]
pub fn zigzag_encode(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse of [`zigzag_encode`]
#[must_use]
pub fn zigzag_decode(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}
