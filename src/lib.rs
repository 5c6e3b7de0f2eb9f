#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod commands;
pub mod line;
pub mod shell;
pub mod usb;

use embassy_usb::driver::EndpointError;

// Common error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    Disconnected,
    BufferOverflow,
}

/// Handles conversion of USB endpoint errors to our Error type
impl From<EndpointError> for Error {
    fn from(val: EndpointError) -> Self {
        match val {
            EndpointError::BufferOverflow => Error::BufferOverflow,
            EndpointError::Disabled => Error::Disconnected,
        }
    }
}

// Common constants
/// Line buffer size; one slot stays reserved, so 127 bytes are usable.
pub const LINE_CAPACITY: usize = 128;
/// Size of the read staging buffer (one full-speed USB packet).
pub const READ_CHUNK: usize = 64;
/// How long a single transport read may wait before reporting zero bytes.
pub const READ_TIMEOUT: Duration = Duration::from_millis(20);
pub const PROMPT: &[u8] = b"\r\n> ";
pub const NEWLINE: &[u8] = b"\r\n";
pub const GREETING: &[u8] = b"\r\n> CLI Ready. Type something...\r\n";

pub use commands::{Action, Dispatcher, Reply};
pub use line::{Event, LineAssembler, LineBuffer};
pub use shell::{Shell, Transport};

// Re-export frequently used dependencies
pub use embassy_time::{Duration, Timer};

#[cfg(all(test, feature = "defmt"))]
mod tests {
    use super::*;

    fn assert_format<T: defmt::Format>() {}

    #[test]
    fn test_public_types_are_loggable() {
        assert_format::<Error>();
        assert_format::<Event>();
        assert_format::<LineBuffer>();
        assert_format::<Action>();
        assert_format::<Reply>();
        assert_format::<Dispatcher>();
    }
}
