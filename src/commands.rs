use crate::{NEWLINE, PROMPT};
use heapless::Vec;

/// Room for the largest reply body (the help listing).
pub const REPLY_CAPACITY: usize = 256;
/// Formatting limit for the unknown-command message, prefix and CRLF included.
pub const UNKNOWN_REPLY_CAPACITY: usize = 160;
/// Column the help descriptions are aligned to.
pub const HELP_NAME_WIDTH: usize = 10;

const UNKNOWN_PREFIX: &[u8] = b"\r\nUnknown command: ";
const CLEAR_SCREEN: &[u8] = b"\x1b[2J\x1b[H";
const PONG: &[u8] = b"\r\npong!\r\n";

/// Built-in commands, in the order `help` lists them.
pub const COMMANDS: [Action; 3] = [Action::Help, Action::Ping, Action::Clear];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Help,
    Ping,
    Clear,
}

impl Action {
    /// Exact, case-sensitive, whole-line lookup.
    pub fn lookup(line: &[u8]) -> Option<Action> {
        match line {
            b"help" => Some(Action::Help),
            b"ping" => Some(Action::Ping),
            b"clear" => Some(Action::Clear),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Action::Help => "help",
            Action::Ping => "ping",
            Action::Clear => "clear",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Action::Help => "Show this help information",
            Action::Ping => "Reply with pong!",
            Action::Clear => "Clear the terminal screen",
        }
    }
}

/// Output of one dispatch: a reply body followed by the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reply {
    body: Vec<u8, REPLY_CAPACITY>,
}

impl Reply {
    fn empty() -> Self {
        Self { body: Vec::new() }
    }

    /// Appends as much of `bytes` as still fits below `limit`.
    fn push_bounded(&mut self, bytes: &[u8], limit: usize) {
        let room = limit.min(REPLY_CAPACITY).saturating_sub(self.body.len());
        let take = bytes.len().min(room);
        let _ = self.body.extend_from_slice(&bytes[..take]);
    }

    fn push(&mut self, bytes: &[u8]) {
        self.push_bounded(bytes, REPLY_CAPACITY);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn prompt(&self) -> &'static [u8] {
        PROMPT
    }

    /// Everything to write, in order.
    pub fn fragments(&self) -> [&[u8]; 2] {
        [self.body(), self.prompt()]
    }
}

/// Stateless mapping from a completed line to its [`Reply`].
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dispatcher;

impl Dispatcher {
    pub const fn new() -> Self {
        Self
    }

    pub fn dispatch(&self, line: &[u8]) -> Reply {
        let mut reply = Reply::empty();

        if line.is_empty() {
            return reply;
        }

        match Action::lookup(line) {
            Some(Action::Help) => render_help(&mut reply),
            Some(Action::Ping) => reply.push(PONG),
            Some(Action::Clear) => reply.push(CLEAR_SCREEN),
            None => {
                debug!("unknown command ({=usize} bytes)", line.len());
                render_unknown(&mut reply, line);
            }
        }

        reply
    }
}

fn render_help(reply: &mut Reply) {
    reply.push(b"\r\nAvailable commands:\r\n");

    for cmd in COMMANDS {
        let name = cmd.name().as_bytes();
        reply.push(b"  ");
        reply.push(name);

        // Pad command name to align descriptions
        for _ in name.len()..HELP_NAME_WIDTH {
            reply.push(b" ");
        }

        reply.push(b"- ");
        reply.push(cmd.description().as_bytes());
        reply.push(NEWLINE);
    }
}

/// The line text is cut short when the message would not fit; the prefix
/// and trailing CRLF are always kept.
fn render_unknown(reply: &mut Reply, line: &[u8]) {
    let text_limit = UNKNOWN_REPLY_CAPACITY - NEWLINE.len();
    reply.push_bounded(UNKNOWN_PREFIX, text_limit);
    reply.push_bounded(line, text_limit);
    reply.push_bounded(NEWLINE, UNKNOWN_REPLY_CAPACITY);
}
