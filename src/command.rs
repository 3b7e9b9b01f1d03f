//! Command dispatch
//!
//! Every inbound line is either chat text or a `/`-command. Private
//! commands only ever answer the issuing connection; public ones go to
//! the whole room.

use rand::Rng;
use tracing::{debug, info};

use crate::broadcast::{broadcast, send_to};
use crate::client::ConnectionHandle;
use crate::error::CommandError;
use crate::message::Envelope;
use crate::room::RoomState;

/// Banner broadcast by `/n`
pub const BANNER: &str = "\
░▒▓███████▓▒░  ░▒▓█▓▒░  ░▒▓██████▓▒░   ░▒▓██████▓▒░   ░▒▓██████▓▒░
░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░ ░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░░▒▓█▓▒░
░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░ ░▒▓█▓▒░        ░▒▓█▓▒░        ░▒▓█▓▒░░▒▓█▓▒░
░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░ ░▒▓█▓▒▒▓███▓▒░ ░▒▓█▓▒▒▓███▓▒░ ░▒▓████████▓▒░
░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░ ░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░░▒▓█▓▒░
░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░ ░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░░▒▓█▓▒░
░▒▓█▓▒░░▒▓█▓▒░ ░▒▓█▓▒░  ░▒▓██████▓▒░   ░▒▓██████▓▒░  ░▒▓█▓▒░░▒▓█▓▒░ ";

/// Listing sent for `/help` (`/n` stays unlisted)
pub const HELP_TEXT: &str = "\
Available commands:
/help - Show this help message
/colour - Change your terminal colors
/clear - Clear your chat window
/quit - Exit the chat";

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Parsed inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/quit`, `/exit`, `/q`
    Quit,
    /// `/clear`, `/c`: handled entirely by the client
    Clear,
    /// `/colour`, `/color`
    Colour,
    /// `/help`
    Help,
    /// `/n`
    Banner,
    /// Any other `/token`
    Unknown(String),
    /// Plain text
    Chat(String),
    /// Blank line
    Empty,
}

impl Command {
    /// Classify a line by its first whitespace-delimited token (case-insensitive)
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if !line.starts_with('/') {
            return Command::Chat(line.to_string());
        }

        let token = line.split_whitespace().next().unwrap_or(line);
        match token.to_lowercase().as_str() {
            "/quit" | "/exit" | "/q" => Command::Quit,
            "/clear" | "/c" => Command::Clear,
            "/colour" | "/color" => Command::Colour,
            "/help" => Command::Help,
            "/n" => Command::Banner,
            _ => Command::Unknown(token.to_string()),
        }
    }
}

/// What the connection loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Random 6-digit uppercase hex colour code
pub fn random_colour() -> String {
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char)
        .collect()
}

/// Apply one command on behalf of `issuer`, a current member of `room`
pub async fn dispatch(room: &RoomState, issuer: &ConnectionHandle, command: Command) -> Flow {
    match command {
        Command::Empty | Command::Clear => Flow::Continue,
        Command::Chat(text) => {
            broadcast(room, &Envelope::chat(issuer.username.clone(), text), None).await;
            Flow::Continue
        }
        Command::Colour => {
            let color = random_colour();
            debug!("Sent colourshift #{} to {}", color, issuer.username);
            send_to(issuer, Envelope::ColourShift { color });
            Flow::Continue
        }
        Command::Help => {
            send_to(issuer, Envelope::notice(HELP_TEXT));
            Flow::Continue
        }
        Command::Banner => {
            info!("{} triggered the banner in room {}", issuer.username, room.key);
            broadcast(room, &Envelope::notice(BANNER), None).await;
            Flow::Continue
        }
        Command::Unknown(token) => {
            send_to(issuer, CommandError::Unknown(token).into());
            Flow::Continue
        }
        Command::Quit => {
            send_to(
                issuer,
                Envelope::notice(format!("Goodbye, {}.", issuer.username)),
            );
            Flow::Close
        }
    }
}
