//! Command fan-out to agents.
//!
//! Commands are grouped per host and per cluster and every host receives
//! exactly one event per dispatch call. Keytab commands are enriched with
//! secret material on the way out.
mod command_publisher;
pub use command_publisher::*;


/// Keytab custom commands that need secret enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeytabAction {
    /// Ship keytab contents to the agent
    Set,
    /// Tell the agent which keytabs to delete
    Remove,
}

impl KeytabAction {
    /// Case-insensitive match against a command's custom command name
    pub fn from_custom_command(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("SET_KEYTAB") {
            Some(KeytabAction::Set)
        } else if name.eq_ignore_ascii_case("REMOVE_KEYTAB") {
            Some(KeytabAction::Remove)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeytabAction::Set => "SET_KEYTAB",
            KeytabAction::Remove => "REMOVE_KEYTAB",
        }
    }
}
