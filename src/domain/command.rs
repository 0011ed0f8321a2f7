//! Pipe command parsing and reply literals.

use serde::{Deserialize, Serialize};

/// First message every worker sends on its channel.
pub const READY: &str = "ready";
pub const PONG: &str = "pong";
pub const RELOADED: &str = "reloaded";
pub const RELOAD_FAILED: &str = "error reloading";
pub const UNKNOWN: &str = "unknown";
pub const EVAL_DISABLED: &str = "eval is disabled";
pub const EVAL_MISSING_CONTENT: &str = "eval requires content";

/// Structured form of a pipe message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl CommandMessage {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            content: None,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Serialized text form, as sent over the pipe.
    #[must_use]
    pub fn to_payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Commands understood by the worker command loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Eval(Option<String>),
    ReloadAll,
    Unknown(String),
}

impl Command {
    /// Parse a raw pipe payload.
    ///
    /// A JSON object is read for its `command` and `content` fields. Anything
    /// else, including an object with no `command`, is taken whole as the
    /// command name with no content.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let (name, content) = match serde_json::from_str::<CommandMessage>(raw) {
            Ok(CommandMessage {
                command: Some(command),
                content,
            }) => (command, content),
            _ => (raw.to_string(), None),
        };

        match name.as_str() {
            "ping" => Self::Ping,
            "eval" => Self::Eval(content),
            "reloadall" => Self::ReloadAll,
            _ => Self::Unknown(name),
        }
    }

    /// Name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Ping => "ping",
            Self::Eval(_) => "eval",
            Self::ReloadAll => "reloadall",
            Self::Unknown(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_ping() {
        assert_eq!(Command::parse(r#"{"command":"ping"}"#), Command::Ping);
    }

    #[test]
    fn parses_bare_command_names() {
        assert_eq!(Command::parse("ping"), Command::Ping);
        assert_eq!(Command::parse("reloadall"), Command::ReloadAll);
    }

    #[test]
    fn eval_carries_content() {
        assert_eq!(
            Command::parse(r#"{"command":"eval","content":"print shards"}"#),
            Command::Eval(Some("print shards".into()))
        );
        assert_eq!(Command::parse("eval"), Command::Eval(None));
    }

    #[test]
    fn unparseable_text_is_unknown() {
        assert_eq!(Command::parse("foo"), Command::Unknown("foo".into()));
        assert_eq!(
            Command::parse(r#"{"command":"#),
            Command::Unknown(r#"{"command":"#.into())
        );
    }

    #[test]
    fn object_without_command_is_unknown() {
        let raw = r#"{"content":"x"}"#;
        assert_eq!(Command::parse(raw), Command::Unknown(raw.into()));
    }

    #[test]
    fn payload_omits_missing_content() {
        assert_eq!(CommandMessage::new("ping").to_payload(), r#"{"command":"ping"}"#);
        assert_eq!(
            CommandMessage::new("eval").with_content("1").to_payload(),
            r#"{"command":"eval","content":"1"}"#
        );
    }
}
