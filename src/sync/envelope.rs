//! Wire schema for collector messages: `{"msg": <kind>, "data": <payload | null>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Attempt, ClientInfo, History, Progress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    ClientInfo,
    History,
    AttemptStart,
    Progress,
    AttemptEnd,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::ClientInfo => "clientInfo",
            MessageKind::History => "history",
            MessageKind::AttemptStart => "attemptStart",
            MessageKind::Progress => "progress",
            MessageKind::AttemptEnd => "attemptEnd",
        }
    }
}

/// Outbound message with its fixed payload shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    ClientInfo(ClientInfo),
    History(History),
    AttemptStart,
    Progress(Progress),
    AttemptEnd(Attempt),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::ClientInfo(_) => MessageKind::ClientInfo,
            Message::History(_) => MessageKind::History,
            Message::AttemptStart => MessageKind::AttemptStart,
            Message::Progress(_) => MessageKind::Progress,
            Message::AttemptEnd(_) => MessageKind::AttemptEnd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub msg: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn from_message(message: &Message) -> Result<Self, serde_json::Error> {
        let data = match message {
            Message::ClientInfo(info) => serde_json::to_value(info)?,
            Message::History(history) => serde_json::to_value(history)?,
            Message::AttemptStart => Value::Null,
            Message::Progress(progress) => serde_json::to_value(progress)?,
            Message::AttemptEnd(attempt) => serde_json::to_value(attempt)?,
        };
        Ok(Self {
            msg: message.kind().as_str().to_string(),
            data,
        })
    }

    pub fn kind(&self) -> Option<MessageKind> {
        serde_json::from_value(Value::String(self.msg.clone())).ok()
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
