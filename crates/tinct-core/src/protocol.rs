//! Line-delimited JSON messages between the UI, the session and the host.
//!
//! Every request carries `{requestId, command, payload}` and gets exactly
//! one response `{requestId, command, status, payload?, error?}`. Push
//! messages carry `{command, payload}` and no id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tinct_draft::{ChangeKind, DraftChange};

use crate::{CoreError, CoreResult, ErrorKind};

/// A request, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub request_id: String,
    pub command: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// The answer to one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub request_id: String,
    pub command: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl Response {
    pub fn success(request: &Request, payload: Value) -> Self {
        Self {
            request_id: request.request_id.clone(),
            command: request.command.clone(),
            status: Status::Success,
            payload: Some(payload),
            error: None,
            error_kind: None,
        }
    }

    pub fn error(request: &Request, err: &CoreError) -> Self {
        Self {
            request_id: request.request_id.clone(),
            command: request.command.clone(),
            status: Status::Error,
            payload: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }

    /// Turns the response back into a result, for the requesting side.
    pub fn into_result(self) -> CoreResult<Value> {
        match self.status {
            Status::Success => Ok(self.payload.unwrap_or(Value::Null)),
            Status::Error => {
                let message = self.error.unwrap_or_else(|| format!("{} failed", self.command));
                Err(match self.error_kind {
                    Some(ErrorKind::NotFound) => CoreError::NotFound(message),
                    Some(ErrorKind::Validation) => CoreError::Validation(message),
                    _ => CoreError::Host(message),
                })
            }
        }
    }
}

/// An unsolicited message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Push {
    pub command: String,
    #[serde(default)]
    pub payload: Value,
}

/// Anything that can arrive on the input stream.
///
/// `Response` is tried first: it is the only shape with a `status` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Incoming {
    Response(Response),
    Request(Request),
}

impl Incoming {
    pub fn parse(line: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Anything the session writes to the output stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outgoing {
    Response(Response),
    Request(Request),
    Push(Push),
}

/// A UI command with its payload decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetState,
    GetResolvedTokens,
    ApplyChanges(Vec<DraftChange>),
    RemoveChange { kind: ChangeKind, key: String },
    DiscardDraft,
    Save,
    ListVersions,
    RestoreVersion(u32),
    ResetToBase,
    SetLivePreview(bool),
}

#[derive(Deserialize)]
struct ApplyChangesPayload {
    changes: Vec<DraftChange>,
}

#[derive(Deserialize)]
struct RemoveChangePayload {
    #[serde(rename = "type")]
    kind: ChangeKind,
    key: String,
}

#[derive(Deserialize)]
struct RestoreVersionPayload {
    version: u32,
}

#[derive(Deserialize)]
struct SetLivePreviewPayload {
    enabled: bool,
}

impl Command {
    /// Decodes a request. Unknown commands and bad payloads are validation errors.
    pub fn from_request(request: &Request) -> CoreResult<Self> {
        fn payload<T: serde::de::DeserializeOwned>(request: &Request) -> CoreResult<T> {
            serde_json::from_value(request.payload.clone()).map_err(|err| {
                CoreError::Validation(format!("bad payload for {}: {err}", request.command))
            })
        }

        Ok(match request.command.as_str() {
            "getState" => Command::GetState,
            "getResolvedTokens" => Command::GetResolvedTokens,
            "applyChanges" => Command::ApplyChanges(payload::<ApplyChangesPayload>(request)?.changes),
            "removeChange" => {
                let p: RemoveChangePayload = payload(request)?;
                Command::RemoveChange {
                    kind: p.kind,
                    key: p.key,
                }
            }
            "discardDraft" => Command::DiscardDraft,
            "save" => Command::Save,
            "listVersions" => Command::ListVersions,
            "restoreVersion" => Command::RestoreVersion(payload::<RestoreVersionPayload>(request)?.version),
            "resetToBase" => Command::ResetToBase,
            "setLivePreview" => Command::SetLivePreview(payload::<SetLivePreviewPayload>(request)?.enabled),
            other => return Err(CoreError::Validation(format!("unknown command {other:?}"))),
        })
    }
}
