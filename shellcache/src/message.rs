//! Messages exchanged with the pages the worker controls.
//!
//! Both directions are JSON objects tagged by `type`:
//!
//! ```
//! use shellcache::message::WorkerMessage;
//!
//! let message = WorkerMessage::from_json(r#"{"type":"CHECK_VERSION"}"#).unwrap();
//! assert_eq!(message, WorkerMessage::CheckVersion);
//! ```

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A message sent to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate the waiting worker without waiting for pages to close.
    SkipWaiting,
    /// Ask for the version tag.
    CheckVersion,
    /// Delete every partition owned by the application.
    ClearCaches,
}

impl WorkerMessage {
    /// Parses the wire form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A reply from the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerReply {
    /// Reply to [`WorkerMessage::CheckVersion`].
    Version {
        /// Current version tag.
        version: String,
    },
    /// Reply to [`WorkerMessage::ClearCaches`].
    CachesCleared {
        /// Partitions deleted.
        deleted: Vec<SmolStr>,
    },
    /// The request could not be carried out.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl WorkerReply {
    /// Serializes the reply.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_messages() {
        assert_eq!(
            WorkerMessage::from_json(r#"{"type":"SKIP_WAITING"}"#).unwrap(),
            WorkerMessage::SkipWaiting
        );
        assert_eq!(
            WorkerMessage::from_json(r#"{"type":"CLEAR_CACHES"}"#).unwrap(),
            WorkerMessage::ClearCaches
        );
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(WorkerMessage::from_json(r#"{"type":"RELOAD"}"#).is_err());
        assert!(WorkerMessage::from_json(r#"{"kind":"SKIP_WAITING"}"#).is_err());
    }

    #[test]
    fn version_reply_wire_form() {
        let reply = WorkerReply::Version {
            version: "v8".into(),
        };
        assert_eq!(reply.to_json().unwrap(), r#"{"type":"VERSION","version":"v8"}"#);
    }
}
