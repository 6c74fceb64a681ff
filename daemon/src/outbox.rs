//! File outbox notifier.
//!
//! Appends one JSON object per notification to a local file. A separate mail
//! relay tails the file and does the actual sending, so the outbox holds
//! plaintext secrets and codes and must be readable by that relay only.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use matric_admission::{Notifier, NotifyError};
use matric_crypto::Secret;
use matric_types::{AssignedId, Clock, ContactAddress, Role, SystemClock, Timestamp};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Message<'a> {
    Acceptance {
        assigned_id: &'a str,
        secret: &'a str,
    },
    Rejection {
        reason: &'a str,
    },
    Credentials {
        assigned_id: Option<&'a str>,
        secret: &'a str,
    },
    RecoveryCode {
        role: Role,
        code: &'a str,
    },
}

#[derive(Debug, Serialize)]
struct Entry<'a> {
    queued_at: Timestamp,
    to: &'a str,
    #[serde(flatten)]
    message: Message<'a>,
}

pub struct OutboxNotifier {
    path: PathBuf,
    file: Mutex<File>,
}

impl OutboxNotifier {
    /// Open `path` for appending, creating it and its parent directory.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    fn append(&self, to: &ContactAddress, message: Message<'_>) -> Result<(), NotifyError> {
        let entry = Entry {
            queued_at: SystemClock.now(),
            to: to.as_str(),
            message,
        };
        let line = serde_json::to_string(&entry).map_err(|e| NotifyError::Delivery {
            contact: to.to_string(),
            reason: e.to_string(),
        })?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| NotifyError::Unavailable("outbox lock poisoned".to_string()))?;
        writeln!(file, "{line}")
            .and_then(|()| file.flush())
            .map_err(|e| NotifyError::Delivery {
                contact: to.to_string(),
                reason: format!("writing {}: {e}", self.path.display()),
            })
    }
}

impl Notifier for OutboxNotifier {
    fn send_acceptance(
        &self,
        contact: &ContactAddress,
        assigned_id: &AssignedId,
        secret: &Secret,
    ) -> Result<(), NotifyError> {
        self.append(
            contact,
            Message::Acceptance {
                assigned_id: assigned_id.as_str(),
                secret: secret.expose(),
            },
        )
    }

    fn send_rejection(&self, contact: &ContactAddress, reason: &str) -> Result<(), NotifyError> {
        self.append(contact, Message::Rejection { reason })
    }

    fn send_credentials(
        &self,
        contact: &ContactAddress,
        assigned_id: Option<&AssignedId>,
        secret: &Secret,
    ) -> Result<(), NotifyError> {
        self.append(
            contact,
            Message::Credentials {
                assigned_id: assigned_id.map(AssignedId::as_str),
                secret: secret.expose(),
            },
        )
    }

    fn send_recovery_code(
        &self,
        contact: &ContactAddress,
        role: Role,
        code: &Secret,
    ) -> Result<(), NotifyError> {
        self.append(
            contact,
            Message::RecoveryCode {
                role,
                code: code.expose(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn appends_one_json_line_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mail/outbox.jsonl");
        let outbox = OutboxNotifier::open(&path).unwrap();
        let to = ContactAddress::parse("pupil@mail.com").unwrap();

        outbox.send_rejection(&to, "Incomplete").unwrap();
        outbox
            .send_credentials(&to, None, &Secret::new("Tmp0rary1x".to_string()))
            .unwrap();

        let written = lines(&path);
        assert_eq!(written.len(), 2);
        assert_eq!(written[0]["kind"], "rejection");
        assert_eq!(written[0]["to"], "pupil@mail.com");
        assert_eq!(written[0]["reason"], "Incomplete");
        assert_eq!(written[1]["kind"], "credentials");
        assert_eq!(written[1]["secret"], "Tmp0rary1x");
        assert!(written[1]["assigned_id"].is_null());
    }

    #[test]
    fn reopening_keeps_earlier_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outbox.jsonl");
        let to = ContactAddress::parse("pupil@mail.com").unwrap();
        OutboxNotifier::open(&path)
            .unwrap()
            .send_rejection(&to, "one")
            .unwrap();
        OutboxNotifier::open(&path)
            .unwrap()
            .send_rejection(&to, "two")
            .unwrap();
        assert_eq!(lines(&path).len(), 2);
    }
}
