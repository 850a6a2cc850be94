use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Who asked for a write, carried into grant/revoke records and logs.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Metadata {
    pub id: String,
    pub trigger_by: Option<String>,
}

impl Metadata {
    pub fn new(trigger_by: impl Into<Option<String>>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            trigger_by: trigger_by.into(),
        }
    }

    pub fn by(trigger_by: impl Into<String>) -> Self {
        Self::new(Some(trigger_by.into()))
    }

    /// Actions performed by the service itself, e.g. `system:sweep`.
    pub fn system(task: &str) -> Self {
        Self::by(format!("system:{task}"))
    }

    pub fn trigger_by(&self) -> crate::Result<String> {
        match self.trigger_by.to_owned() {
            Some(id) => Ok(id),
            _ => crate::bail!("User not found in metadata"),
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new(None)
    }
}
