use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Status token reported to the runtime when an invocation completes.
pub const COMPLETION_STATUS: &str = "OK";

/// EventBridge "Parameter Store Change" envelope.
///
/// Only `detail` drives behavior; the remaining fields are kept so log lines
/// can identify where a notification came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeEvent {
    #[serde(
        default,
        rename = "detail-type",
        skip_serializing_if = "Option::is_none"
    )]
    pub detail_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub detail: ChangeDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeDetail {
    #[serde(default)]
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ChangeEvent {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn operation(&self) -> &Operation {
        &self.detail.operation
    }

    /// Parameter name exactly as sent, `None` when missing or blank.
    pub fn parameter_name(&self) -> Option<&str> {
        self.detail
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

/// Kind of change reported for a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Unrecognized(String),
}

impl Operation {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl Default for Operation {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl From<String> for Operation {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Create" => Self::Create,
            "Update" => Self::Update,
            "Delete" => Self::Delete,
            _ => Self::Unrecognized(raw),
        }
    }
}

impl From<Operation> for String {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

// A null or non-string operation is just another kind this replicator does
// not act on.
impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => Self::from(raw),
            Value::Null => Self::default(),
            other => Self::Unrecognized(other.to_string()),
        })
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter type tag as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    String,
    StringList,
    SecureString,
    Other(String),
}

impl ParameterType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "String",
            Self::StringList => "StringList",
            Self::SecureString => "SecureString",
            Self::Other(raw) => raw,
        }
    }
}

impl From<&str> for ParameterType {
    fn from(raw: &str) -> Self {
        match raw {
            "String" => Self::String,
            "StringList" => Self::StringList,
            "SecureString" => Self::SecureString,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient copy of a parameter held by one store.
#[derive(Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub kind: ParameterType,
    pub data_type: Option<String>,
    pub version: Option<i64>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>, kind: ParameterType) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind,
            data_type: None,
            version: None,
        }
    }

    /// Value and type agree; name, data type and version are not compared.
    pub fn matches(&self, other: &Parameter) -> bool {
        self.value == other.value && self.kind == other.kind
    }

    /// Builds the write request for another store. The version marker is
    /// dropped because the receiving store assigns its own.
    pub fn to_write(&self, overwrite: bool) -> ParameterWrite {
        ParameterWrite {
            name: self.name.clone(),
            value: self.value.clone(),
            kind: self.kind.clone(),
            data_type: self.data_type.clone(),
            overwrite,
        }
    }
}

// Values of SecureString parameters are decrypted in memory; keep them out of
// debug output.
impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("kind", &self.kind)
            .field("data_type", &self.data_type)
            .field("version", &self.version)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ParameterWrite {
    pub name: String,
    pub value: String,
    pub kind: ParameterType,
    pub data_type: Option<String>,
    pub overwrite: bool,
}

impl std::fmt::Debug for ParameterWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterWrite")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("kind", &self.kind)
            .field("data_type", &self.data_type)
            .field("overwrite", &self.overwrite)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PutReceipt {
    pub version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

/// What one invocation did to the target store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReplicationOutcome {
    Written {
        name: String,
        version: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        tier: Option<String>,
    },
    Unchanged {
        name: String,
    },
    Deleted {
        name: String,
    },
    AlreadyAbsent {
        name: String,
    },
    Ignored {
        operation: String,
    },
}
