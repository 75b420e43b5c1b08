use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A contact person named in a job ad
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Full name of the contact person
    pub name: Option<String>,
    /// Job title of the contact person
    pub title: Option<String>,
    /// Email address of the contact person
    pub email: Option<String>,
    /// Phone number of the contact person
    pub phone: Option<String>,
}

impl ContactInfo {
    /// Returns true if no field carries a value
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.title.is_none() && self.email.is_none() && self.phone.is_none()
    }

    /// Decodes a contact from a loosely typed JSON object
    ///
    /// Blank strings become `None`; numbers are accepted for the phone field
    /// since LLMs occasionally return them unquoted.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            name: string_field(object, "name"),
            title: string_field(object, "title"),
            email: string_field(object, "email"),
            phone: string_field(object, "phone"),
        }
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match object.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Structured output of an extraction strategy
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedPayload {
    /// One record per element matched by a selector schema
    Schema(Vec<Map<String, Value>>),
    /// Contact objects returned by the LLM
    Llm(Vec<Value>),
    /// Contacts found by pattern matching
    Regex(Vec<ContactInfo>),
}

impl ExtractedPayload {
    /// All records as JSON values
    pub fn records(&self) -> Vec<Value> {
        match self {
            Self::Schema(records) => records.iter().cloned().map(Value::Object).collect(),
            Self::Llm(values) => values.clone(),
            Self::Regex(contacts) => contacts
                .iter()
                .filter_map(|c| serde_json::to_value(c).ok())
                .collect(),
        }
    }

    /// Records decoded as contacts; non-object records are skipped
    pub fn contacts(&self) -> Vec<ContactInfo> {
        match self {
            Self::Regex(contacts) => contacts.clone(),
            Self::Schema(records) => records.iter().map(ContactInfo::from_object).collect(),
            Self::Llm(values) => values
                .iter()
                .filter_map(Value::as_object)
                .map(ContactInfo::from_object)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Schema(records) => records.len(),
            Self::Llm(values) => values.len(),
            Self::Regex(contacts) => contacts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
