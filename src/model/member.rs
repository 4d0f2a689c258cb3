use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ids_to_value, Entity, Id};

/// A user as shown in the organization member list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: Id,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Unix timestamp in seconds of the last invitation email
    #[serde(default)]
    pub last_email_sent: Option<i64>,
    /// Decimal string as delivered by the backend, e.g. `"1.000000"`
    #[serde(default)]
    pub default_vote_weight: Option<String>,
    #[serde(default)]
    pub committee_ids: Vec<Id>,
    #[serde(default)]
    pub is_present_in_meeting_ids: Vec<Id>,
}

impl Member {
    pub fn is_last_email_sent(&self) -> bool {
        self.last_email_sent.map(|ts| ts > 0).unwrap_or(false)
    }

    /// A missing vote weight counts as the default of one
    pub fn is_vote_weight_one(&self) -> bool {
        match &self.default_vote_weight {
            None => true,
            Some(weight) => weight.trim().parse::<f64>().map(|w| w == 1.0).unwrap_or(false),
        }
    }

    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}

impl Entity for Member {
    fn id(&self) -> Id {
        self.id
    }

    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => Value::from(self.id),
            "username" => Value::from(self.username.clone()),
            "first_name" => Value::from(self.first_name.clone()),
            "last_name" => Value::from(self.last_name.clone()),
            "is_active" => Value::from(self.is_active),
            "last_email_sent" => Value::from(self.last_email_sent),
            "default_vote_weight" => Value::from(self.default_vote_weight.clone()),
            "is_last_email_sent" => Value::Bool(self.is_last_email_sent()),
            "is_vote_weight_one" => Value::Bool(self.is_vote_weight_one()),
            "committee_ids" => ids_to_value(&self.committee_ids),
            "is_present_in_meeting_ids" => ids_to_value(&self.is_present_in_meeting_ids),
            _ => return None,
        };
        Some(value)
    }
}

/// Name information extracted from a free-form import string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullNameInformation {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// How a raw name string is laid out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NamingSchema {
    /// `"Ada Lovelace"`
    #[default]
    FirstSpaceLast,
    /// `"Lovelace, Ada"`
    LastCommaFirst,
}
