use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{ids_to_value, Entity, Id};

/// Field that distinguishes "untouched" (`None`) from "cleared" (`Some(None)`)
pub type Nullable<T> = Option<Option<T>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub id: Id,
    pub meeting_id: Id,
    #[serde(default)]
    pub sequential_number: u64,
    pub title: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub sort_weight: Option<i64>,
    #[serde(default)]
    pub sort_parent_id: Option<Id>,
    #[serde(default)]
    pub lead_motion_id: Option<Id>,
    #[serde(default)]
    pub origin_id: Option<Id>,
    #[serde(default)]
    pub state_id: Option<Id>,
    #[serde(default)]
    pub recommendation_id: Option<Id>,
    #[serde(default)]
    pub workflow_id: Option<Id>,
    #[serde(default)]
    pub category_id: Option<Id>,
    #[serde(default)]
    pub block_id: Option<Id>,
    #[serde(default)]
    pub statute_paragraph_id: Option<Id>,
    #[serde(default)]
    pub state_extension: Option<String>,
    #[serde(default)]
    pub submitter_ids: Vec<Id>,
    #[serde(default)]
    pub supporter_ids: Vec<Id>,
    #[serde(default)]
    pub tag_ids: Vec<Id>,
    #[serde(default)]
    pub attachment_ids: Vec<Id>,
}

impl Entity for Motion {
    fn id(&self) -> Id {
        self.id
    }

    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => Value::from(self.id),
            "meeting_id" => Value::from(self.meeting_id),
            "sequential_number" => Value::from(self.sequential_number),
            "title" => Value::from(self.title.clone()),
            "number" => Value::from(self.number.clone()),
            "text" => Value::from(self.text.clone()),
            "reason" => Value::from(self.reason.clone()),
            "sort_weight" => Value::from(self.sort_weight),
            "sort_parent_id" => Value::from(self.sort_parent_id),
            "lead_motion_id" => Value::from(self.lead_motion_id),
            "origin_id" => Value::from(self.origin_id),
            "state_id" => Value::from(self.state_id),
            "recommendation_id" => Value::from(self.recommendation_id),
            "workflow_id" => Value::from(self.workflow_id),
            "category_id" => Value::from(self.category_id),
            "block_id" => Value::from(self.block_id),
            "statute_paragraph_id" => Value::from(self.statute_paragraph_id),
            "state_extension" => Value::from(self.state_extension.clone()),
            "submitter_ids" => ids_to_value(&self.submitter_ids),
            "supporter_ids" => ids_to_value(&self.supporter_ids),
            "tag_ids" => ids_to_value(&self.tag_ids),
            "attachment_ids" => ids_to_value(&self.attachment_ids),
            _ => return None,
        };
        Some(value)
    }
}

/// Partial motion used for updates; unset fields are left out of the payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MotionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Nullable<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Nullable<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Nullable<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Nullable<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Nullable<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_extension: Nullable<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_ids: Nullable<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supporter_ids: Nullable<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Nullable<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_ids: Nullable<Vec<Id>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgendaItemType {
    Common,
    Internal,
    Hidden,
}

/// Agenda item fields that may accompany the creation of a content object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgendaItemCreation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agenda_create: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agenda_type: Option<AgendaItemType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agenda_parent_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agenda_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agenda_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agenda_weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agenda_tag_ids: Option<Vec<Id>>,
}

/// Everything a caller may provide when creating a motion or amendment.
///
/// Each create action picks the fields it forwards from here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionDraft {
    pub title: Option<String>,
    pub text: Option<String>,
    pub reason: Option<String>,
    pub number: Option<String>,
    pub state_extension: Option<String>,
    pub lead_motion_id: Option<Id>,
    pub origin_id: Option<Id>,
    pub workflow_id: Option<Id>,
    pub category_id: Option<Id>,
    pub block_id: Option<Id>,
    pub sort_parent_id: Option<Id>,
    pub statute_paragraph_id: Option<Id>,
    pub amendment_paragraphs: Option<Map<String, Value>>,
    pub submitter_ids: Nullable<Vec<Id>>,
    pub supporter_ids: Nullable<Vec<Id>>,
    pub tag_ids: Nullable<Vec<Id>>,
    pub attachment_ids: Nullable<Vec<Id>>,
    pub agenda: AgendaItemCreation,
}

/// Node of a sorted motion tree as the backend expects it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeIdNode {
    pub id: Id,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub children: Option<Vec<TreeIdNode>>,
}

/// Any tree the sorting UI produces; only ids and structure are sent
pub trait IdTree {
    fn node_id(&self) -> Id;
    fn child_nodes(&self) -> Option<&[Self]>
    where
        Self: Sized;
}

impl IdTree for TreeIdNode {
    fn node_id(&self) -> Id {
        self.id
    }

    fn child_nodes(&self) -> Option<&[Self]> {
        self.children.as_deref()
    }
}
