use log::debug;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::logic::{diff_objects, ListSorter, SortProperty};
use crate::model::{
    is_truthy, ActionRequest, AgendaItemCreation, Entity, Id, IdTree, Motion, MotionAction,
    MotionDraft, MotionUpdate, Nullable, TreeIdNode,
};

/// Fields whose cleared value must reach the backend as `[]`
pub const MOTION_COLLECTION_FIELDS: &[&str] = &["supporter_ids", "tag_ids", "attachment_ids"];

/// `null` becomes `[]`, an untouched field stays untouched
fn empty_if_cleared(ids: &Nullable<Vec<Id>>) -> Option<Vec<Id>> {
    ids.as_ref().map(|ids| ids.clone().unwrap_or_default())
}

#[derive(Debug, Serialize)]
struct CreateMotionPayload {
    meeting_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submitter_ids: Nullable<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment_ids: Option<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_parent_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_ids: Option<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supporter_ids: Option<Vec<Id>>,
    #[serde(flatten)]
    agenda: AgendaItemCreation,
}

impl CreateMotionPayload {
    fn from_draft(meeting_id: Id, draft: &MotionDraft) -> Self {
        Self {
            meeting_id,
            title: draft.title.clone(),
            text: draft.text.clone(),
            origin_id: draft.origin_id,
            submitter_ids: draft.submitter_ids.clone(),
            workflow_id: draft.workflow_id,
            category_id: draft.category_id,
            attachment_ids: empty_if_cleared(&draft.attachment_ids),
            reason: draft.reason.clone(),
            number: draft.number.clone(),
            block_id: draft.block_id,
            state_extension: draft.state_extension.clone(),
            sort_parent_id: draft.sort_parent_id,
            tag_ids: empty_if_cleared(&draft.tag_ids),
            supporter_ids: empty_if_cleared(&draft.supporter_ids),
            agenda: draft.agenda.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TextBasedAmendmentPayload {
    meeting_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    lead_motion_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submitter_ids: Nullable<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment_ids: Nullable<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_parent_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_ids: Nullable<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supporter_ids: Nullable<Vec<Id>>,
    #[serde(flatten)]
    agenda: AgendaItemCreation,
}

#[derive(Debug, Serialize)]
struct ParagraphBasedAmendmentPayload {
    meeting_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    lead_motion_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submitter_ids: Option<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment_ids: Option<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_extension: Option<String>,
    #[serde(rename = "amendment_paragraph_$", skip_serializing_if = "Option::is_none")]
    amendment_paragraphs: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_parent_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_ids: Option<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supporter_ids: Option<Vec<Id>>,
    #[serde(flatten)]
    agenda: AgendaItemCreation,
}

#[derive(Debug, Serialize)]
struct StatuteAmendmentPayload {
    meeting_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submitter_ids: Nullable<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment_ids: Nullable<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statute_paragraph_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_parent_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_ids: Nullable<Vec<Id>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supporter_ids: Nullable<Vec<Id>>,
    #[serde(flatten)]
    agenda: AgendaItemCreation,
}

/// Keep only ids and structure of a sorted tree
pub fn create_sort_tree<T: IdTree>(nodes: &[T]) -> Vec<TreeIdNode> {
    nodes
        .iter()
        .map(|node| TreeIdNode {
            id: node.node_id(),
            children: node.child_nodes().map(create_sort_tree),
        })
        .collect()
}

fn id_entries<'a>(ids: impl IntoIterator<Item = &'a Id>) -> Vec<Value> {
    ids.into_iter().map(|id| json!({ "id": id })).collect()
}

/// Builds backend action payloads for motions of the active meeting
#[derive(Debug, Clone)]
pub struct MotionRepository {
    active_meeting_id: Id,
    sorter: ListSorter,
}

impl MotionRepository {
    pub fn new(active_meeting_id: Id) -> Self {
        Self {
            active_meeting_id,
            sorter: ListSorter::default(),
        }
    }

    pub fn with_sort_property(mut self, property: SortProperty) -> Self {
        self.sorter.set_property(property);
        self
    }

    pub fn active_meeting_id(&self) -> Id {
        self.active_meeting_id
    }

    pub fn set_active_meeting(&mut self, meeting_id: Id) {
        self.active_meeting_id = meeting_id;
    }

    pub fn sort_property(&self) -> SortProperty {
        self.sorter.property()
    }

    /// Apply a new value of the `motions_default_sorting` meeting setting.
    ///
    /// An unknown value is rejected and the current order is kept.
    pub fn apply_sort_setting(&mut self, value: &str) -> Result<()> {
        let property: SortProperty = value.parse()?;
        debug!("Motion list now sorted by {}", property);
        self.sorter.set_property(property);
        Ok(())
    }

    /// Motions of the active meeting in default list order
    pub fn view_model_list(&self, motions: &[Motion]) -> Vec<Motion> {
        let mut current: Vec<Motion> = motions
            .iter()
            .filter(|motion| motion.meeting_id == self.active_meeting_id)
            .cloned()
            .collect();
        self.sorter.sort(&mut current);
        current
    }

    pub fn create(&self, drafts: &[MotionDraft]) -> Result<ActionRequest> {
        let data = drafts
            .iter()
            .map(|draft| serde_json::to_value(CreateMotionPayload::from_draft(self.active_meeting_id, draft)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ActionRequest::new(MotionAction::Create, data))
    }

    /// One entry per target meeting and motion
    pub fn create_forwarded(&self, meeting_ids: &[Id], drafts: &[MotionDraft]) -> Result<ActionRequest> {
        let mut data = Vec::with_capacity(meeting_ids.len() * drafts.len());
        for meeting_id in meeting_ids {
            for draft in drafts {
                data.push(serde_json::to_value(CreateMotionPayload::from_draft(*meeting_id, draft))?);
            }
        }
        Ok(ActionRequest::new(MotionAction::CreateForwarded, data))
    }

    /// Send only the fields of `update` that differ per motion.
    ///
    /// A typed `Motion` serializes an unset field as `null`, so clearing a
    /// field that is already unset (e.g. `number: null` on an unnumbered
    /// motion) is no change and is left out of the patch.
    pub fn update(&self, update: &MotionUpdate, motions: &[Motion]) -> Result<ActionRequest> {
        let data = motions
            .iter()
            .map(|motion| {
                diff_objects(motion.id, update, motion, MOTION_COLLECTION_FIELDS, "motion update")?
                    .to_value()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ActionRequest::new(MotionAction::Update, data))
    }

    pub fn delete(&self, ids: &[Id]) -> ActionRequest {
        ActionRequest::new(MotionAction::Delete, id_entries(ids))
    }

    /// Motions already in the target state are skipped
    pub fn set_state(&self, state_id: Option<Id>, motions: &[Motion]) -> ActionRequest {
        let data = motions
            .iter()
            .filter(|motion| motion.state_id != state_id)
            .map(|motion| json!({ "id": motion.id, "state_id": state_id }))
            .collect();
        ActionRequest::new(MotionAction::SetState, data)
    }

    pub fn reset_state(&self, ids: &[Id]) -> ActionRequest {
        ActionRequest::new(MotionAction::ResetState, id_entries(ids))
    }

    /// Motions already carrying the recommendation are skipped
    pub fn set_recommendation(&self, recommendation_id: Id, motions: &[Motion]) -> ActionRequest {
        let data = motions
            .iter()
            .filter(|motion| motion.recommendation_id != Some(recommendation_id))
            .map(|motion| json!({ "id": motion.id, "recommendation_id": recommendation_id }))
            .collect();
        ActionRequest::new(MotionAction::SetRecommendation, data)
    }

    pub fn reset_recommendation(&self, ids: &[Id]) -> ActionRequest {
        ActionRequest::new(MotionAction::ResetRecommendation, id_entries(ids))
    }

    pub fn follow_recommendation(&self, ids: &[Id]) -> ActionRequest {
        ActionRequest::new(MotionAction::FollowRecommendation, id_entries(ids))
    }

    pub fn support(&self, motion_id: Id) -> ActionRequest {
        self.set_support_self(motion_id, true)
    }

    pub fn unsupport(&self, motion_id: Id) -> ActionRequest {
        self.set_support_self(motion_id, false)
    }

    fn set_support_self(&self, motion_id: Id, support: bool) -> ActionRequest {
        ActionRequest::new(
            MotionAction::SetSupportSelf,
            vec![json!({ "motion_id": motion_id, "support": support })],
        )
    }

    pub fn sort_motions<T: IdTree>(&self, tree: &[T]) -> Result<ActionRequest> {
        let payload = json!({
            "meeting_id": self.active_meeting_id,
            "tree": serde_json::to_value(create_sort_tree(tree))?,
        });
        Ok(ActionRequest::new(MotionAction::Sort, vec![payload]))
    }

    pub fn create_text_based(&self, draft: &MotionDraft) -> Result<ActionRequest> {
        let payload = TextBasedAmendmentPayload {
            meeting_id: self.active_meeting_id,
            lead_motion_id: draft.lead_motion_id,
            title: draft.title.clone(),
            text: draft.text.clone(),
            origin_id: draft.origin_id,
            submitter_ids: draft.submitter_ids.clone(),
            workflow_id: draft.workflow_id,
            category_id: draft.category_id,
            attachment_ids: draft.attachment_ids.clone(),
            reason: draft.reason.clone(),
            number: draft.number.clone(),
            block_id: draft.block_id,
            state_extension: draft.state_extension.clone(),
            sort_parent_id: draft.sort_parent_id,
            tag_ids: draft.tag_ids.clone(),
            supporter_ids: draft.supporter_ids.clone(),
            agenda: draft.agenda.clone(),
        };
        Ok(ActionRequest::new(
            MotionAction::CreateTextBasedAmendment,
            vec![serde_json::to_value(payload)?],
        ))
    }

    pub fn create_paragraph_based(&self, draft: &MotionDraft) -> Result<ActionRequest> {
        let payload = ParagraphBasedAmendmentPayload {
            meeting_id: self.active_meeting_id,
            lead_motion_id: draft.lead_motion_id,
            title: draft.title.clone(),
            origin_id: draft.origin_id,
            submitter_ids: empty_if_cleared(&draft.submitter_ids),
            workflow_id: draft.workflow_id,
            category_id: draft.category_id,
            attachment_ids: empty_if_cleared(&draft.attachment_ids),
            reason: draft.reason.clone(),
            number: draft.number.clone(),
            block_id: draft.block_id,
            state_extension: draft.state_extension.clone(),
            amendment_paragraphs: draft.amendment_paragraphs.clone(),
            sort_parent_id: draft.sort_parent_id,
            tag_ids: empty_if_cleared(&draft.tag_ids),
            supporter_ids: empty_if_cleared(&draft.supporter_ids),
            agenda: draft.agenda.clone(),
        };
        Ok(ActionRequest::new(
            MotionAction::CreateParagraphBasedAmendment,
            vec![serde_json::to_value(payload)?],
        ))
    }

    pub fn create_statute_amendment(&self, draft: &MotionDraft) -> Result<ActionRequest> {
        let payload = StatuteAmendmentPayload {
            meeting_id: self.active_meeting_id,
            title: draft.title.clone(),
            text: draft.text.clone(),
            origin_id: draft.origin_id,
            submitter_ids: draft.submitter_ids.clone(),
            workflow_id: draft.workflow_id,
            category_id: draft.category_id,
            attachment_ids: draft.attachment_ids.clone(),
            reason: draft.reason.clone(),
            number: draft.number.clone(),
            block_id: draft.block_id,
            state_extension: draft.state_extension.clone(),
            statute_paragraph_id: draft.statute_paragraph_id,
            sort_parent_id: draft.sort_parent_id,
            tag_ids: draft.tag_ids.clone(),
            supporter_ids: draft.supporter_ids.clone(),
            agenda: draft.agenda.clone(),
        };
        Ok(ActionRequest::new(
            MotionAction::CreateStatuteBasedAmendment,
            vec![serde_json::to_value(payload)?],
        ))
    }

    /// `"<number>: <title>"`, or just the title for unnumbered motions
    pub fn title(&self, motion: &Motion) -> String {
        match motion.number.as_deref() {
            Some(number) if has_number(motion) => format!("{}: {}", number, motion.title),
            _ => motion.title.clone(),
        }
    }

    pub fn number_or_title(&self, motion: &Motion) -> String {
        match motion.number.as_deref() {
            Some(number) if has_number(motion) => number.to_string(),
            _ => motion.title.clone(),
        }
    }
}

fn has_number(motion: &Motion) -> bool {
    is_truthy(motion.field("number").as_ref())
}
