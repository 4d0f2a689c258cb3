use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One backend action call: an action name and the payload entries it applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub data: Vec<Value>,
}

impl ActionRequest {
    pub fn new(action: MotionAction, data: Vec<Value>) -> Self {
        Self {
            action: action.to_string(),
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Backend actions on motions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAction {
    Create,
    CreateForwarded,
    Update,
    Delete,
    Sort,
    SetState,
    ResetState,
    SetRecommendation,
    ResetRecommendation,
    FollowRecommendation,
    SetSupportSelf,
    CreateTextBasedAmendment,
    CreateParagraphBasedAmendment,
    CreateStatuteBasedAmendment,
}

impl std::fmt::Display for MotionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            // Amendments are motions with a lead motion; the backend has one create action
            MotionAction::Create
            | MotionAction::CreateTextBasedAmendment
            | MotionAction::CreateParagraphBasedAmendment
            | MotionAction::CreateStatuteBasedAmendment => "motion.create",
            MotionAction::CreateForwarded => "motion.create_forwarded",
            MotionAction::Update => "motion.update",
            MotionAction::Delete => "motion.delete",
            MotionAction::Sort => "motion.sort",
            MotionAction::SetState => "motion.set_state",
            MotionAction::ResetState => "motion.reset_state",
            MotionAction::SetRecommendation => "motion.set_recommendation",
            MotionAction::ResetRecommendation => "motion.reset_recommendation",
            MotionAction::FollowRecommendation => "motion.follow_recommendation",
            MotionAction::SetSupportSelf => "motion.set_support_self",
        };
        write!(f, "{}", name)
    }
}
