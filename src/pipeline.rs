use crate::models::{AdminApproval, Candidate, PipelineStatus};

pub const STAGES: [PipelineStatus; 3] = [
    PipelineStatus::Applied,
    PipelineStatus::Interviewing,
    PipelineStatus::Offered,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    pub fn path_segment(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Deny => "deny",
        }
    }

    pub fn outcome(&self) -> AdminApproval {
        match self {
            Decision::Approve => AdminApproval::Approved,
            Decision::Deny => AdminApproval::Denied,
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Decision::Approve => "approved",
            Decision::Deny => "denied",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateAction {
    MoveTo(PipelineStatus),
    Decide(Decision),
    Delete,
}

pub fn is_undecided(candidate: &Candidate) -> bool {
    candidate.admin_approval == AdminApproval::Pending
}

pub fn available_actions(candidate: &Candidate) -> Vec<CandidateAction> {
    let mut actions: Vec<CandidateAction> = STAGES
        .iter()
        .filter(|stage| **stage != candidate.pipeline_status)
        .map(|stage| CandidateAction::MoveTo(*stage))
        .collect();
    if is_undecided(candidate) {
        actions.push(CandidateAction::Decide(Decision::Approve));
        actions.push(CandidateAction::Decide(Decision::Deny));
    }
    actions.push(CandidateAction::Delete);
    actions
}

pub fn offers(candidate: &Candidate, action: CandidateAction) -> bool {
    available_actions(candidate).contains(&action)
}
