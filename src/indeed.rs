use serde::{Deserialize, Serialize};

use crate::gateway::{ApiRequest, Gateway, GatewayError, Method};
use crate::models::{Candidate, SyncStatus};
use crate::mutation::{Coordinator, Outcome};
use crate::store::{Action, Collection};

#[derive(Debug, Deserialize)]
struct SyncResponse {
    #[serde(default)]
    synced_candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize)]
struct PushRequest {
    candidate_id: i64,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    candidate: Option<Candidate>,
}

pub fn sync_status(gateway: &Gateway) -> Result<SyncStatus, GatewayError> {
    gateway.fetch(&ApiRequest::new(Method::Get, &["api", "indeed", "sync-status"]))
}

pub fn sync_candidates(coordinator: &Coordinator, store: &mut Collection<Candidate>) -> Outcome {
    let request = ApiRequest::new(Method::Post, &["api", "indeed", "sync-candidates"]);
    match coordinator.gateway().fetch::<SyncResponse>(&request) {
        Ok(response) => {
            let count = response.synced_candidates.len();
            let mut merged = std::mem::take(store);
            for candidate in response.synced_candidates {
                merged = merged.reduce(Action::Inserted(candidate));
            }
            *store = merged;
            coordinator.info(format!("Synced {} candidates from Indeed", count));
            Outcome::Applied
        }
        Err(err) => coordinator.fail("sync candidates from Indeed", err),
    }
}

pub fn push_status(coordinator: &Coordinator, store: &mut Collection<Candidate>, id: i64) -> Outcome {
    let what = format!("push candidate #{} to Indeed", id);
    let request = match ApiRequest::new(Method::Post, &["api", "indeed", "push-candidate-status"])
        .with_json(&PushRequest { candidate_id: id })
    {
        Ok(request) => request,
        Err(err) => return coordinator.fail(&what, err),
    };
    match coordinator.gateway().fetch::<PushResponse>(&request) {
        Ok(PushResponse { candidate: Some(candidate) }) => {
            store.apply_patch(id, candidate);
            coordinator.info(format!("Pushed candidate #{} status to Indeed", id));
            Outcome::Applied
        }
        Ok(PushResponse { candidate: None }) => match coordinator.reload(store) {
            outcome if outcome.succeeded() => {
                coordinator.info(format!("Pushed candidate #{} status to Indeed", id));
                outcome
            }
            outcome => outcome,
        },
        Err(err) => coordinator.fail(&what, err),
    }
}
