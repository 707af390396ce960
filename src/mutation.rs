use serde::Serialize;
use tracing::{info, warn};

use crate::gateway::{Gateway, GatewayError, Resource};
use crate::models::{Candidate, CandidateUpdate, Employee, PipelineStatus, SubCollectionItem};
use crate::pipeline::{self, CandidateAction, Decision};
use crate::store::{Action, Collection, Record};

// --- Notification and confirmation seams ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: Level::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

pub trait Notify {
    fn notify(&self, notice: Notice);
}

pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

pub struct Confirmed;

impl Confirm for Confirmed {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

// --- Outcome ---

#[derive(Debug)]
pub enum Outcome {
    Applied,
    Reloaded,
    Declined,
    NotOffered,
    Failed(GatewayError),
}

impl Outcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Outcome::Applied | Outcome::Reloaded)
    }
}

fn commit<T: Record>(store: &mut Collection<T>, action: Action<T>) {
    let snapshot = std::mem::take(store);
    *store = snapshot.reduce(action);
}

// --- Coordinator ---

pub struct Coordinator<'a> {
    gateway: &'a Gateway,
    confirm: &'a dyn Confirm,
    notify: &'a dyn Notify,
}

impl<'a> Coordinator<'a> {
    pub fn new(gateway: &'a Gateway, confirm: &'a dyn Confirm, notify: &'a dyn Notify) -> Self {
        Self { gateway, confirm, notify }
    }

    pub fn gateway(&self) -> &'a Gateway {
        self.gateway
    }

    pub fn confirm(&self, prompt: &str) -> bool {
        self.confirm.confirm(prompt)
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.notify.notify(Notice::info(message));
    }

    pub fn fail(&self, what: &str, err: GatewayError) -> Outcome {
        warn!(error = %err, "{} failed", what);
        self.notify.notify(Notice::error(format!("Failed to {}: {}", what, err)));
        Outcome::Failed(err)
    }

    pub fn reload<R: Resource>(&self, store: &mut Collection<R>) -> Outcome {
        match self.gateway.list::<R>() {
            Ok(items) => {
                commit(store, Action::Loaded(items));
                Outcome::Reloaded
            }
            Err(err) => self.fail(&format!("load {}s", R::NOUN), err),
        }
    }

    fn reconcile<R: Resource>(&self, store: &mut Collection<R>, returned: Option<R>, action: fn(R) -> Action<R>) -> Outcome {
        match returned {
            Some(item) => {
                commit(store, action(item));
                Outcome::Applied
            }
            None => self.reload(store),
        }
    }

    pub fn create<R: Resource, B: Serialize>(&self, store: &mut Collection<R>, body: &B) -> Outcome {
        match self.gateway.create::<R, B>(body) {
            Ok(returned) => {
                let id = returned.as_ref().map(|item| item.id());
                let outcome = self.reconcile(store, returned, Action::Inserted);
                if outcome.succeeded() {
                    match id {
                        Some(id) => self.info(format!("Created {} #{}", R::NOUN, id)),
                        None => self.info(format!("Created {}", R::NOUN)),
                    }
                }
                outcome
            }
            Err(err) => self.fail(&format!("create {}", R::NOUN), err),
        }
    }

    pub fn update<R: Resource, B: Serialize>(&self, store: &mut Collection<R>, id: i64, fields: &B) -> Outcome {
        match self.gateway.update::<R, B>(id, fields) {
            Ok(returned) => {
                let outcome = self.reconcile(store, returned, Action::Patched);
                if outcome.succeeded() {
                    self.info(format!("Updated {} #{}", R::NOUN, id));
                }
                outcome
            }
            Err(err) => self.fail(&format!("update {} #{}", R::NOUN, id), err),
        }
    }

    pub fn delete<R: Resource>(&self, store: &mut Collection<R>, id: i64) -> Outcome {
        if !self.confirm(&format!("Delete {} #{}?", R::NOUN, id)) {
            return Outcome::Declined;
        }
        match self.gateway.delete::<R>(id) {
            Ok(()) => {
                commit(store, Action::Removed(id));
                self.info(format!("Deleted {} #{}", R::NOUN, id));
                Outcome::Applied
            }
            Err(err) => self.fail(&format!("delete {} #{}", R::NOUN, id), err),
        }
    }

    pub fn transition(&self, store: &mut Collection<Candidate>, id: i64, status: PipelineStatus) -> Outcome {
        self.update(store, id, &CandidateUpdate::pipeline_status(status))
    }

    /// Approves or denies a candidate. Only requested while the candidate's
    /// approval is still pending in the local copy.
    pub fn decide(&self, store: &mut Collection<Candidate>, id: i64, decision: Decision) -> Outcome {
        let offered = store
            .get(id)
            .is_some_and(|c| pipeline::offers(c, CandidateAction::Decide(decision)));
        if !offered {
            self.notify.notify(Notice::error(format!(
                "Candidate #{} is not awaiting approval",
                id
            )));
            return Outcome::NotOffered;
        }

        let what = format!("{} candidate #{}", decision.path_segment(), id);
        match self.gateway.post_nested::<Candidate, ()>(id, &[decision.path_segment()], None) {
            Ok(body) => {
                let returned = match body.map(serde_json::from_value::<Candidate>).transpose() {
                    Ok(returned) => returned,
                    Err(err) => return self.fail(&what, err.into()),
                };
                let outcome = self.reconcile(store, returned, Action::Patched);
                if outcome.succeeded() {
                    info!(id, approval = %decision.outcome(), "candidate decided");
                    self.info(format!("Candidate #{} {}", id, decision.past_tense()));
                }
                outcome
            }
            Err(err) => self.fail(&what, err),
        }
    }

    pub fn add_record(&self, detail: &mut Employee, item: &SubCollectionItem) -> Outcome {
        let id = detail.id;
        let what = format!("add {} to employee #{}", item.kind(), id);
        if let Err(err) = self.gateway.post_nested::<Employee, _>(id, &[item.path_segment()], Some(item)) {
            return self.fail(&what, err);
        }
        match self.gateway.get::<Employee>(id) {
            Ok(fresh) => {
                *detail = fresh;
                self.info(format!("Added {} to employee #{}", item.kind(), id));
                Outcome::Applied
            }
            Err(err) => self.fail(&format!("reload employee #{}", id), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Body, Method};
    use crate::models::{AdminApproval, NewAbsence, NewCandidate, User, UserUpdate};
    use crate::testing::{Answer, RecordingNotifier, ScriptedTransport, candidate, candidate_json};
    use chrono::NaiveDate;
    use serde_json::json;

    fn loaded(candidates: Vec<Candidate>) -> Collection<Candidate> {
        let mut store = Collection::new();
        store.load(candidates);
        store
    }

    fn new_candidate() -> NewCandidate {
        NewCandidate {
            first_name: "Ann".into(),
            last_name: "Tester".into(),
            email: "ann@x.com".into(),
            phone: None,
            resume_path: None,
            pipeline_status: PipelineStatus::Applied,
        }
    }

    #[test]
    fn test_transition_sends_one_put_and_patches() {
        let transport = ScriptedTransport::new();
        let mut offered = candidate_json(1, "Ann");
        offered["pipeline_status"] = json!("Offered");
        transport.reply(offered);
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut store = loaded(vec![candidate(1, "Ann", "Lee", "a@x.com")]);
        let outcome = coordinator.transition(&mut store, 1, PipelineStatus::Offered);

        assert!(matches!(outcome, Outcome::Applied));
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Put);
        assert_eq!(sent[0].path(), "/api/candidates/1");
        assert_eq!(sent[0].body, Body::Json(json!({ "pipeline_status": "Offered" })));
        assert_eq!(store.get(1).unwrap().pipeline_status, PipelineStatus::Offered);
    }

    #[test]
    fn test_failed_update_leaves_store_unchanged() {
        let transport = ScriptedTransport::new();
        transport.fail(500, "database is locked");
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut store = loaded(vec![candidate(1, "Ann", "Lee", "a@x.com")]);
        let outcome = coordinator.transition(&mut store, 1, PipelineStatus::Interviewing);

        assert!(matches!(outcome, Outcome::Failed(GatewayError::Status { status: 500, .. })));
        assert_eq!(store.get(1).unwrap().pipeline_status, PipelineStatus::Applied);
        let errors = notes.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("database is locked"));
        assert_eq!(transport.requests().len(), 1, "no retry");
    }

    #[test]
    fn test_create_inserts_server_record_once() {
        let transport = ScriptedTransport::new();
        transport.reply(candidate_json(5, "Ann"));
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut store = loaded(vec![candidate(1, "Bo", "Ray", "b@x.com")]);
        let outcome = coordinator.create(&mut store, &new_candidate());

        assert!(matches!(outcome, Outcome::Applied));
        assert_eq!(store.items().iter().filter(|c| c.id == 5).count(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(transport.requests()[0].method, Method::Post);
        assert_eq!(notes.notices(), vec![Notice::info("Created candidate #5")]);
    }

    #[test]
    fn test_create_without_body_reloads() {
        let transport = ScriptedTransport::new();
        transport.reply_empty();
        transport.reply(json!([candidate_json(1, "Bo"), candidate_json(5, "Ann")]));
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut store = loaded(vec![candidate(1, "Bo", "Ray", "b@x.com")]);
        let outcome = coordinator.create(&mut store, &new_candidate());

        assert!(matches!(outcome, Outcome::Reloaded));
        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].method, Method::Get);
        assert_eq!(store.items().iter().filter(|c| c.id == 5).count(), 1);
    }

    #[test]
    fn test_update_without_body_reloads() {
        let transport = ScriptedTransport::new();
        transport.reply_empty();
        transport.reply(json!([candidate_json(1, "Anne")]));
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut store = loaded(vec![candidate(1, "Ann", "Lee", "a@x.com")]);
        let fields = CandidateUpdate { first_name: Some("Anne".into()), ..Default::default() };
        let outcome = coordinator.update(&mut store, 1, &fields);

        assert!(matches!(outcome, Outcome::Reloaded));
        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].method, Method::Put);
        assert_eq!(sent[0].body, Body::Json(json!({ "first_name": "Anne" })));
        assert_eq!(sent[1].method, Method::Get);
        assert_eq!(sent[1].path(), "/api/candidates");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap().first_name, "Anne");
        assert_eq!(notes.notices(), vec![Notice::info("Updated candidate #1")]);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let transport = ScriptedTransport::new();
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::no(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut store = loaded(vec![candidate(1, "Ann", "Lee", "a@x.com")]);
        let outcome = coordinator.delete(&mut store, 1);

        assert!(matches!(outcome, Outcome::Declined));
        assert_eq!(*answer.asked.borrow(), 1);
        assert!(transport.requests().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_confirmed_delete_removes_item() {
        let transport = ScriptedTransport::new();
        transport.reply(json!({"message": "Candidate deleted"}));
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut store = loaded(vec![
            candidate(1, "Ann", "Lee", "a@x.com"),
            candidate(2, "Bo", "Ray", "b@x.com"),
        ]);
        let outcome = coordinator.delete(&mut store, 1);

        assert!(outcome.succeeded());
        assert_eq!(store.items().iter().filter(|c| c.id == 1).count(), 0);
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Delete);
        assert_eq!(sent[0].path(), "/api/candidates/1");
    }

    #[test]
    fn test_failed_delete_keeps_item() {
        let transport = ScriptedTransport::new();
        transport.fail(404, "Candidate not found");
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut store = loaded(vec![candidate(1, "Ann", "Lee", "a@x.com")]);
        let outcome = coordinator.delete(&mut store, 1);

        assert!(!outcome.succeeded());
        assert_eq!(store.len(), 1);
        assert_eq!(notes.errors().len(), 1);
    }

    #[test]
    fn test_decide_only_while_pending() {
        let transport = ScriptedTransport::new();
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut decided = candidate(1, "Ann", "Lee", "a@x.com");
        decided.admin_approval = AdminApproval::Approved;
        let mut store = loaded(vec![decided]);

        assert!(matches!(coordinator.decide(&mut store, 1, Decision::Deny), Outcome::NotOffered));
        assert!(matches!(coordinator.decide(&mut store, 42, Decision::Approve), Outcome::NotOffered));
        assert!(transport.requests().is_empty());
        assert_eq!(store.get(1).unwrap().admin_approval, AdminApproval::Approved);
    }

    #[test]
    fn test_approve_pending_candidate() {
        let transport = ScriptedTransport::new();
        let mut approved = candidate_json(1, "Ann");
        approved["admin_approval"] = json!("Approved");
        transport.reply(approved);
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut store = loaded(vec![candidate(1, "Ann", "Lee", "a@x.com")]);
        let outcome = coordinator.decide(&mut store, 1, Decision::Approve);

        assert!(matches!(outcome, Outcome::Applied));
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].path(), "/api/candidates/1/approve");
        assert_eq!(store.get(1).unwrap().admin_approval, AdminApproval::Approved);

        // Once decided, a second decision is not even requested.
        assert!(matches!(coordinator.decide(&mut store, 1, Decision::Deny), Outcome::NotOffered));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_user_update_patches_with_response() {
        let transport = ScriptedTransport::new();
        transport.reply(json!({"id": 3, "username": "hr1", "email": "hr@x.com", "role": "hr", "is_active": false}));
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut store: Collection<User> = Collection::new();
        store.load(vec![crate::testing::user(3, "hr1", "hr@x.com", crate::models::Role::Hr)]);
        let fields = UserUpdate { is_active: Some(false), ..Default::default() };
        assert!(coordinator.update(&mut store, 3, &fields).succeeded());

        assert!(!store.get(3).unwrap().is_active);
        let sent = transport.requests();
        assert_eq!(sent[0].path(), "/api/admin/users/3");
        assert_eq!(sent[0].body, Body::Json(json!({ "is_active": false })));
    }

    #[test]
    fn test_add_record_refetches_employee() {
        let transport = ScriptedTransport::new();
        transport.reply(json!({"id": 11, "absence_date": "2024-03-01", "reason": "Sick"}));
        transport.reply(json!({
            "id": 4, "first_name": "Bo", "last_name": "Ray", "email": "bo@x.com",
            "absences": [{"id": 11, "absence_date": "2024-03-01", "reason": "Sick"}]
        }));
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut detail = crate::testing::employee(4, "Bo", "Ray", "bo@x.com");
        let item = SubCollectionItem::Absence(NewAbsence {
            absence_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            reason: Some("Sick".into()),
        });
        assert!(coordinator.add_record(&mut detail, &item).succeeded());

        assert_eq!(detail.absences.len(), 1);
        let sent = transport.requests();
        assert_eq!(sent[0].path(), "/api/employees/4/absences");
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[1].path(), "/api/employees/4");
        assert_eq!(sent[1].method, Method::Get);
    }

    #[test]
    fn test_add_record_failure_keeps_detail() {
        let transport = ScriptedTransport::new();
        transport.fail(400, "absence_date is required");
        let gateway = transport.gateway();
        let (answer, notes) = (Answer::yes(), RecordingNotifier::default());
        let coordinator = Coordinator::new(&gateway, &answer, &notes);

        let mut detail = crate::testing::employee(4, "Bo", "Ray", "bo@x.com");
        let item = SubCollectionItem::Absence(NewAbsence {
            absence_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            reason: None,
        });
        assert!(!coordinator.add_record(&mut detail, &item).succeeded());
        assert!(detail.absences.is_empty());
        assert_eq!(transport.requests().len(), 1);
    }
}
