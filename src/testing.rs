use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::gateway::{ApiRequest, Gateway, GatewayError, Transport};
use crate::models::{AdminApproval, Candidate, Employee, PipelineStatus, Role, User};
use crate::mutation::{Confirm, Notice, Notify};

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    requests: Rc<RefCell<Vec<ApiRequest>>>,
    replies: Rc<RefCell<VecDeque<Result<Option<Value>, GatewayError>>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gateway(&self) -> Gateway {
        Gateway::new(Box::new(self.clone()))
    }

    pub fn reply(&self, body: Value) {
        self.replies.borrow_mut().push_back(Ok(Some(body)));
    }

    pub fn reply_empty(&self) {
        self.replies.borrow_mut().push_back(Ok(None));
    }

    pub fn fail(&self, status: u16, message: &str) {
        self.replies.borrow_mut().push_back(Err(GatewayError::Status {
            status,
            message: message.to_string(),
        }));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &ApiRequest) -> Result<Option<Value>, GatewayError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(GatewayError::Status {
                status: 599,
                message: format!("no scripted reply for {}", request.path()),
            })
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.notices().into_iter().filter(|n| n.is_error()).collect()
    }
}

impl Notify for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }
}

pub struct Answer {
    pub yes: bool,
    pub asked: RefCell<usize>,
}

impl Answer {
    pub fn yes() -> Self {
        Self { yes: true, asked: RefCell::new(0) }
    }

    pub fn no() -> Self {
        Self { yes: false, asked: RefCell::new(0) }
    }
}

impl Confirm for Answer {
    fn confirm(&self, _prompt: &str) -> bool {
        *self.asked.borrow_mut() += 1;
        self.yes
    }
}

pub fn candidate(id: i64, first: &str, last: &str, email: &str) -> Candidate {
    Candidate {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        phone: None,
        resume_path: None,
        pipeline_status: PipelineStatus::Applied,
        admin_approval: AdminApproval::Pending,
        indeed_status: None,
        indeed_registration_id: None,
        created_at: None,
    }
}

pub fn candidate_json(id: i64, first: &str) -> Value {
    json!({
        "id": id,
        "first_name": first,
        "last_name": "Tester",
        "email": format!("{}@x.com", first.to_lowercase()),
        "pipeline_status": "Applied",
        "admin_approval": "Pending",
        "created_at": "2024-01-15T09:30:00"
    })
}

pub fn employee(id: i64, first: &str, last: &str, email: &str) -> Employee {
    Employee {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        phone: None,
        address: None,
        start_date: None,
        end_date: None,
        pto: None,
        contracts: Vec::new(),
        administrative_actions: Vec::new(),
        absences: Vec::new(),
        licensures: Vec::new(),
        awards: Vec::new(),
    }
}

pub fn user(id: i64, username: &str, email: &str, role: Role) -> User {
    User {
        id,
        username: username.to_string(),
        email: email.to_string(),
        role,
        is_active: true,
        created_at: None,
        last_login: None,
    }
}
