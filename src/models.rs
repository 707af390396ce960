use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Candidates ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum PipelineStatus {
    Applied,
    Interviewing,
    Offered,
    Approved,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum AdminApproval {
    Pending,
    Approved,
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub resume_path: Option<String>,
    pub pipeline_status: PipelineStatus,
    pub admin_approval: AdminApproval,
    #[serde(default)]
    pub indeed_status: Option<String>, // mirrored from the Indeed ATS, free text
    #[serde(default)]
    pub indeed_registration_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCandidate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_path: Option<String>,
    pub pipeline_status: PipelineStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CandidateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_status: Option<PipelineStatus>,
}

impl CandidateUpdate {
    pub fn pipeline_status(status: PipelineStatus) -> Self {
        Self {
            pipeline_status: Some(status),
            ..Self::default()
        }
    }
}

// --- Employees ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pto {
    #[serde(default)]
    pub available_hours: f64,
    #[serde(default)]
    pub used_hours: f64,
    #[serde(default)]
    pub remaining_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    pub contract_title: Option<String>,
    pub sign_date: Option<String>,
    pub contract_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdministrativeAction {
    pub id: i64,
    pub action_date: Option<String>,
    pub description: Option<String>,
    pub document_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Absence {
    pub id: i64,
    pub absence_date: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Licensure {
    pub id: i64,
    pub license_name: Option<String>,
    pub issuing_body: Option<String>,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Award {
    pub id: i64,
    pub award_name: Option<String>,
    pub award_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub pto: Option<Pto>,
    // Sub-collections are only present on the detail endpoint.
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub administrative_actions: Vec<AdministrativeAction>,
    #[serde(default)]
    pub absences: Vec<Absence>,
    #[serde(default)]
    pub licensures: Vec<Licensure>,
    #[serde(default)]
    pub awards: Vec<Award>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn activity(&self) -> Activity {
        if self.is_active() {
            Activity::Active
        } else {
            Activity::Former
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Activity {
    Active,
    Former,
}

pub const DEFAULT_PTO_HOURS: u32 = 80;

#[derive(Debug, Clone, Serialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub initial_pto_hours: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewContract {
    pub contract_title: String,
    pub sign_date: Option<NaiveDate>,
    pub contract_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAdministrativeAction {
    pub action_date: NaiveDate,
    pub description: String,
    pub document_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAbsence {
    pub absence_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewLicensure {
    pub license_name: String,
    pub issuing_body: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAward {
    pub award_name: String,
    pub award_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// A record appended to one of an employee's sub-collections. The variant
/// picks the endpoint; the payload is the body.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SubCollectionItem {
    Contract(NewContract),
    AdministrativeAction(NewAdministrativeAction),
    Absence(NewAbsence),
    Licensure(NewLicensure),
    Award(NewAward),
}

impl SubCollectionItem {
    pub fn path_segment(&self) -> &'static str {
        match self {
            SubCollectionItem::Contract(_) => "contracts",
            SubCollectionItem::AdministrativeAction(_) => "administrative-actions",
            SubCollectionItem::Absence(_) => "absences",
            SubCollectionItem::Licensure(_) => "licensures",
            SubCollectionItem::Award(_) => "awards",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SubCollectionItem::Contract(_) => "contract",
            SubCollectionItem::AdministrativeAction(_) => "administrative action",
            SubCollectionItem::Absence(_) => "absence",
            SubCollectionItem::Licensure(_) => "licensure",
            SubCollectionItem::Award(_) => "award",
        }
    }
}

// --- Users ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Hr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

// --- Files ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Resumes,
    Contracts,
    Policies,
    Licenses,
    Awards,
    Documents,
}

impl FileCategory {
    pub const ALL: [FileCategory; 6] = [
        FileCategory::Resumes,
        FileCategory::Contracts,
        FileCategory::Policies,
        FileCategory::Licenses,
        FileCategory::Awards,
        FileCategory::Documents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Resumes => "resumes",
            FileCategory::Contracts => "contracts",
            FileCategory::Policies => "policies",
            FileCategory::Licenses => "licenses",
            FileCategory::Awards => "awards",
            FileCategory::Documents => "documents",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::Resumes => "Resumes",
            FileCategory::Contracts => "Contracts",
            FileCategory::Policies => "Policy Documents",
            FileCategory::Licenses => "Licenses",
            FileCategory::Awards => "Awards",
            FileCategory::Documents => "General Documents",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Candidate,
    Employee,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Candidate => "candidate",
            EntityKind::Employee => "employee",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

// --- Admin ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineCounts {
    #[serde(default)]
    pub applied: u64,
    #[serde(default)]
    pub interviewing: u64,
    #[serde(default)]
    pub offered: u64,
    #[serde(default)]
    pub approved: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub denied: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseStats {
    #[serde(default)]
    pub total_candidates: u64,
    #[serde(default)]
    pub total_employees: u64,
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub active_users: u64,
    #[serde(default)]
    pub candidate_pipeline_stats: PipelineCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupResult {
    pub backup_file: String,
}

// --- Indeed sync ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    pub total_candidates: u64,
    pub synced_candidates: u64,
    pub sync_percentage: f64,
    #[serde(default)]
    pub last_sync_time: Option<String>,
    #[serde(default)]
    pub indeed_api_configured: bool,
}

// --- Display ---

macro_rules! display_as {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match self {
                    $(Self::$variant => $text,)+
                };
                f.write_str(text)
            }
        }
    };
}

display_as!(PipelineStatus {
    Applied => "Applied",
    Interviewing => "Interviewing",
    Offered => "Offered",
    Approved => "Approved",
    Denied => "Denied",
});

display_as!(AdminApproval {
    Pending => "Pending",
    Approved => "Approved",
    Denied => "Denied",
});

display_as!(Role {
    Admin => "admin",
    User => "user",
    Hr => "hr",
});

display_as!(Activity {
    Active => "active",
    Former => "former",
});
