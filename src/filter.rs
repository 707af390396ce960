use clap::ValueEnum;
use std::str::FromStr;

use crate::models::{Activity, AdminApproval, Candidate, Employee, FileEntry, PipelineStatus, Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: PartialEq> Choice<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => wanted == value,
        }
    }
}

impl<T: ValueEnum + Clone> Choice<T> {
    pub fn cycle(&self) -> Self
    where
        T: PartialEq,
    {
        let variants = T::value_variants();
        match self {
            Choice::All => variants.first().cloned().map_or(Choice::All, Choice::Only),
            Choice::Only(current) => {
                let next = variants
                    .iter()
                    .position(|v| v == current)
                    .and_then(|i| variants.get(i + 1));
                next.cloned().map_or(Choice::All, Choice::Only)
            }
        }
    }
}

impl<T: ValueEnum> FromStr for Choice<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Choice::All);
        }
        <T as ValueEnum>::from_str(s.trim(), true).map(Choice::Only)
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Choice::All => f.write_str("all"),
            Choice::Only(value) => value.fmt(f),
        }
    }
}

pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Candidate {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.first_name.as_str(), self.last_name.as_str(), self.email.as_str()]
    }
}

impl Searchable for Employee {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.first_name.as_str(), self.last_name.as_str(), self.email.as_str()]
    }
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.username.as_str(), self.email.as_str()]
    }
}

impl Searchable for FileEntry {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.filename.as_str()]
    }
}

pub fn matches_search<T: Searchable>(item: &T, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

pub trait Predicate<T> {
    fn admits(&self, item: &T) -> bool;
}

pub fn apply<'a, T, P: Predicate<T>>(items: &'a [T], predicate: &P) -> Vec<&'a T> {
    items.iter().filter(|item| predicate.admits(item)).collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    pub search: String,
    pub pipeline: Choice<PipelineStatus>,
    pub approval: Choice<AdminApproval>,
}

impl Predicate<Candidate> for CandidateFilter {
    fn admits(&self, candidate: &Candidate) -> bool {
        matches_search(candidate, &self.search)
            && self.pipeline.admits(&candidate.pipeline_status)
            && self.approval.admits(&candidate.admin_approval)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilter {
    pub search: String,
    pub activity: Choice<Activity>,
}

impl Predicate<Employee> for EmployeeFilter {
    fn admits(&self, employee: &Employee) -> bool {
        matches_search(employee, &self.search) && self.activity.admits(&employee.activity())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub search: String,
    pub role: Choice<Role>,
    pub active: Choice<bool>,
}

impl Predicate<User> for UserFilter {
    fn admits(&self, user: &User) -> bool {
        matches_search(user, &self.search)
            && self.role.admits(&user.role)
            && self.active.admits(&user.is_active)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileFilter {
    pub search: String,
}

impl Predicate<FileEntry> for FileFilter {
    fn admits(&self, entry: &FileEntry) -> bool {
        matches_search(entry, &self.search)
    }
}

pub fn parse_active(s: &str) -> Result<Choice<bool>, String> {
    match s.trim().to_lowercase().as_str() {
        "all" => Ok(Choice::All),
        "true" | "yes" | "active" => Ok(Choice::Only(true)),
        "false" | "no" | "inactive" => Ok(Choice::Only(false)),
        other => Err(format!("expected all, active or inactive, got '{}'", other)),
    }
}
