use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt::Write;

use crate::files::format_size;
use crate::models::{Candidate, DatabaseStats, Employee, FileCategory, FileEntry, SyncStatus, User};
use crate::pipeline::{self, CandidateAction};

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Shortens a server timestamp to `YYYY-MM-DD HH:MM`, or a date to
/// `YYYY-MM-DD`. Anything unparseable is shown as-is.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

fn opt(value: &Option<String>) -> String {
    value.as_deref().map(format_timestamp).unwrap_or_else(|| "-".to_string())
}

fn rule(width: usize) -> String {
    "-".repeat(width)
}

// --- Tables ---

pub fn candidate_table(rows: &[&Candidate]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:<24} {:<28} {:<13} {:<9}", "ID", "NAME", "EMAIL", "PIPELINE", "APPROVAL");
    let _ = writeln!(out, "{}", rule(84));
    for c in rows {
        let name = format!("{} {}", c.first_name, c.last_name);
        let _ = writeln!(
            out,
            "{:<6} {:<24} {:<28} {:<13} {:<9}",
            c.id,
            truncate(&name, 22),
            truncate(&c.email, 26),
            c.pipeline_status.to_string(),
            c.admin_approval.to_string()
        );
    }
    out
}

pub fn employee_table(rows: &[&Employee]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:<24} {:<28} {:<12} {:<8}", "ID", "NAME", "EMAIL", "STARTED", "STATUS");
    let _ = writeln!(out, "{}", rule(82));
    for e in rows {
        let name = format!("{} {}", e.first_name, e.last_name);
        let _ = writeln!(
            out,
            "{:<6} {:<24} {:<28} {:<12} {:<8}",
            e.id,
            truncate(&name, 22),
            truncate(&e.email, 26),
            opt(&e.start_date),
            e.activity().to_string()
        );
    }
    out
}

pub fn user_table(rows: &[&User]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<6} {:<18} {:<28} {:<6} {:<9} {:<17}", "ID", "USERNAME", "EMAIL", "ROLE", "STATUS", "LAST LOGIN");
    let _ = writeln!(out, "{}", rule(88));
    for u in rows {
        let last_login = u.last_login.as_deref().map(format_timestamp).unwrap_or_else(|| "Never".to_string());
        let _ = writeln!(
            out,
            "{:<6} {:<18} {:<28} {:<6} {:<9} {:<17}",
            u.id,
            truncate(&u.username, 16),
            truncate(&u.email, 26),
            u.role.to_string(),
            if u.is_active { "active" } else { "inactive" },
            last_login
        );
    }
    out
}

pub fn file_table(category: FileCategory, rows: &[&FileEntry], error: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", category.label(), rows.len());
    if let Some(error) = error {
        let _ = writeln!(out, "  (failed to load: {})", error);
        return out;
    }
    if rows.is_empty() {
        let _ = writeln!(out, "  No files.");
        return out;
    }
    for f in rows {
        let _ = writeln!(
            out,
            "  {:<40} {:>10}  {}",
            truncate(&f.filename, 38),
            format_size(f.size),
            opt(&f.modified)
        );
    }
    out
}

// --- Detail cards ---

pub fn candidate_card(c: &Candidate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Candidate #{}", c.id);
    let _ = writeln!(out, "Name: {} {}", c.first_name, c.last_name);
    let _ = writeln!(out, "Email: {}", c.email);
    let _ = writeln!(out, "Phone: {}", c.phone.as_deref().unwrap_or("Not provided"));
    let _ = writeln!(out, "Pipeline: {}", c.pipeline_status);
    let _ = writeln!(out, "Approval: {}", c.admin_approval);
    let _ = writeln!(out, "Indeed: {}", c.indeed_status.as_deref().unwrap_or("Not synced"));
    if let Some(reg) = &c.indeed_registration_id {
        let _ = writeln!(out, "Indeed registration: {}", reg);
    }
    if let Some(resume) = &c.resume_path {
        let _ = writeln!(out, "Resume: {}", resume);
    }
    if let Some(created) = &c.created_at {
        let _ = writeln!(out, "Created: {}", format_timestamp(created));
    }
    let actions: Vec<String> = pipeline::available_actions(c)
        .into_iter()
        .map(|action| match action {
            CandidateAction::MoveTo(status) => format!("move to {}", status),
            CandidateAction::Decide(decision) => decision.path_segment().to_string(),
            CandidateAction::Delete => "delete".to_string(),
        })
        .collect();
    let _ = writeln!(out, "Actions: {}", actions.join(", "));
    out
}

pub fn employee_card(e: &Employee) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Employee #{}", e.id);
    let _ = writeln!(out, "Name: {} {}", e.first_name, e.last_name);
    let _ = writeln!(out, "Email: {}", e.email);
    if let Some(phone) = &e.phone {
        let _ = writeln!(out, "Phone: {}", phone);
    }
    if let Some(address) = &e.address {
        let _ = writeln!(out, "Address: {}", address);
    }
    let _ = writeln!(out, "Started: {}", opt(&e.start_date));
    match &e.end_date {
        Some(end) => {
            let _ = writeln!(out, "Ended: {}", format_timestamp(end));
        }
        None => {
            let _ = writeln!(out, "Status: active");
        }
    }
    if let Some(pto) = &e.pto {
        let _ = writeln!(
            out,
            "PTO: {:.1}h available, {:.1}h used, {:.1}h remaining",
            pto.available_hours, pto.used_hours, pto.remaining_hours
        );
    }

    let _ = writeln!(out, "\nContracts ({}):", e.contracts.len());
    for c in &e.contracts {
        let _ = writeln!(
            out,
            "  #{} {} signed {} {}",
            c.id,
            c.contract_title.as_deref().unwrap_or("(untitled)"),
            opt(&c.sign_date),
            c.contract_path.as_deref().unwrap_or("")
        );
    }
    let _ = writeln!(out, "\nAdministrative actions ({}):", e.administrative_actions.len());
    for a in &e.administrative_actions {
        let _ = writeln!(
            out,
            "  #{} {} {}",
            a.id,
            opt(&a.action_date),
            a.description.as_deref().unwrap_or("")
        );
    }
    let _ = writeln!(out, "\nAbsences ({}):", e.absences.len());
    for a in &e.absences {
        let _ = writeln!(out, "  #{} {} {}", a.id, opt(&a.absence_date), a.reason.as_deref().unwrap_or(""));
    }
    let _ = writeln!(out, "\nLicensures ({}):", e.licensures.len());
    for l in &e.licensures {
        let _ = writeln!(
            out,
            "  #{} {} ({}) issued {} expires {}",
            l.id,
            l.license_name.as_deref().unwrap_or("(unnamed)"),
            l.issuing_body.as_deref().unwrap_or("-"),
            opt(&l.issue_date),
            opt(&l.expiry_date)
        );
    }
    let _ = writeln!(out, "\nAwards ({}):", e.awards.len());
    for a in &e.awards {
        let _ = writeln!(
            out,
            "  #{} {} {} {}",
            a.id,
            a.award_name.as_deref().unwrap_or("(unnamed)"),
            opt(&a.award_date),
            a.description.as_deref().unwrap_or("")
        );
    }
    out
}

pub fn stats_card(stats: &DatabaseStats) -> String {
    let p = &stats.candidate_pipeline_stats;
    let mut out = String::new();
    let _ = writeln!(out, "Candidates:   {}", stats.total_candidates);
    let _ = writeln!(out, "Employees:    {}", stats.total_employees);
    let _ = writeln!(out, "Users:        {} ({} active)", stats.total_users, stats.active_users);
    let _ = writeln!(out, "\nPipeline:");
    let _ = writeln!(out, "  Applied       {:>6}", p.applied);
    let _ = writeln!(out, "  Interviewing  {:>6}", p.interviewing);
    let _ = writeln!(out, "  Offered       {:>6}", p.offered);
    let _ = writeln!(out, "  Approved      {:>6}", p.approved);
    let _ = writeln!(out, "  Pending       {:>6}", p.pending);
    let _ = writeln!(out, "  Denied        {:>6}", p.denied);
    out
}

pub fn sync_card(status: &SyncStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Synced: {} of {} candidates ({:.1}%)",
        status.synced_candidates, status.total_candidates, status.sync_percentage
    );
    let _ = writeln!(out, "Last sync: {}", opt(&status.last_sync_time));
    let _ = writeln!(
        out,
        "API credentials: {}",
        if status.indeed_api_configured { "configured" } else { "not configured" }
    );
    out
}
