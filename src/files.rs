use std::collections::BTreeMap;
use tracing::debug;

use crate::gateway::{ApiRequest, Gateway, GatewayError, Method, UploadForm};
use crate::models::{FileCategory, FileEntry};
use crate::mutation::{Coordinator, Outcome};

#[derive(Debug, Default)]
pub struct FileBrowser {
    listings: BTreeMap<FileCategory, Vec<FileEntry>>,
    errors: BTreeMap<FileCategory, String>,
}

impl FileBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(&self, category: FileCategory) -> &[FileEntry] {
        self.listings.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn error(&self, category: FileCategory) -> Option<&str> {
        self.errors.get(&category).map(String::as_str)
    }

    pub fn refresh(&mut self, gateway: &Gateway, category: FileCategory) -> Result<(), GatewayError> {
        let request = ApiRequest::new(Method::Get, &["api", "files", "list", category.as_str()]);
        match gateway.fetch::<Vec<FileEntry>>(&request) {
            Ok(entries) => {
                debug!(category = category.as_str(), count = entries.len(), "loaded file listing");
                self.listings.insert(category, entries);
                self.errors.remove(&category);
                Ok(())
            }
            Err(err) => {
                self.errors.insert(category, err.to_string());
                Err(err)
            }
        }
    }

    pub fn refresh_all(&mut self, gateway: &Gateway) -> usize {
        FileCategory::ALL
            .iter()
            .filter(|category| self.refresh(gateway, **category).is_err())
            .count()
    }

    pub fn upload(&mut self, coordinator: &Coordinator, form: UploadForm) -> Outcome {
        let category = form.category;
        let filename = form
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| form.path.display().to_string());
        let request = ApiRequest::new(Method::Post, &["api", "files", "upload"]).with_upload(form);

        if let Err(err) = coordinator.gateway().send(&request) {
            return coordinator.fail(&format!("upload {}", filename), err);
        }
        match self.refresh(coordinator.gateway(), category) {
            Ok(()) => {
                coordinator.info(format!("Uploaded {} to {}", filename, category.label()));
                Outcome::Reloaded
            }
            Err(err) => coordinator.fail(&format!("reload {}", category.label()), err),
        }
    }

    pub fn delete(&mut self, coordinator: &Coordinator, category: FileCategory, filename: &str) -> Outcome {
        if !coordinator.confirm(&format!("Delete {} from {}?", filename, category.label())) {
            return Outcome::Declined;
        }
        let request = ApiRequest::new(Method::Delete, &["api", "files", "delete", category.as_str(), filename]);
        match coordinator.gateway().send(&request) {
            Ok(_) => {
                if let Some(entries) = self.listings.get_mut(&category) {
                    entries.retain(|entry| entry.filename != filename);
                }
                coordinator.info(format!("Deleted {} from {}", filename, category.label()));
                Outcome::Applied
            }
            Err(err) => coordinator.fail(&format!("delete {}", filename), err),
        }
    }
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
