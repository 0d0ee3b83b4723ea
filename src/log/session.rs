/// Session log
///
/// Records what the user did with the report, in order: dataset loads,
/// figure toggles, custom protein uploads, downloads and exports. The log
/// can be saved as plain text or JSON next to the exported report.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    /// 1-based
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    pub action: String,
    pub detail: String,
}

impl SessionEntry {
    pub fn to_text(&self) -> String {
        format!(
            "[{:03}] {} | {} | {}",
            self.sequence,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.action,
            if self.detail.is_empty() { "-" } else { &self.detail }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub session_start: DateTime<Local>,
    pub dataset: Option<String>,
    pub software_version: String,
    pub entries: Vec<SessionEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: Local::now(),
            dataset: None,
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: Vec::new(),
        }
    }

    pub fn set_dataset(&mut self, dataset: &str) {
        self.dataset = Some(dataset.to_string());
        self.record("Dataset selected", dataset);
    }

    pub fn record(&mut self, action: &str, detail: &str) {
        let sequence = self.entries.len() + 1;
        self.entries.push(SessionEntry {
            sequence,
            timestamp: Local::now(),
            action: action.to_string(),
            detail: detail.to_string(),
        });
        log::info!("[session {:03}] {}: {}", sequence, action, detail);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_text(&self) -> String {
        let rule = "=".repeat(64);
        let mut out = String::new();
        out.push_str(&rule);
        out.push_str("\n  Proteomics Report Session Log\n");
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!("  Session ID:  {}\n", self.session_id));
        out.push_str(&format!(
            "  Started:     {}\n",
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!(
            "  Dataset:     {}\n",
            self.dataset.as_deref().unwrap_or("(none)")
        ));
        out.push_str(&format!("  Software:    proteomics_report v{}\n", self.software_version));
        out.push_str(&format!("  Actions:     {}\n", self.entries.len()));
        out.push_str(&"-".repeat(64));
        out.push_str("\n\n");
        for entry in &self.entries {
            out.push_str(&entry.to_text());
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_text(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entries_are_numbered_in_order() {
        let mut log = SessionLog::new();
        assert!(log.is_empty());
        log.set_dataset("PXD000001");
        log.record("Figure hidden", "Hit Selection");
        assert_eq!(log.len(), 2);
        assert_eq!(log.dataset.as_deref(), Some("PXD000001"));
        let seq: Vec<usize> = log.entries.iter().map(|e| e.sequence).collect();
        assert_eq!(seq, vec![1, 2]);
        assert_eq!(log.entries[1].action, "Figure hidden");
    }

    #[test]
    fn test_text_export_lists_actions() {
        let mut log = SessionLog::new();
        log.record("PDF exported", "");
        let text = log.to_text();
        assert!(text.contains("Dataset:     (none)"));
        assert!(text.contains("| PDF exported | -"));
        assert!(text.contains(&log.session_id));
    }

    #[test]
    fn test_json_save_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.json");
        let mut log = SessionLog::new();
        log.set_dataset("local");
        log.save_json(&path).unwrap();

        let parsed: SessionLog = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.session_id, log.session_id);
        assert_eq!(parsed.entries, log.entries);

        let txt = tmp.path().join("session.txt");
        log.save_text(&txt).unwrap();
        assert!(fs::read_to_string(&txt).unwrap().contains("Dataset selected"));
    }
}
