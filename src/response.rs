//! Outcome of one vulnerability database query and its classification

use crate::error::{Error, Result};
use crate::report::Report;
use crate::version::is_older;
use serde::Deserialize;
use std::fmt;
use std::io::Write;

/// Status value the API uses for items with known vulnerabilities
const STATUS_INSECURE: &str = "insecure";

/// Status value carried over from an `{"error": "Not found"}` body
const STATUS_NOT_FOUND: &str = "Not found";

/// Vulnerability identifier, numeric or textual depending on the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VulnId {
    Number(u64),
    Text(String),
}

impl fmt::Display for VulnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Reference links attached to a vulnerability
#[derive(Debug, Clone, Default, Deserialize)]
pub struct References {
    #[serde(default)]
    pub url: Vec<String>,
}

/// One vulnerability as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct VulnerabilityRecord {
    pub id: VulnId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub vuln_type: Option<String>,
    /// `None` when the vulnerability has no fix yet
    #[serde(default)]
    pub fixed_in: Option<String>,
    #[serde(default)]
    pub references: Option<References>,
}

impl VulnerabilityRecord {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn vuln_type(&self) -> &str {
        self.vuln_type.as_deref().unwrap_or_default()
    }

    pub fn fixed_in(&self) -> &str {
        self.fixed_in.as_deref().unwrap_or_default()
    }

    /// First reference URL, or an empty string
    pub fn reference_url(&self) -> &str {
        self.references
            .as_ref()
            .and_then(|r| r.url.first())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Per-item data the API nests under the item's name
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemData {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub vulnerabilities: Option<Vec<VulnerabilityRecord>>,
}

/// Result of querying the database for one item at one installed version
#[derive(Debug, Clone, Default)]
pub struct VulnResponse {
    /// Item name (`wordpress` or a plugin slug)
    pub item: String,
    /// Installed version
    pub version: String,
    pub status: Option<String>,
    pub latest_version: Option<String>,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    /// Transport or parse failure
    pub error: Option<String>,
}

impl fmt::Display for VulnResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.item, self.version)
    }
}

impl VulnResponse {
    pub fn new(item: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Adopt the fields the API returned for this item
    pub fn load(mut self, data: ItemData) -> Self {
        self.status = data.status;
        self.latest_version = data.latest_version;
        self.vulnerabilities = data.vulnerabilities.unwrap_or_default();
        self
    }

    /// Classify this response into `report` and print a status line if there
    /// is anything to say about it
    ///
    /// Vulnerability records are only examined once the item is flagged
    /// insecure or out of date. A record counts when the installed version is
    /// older than its fix, and each counted record adds a vulnerable mark on
    /// top of the one an `insecure` status already gave.
    pub fn report<W: Write>(&self, report: &mut Report, out: &mut W) -> Result<&Self> {
        let mut feedback = None;

        if let Some(error) = &self.error {
            feedback = Some(format!("Error: {error}"));
            report.mark_unknown(self);
        } else {
            let mut search = false;

            if let Some(status) = &self.status {
                feedback = Some(format!("Status: {status}"));
                if status == STATUS_INSECURE {
                    report.mark_vulnerable(self);
                    search = true;
                } else if status == STATUS_NOT_FOUND {
                    report.mark_unknown(self);
                }
            }

            if let Some(latest) = &self.latest_version
                && is_older(&self.version, latest)
            {
                report.mark_out_of_date(self);
                search = true;
            }

            if search {
                for vuln in &self.vulnerabilities {
                    if is_older(&self.version, vuln.fixed_in()) {
                        report.add_vulnerability(self, vuln);
                    }
                }
            }
        }

        if let Some(feedback) = feedback {
            writeln!(out, "{} @ {}: {}", self.item, self.version, feedback)
                .map_err(Error::OutputFailed)?;
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vuln(id: u64, fixed_in: &str) -> VulnerabilityRecord {
        VulnerabilityRecord {
            id: VulnId::Number(id),
            title: Some(format!("vuln {id}")),
            vuln_type: Some("XSS".to_string()),
            fixed_in: Some(fixed_in.to_string()),
            references: None,
        }
    }

    fn classify(resp: &VulnResponse) -> (Report, String) {
        let mut report = Report::new();
        let mut out = Vec::new();
        resp.report(&mut report, &mut out).unwrap();
        (report, String::from_utf8(out).unwrap())
    }

    #[test]
    fn key_is_item_at_version() {
        assert_eq!(VulnResponse::new("akismet", "4.1").to_string(), "akismet@4.1");
    }

    #[test]
    fn error_marks_unknown_and_prints() {
        let resp = VulnResponse::new("akismet", "4.1").with_error("connection refused");
        let (report, out) = classify(&resp);

        assert_eq!(out, "akismet @ 4.1: Error: connection refused\n");
        assert_eq!(report.unknown_count(), 1);
        assert_eq!(report.vulnerable_count(), 0);
    }

    #[test]
    fn insecure_without_records_marks_vulnerable_once() {
        let resp = VulnResponse::new("akismet", "4.1").with_status("insecure");
        let (report, out) = classify(&resp);

        assert_eq!(out, "akismet @ 4.1: Status: insecure\n");
        assert_eq!(report.tally("akismet@4.1").unwrap().vulnerable, 1);
        assert_eq!(report.vulnerable_count(), 1);
        assert!(report.vulnerabilities("akismet@4.1").is_empty());
    }

    #[test]
    fn older_than_latest_is_out_of_date_only() {
        let mut resp = VulnResponse::new("akismet", "1.0");
        resp.latest_version = Some("2.0".to_string());
        let (report, out) = classify(&resp);

        assert_eq!(out, "");
        let tally = report.tally("akismet@1.0").unwrap();
        assert_eq!(tally.out_of_date, 1);
        assert_eq!(tally.vulnerable, 0);
        assert_eq!(report.vulnerable_count(), 0);
    }

    #[test]
    fn current_version_is_not_marked() {
        let mut resp = VulnResponse::new("akismet", "2.0");
        resp.latest_version = Some("2.0".to_string());
        resp.vulnerabilities = vec![vuln(1, "2.1")];
        let (report, _) = classify(&resp);

        assert!(report.is_empty());
    }

    #[test]
    fn records_need_a_reason_to_search() {
        let mut resp = VulnResponse::new("akismet", "1.0");
        resp.vulnerabilities = vec![vuln(1, "1.5")];
        let (report, out) = classify(&resp);

        assert_eq!(out, "");
        assert!(report.is_empty());
        assert_eq!(report.vulnerable_count(), 0);
    }

    #[test]
    fn insecure_status_and_unpatched_record_count_twice() {
        let mut resp = VulnResponse::new("akismet", "1.0").with_status("insecure");
        resp.vulnerabilities = vec![vuln(1, "1.5"), vuln(2, "0.9")];
        let (report, _) = classify(&resp);

        let stored = report.vulnerabilities("akismet@1.0");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, VulnId::Number(1));
        assert_eq!(report.vulnerable_count(), 2);
    }

    #[test]
    fn out_of_date_enables_search() {
        let mut resp = VulnResponse::new("wordpress", "5.8");
        resp.latest_version = Some("5.8.1".to_string());
        resp.vulnerabilities = vec![vuln(10, "5.8.1"), vuln(11, "5.7")];
        let (report, out) = classify(&resp);

        assert!(!out.contains("Status:"));
        let tally = report.tally("wordpress@5.8").unwrap();
        assert_eq!(tally.out_of_date, 1);
        assert_eq!(tally.vulnerable, 1);
        assert_eq!(report.vulnerable_count(), 1);
    }

    #[test]
    fn unfixed_records_are_not_counted() {
        let mut resp = VulnResponse::new("akismet", "1.0").with_status("insecure");
        resp.vulnerabilities = vec![VulnerabilityRecord {
            fixed_in: None,
            ..vuln(3, "")
        }];
        let (report, _) = classify(&resp);

        assert_eq!(report.vulnerable_count(), 1);
        assert!(report.vulnerabilities("akismet@1.0").is_empty());
    }

    #[test]
    fn not_found_marks_unknown() {
        let resp = VulnResponse::new("custom-plugin", "1.0").with_status("Not found");
        let (report, out) = classify(&resp);

        assert_eq!(out, "custom-plugin @ 1.0: Status: Not found\n");
        assert_eq!(report.tally("custom-plugin@1.0").unwrap().unknown, 1);
        assert_eq!(report.vulnerable_count(), 0);
    }

    #[test]
    fn record_deserializes_from_api_shape() {
        let record: VulnerabilityRecord = serde_json::from_value(serde_json::json!({
            "id": 8615,
            "title": "Akismet <= 3.1.4 - Unauthenticated Stored XSS",
            "created_at": "2016-09-06T00:00:00.000Z",
            "vuln_type": "XSS",
            "references": { "url": ["https://blog.akismet.com/"] },
            "fixed_in": "3.1.5"
        }))
        .unwrap();

        assert_eq!(record.id.to_string(), "8615");
        assert_eq!(record.vuln_type(), "XSS");
        assert_eq!(record.fixed_in(), "3.1.5");
        assert_eq!(record.reference_url(), "https://blog.akismet.com/");

        let textual: VulnerabilityRecord =
            serde_json::from_value(serde_json::json!({ "id": "abc", "fixed_in": null })).unwrap();
        assert_eq!(textual.id, VulnId::Text("abc".to_string()));
        assert_eq!(textual.reference_url(), "");
        assert_eq!(textual.fixed_in(), "");
    }
}
