//! Run-wide tally of classifications and the final text report

use crate::error::{Error, Result};
use crate::response::{VulnResponse, VulnerabilityRecord};
use std::io::Write;

/// Width of the name column
const COLUMN_WIDTH_FIRST: usize = 36;

/// Width of each count column
const COLUMN_WIDTH: usize = 14;

/// Stand-in for a zero count in item rows
const ZERO_COUNT: &str = ".";

/// Classification applied to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Status could not be determined
    Unknown,
    /// Installed version is older than the latest known one
    OutOfDate,
    /// Known vulnerable
    Vulnerable,
}

/// Per-marker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub unknown: u32,
    pub out_of_date: u32,
    pub vulnerable: u32,
}

impl Tally {
    fn bump(&mut self, marker: Marker) {
        match marker {
            Marker::Unknown => self.unknown += 1,
            Marker::OutOfDate => self.out_of_date += 1,
            Marker::Vulnerable => self.vulnerable += 1,
        }
    }
}

/// Accumulates classifications for one run
///
/// Items and vulnerability records keep their first-seen order, which is
/// the order the report prints them in.
#[derive(Debug, Default)]
pub struct Report {
    tally: Vec<(String, Tally)>,
    totals: Tally,
    detail: Vec<(String, Vec<VulnerabilityRecord>)>,
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `marker` against the item `key` without touching the totals
    pub fn mark(&mut self, key: &str, marker: Marker) {
        match self.tally.iter_mut().find(|(k, _)| k.as_str() == key) {
            Some((_, tally)) => tally.bump(marker),
            None => {
                let mut tally = Tally::default();
                tally.bump(marker);
                self.tally.push((key.to_string(), tally));
            }
        }
    }

    fn mark_response(&mut self, response: &VulnResponse, marker: Marker) {
        self.mark(&response.to_string(), marker);
        self.totals.bump(marker);
    }

    pub fn mark_unknown(&mut self, response: &VulnResponse) {
        self.mark_response(response, Marker::Unknown);
    }

    pub fn mark_out_of_date(&mut self, response: &VulnResponse) {
        self.mark_response(response, Marker::OutOfDate);
    }

    pub fn mark_vulnerable(&mut self, response: &VulnResponse) {
        self.mark_response(response, Marker::Vulnerable);
    }

    /// Mark the item vulnerable and keep `record` for the detail listing
    ///
    /// A record whose id was already stored for this item replaces the old one.
    pub fn add_vulnerability(&mut self, response: &VulnResponse, record: &VulnerabilityRecord) {
        self.mark_vulnerable(response);

        let key = response.to_string();
        let records = match self.detail.iter().position(|(k, _)| *k == key) {
            Some(ix) => &mut self.detail[ix].1,
            None => {
                self.detail.push((key, Vec::new()));
                let last = self.detail.len() - 1;
                &mut self.detail[last].1
            }
        };

        let id = record.id.to_string();
        match records.iter_mut().find(|r| r.id.to_string() == id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
    }

    /// Counters for one item key, if it was ever marked
    pub fn tally(&self, key: &str) -> Option<Tally> {
        self.tally.iter().find(|(k, _)| k.as_str() == key).map(|(_, t)| *t)
    }

    /// Stored vulnerability records for one item key
    pub fn vulnerabilities(&self, key: &str) -> &[VulnerabilityRecord] {
        self.detail
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, records)| records.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.tally.is_empty()
    }

    pub fn unknown_count(&self) -> u32 {
        self.totals.unknown
    }

    pub fn out_of_date_count(&self) -> u32 {
        self.totals.out_of_date
    }

    /// Total vulnerable marks; this becomes the process exit code
    pub fn vulnerable_count(&self) -> u32 {
        self.totals.vulnerable
    }

    /// Write the summary table and, if anything is vulnerable, the detail listing
    pub fn print_report<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.write_report(writer).map_err(Error::OutputFailed)
    }

    fn write_report<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        if !self.is_empty() {
            writeln!(
                w,
                "{}",
                row(["Name", "Unknown", "Out of Date", "Vulnerabilities"])
            )?;
            writeln!(w, "{}", "=".repeat(table_width()))?;

            for (name, tally) in &self.tally {
                writeln!(
                    w,
                    "{}",
                    row([
                        name.as_str(),
                        &count(tally.unknown),
                        &count(tally.out_of_date),
                        &count(tally.vulnerable),
                    ])
                )?;
            }

            writeln!(w, "{}", "-".repeat(table_width()))?;
            writeln!(
                w,
                "{}",
                row([
                    "Total",
                    &self.totals.unknown.to_string(),
                    &self.totals.out_of_date.to_string(),
                    &self.totals.vulnerable.to_string(),
                ])
            )?;
        }

        if self.totals.vulnerable > 0 {
            writeln!(w, "\n\nVulnerability Report:")?;
            writeln!(w, "Item\tType\tTitle\tUrl\tFixed in")?;
            for (item, records) in &self.detail {
                for record in records {
                    writeln!(
                        w,
                        "{}\t{}\t{}\t{}\t{}",
                        item,
                        record.vuln_type(),
                        record.title(),
                        record.reference_url(),
                        record.fixed_in(),
                    )?;
                }
            }
        }

        Ok(())
    }
}

fn count(n: u32) -> String {
    if n == 0 {
        ZERO_COUNT.to_string()
    } else {
        n.to_string()
    }
}

fn table_width() -> usize {
    COLUMN_WIDTH_FIRST + 3 * COLUMN_WIDTH
}

/// Fit `text` into `width` columns, keeping at most `width - 1` characters
fn column(text: &str, width: usize, left_align: bool) -> String {
    let cut: String = text.chars().take(width.saturating_sub(1)).collect();
    if left_align {
        format!("{cut:<width$}")
    } else {
        format!("{cut:>width$}")
    }
}

fn row(cells: [&str; 4]) -> String {
    let [name, rest @ ..] = cells;
    let mut line = column(name, COLUMN_WIDTH_FIRST, true);
    for cell in rest {
        line.push_str(&column(cell, COLUMN_WIDTH, false));
    }
    line
}
