// src/extract/mod.rs
//
// Pair sources for the similarity engine: structured ledger CSV rows and
// free-form incident write-ups. Corrupt rows are skipped one at a time,
// never aborting the batch, so downstream analysis may see fewer pairs
// than the raw input contained.

use regex::Regex;
use tracing::debug;

use crate::error::DetectorResult;
use crate::types::{AddressPair, LedgerRecord};

const LEDGER_HEADER: &str = "amount_usd,date,lookalike_address,intended_address";

/// Parse a structured poisoning ledger in
/// `amount_usd,date,lookalike_address,intended_address` form (ISO dates).
/// Malformed rows are dropped with a debug log.
pub fn parse_ledger_csv(data: &str) -> Vec<LedgerRecord> {
    let mut records = Vec::new();
    for (line_no, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line == LEDGER_HEADER {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        let &[amount, date, lookalike, intended] = fields.as_slice() else {
            debug!(line_no, "skipping ledger row with wrong field count");
            continue;
        };
        let (Ok(amount_usd), Ok(date)) = (
            amount.trim().parse::<f64>(),
            date.trim().parse::<chrono::NaiveDate>(),
        ) else {
            debug!(line_no, "skipping ledger row with bad amount or date");
            continue;
        };
        if lookalike.trim().is_empty() || intended.trim().is_empty() {
            debug!(line_no, "skipping ledger row with missing address");
            continue;
        }

        records.push(LedgerRecord {
            amount_usd,
            date,
            lookalike: lookalike.trim().to_string(),
            intended: intended.trim().to_string(),
        });
    }
    records
}

/// Scans free-form text for address tokens adjacent to "lookalike" /
/// "intended" markers, plus stolen-amount and date annotations.
pub struct PlaintextExtractor {
    address_re: Regex,
    amount_re: Regex,
    date_re: Regex,
}

impl PlaintextExtractor {
    pub fn new() -> DetectorResult<Self> {
        Ok(Self {
            address_re: Regex::new(r"0x[a-fA-F0-9]{40}")?,
            amount_re: Regex::new(r"-\$([\d,]+\.\d{2})")?,
            date_re: Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})")?,
        })
    }

    /// Pull `(lookalike, intended)` pairs out of an incident write-up. The
    /// address may sit on the marker line itself or on the following line.
    pub fn extract_pairs(&self, text: &str) -> Vec<AddressPair> {
        let lines: Vec<&str> = text.lines().collect();
        let mut pairs = Vec::new();
        let mut lookalike: Option<String> = None;

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i].trim();
            let lowered = line.to_ascii_lowercase();

            if lowered.contains("lookalike") {
                if let Some(addr) = self.address_near(&lines, &mut i) {
                    lookalike = Some(addr);
                }
            } else if lowered.contains("intended") && lookalike.is_some() {
                if let Some(intended) = self.address_near(&lines, &mut i) {
                    let found = lookalike.take().map(|l| AddressPair::new(l, intended));
                    match found.flatten() {
                        Some(pair) => pairs.push(pair),
                        None => debug!(line = i, "markers resolved to a degenerate pair"),
                    }
                }
            }
            i += 1;
        }
        pairs
    }

    /// Full incident records: stolen amount, date, and the address pair.
    /// A record is emitted once all four fields have been seen.
    pub fn extract_records(&self, text: &str) -> Vec<LedgerRecord> {
        let lines: Vec<&str> = text.lines().collect();
        let mut records = Vec::new();

        let mut amount: Option<f64> = None;
        let mut date: Option<chrono::NaiveDate> = None;
        let mut lookalike: Option<String> = None;
        let mut intended: Option<String> = None;

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i].trim();
            let lowered = line.to_ascii_lowercase();

            if let Some(captures) = self.amount_re.captures(line) {
                amount = captures[1].replace(',', "").parse::<f64>().ok();
            }
            if let Some(captures) = self.date_re.captures(line) {
                date = chrono::NaiveDate::parse_from_str(&captures[1], "%m/%d/%Y").ok();
            }
            if lowered.contains("lookalike") {
                if let Some(addr) = self.address_near(&lines, &mut i) {
                    lookalike = Some(addr);
                }
            } else if lowered.contains("intended") {
                if let Some(addr) = self.address_near(&lines, &mut i) {
                    intended = Some(addr);
                }
            }

            if let (Some(amount_usd), Some(d), Some(l), Some(int)) =
                (amount, date, lookalike.as_ref(), intended.as_ref())
            {
                records.push(LedgerRecord {
                    amount_usd,
                    date: d,
                    lookalike: l.clone(),
                    intended: int.clone(),
                });
                amount = None;
                date = None;
                lookalike = None;
                intended = None;
            }
            i += 1;
        }
        records
    }

    /// Address on the current line, or on the next line (consuming it).
    fn address_near(&self, lines: &[&str], i: &mut usize) -> Option<String> {
        if let Some(found) = self.address_re.find(lines[*i]) {
            return Some(found.as_str().to_string());
        }
        if *i + 1 < lines.len() {
            if let Some(found) = self.address_re.find(lines[*i + 1]) {
                *i += 1;
                return Some(found.as_str().to_string());
            }
        }
        None
    }
}
