// src/types.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ethereum-style address: `0x` followed by 40 hex characters.
///
/// Addresses are carried as loosely-validated strings on purpose: upstream
/// data sources (ledger exports, plaintext dumps) produce strings, and the
/// similarity engine does best-effort comparison on whatever it receives.
/// Only the generator's fixed inputs are checked with `is_well_formed_address`.
pub type Address = String;

/// Check the `0x` + 40 hex convention for a 20-byte address.
pub fn is_well_formed_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Lowercase an address for case-insensitive comparison.
pub fn normalize_address(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// An attacker-crafted address and the genuine counterparty it imitates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPair {
    pub lookalike: Address,
    pub intended: Address,
}

impl AddressPair {
    /// Build a pair, rejecting the degenerate case where both sides are the
    /// same address (case-insensitive).
    pub fn new(lookalike: impl Into<Address>, intended: impl Into<Address>) -> Option<Self> {
        let lookalike = lookalike.into();
        let intended = intended.into();
        if normalize_address(&lookalike) == normalize_address(&intended) {
            return None;
        }
        Some(Self { lookalike, intended })
    }
}

/// Lifecycle states a transaction moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TxStatus {
    Created,
    Approved,
    Signed,
    Submitted,
    FeeAdjusted,
    Confirmed,
}

/// One lifecycle transition with the time it happened (epoch millis).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub status: TxStatus,
    pub timestamp: i64,
}

/// Core transfer parameters. `value` is in the smallest unit (wei).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxParams {
    pub from: Address,
    pub to: Address,
    pub value: u128,
    pub gas: u64,
    pub gas_price: u64,
    pub nonce: u64,
}

/// Receipt mirroring the final from/to/value of the transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub block_hash: String,
    pub block_number: u64,
    pub from: Address,
    pub to: Address,
    pub value: u128,
    pub gas_used: u64,
    pub effective_gas_price: u64,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub hash: String,
    pub chain_id: u64,
    pub block_number: u64,
    pub status: TxStatus,
    /// Creation time, epoch millis.
    pub time: i64,
    pub submitted_time: i64,
    pub params: TxParams,
    pub history: Vec<LifecycleEvent>,
    pub receipt: Option<TxReceipt>,
}

impl Transaction {
    pub fn is_from(&self, addr: &str) -> bool {
        normalize_address(&self.params.from) == normalize_address(addr)
    }

    pub fn is_to(&self, addr: &str) -> bool {
        normalize_address(&self.params.to) == normalize_address(addr)
    }

    /// True if `addr` is the sender or the recipient.
    pub fn involves(&self, addr: &str) -> bool {
        self.is_from(addr) || self.is_to(addr)
    }

    /// The non-`user` side of the transfer, if `user` is involved at all.
    pub fn counterparty(&self, user: &str) -> Option<&str> {
        if self.is_from(user) {
            Some(self.params.to.as_str())
        } else if self.is_to(user) {
            Some(self.params.from.as_str())
        } else {
            None
        }
    }
}

/// Ordered transaction history, oldest first at generation time, then
/// worst-case reordered (see the generator).
pub type TransactionCorpus = Vec<Transaction>;

/// Engine verdict for one pair, optionally annotated with the USD amount
/// taken in the associated incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub pair: AddressPair,
    pub amount_stolen: Option<f64>,
    pub detected: bool,
}

/// Aggregated verdicts over one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub run_id: Uuid,
    pub total_pairs: usize,
    pub detected: usize,
    /// Fraction in 0.0..=1.0; 0.0 when no pairs were analyzed.
    pub detection_rate: f64,
    /// USD total attributed to detected attacks only.
    pub total_stolen_usd: f64,
}

/// One row of a structured poisoning ledger: the incident amount, when it
/// happened, and the two addresses involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub amount_usd: f64,
    pub date: chrono::NaiveDate,
    pub lookalike: Address,
    pub intended: Address,
}
