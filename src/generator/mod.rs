// src/generator/mod.rs
pub mod sampling;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::error::{DetectorError, DetectorResult};
use crate::types::{
    Address, LifecycleEvent, Transaction, TransactionCorpus, TxParams, TxReceipt, TxStatus,
    is_well_formed_address, normalize_address,
};

/// Bucket proportions, in percent of the corpus. The remainder after the
/// first three buckets becomes normal incoming traffic.
const TO_INTENDED_PCT: usize = 30;
const FROM_LOOKALIKE_PCT: usize = 15;
const NORMAL_OUTGOING_PCT: usize = 35;

/// Recurring counterparties sampled alongside the intended address.
const FREQUENT_RECIPIENT_POOL: usize = 4;

/// Milliseconds between lifecycle transitions.
const LIFECYCLE_STEP_MS: i64 = 1_000;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of transactions to produce. Zero is a caller bug.
    pub count: usize,
    /// The wallet under test; every transaction involves it on one side.
    pub user: Address,
    /// The genuine, frequently-used recipient.
    pub intended: Address,
    /// The attacker's forged twin of `intended`.
    pub lookalike: Address,
    /// Historical window the corpus is spread over, oldest first.
    pub window_days: i64,
    /// Block numbers start here and grow with time.
    pub base_block: u64,
    /// Apply the worst-case reorder after the chronological sort.
    pub worst_case: bool,
}

impl GeneratorConfig {
    pub fn new(
        count: usize,
        user: impl Into<Address>,
        intended: impl Into<Address>,
        lookalike: impl Into<Address>,
    ) -> Self {
        Self {
            count,
            user: user.into(),
            intended: intended.into(),
            lookalike: lookalike.into(),
            window_days: 365,
            base_block: 15_000_000,
            worst_case: true,
        }
    }

    /// Forge the lookalike from the intended address itself, the same way
    /// attackers brute-force vanity twins: shared first and last characters,
    /// random middle. Rerolls the (vanishingly unlikely) collisions with the
    /// intended or user address so the config always validates.
    pub fn with_forged_lookalike<R: Rng + ?Sized>(
        count: usize,
        user: impl Into<Address>,
        intended: impl Into<Address>,
        rng: &mut R,
    ) -> Self {
        let user = user.into();
        let intended = intended.into();
        let lookalike = loop {
            let forged = sampling::similar_address(rng, &intended);
            if normalize_address(&forged) != normalize_address(&intended)
                && normalize_address(&forged) != normalize_address(&user)
            {
                break forged;
            }
        };
        Self::new(count, user, intended, lookalike)
    }
}

/// How a `count` splits across the four traffic buckets. Floor division on
/// the percentages, remainder into `normal_incoming`, so the sizes always
/// sum to `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSizes {
    pub to_intended: usize,
    pub from_lookalike: usize,
    pub normal_outgoing: usize,
    pub normal_incoming: usize,
}

impl BucketSizes {
    pub fn for_count(count: usize) -> Self {
        let to_intended = count * TO_INTENDED_PCT / 100;
        let from_lookalike = count * FROM_LOOKALIKE_PCT / 100;
        let normal_outgoing = count * NORMAL_OUTGOING_PCT / 100;
        let normal_incoming = count - to_intended - from_lookalike - normal_outgoing;
        Self {
            to_intended,
            from_lookalike,
            normal_outgoing,
            normal_incoming,
        }
    }

    pub fn total(&self) -> usize {
        self.to_intended + self.from_lookalike + self.normal_outgoing + self.normal_incoming
    }
}

/// Builds synthetic transaction histories that stress a sequential-scan
/// detector: a fixed mix of genuine traffic to the intended address, dust
/// probes from the lookalike, and benign noise, reordered so every true
/// positive sits at the very end of the history.
#[derive(Debug)]
pub struct TransactionGenerator {
    config: GeneratorConfig,
}

impl TransactionGenerator {
    /// Validate the configuration up front. A nonsensical request fails
    /// here, visibly, rather than producing a partial corpus.
    pub fn new(config: GeneratorConfig) -> DetectorResult<Self> {
        if config.count == 0 {
            return Err(DetectorError::InvalidConfiguration(
                "transaction count must be at least 1".to_string(),
            ));
        }
        if config.window_days <= 0 {
            return Err(DetectorError::InvalidConfiguration(
                "historical window must be at least one day".to_string(),
            ));
        }
        for (role, addr) in [
            ("user", &config.user),
            ("intended", &config.intended),
            ("lookalike", &config.lookalike),
        ] {
            if !is_well_formed_address(addr) {
                return Err(DetectorError::InvalidAddress(format!("{role}: {addr}")));
            }
        }
        if normalize_address(&config.intended) == normalize_address(&config.lookalike) {
            return Err(DetectorError::InvalidConfiguration(
                "intended and lookalike addresses must differ".to_string(),
            ));
        }
        for (role, addr) in [("intended", &config.intended), ("lookalike", &config.lookalike)] {
            if normalize_address(&config.user) == normalize_address(addr) {
                return Err(DetectorError::InvalidConfiguration(format!(
                    "user address must differ from the {role} address"
                )));
            }
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate with fresh entropy.
    pub fn generate(&self) -> TransactionCorpus {
        self.generate_with_rng(&mut StdRng::from_entropy())
    }

    /// Generate a replayable corpus from a fixed seed.
    pub fn generate_seeded(&self, seed: u64) -> TransactionCorpus {
        self.generate_with_rng(&mut StdRng::seed_from_u64(seed))
    }

    pub fn generate_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> TransactionCorpus {
        let cfg = &self.config;
        let sizes = BucketSizes::for_count(cfg.count);
        let now_ms = chrono::Utc::now().timestamp_millis();

        // Recurring recipients the user pays besides the intended address.
        let pool: Vec<Address> = (0..FREQUENT_RECIPIENT_POOL)
            .map(|_| self.fresh_counterparty(rng))
            .collect();

        let mut corpus: TransactionCorpus = Vec::with_capacity(cfg.count);
        for index in 0..cfg.count {
            let time = self.spread_timestamp(now_ms, index);
            let tx = if index < sizes.to_intended {
                let value = sampling::random_value(rng);
                self.build_transaction(rng, time, cfg.user.clone(), cfg.intended.clone(), value)
            } else if index < sizes.to_intended + sizes.from_lookalike {
                // Poisoning probes carry dust so they cost the attacker
                // nearly nothing.
                let value = sampling::dust_value(rng);
                self.build_transaction(rng, time, cfg.lookalike.clone(), cfg.user.clone(), value)
            } else if index < sizes.to_intended + sizes.from_lookalike + sizes.normal_outgoing {
                let to = if rng.gen_bool(0.5) {
                    pool[rng.gen_range(0..pool.len())].clone()
                } else {
                    self.fresh_counterparty(rng)
                };
                let value = sampling::random_value(rng);
                self.build_transaction(rng, time, cfg.user.clone(), to, value)
            } else {
                let from = self.fresh_counterparty(rng);
                let value = sampling::random_value(rng);
                self.build_transaction(rng, time, from, cfg.user.clone(), value)
            };
            corpus.push(tx);
        }

        // Chronological order, then block numbers that grow with time.
        corpus.sort_by_key(|tx| tx.time);
        let mut offsets: Vec<u64> = (0..cfg.count)
            .map(|_| sampling::random_block_number(rng, cfg.base_block))
            .collect();
        offsets.sort_unstable();
        for (tx, block) in corpus.iter_mut().zip(offsets) {
            tx.block_number = block;
            if let Some(receipt) = tx.receipt.as_mut() {
                receipt.block_number = block;
            }
        }

        if cfg.worst_case {
            worst_case_reorder(&mut corpus, &cfg.intended);
            debug!(
                to_intended = sizes.to_intended,
                "moved true positives to the end of the history"
            );
        }

        reassign_positions(&mut corpus, now_ms);

        info!(
            count = cfg.count,
            to_intended = sizes.to_intended,
            from_lookalike = sizes.from_lookalike,
            normal_outgoing = sizes.normal_outgoing,
            normal_incoming = sizes.normal_incoming,
            worst_case = cfg.worst_case,
            "generated transaction corpus"
        );
        corpus
    }

    /// A random counterparty that is never the user itself; the invariant
    /// "user on exactly one side" must not fall to a collision.
    fn fresh_counterparty<R: Rng + ?Sized>(&self, rng: &mut R) -> Address {
        loop {
            let addr = sampling::random_address(rng);
            if normalize_address(&addr) != normalize_address(&self.config.user) {
                return addr;
            }
        }
    }

    /// Spread creation times over the historical window, oldest first.
    fn spread_timestamp(&self, now_ms: i64, index: usize) -> i64 {
        let count = self.config.count as i64;
        let days_ago = (count - index as i64) * self.config.window_days / count;
        now_ms - days_ago * 24 * 60 * 60 * 1_000
    }

    fn build_transaction<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        time: i64,
        from: Address,
        to: Address,
        value: u128,
    ) -> Transaction {
        let hash = sampling::random_tx_hash(rng);
        let gas_price = sampling::random_gas_price(rng);

        let history = vec![
            LifecycleEvent { status: TxStatus::Created, timestamp: time },
            LifecycleEvent { status: TxStatus::Approved, timestamp: time + LIFECYCLE_STEP_MS },
            LifecycleEvent { status: TxStatus::Signed, timestamp: time + 2 * LIFECYCLE_STEP_MS },
            LifecycleEvent { status: TxStatus::Submitted, timestamp: time + 3 * LIFECYCLE_STEP_MS },
            LifecycleEvent { status: TxStatus::FeeAdjusted, timestamp: time + 4 * LIFECYCLE_STEP_MS },
            LifecycleEvent { status: TxStatus::Confirmed, timestamp: time + 5 * LIFECYCLE_STEP_MS },
        ];

        let receipt = TxReceipt {
            transaction_hash: hash.clone(),
            block_hash: sampling::random_tx_hash(rng),
            block_number: self.config.base_block,
            from: from.clone(),
            to: to.clone(),
            value,
            gas_used: 21_000,
            effective_gas_price: gas_price,
            success: true,
        };

        Transaction {
            id: String::new(), // stamped by reassign_positions
            hash,
            chain_id: 1,
            block_number: self.config.base_block,
            status: TxStatus::Confirmed,
            time,
            submitted_time: time + 3 * LIFECYCLE_STEP_MS,
            params: TxParams {
                from,
                to,
                value,
                gas: 21_000,
                gas_price,
                nonce: 0,
            },
            history,
            receipt: Some(receipt),
        }
    }
}

/// Adversarial post-processing: keep everything else in order, but move all
/// transfers to `intended` to the end of the corpus. A sequential-scan
/// detector now has to look at every other record before it can see the
/// first genuine intended-address transfer.
///
/// Kept separate from generation so best-case and worst-case scan orders
/// can be benchmarked against each other.
pub fn worst_case_reorder(corpus: &mut TransactionCorpus, intended: &str) {
    let (to_intended, others): (Vec<Transaction>, Vec<Transaction>) =
        corpus.drain(..).partition(|tx| tx.is_to(intended));
    corpus.extend(others);
    corpus.extend(to_intended);
}

/// Stamp identifiers and nonces from final positions so each record is
/// internally consistent with where it sits in the corpus.
fn reassign_positions(corpus: &mut TransactionCorpus, id_base: i64) {
    for (index, tx) in corpus.iter_mut().enumerate() {
        tx.id = format!("{id_base}-{index}");
        tx.params.nonce = index as u64;
    }
}
