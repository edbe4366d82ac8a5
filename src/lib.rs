// src/lib.rs
pub mod analysis;
pub mod error;
pub mod extract;
pub mod generator;
pub mod similarity;
pub mod types;

pub use analysis::{PairAnalysis, ScanOutcome, analyze_pairs, analyze_records, scan_for_poisoning};
pub use error::{DetectorError, DetectorResult};
pub use generator::{BucketSizes, GeneratorConfig, TransactionGenerator, worst_case_reorder};
pub use similarity::{SimilarityConfig, SimilarityEngine, SimilarityPolicy};
pub use types::{
    Address, AddressPair, DetectionResult, DetectionSummary, LedgerRecord, Transaction,
    TransactionCorpus,
};

use extract::PlaintextExtractor;

/// Main entry point: one similarity engine plus the drivers around it.
pub struct PoisonDetector {
    engine: SimilarityEngine,
}

impl PoisonDetector {
    pub fn new(policy: SimilarityPolicy) -> Self {
        Self {
            engine: SimilarityEngine::new(policy),
        }
    }

    pub fn with_config(policy: SimilarityPolicy, config: SimilarityConfig) -> Self {
        Self {
            engine: SimilarityEngine::with_config(policy, config),
        }
    }

    pub fn engine(&self) -> &SimilarityEngine {
        &self.engine
    }

    /// Analyze a structured poisoning ledger (CSV text).
    pub fn analyze_ledger(&self, csv: &str) -> PairAnalysis {
        let records = extract::parse_ledger_csv(csv);
        analysis::analyze_records(&self.engine, &records)
    }

    /// Analyze incident records scraped out of free-form text.
    pub fn analyze_plaintext(&self, text: &str) -> DetectorResult<PairAnalysis> {
        let extractor = PlaintextExtractor::new()?;
        let records = extractor.extract_records(text);
        Ok(analysis::analyze_records(&self.engine, &records))
    }

    /// Build an adversarial corpus for this detector to be benchmarked on.
    pub fn generate_corpus(&self, config: GeneratorConfig) -> DetectorResult<TransactionCorpus> {
        Ok(TransactionGenerator::new(config)?.generate())
    }

    /// Replayable variant of `generate_corpus`.
    pub fn generate_corpus_seeded(
        &self,
        config: GeneratorConfig,
        seed: u64,
    ) -> DetectorResult<TransactionCorpus> {
        Ok(TransactionGenerator::new(config)?.generate_seeded(seed))
    }

    /// Analyze a ledger CSV on disk.
    pub fn analyze_ledger_file(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> DetectorResult<PairAnalysis> {
        let csv = std::fs::read_to_string(path)?;
        Ok(self.analyze_ledger(&csv))
    }

    /// Sequential-scan detection over a transaction history.
    pub fn scan(&self, corpus: &[Transaction], user: &str) -> ScanOutcome {
        scan_for_poisoning(&self.engine, corpus, user)
    }
}

/// Persist a corpus in the JSON shape the corpus sink consumes.
pub fn write_corpus_json(
    corpus: &[Transaction],
    path: impl AsRef<std::path::Path>,
) -> DetectorResult<()> {
    let json = serde_json::to_string_pretty(corpus)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a corpus previously written by `write_corpus_json`.
pub fn read_corpus_json(path: impl AsRef<std::path::Path>) -> DetectorResult<TransactionCorpus> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "0x8a8b958c11397b82d094cf790ce76a4d6c506496";
    const INTENDED: &str = "0x78608f9fd1cf69fbd7ac08d3f2e9eeec32691345";
    const LOOKALIKE: &str = "0x78664ce9c17937c552138254d5e906b18a8b1345";

    #[test]
    fn test_end_to_end_worst_case_500() {
        let detector = PoisonDetector::new(SimilarityPolicy::ExactBoundary);
        let corpus = detector
            .generate_corpus_seeded(GeneratorConfig::new(500, USER, INTENDED, LOOKALIKE), 42)
            .unwrap();

        assert_eq!(corpus.len(), 500);
        assert_eq!(corpus.iter().filter(|tx| tx.is_to(INTENDED)).count(), 150);
        assert_eq!(corpus.iter().filter(|tx| tx.is_from(LOOKALIKE)).count(), 75);
        assert_eq!(
            corpus
                .iter()
                .filter(|tx| tx.is_from(USER) && !tx.is_to(INTENDED))
                .count(),
            175
        );
        assert_eq!(
            corpus
                .iter()
                .filter(|tx| tx.is_to(USER) && !tx.is_from(LOOKALIKE))
                .count(),
            100
        );
        assert!(corpus.iter().all(|tx| tx.involves(USER)));

        // The engine must recognize the planted pair
        assert!(
            detector
                .engine()
                .is_similar(Some(LOOKALIKE), Some(INTENDED))
        );

        // And the history scan must be forced through every decoy first
        let outcome = detector.scan(&corpus, USER);
        assert_eq!(outcome.scanned, 351);
    }

    #[test]
    fn test_corpus_round_trip() {
        let detector = PoisonDetector::new(SimilarityPolicy::ExactBoundary);
        let corpus = detector
            .generate_corpus_seeded(GeneratorConfig::new(120, USER, INTENDED, LOOKALIKE), 9)
            .unwrap();

        let json = serde_json::to_string(&corpus).unwrap();
        let parsed: TransactionCorpus = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, corpus);
        assert_eq!(
            parsed.iter().filter(|tx| tx.is_to(INTENDED)).count(),
            corpus.iter().filter(|tx| tx.is_to(INTENDED)).count()
        );
        let ids: Vec<&str> = parsed.iter().map(|tx| tx.id.as_str()).collect();
        let original_ids: Vec<&str> = corpus.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, original_ids);
    }

    #[test]
    fn test_corpus_file_round_trip() {
        let detector = PoisonDetector::new(SimilarityPolicy::ExactBoundary);
        let corpus = detector
            .generate_corpus_seeded(GeneratorConfig::new(60, USER, INTENDED, LOOKALIKE), 3)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions_60.json");
        write_corpus_json(&corpus, &path).unwrap();
        let parsed = read_corpus_json(&path).unwrap();
        assert_eq!(parsed, corpus);
    }

    #[test]
    fn test_ledger_pipeline() {
        let csv = format!(
            "amount_usd,date,lookalike_address,intended_address\n\
             1000.0,2024-01-15,{LOOKALIKE},{INTENDED}\n\
             garbage line without commas enough\n\
             25.5,2024-02-20,0x1111111111111111111111111111111111111111,{INTENDED}\n"
        );
        let detector = PoisonDetector::new(SimilarityPolicy::ExactBoundary);
        let analysis = detector.analyze_ledger(&csv);

        assert_eq!(analysis.summary.total_pairs, 2);
        assert_eq!(analysis.summary.detected, 1);
        assert!((analysis.summary.total_stolen_usd - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_plaintext_pipeline() {
        let text = format!(
            "Report: victim drained -$2,500.00 on 4/1/2024\n\
             Lookalike address seen in history:\n\
             {LOOKALIKE}\n\
             Intended counterparty:\n\
             {INTENDED}\n"
        );
        let detector = PoisonDetector::new(SimilarityPolicy::ExactBoundary);
        let analysis = detector.analyze_plaintext(&text).unwrap();

        assert_eq!(analysis.summary.total_pairs, 1);
        assert_eq!(analysis.summary.detected, 1);
    }
}
