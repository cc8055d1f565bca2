//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use certchain::{Ledger, LedgerConfig, Registry};
use certchain_core::{Block, Certificate, CertificateBuilder, CertificateId, Link};
use certchain_store::MemoryStore;

/// Fixed start time for deterministic fixtures (2025-01-14T16:00:00Z, microseconds).
pub const BASE_TIME: i64 = 1_736_870_400_000_000;

/// Holder names used by sample data.
pub const SAMPLE_HOLDERS: [&str; 5] = ["Alice", "Bob", "Carol", "Dave", "Eve"];

/// A test fixture with a ledger and a deterministic clock.
pub struct TestFixture {
    pub ledger: Ledger,
    clock: i64,
}

impl TestFixture {
    /// Create a fixture around a default ledger.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Create a fixture around a ledger with the given config.
    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            ledger: Ledger::new(config),
            clock: BASE_TIME,
        }
    }

    /// Advance the fixture clock by one microsecond.
    pub fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    /// Build a certificate with a deterministic issuance time.
    ///
    /// The certificate is not added to the ledger.
    pub fn make_certificate(&mut self, holder: &str) -> Certificate {
        CertificateBuilder::new(holder, "Distributed Systems", "Test University")
            .metadata("grade: A")
            .issued_at(self.tick())
            .build()
    }

    /// Submit one certificate per holder, then seal them into a block.
    pub fn issue_batch(&mut self, holders: &[&str], proof: u64) -> (Vec<CertificateId>, Block) {
        let ids = holders
            .iter()
            .filter_map(|h| {
                self.ledger
                    .submit(h, "Distributed Systems", "Test University", "")
                    .ok()
            })
            .collect();
        let block = self.ledger.seal(proof);
        (ids, block)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a well-linked chain with fixed timestamps.
///
/// The result starts with an empty genesis block, followed by `blocks`
/// blocks holding `per_block` certificates each.
pub fn sample_chain(blocks: usize, per_block: usize) -> Vec<Block> {
    let mut chain = vec![Block::seal(1, BASE_TIME, vec![], 100, Link::Genesis)];

    for b in 0..blocks {
        let certs = (0..per_block)
            .map(|n| {
                let holder = SAMPLE_HOLDERS[n % SAMPLE_HOLDERS.len()];
                CertificateBuilder::new(holder, format!("Course {}", b), "Test University")
                    .issued_at(BASE_TIME + (b * per_block + n) as i64)
                    .build()
            })
            .collect();

        let prev = chain.last().map(|p| Link::Block(p.hash)).unwrap_or(Link::Genesis);
        let index = chain.len() as u64 + 1;
        chain.push(Block::seal(index, BASE_TIME + index as i64 * 60_000_000, certs, 123, prev));
    }

    chain
}

/// Open a registry over a fresh in-memory store.
pub async fn memory_registry(config: LedgerConfig) -> certchain::Result<Registry<MemoryStore>> {
    Registry::open(MemoryStore::new(), config).await
}
