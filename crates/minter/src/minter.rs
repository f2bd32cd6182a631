//! Deduplicating code minter
//!
//! [`DeduplicatingMinter`] ties the pieces together: canonical hashing
//! decides whether an entity already has a code, the allocator issues a
//! fresh integer when it does not, and the repository persists the new
//! record so every later identical submission resolves to the same code.
//!
//! Dedup is best-effort under concurrency. Two first-time submissions of
//! the same entity can both miss the lookup and both mint; the repository
//! collapses the rows to one winner but both callers receive a valid
//! code, and one issued integer becomes a permanent gap. Uniqueness of
//! issued codes is never at risk.

use std::sync::Arc;

use chrono::Utc;
use codemint_alloc::CodeAllocator;
use codemint_codec::{int_to_code, validate_weight_sum, CanonicalEntity, Sku};
use codemint_core::{
    CounterStore, EntityRecord, EntityRepository, Error, Result, Scope, WeightPercent,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MintConfig;

/// Well-known counter names.
///
/// A counter is identified by `(name, scope)`; these are the names this
/// system draws from. Callers with their own counters are free to use
/// [`CodeAllocator`] directly.
pub mod counters {
    /// Ingredient-set codes, global scope.
    pub const SET_CODE: &str = "set_code";
    /// Weight-recipe codes, scoped per set code.
    pub const WEIGHT_CODE: &str = "weight_code";
    /// Batch-variant codes, scoped per `set weight` pair.
    pub const BATCH_VARIANT_CODE: &str = "batch_variant_code";
    /// Global ingredient sequence feeding SKU minting.
    pub const INGREDIENT_SEQ: &str = "ingredient_seq";
    /// Compounding process codes, global scope.
    pub const COMPOUNDING_PROCESS_CODE: &str = "compounding_process_code";
    /// Location partner codes, probed against existing rows; conventionally
    /// started at 31 ("BF") to leave headroom for reserved assignments.
    pub const LOCATION_PARTNER_CODE: &str = "location_partner_code";
}

/// Candidate cap for [`DeduplicatingMinter::mint_unused_code`].
const PROBE_LIMIT: u32 = 20;

/// Result of a get-or-create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintOutcome {
    /// The two-letter code now bound to the entity.
    pub code: String,
    /// True if this call minted the code, false if it already existed.
    pub created: bool,
}

/// Content-addressed code minter over an allocator and a repository.
#[derive(Clone)]
pub struct DeduplicatingMinter {
    allocator: CodeAllocator,
    repo: Arc<dyn EntityRepository>,
    config: MintConfig,
}

impl DeduplicatingMinter {
    /// Minter with default starting values.
    pub fn new(store: Arc<dyn CounterStore>, repo: Arc<dyn EntityRepository>) -> Self {
        Self::with_config(store, repo, MintConfig::default())
    }

    /// Minter with explicit starting values.
    pub fn with_config(
        store: Arc<dyn CounterStore>,
        repo: Arc<dyn EntityRepository>,
        config: MintConfig,
    ) -> Self {
        DeduplicatingMinter {
            allocator: CodeAllocator::new(store),
            repo,
            config,
        }
    }

    /// Resolve an entity to its code, minting one on first sight.
    ///
    /// The lookup key is the entity's content hash within `scope`, so the
    /// same members submitted in any order resolve identically.
    pub fn get_or_create(
        &self,
        counter_name: &str,
        scope: &Scope,
        entity: &CanonicalEntity,
        start_value: i64,
        created_by: Option<&str>,
    ) -> Result<MintOutcome> {
        let hash = entity.content_hash();
        if let Some(code) = self.repo.get_code_by_hash(scope, &hash)? {
            debug!(counter = counter_name, scope = scope.as_str(), code = %code, "dedup hit");
            return Ok(MintOutcome {
                code,
                created: false,
            });
        }

        let value = self.allocator.allocate(counter_name, scope, start_value)?;
        let code = int_to_code(value)?;
        debug!(counter = counter_name, scope = scope.as_str(), value, code = %code, "minted");

        self.repo.insert_entity(EntityRecord {
            scope: scope.clone(),
            hash,
            code: code.clone(),
            details: entity.detail_rows(),
            created_by: created_by.map(str::to_string),
            created_at: Utc::now(),
        })?;
        Ok(MintOutcome {
            code,
            created: true,
        })
    }

    /// Code for an ingredient set, identified by its member SKUs.
    pub fn get_or_create_set<S: AsRef<str>>(
        &self,
        skus: &[S],
        created_by: Option<&str>,
    ) -> Result<MintOutcome> {
        self.get_or_create(
            counters::SET_CODE,
            &Scope::global(),
            &CanonicalEntity::from_keys(skus.iter().map(|s| s.as_ref())),
            self.config.start_set,
            created_by,
        )
    }

    /// Code for a weight recipe within a set. Weights must sum to exactly
    /// 100.00 after rounding.
    pub fn get_or_create_weights<S: AsRef<str>>(
        &self,
        set_code: &str,
        items: &[(S, WeightPercent)],
        created_by: Option<&str>,
    ) -> Result<MintOutcome> {
        validate_weight_sum(items)?;
        self.get_or_create(
            counters::WEIGHT_CODE,
            &Scope::new(set_code),
            &CanonicalEntity::from_pairs(
                items.iter().map(|(sku, wt)| (sku.as_ref(), wt.to_string())),
            ),
            self.config.start_weight,
            created_by,
        )
    }

    /// Code for a batch-variant binding within a `(set, weight)` recipe.
    pub fn get_or_create_batches<S: AsRef<str>, T: AsRef<str>>(
        &self,
        set_code: &str,
        weight_code: &str,
        items: &[(S, T)],
        created_by: Option<&str>,
    ) -> Result<MintOutcome> {
        self.get_or_create(
            counters::BATCH_VARIANT_CODE,
            &Scope::joined(&[set_code, weight_code]),
            &CanonicalEntity::from_pairs(items.iter().map(|(sku, b)| (sku.as_ref(), b.as_ref()))),
            self.config.start_batch,
            created_by,
        )
    }

    /// Next ingredient SKU from the global sequence. No dedup; every call
    /// produces a new SKU.
    pub fn next_sku(&self, category_code: u32, pack_size_value: u32) -> Result<Sku> {
        let value = self
            .allocator
            .allocate(counters::INGREDIENT_SEQ, &Scope::new("global"), 1)?;
        let seq = u32::try_from(value).map_err(|_| Error::OutOfRange {
            value,
            max: i64::from(u32::MAX),
        })?;
        Ok(Sku::new(category_code, seq, pack_size_value))
    }

    /// Raise the global SKU sequence past an imported sequence value, so
    /// [`DeduplicatingMinter::next_sku`] never re-issues it. Importing a
    /// value below the current sequence changes nothing.
    pub fn reserve_sku_seq(&self, seq: u32) -> Result<()> {
        self.allocator.ensure_at_least(
            counters::INGREDIENT_SEQ,
            &Scope::new("global"),
            i64::from(seq) + 1,
        )
    }

    /// Next compounding process code. No dedup.
    pub fn next_process_code(&self) -> Result<String> {
        let value =
            self.allocator
                .allocate(counters::COMPOUNDING_PROCESS_CODE, &Scope::global(), 1)?;
        int_to_code(value)
    }

    /// Mint the first code not already taken according to `is_taken`.
    ///
    /// Covers datasets whose codes predate the counter: each candidate
    /// comes off the counter as usual, but is checked against existing
    /// rows before being handed out. Skipped candidates stay consumed.
    /// Gives up after a bounded number of candidates, which indicates the
    /// counter is far behind the data and needs operator attention.
    pub fn mint_unused_code(
        &self,
        counter_name: &str,
        scope: &Scope,
        start_value: i64,
        is_taken: impl Fn(&str) -> Result<bool>,
    ) -> Result<String> {
        for _ in 0..PROBE_LIMIT {
            let value = self.allocator.allocate(counter_name, scope, start_value)?;
            let code = int_to_code(value)?;
            if !is_taken(&code)? {
                return Ok(code);
            }
            debug!(counter = counter_name, scope = scope.as_str(), code = %code, "probe: taken");
        }
        Err(Error::AllocationFailed {
            counter: counter_name.to_string(),
            scope: scope.to_string(),
            attempts: PROBE_LIMIT,
        })
    }
}
