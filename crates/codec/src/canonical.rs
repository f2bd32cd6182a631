//! Canonical entity hashing
//!
//! Produces an order-independent, format-stable digest for a composite
//! entity so that semantically identical submissions resolve to the same
//! content hash regardless of input ordering.
//!
//! Canonical form: sort pairs by key (byte-lexicographic), render each as
//! `key` or `key=value`, join with `|`, and SHA-256 the UTF-8 bytes.
//! SHA-256 is deterministic across platforms and Rust versions, which is
//! what makes the hash usable as a durable natural key. Keys and values
//! must not contain the `|` delimiter; member identifiers and rendered
//! attributes in this system never do.
//!
//! Value rendering is part of the contract: weight percentages are always
//! rendered with exactly two decimal places ([`WeightPercent`]'s Display),
//! batch tokens verbatim. A differing rendered value is a differing entity.

use codemint_core::{ContentHash, DetailRow, WeightPercent};
use sha2::{Digest, Sha256};

/// Delimiter between rendered pairs in the canonical string.
pub const CANONICAL_DELIMITER: char = '|';

/// An unordered collection of (identifier, optional attribute) pairs
/// describing one logical entity to be minted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalEntity {
    pairs: Vec<(String, Option<String>)>,
}

impl CanonicalEntity {
    /// Entity made of bare identifiers (e.g. an ingredient set).
    pub fn from_keys<S: AsRef<str>>(keys: impl IntoIterator<Item = S>) -> Self {
        CanonicalEntity {
            pairs: keys
                .into_iter()
                .map(|k| (k.as_ref().to_string(), None))
                .collect(),
        }
    }

    /// Entity made of (identifier, attribute) pairs, attributes already in
    /// their canonical rendering.
    pub fn from_pairs<K: AsRef<str>, V: AsRef<str>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        CanonicalEntity {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), Some(v.as_ref().to_string())))
                .collect(),
        }
    }

    /// Number of member pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if the entity has no members.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The canonical string this entity hashes to. Stable under input
    /// reordering.
    fn canonical_string(&self) -> String {
        let mut sorted: Vec<&(String, Option<String>)> = self.pairs.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let rendered: Vec<String> = sorted
            .iter()
            .map(|(key, value)| match value {
                Some(value) => format!("{key}={value}"),
                None => key.clone(),
            })
            .collect();
        let mut joined = String::new();
        for (i, part) in rendered.iter().enumerate() {
            if i > 0 {
                joined.push(CANONICAL_DELIMITER);
            }
            joined.push_str(part);
        }
        joined
    }

    /// Order-independent content digest of this entity.
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_string().as_bytes());
        ContentHash::from_digest(hasher.finalize().into())
    }

    /// Detail rows for persistence, in input order.
    pub fn detail_rows(&self) -> Vec<DetailRow> {
        self.pairs
            .iter()
            .map(|(key, value)| DetailRow {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

/// Hash an ingredient set: the sorted member SKUs.
pub fn hash_set<S: AsRef<str>>(skus: &[S]) -> ContentHash {
    CanonicalEntity::from_keys(skus.iter().map(|s| s.as_ref())).content_hash()
}

/// Hash a weight-percentage recipe: `sku=NN.NN` pairs.
pub fn hash_weights<S: AsRef<str>>(items: &[(S, WeightPercent)]) -> ContentHash {
    CanonicalEntity::from_pairs(items.iter().map(|(sku, wt)| (sku.as_ref(), wt.to_string())))
        .content_hash()
}

/// Hash a batch binding: `sku=<batch_code>` pairs, batch codes verbatim.
pub fn hash_batches<S: AsRef<str>, T: AsRef<str>>(items: &[(S, T)]) -> ContentHash {
    CanonicalEntity::from_pairs(items.iter().map(|(sku, b)| (sku.as_ref(), b.as_ref())))
        .content_hash()
}
