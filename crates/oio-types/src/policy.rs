// Path: crates/oio-types/src/policy.rs
use serde::{Deserialize, Serialize};

/// Which chunk-layout generator a storage policy selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyType {
    /// No redundancy: exactly one chunk per position.
    None,
    /// N-way replication.
    Dupli,
    /// (K, M) erasure coding.
    Rain,
}

/// Decoded parameters of a named storage policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePolicy {
    pub name: String,
    pub policy_type: PolicyType,
    pub copy_count: u32,
    pub distance: u32,
    pub k: u32,
    pub m: u32,
    pub algo: String,
    pub storage_class: String,
}

impl StoragePolicy {
    /// The plain single-copy, no-redundancy policy used when a namespace or
    /// container has no explicit default.
    pub fn single() -> Self {
        Self {
            name: "SINGLE".to_string(),
            policy_type: PolicyType::None,
            copy_count: 1,
            distance: 1,
            k: 0,
            m: 0,
            algo: String::new(),
            storage_class: "STANDARD".to_string(),
        }
    }

    /// A two-way replication policy, a common production default.
    pub fn replication(copy_count: u32, distance: u32) -> Self {
        Self {
            name: format!("DUPLI-{copy_count}"),
            policy_type: PolicyType::Dupli,
            copy_count,
            distance,
            k: 0,
            m: 0,
            algo: String::new(),
            storage_class: "STANDARD".to_string(),
        }
    }

    /// An erasure-coded policy requesting `k` data chunks and `m` parity
    /// chunks per stripe.
    pub fn erasure_coded(k: u32, m: u32, distance: u32) -> Self {
        Self {
            name: format!("RAIN-{k}-{m}"),
            policy_type: PolicyType::Rain,
            copy_count: 1,
            distance,
            k,
            m,
            algo: "liberation".to_string(),
            storage_class: "STANDARD".to_string(),
        }
    }

    /// Number of services the layout generator must obtain per position.
    pub fn services_per_position(&self) -> u32 {
        match self.policy_type {
            PolicyType::None => 1,
            PolicyType::Dupli => self.copy_count.max(1),
            PolicyType::Rain => self.k + self.m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dupli_requests_copy_count_services() {
        let p = StoragePolicy::replication(3, 1);
        assert_eq!(p.services_per_position(), 3);
    }

    #[test]
    fn rain_requests_k_plus_m_services() {
        let p = StoragePolicy::erasure_coded(6, 3, 1);
        assert_eq!(p.services_per_position(), 9);
    }

    #[test]
    fn none_requests_one_service() {
        assert_eq!(StoragePolicy::single().services_per_position(), 1);
    }
}
