// Path: crates/oio-layout/src/generator.rs
//! `ChunkLayoutGenerator`: the single `LayoutGenerator` implementation,
//! dispatching on `StoragePolicy::policy_type`.

use oio_api::layout::{LayoutGenerator, RawxIterator};
use oio_types::entity::{ChunkShell, ContentShell};
use oio_types::error::LayoutError;
use oio_types::ids::random_chunk_suffix;
use oio_types::policy::{PolicyType, StoragePolicy};
use oio_types::position::ChunkPosition;

#[derive(Debug, Default)]
pub struct ChunkLayoutGenerator;

impl ChunkLayoutGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl LayoutGenerator for ChunkLayoutGenerator {
    fn generate(
        &self,
        content_size: i64,
        chunk_size: i64,
        policy: &StoragePolicy,
        rawx: &mut dyn RawxIterator,
    ) -> Result<(ContentShell, Vec<ChunkShell>), LayoutError> {
        if chunk_size <= 0 {
            return Err(LayoutError::NamespaceImpossible(
                    "chunk_size must be positive".to_string(),
                ));
        }
        let num_positions =
        ((content_size.max(0) + chunk_size - 1) / chunk_size).max(1) as u32;
        let per_position = policy.services_per_position();

        let mut chunks = Vec::new();
        for p in 0..num_positions {
            let candidates = rawx
            .next_candidates(per_position, policy.distance, &policy.storage_class)
            .filter(|c| c.len() >= per_position as usize)
            .ok_or(layout_failure(p))?;

            let consumed = (p as i64) * chunk_size;
            let this_chunk_size = (content_size - consumed).clamp(0, chunk_size);

            match policy.policy_type {
                PolicyType::None | PolicyType::Dupli => {
                    for candidate in candidates.iter().take(per_position as usize) {
                        chunks.push(ChunkShell {
                                id: chunk_url(&candidate.addr),
                                position: ChunkPosition::metachunk(p),
                                hash: None,
                                size: this_chunk_size,
                            });
                    }
                }
                PolicyType::Rain => {
                    let k = policy.k as usize;
                    let m = policy.m as usize;
                    for (i, candidate) in candidates.iter().take(k).enumerate() {
                        chunks.push(ChunkShell {
                                id: chunk_url(&candidate.addr),
                                position: ChunkPosition::data(p, i as u32),
                                hash: None,
                                size: this_chunk_size,
                            });
                    }
                    for (i, candidate) in candidates.iter().skip(k).take(m).enumerate() {
                        chunks.push(ChunkShell {
                                id: chunk_url(&candidate.addr),
                                position: ChunkPosition::parity(p, i as u32),
                                hash: None,
                                size: this_chunk_size,
                            });
                    }
                }
            }
        }

        let content = ContentShell {
            size: content_size,
            policy: Some(policy.name.clone()),
            chunk_method: chunk_method_for(policy),
            mime_type: "application/octet-stream".to_string(),
            hash: None,
        };
        Ok((content, chunks))
    }
}

/// Position 0 failing means there is no RAWX at all; any later position
/// failing means the policy could no longer be satisfied.
fn layout_failure(position: u32) -> LayoutError {
    if position == 0 {
        LayoutError::PlatformError
    } else {
        LayoutError::PolicyNotSatisfiable(position)
    }
}

fn chunk_url(addr: &str) -> String {
    format!("http://{addr}/{}", random_chunk_suffix())
}

fn chunk_method_for(policy: &StoragePolicy) -> String {
    match policy.policy_type {
        PolicyType::None => "plain/nb_copy=1".to_string(),
        PolicyType::Dupli => format!("plain/nb_copy={}", policy.copy_count),
        PolicyType::Rain => format!("ec/algo={},k={},m={}", policy.algo, policy.k, policy.m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oio_api::layout::RawxCandidate;

    struct FixedRawx {
        pool: Vec<String>,
        fail_at: Option<u32>,
        calls: u32,
    }

    impl FixedRawx {
        fn new(pool: &[&str]) -> Self {
            Self {
                pool: pool.iter().map(|s| s.to_string()).collect(),
                fail_at: None,
                calls: 0,
            }
        }

        fn failing_at(pool: &[&str], fail_at: u32) -> Self {
            Self {
                pool: pool.iter().map(|s| s.to_string()).collect(),
                fail_at: Some(fail_at),
                calls: 0,
            }
        }
    }

    impl RawxIterator for FixedRawx {
        fn next_candidates(
            &mut self,
            count: u32,
            _distance: u32,
            _storage_class: &str,
        ) -> Option<Vec<RawxCandidate>> {
            let call = self.calls;
            self.calls += 1;
            if self.fail_at == Some(call) {
                return None;
            }
            if self.pool.len() < count as usize {
                return None;
            }
            Some(
                self.pool
                .iter()
                .cycle()
                .skip(call as usize)
                .take(count as usize)
                .map(|addr| RawxCandidate { addr: addr.clone() })
                .collect(),
            )
        }
    }

    #[test]
    fn single_policy_emits_one_chunk_per_position() {
        let gen = ChunkLayoutGenerator::new();
        let policy = StoragePolicy::single();
        let mut rawx = FixedRawx::new(&["rawx1", "rawx2", "rawx3"]);
        let (content, chunks) = gen.generate(25, 10, &policy, &mut rawx).expect("layout");
        assert_eq!(content.size, 25);
        assert_eq!(chunks.len(), 3); // ceil(25/10) positions, 1 chunk each
        assert_eq!(chunks[2].size, 5);
    }

    #[test]
    fn dupli_policy_emits_copy_count_chunks_per_position() {
        let gen = ChunkLayoutGenerator::new();
        let policy = StoragePolicy::replication(3, 1);
        let mut rawx = FixedRawx::new(&["rawx1", "rawx2", "rawx3"]);
        let (_content, chunks) = gen.generate(10, 10, &policy, &mut rawx).expect("layout");
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.position == ChunkPosition::metachunk(0)));
    }

    #[test]
    fn rain_policy_splits_data_and_parity_positions() {
        let gen = ChunkLayoutGenerator::new();
        let policy = StoragePolicy::erasure_coded(2, 1, 1);
        let mut rawx = FixedRawx::new(&["rawx1", "rawx2", "rawx3"]);
        let (_content, chunks) = gen.generate(10, 10, &policy, &mut rawx).expect("layout");
        assert_eq!(chunks.len(), 3);
        assert_eq!(
            chunks.iter().filter(|c| c.position.parity).count(),
            1,
            "exactly one parity chunk per stripe"
        );
    }

    #[test]
    fn platform_error_when_first_position_has_no_candidates() {
        let gen = ChunkLayoutGenerator::new();
        let policy = StoragePolicy::single();
        let mut rawx = FixedRawx::failing_at(&["rawx1"], 0);
        let err = gen.generate(10, 10, &policy, &mut rawx).unwrap_err();
        assert!(matches!(err, LayoutError::PlatformError));
    }

    #[test]
    fn policy_not_satisfiable_when_later_position_runs_out() {
        let gen = ChunkLayoutGenerator::new();
        let policy = StoragePolicy::single();
        let mut rawx = FixedRawx::failing_at(&["rawx1"], 1);
        let err = gen.generate(25, 10, &policy, &mut rawx).unwrap_err();
        assert!(matches!(err, LayoutError::PolicyNotSatisfiable(1)));
    }
}
