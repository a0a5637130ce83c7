//! MECE Duplication Analyzer (C5, spec §4.5). Chunks function bodies into
//! candidate blocks, fingerprints each with a k-shingle MinHash signature,
//! and unions blocks whose estimated Jaccard similarity clears
//! `similarity_threshold` into `DuplicationCluster`s. `mece_score` is
//! `1 - redundant_loc / total_analyzed_loc`.

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::types::{DuplicationBlock, DuplicationCluster, ParsedUnit, Violation, ViolationKind};

const NUM_HASHES: usize = 32;

fn seeds() -> [u64; NUM_HASHES] {
    let mut out = [0u64; NUM_HASHES];
    let mut i = 0;
    while i < NUM_HASHES {
        out[i] = (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1);
        i += 1;
    }
    out
}

struct Block {
    file: String,
    line_start: u32,
    line_end: u32,
    loc: usize,
    is_test: bool,
    signature: Vec<u64>,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn shingles(tokens: &[String], k: usize) -> Vec<u64> {
    if tokens.len() < k {
        return Vec::new();
    }
    (0..=tokens.len() - k)
        .map(|i| xxhash_rust::xxh3::xxh3_64(tokens[i..i + k].join(" ").as_bytes()))
        .collect()
}

fn minhash_signature(shingles: &[u64], seeds: &[u64; NUM_HASHES]) -> Vec<u64> {
    seeds
        .iter()
        .map(|seed| {
            shingles
                .iter()
                .map(|s| xxhash_rust::xxh3::xxh3_64_with_seed(&s.to_le_bytes(), *seed))
                .min()
                .unwrap_or(u64::MAX)
        })
        .collect()
}

fn estimate_similarity(a: &[u64], b: &[u64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let matches = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    matches as f64 / a.len() as f64
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

pub struct MeceAnalyzer {
    min_block_lines: usize,
    shingle_k: usize,
    similarity_threshold: f64,
}

impl Default for MeceAnalyzer {
    fn default() -> Self {
        Self {
            min_block_lines: scrutiny_core::constants::MIN_BLOCK_LINES,
            shingle_k: scrutiny_core::constants::MECE_SHINGLE_K,
            similarity_threshold: scrutiny_core::constants::MECE_SIMILARITY_THRESHOLD,
        }
    }
}

impl MeceAnalyzer {
    pub fn configure(&mut self, config: &AnalysisConfig) {
        self.min_block_lines = config.detectors.threshold_usize_or("MECE", "min_block_lines", scrutiny_core::constants::MIN_BLOCK_LINES);
        self.shingle_k = config.detectors.threshold_usize_or("MECE", "shingle_k", scrutiny_core::constants::MECE_SHINGLE_K);
        self.similarity_threshold = config.detectors.threshold_or("MECE", "similarity_threshold", scrutiny_core::constants::MECE_SIMILARITY_THRESHOLD);
    }

    fn collect_blocks(&self, units: &[ParsedUnit], config: &AnalysisConfig) -> Vec<Block> {
        let seeds = seeds();
        let mut blocks = Vec::new();
        for unit in units {
            if config.paths.is_generated(&unit.file.path) {
                continue;
            }
            let is_test = config.paths.is_test_file(&unit.file.path);
            for function in &unit.functions {
                let loc = function.body_lines() as usize;
                if loc < self.min_block_lines {
                    continue;
                }
                let body: String = unit
                    .stripped_source
                    .lines()
                    .skip(function.body_span.line.saturating_sub(1) as usize)
                    .take(loc)
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                let tokens = tokenize(&body);
                let shingle_set = shingles(&tokens, self.shingle_k);
                if shingle_set.is_empty() {
                    continue;
                }
                blocks.push(Block {
                    file: unit.file.path.clone(),
                    line_start: function.body_span.line,
                    line_end: function.body_span.end_line,
                    loc,
                    is_test,
                    signature: minhash_signature(&shingle_set, &seeds),
                });
            }
        }
        blocks
    }

    /// Returns the clusters found, the `Violation`s to surface, and the
    /// repo-wide `mece_score`.
    pub fn analyze(&self, units: &[ParsedUnit], config: &AnalysisConfig) -> (Vec<DuplicationCluster>, Vec<Violation>, f64) {
        let blocks = self.collect_blocks(units, config);
        if blocks.is_empty() {
            return (Vec::new(), Vec::new(), 1.0);
        }

        let mut uf = UnionFind::new(blocks.len());
        for i in 0..blocks.len() {
            for j in (i + 1)..blocks.len() {
                if blocks[i].is_test != blocks[j].is_test {
                    continue;
                }
                if estimate_similarity(&blocks[i].signature, &blocks[j].signature) >= self.similarity_threshold {
                    uf.union(i, j);
                }
            }
        }

        let mut groups: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
        for i in 0..blocks.len() {
            let root = uf.find(i);
            groups.entry(root).or_default().push(i);
        }

        let mut clusters = Vec::new();
        let mut violations = Vec::new();
        let mut redundant_loc = 0usize;
        let mut total_loc = 0usize;
        let mut non_test_total_loc = 0usize;

        for block in &blocks {
            total_loc += block.loc;
            if !block.is_test {
                non_test_total_loc += block.loc;
            }
        }

        for (cluster_id, members) in groups.into_iter() {
            if members.len() < 2 {
                continue;
            }
            let dup_blocks: Vec<DuplicationBlock> = members
                .iter()
                .map(|&i| DuplicationBlock { file: blocks[i].file.clone(), line_start: blocks[i].line_start, line_end: blocks[i].line_end })
                .collect();
            let canonical_idx = members.iter().copied().max_by_key(|&i| blocks[i].loc).unwrap();
            let canonical = DuplicationBlock { file: blocks[canonical_idx].file.clone(), line_start: blocks[canonical_idx].line_start, line_end: blocks[canonical_idx].line_end };

            if !blocks[members[0]].is_test {
                redundant_loc += members.iter().filter(|&&i| i != canonical_idx).map(|&i| blocks[i].loc).sum::<usize>();
            }

            for &i in &members {
                violations.push(Violation::new(
                    ViolationKind::Duplication,
                    Severity::Medium,
                    Span::range(blocks[i].file.clone(), blocks[i].line_start, blocks[i].line_end, 0, 0),
                    format!("block duplicates {} other block(s) in cluster {cluster_id}", members.len() - 1),
                    serde_json::json!({ "cluster_id": cluster_id }),
                ));
            }

            clusters.push(DuplicationCluster { cluster_id: cluster_id as u64, similarity: self.similarity_threshold, blocks: dup_blocks, canonical_block: canonical });
        }

        let _ = total_loc;
        let mece_score = if non_test_total_loc == 0 {
            1.0
        } else {
            (1.0 - redundant_loc as f64 / non_test_total_loc as f64).clamp(0.0, 1.0)
        };

        (clusters, violations, mece_score)
    }
}
