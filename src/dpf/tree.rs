//! Two-key DPF from a length-doubling PRG (GGM tree), with the hash-based
//! verifiability extension layered on the leaf seeds.
use openssl::sha::Sha256;
use serde::{Deserialize, Serialize};

use super::{Dpf, HashKey, PrfKey, VerifiableDpf};
use crate::prg::{AesPrg, Seed, SEED_SIZE};

// One PRG call expands a node seed into two child seeds plus two control bits.
const EXPAND_SIZE: usize = 2 * SEED_SIZE + 1;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Construction {
    prf_key: PrfKey,
    hash_keys: Option<[HashKey; 2]>,
}

/// Per-level correction word: applied by the evaluator whenever its control
/// bit is set, forcing the two evaluations to agree off the programmed path.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CorrectionWord {
    seed: Seed,
    bit_left: bool,
    bit_right: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Key {
    domain: u32,
    root: Seed,
    root_bit: bool,
    levels: Vec<CorrectionWord>,
    // leaf-tag correction word; present only on verifiably generated keys
    proof_cw: Option<[u8; 32]>,
}

impl Key {
    pub fn domain(&self) -> u32 {
        self.domain
    }
}

fn mask_index(index: u64, domain: u32) -> u64 {
    if domain >= 64 {
        index
    } else {
        index & ((1u64 << domain) - 1)
    }
}

fn xor_assign(acc: &mut [u8; 32], rhs: &[u8; 32]) {
    acc.iter_mut().zip(rhs.iter()).for_each(|(x, y)| *x ^= y);
}

/// Position-bound hash of a leaf seed.
fn leaf_tag(hash_key: &HashKey, index: u64, seed: &Seed) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(hash_key.as_bytes());
    hasher.update(&index.to_be_bytes());
    hasher.update(seed.as_bytes());
    hasher.finish()
}

impl Construction {
    pub fn new(prf_key: PrfKey) -> Construction {
        Construction {
            prf_key,
            hash_keys: None,
        }
    }

    pub fn new_verifiable(prf_key: PrfKey, hash_keys: [HashKey; 2]) -> Construction {
        Construction {
            prf_key,
            hash_keys: Some(hash_keys),
        }
    }

    pub fn prf_key(&self) -> PrfKey {
        self.prf_key
    }

    fn prg(&self) -> AesPrg {
        AesPrg::new(self.prf_key.bytes(), EXPAND_SIZE)
    }

    fn hash_keys(&self) -> &[HashKey; 2] {
        self.hash_keys
            .as_ref()
            .expect("verifiable evaluation requires hash keys")
    }

    // (left seed, left bit, right seed, right bit)
    fn expand(prg: &AesPrg, seed: &Seed) -> (Seed, bool, Seed, bool) {
        use std::convert::TryFrom;
        let out = prg.eval(seed);
        let left = Seed::try_from(&out[..SEED_SIZE]).unwrap();
        let right = Seed::try_from(&out[SEED_SIZE..2 * SEED_SIZE]).unwrap();
        let bits = out[2 * SEED_SIZE];
        (left, bits & 1 == 1, right, bits & 2 == 2)
    }

    fn gen_keys(&self, alpha: u64, domain: u32, verifiable: bool) -> (Key, Key) {
        assert!(domain >= 1 && domain <= 64, "unsupported DPF domain");
        if domain < 64 {
            assert!(alpha < 1u64 << domain, "point outside the DPF domain");
        }

        let prg = self.prg();
        let root_a = Seed::random();
        let root_b = Seed::random();
        let (mut seed_a, mut bit_a) = (root_a, false);
        let (mut seed_b, mut bit_b) = (root_b, true);
        let mut levels = Vec::with_capacity(domain as usize);

        for level in 0..domain {
            let path_bit = (alpha >> (domain - 1 - level)) & 1 == 1;
            let (left_a, lbit_a, right_a, rbit_a) = Self::expand(&prg, &seed_a);
            let (left_b, lbit_b, right_b, rbit_b) = Self::expand(&prg, &seed_b);

            // correct the off-path child so both evaluations collapse to the
            // same seed once they leave the path to alpha
            let cw = CorrectionWord {
                seed: if path_bit {
                    left_a ^ left_b
                } else {
                    right_a ^ right_b
                },
                bit_left: lbit_a ^ lbit_b ^ path_bit ^ true,
                bit_right: rbit_a ^ rbit_b ^ path_bit,
            };

            let descend = |keep_seed: Seed, keep_bit: bool, prev_bit: bool| {
                let bit_cw = if path_bit { cw.bit_right } else { cw.bit_left };
                let mut seed = keep_seed;
                if prev_bit {
                    seed ^= cw.seed;
                }
                (seed, keep_bit ^ (prev_bit & bit_cw))
            };

            let next_a = if path_bit {
                descend(right_a, rbit_a, bit_a)
            } else {
                descend(left_a, lbit_a, bit_a)
            };
            let next_b = if path_bit {
                descend(right_b, rbit_b, bit_b)
            } else {
                descend(left_b, lbit_b, bit_b)
            };
            seed_a = next_a.0;
            bit_a = next_a.1;
            seed_b = next_b.0;
            bit_b = next_b.1;

            levels.push(cw);
        }

        let proof_cw = if verifiable {
            let hash_keys = self.hash_keys();
            let mut cw = leaf_tag(&hash_keys[0], alpha, &seed_a);
            xor_assign(&mut cw, &leaf_tag(&hash_keys[0], alpha, &seed_b));
            Some(cw)
        } else {
            None
        };

        (
            Key {
                domain,
                root: root_a,
                root_bit: false,
                levels: levels.clone(),
                proof_cw,
            },
            Key {
                domain,
                root: root_b,
                root_bit: true,
                levels,
                proof_cw,
            },
        )
    }

    /// Walks the tree to the leaf for `index`, returning the corrected leaf
    /// seed and control bit.
    fn walk(&self, key: &Key, index: u64) -> (Seed, bool) {
        let prg = self.prg();
        let index = mask_index(index, key.domain);
        let mut seed = key.root;
        let mut bit = key.root_bit;
        for (level, cw) in key.levels.iter().enumerate() {
            let (left, lbit, right, rbit) = Self::expand(&prg, &seed);
            let go_right = (index >> (key.domain - 1 - level as u32)) & 1 == 1;
            let (mut next_seed, mut next_bit) = if go_right { (right, rbit) } else { (left, lbit) };
            if bit {
                next_seed ^= cw.seed;
                next_bit ^= if go_right { cw.bit_right } else { cw.bit_left };
            }
            seed = next_seed;
            bit = next_bit;
        }
        (seed, bit)
    }

    /// Expands every leaf of the tree, in index order.
    fn full_walk(&self, key: &Key) -> Vec<(Seed, bool)> {
        assert!(
            key.domain <= 30,
            "full-domain expansion is only sensible for small domains"
        );
        let prg = self.prg();
        let mut nodes = vec![(key.root, key.root_bit)];
        for cw in &key.levels {
            let mut next = Vec::with_capacity(nodes.len() * 2);
            for (seed, bit) in nodes {
                let (mut left, mut lbit, mut right, mut rbit) = Self::expand(&prg, &seed);
                if bit {
                    left ^= cw.seed;
                    lbit ^= cw.bit_left;
                    right ^= cw.seed;
                    rbit ^= cw.bit_right;
                }
                next.push((left, lbit));
                next.push((right, rbit));
            }
            nodes = next;
        }
        nodes
    }

    fn corrected_tag(&self, key: &Key, index: u64, seed: &Seed, bit: bool) -> [u8; 32] {
        let hash_keys = self.hash_keys();
        let mut tag = leaf_tag(&hash_keys[0], index, seed);
        if bit {
            let cw = key
                .proof_cw
                .as_ref()
                .expect("key was not generated verifiably");
            xor_assign(&mut tag, cw);
        }
        tag
    }

    fn finalize_proof(&self, acc: &[u8; 32]) -> Vec<u8> {
        let hash_keys = self.hash_keys();
        let mut hasher = Sha256::new();
        hasher.update(hash_keys[1].as_bytes());
        hasher.update(acc);
        hasher.finish().to_vec()
    }
}

impl Dpf for Construction {
    type Key = Key;

    fn gen(&self, alpha: u64, domain: u32) -> (Key, Key) {
        self.gen_keys(alpha, domain, false)
    }

    fn eval(&self, key: &Key, index: u64) -> u8 {
        self.walk(key, index).1 as u8
    }

    fn full_domain_eval(&self, key: &Key) -> Vec<u8> {
        self.full_walk(key)
            .into_iter()
            .map(|(_, bit)| bit as u8)
            .collect()
    }
}

impl VerifiableDpf for Construction {
    fn gen_verifiable(&self, alpha: u64, domain: u32) -> (Key, Key) {
        self.gen_keys(alpha, domain, true)
    }

    fn full_domain_ver_eval(&self, key: &Key) -> (Vec<u8>, Vec<u8>) {
        let mut acc = [0; 32];
        let bits = self
            .full_walk(key)
            .into_iter()
            .enumerate()
            .map(|(index, (seed, bit))| {
                let tag = self.corrected_tag(key, index as u64, &seed, bit);
                xor_assign(&mut acc, &tag);
                bit as u8
            })
            .collect();
        (bits, self.finalize_proof(&acc))
    }

    fn batch_ver_eval(&self, key: &Key, indices: &[u64]) -> (Vec<u8>, Vec<u8>) {
        let mut acc = [0; 32];
        let bits = indices
            .iter()
            .map(|&index| {
                let index = mask_index(index, key.domain);
                let (seed, bit) = self.walk(key, index);
                let tag = self.corrected_tag(key, index, &seed, bit);
                xor_assign(&mut acc, &tag);
                bit as u8
            })
            .collect();
        (bits, self.finalize_proof(&acc))
    }
}
