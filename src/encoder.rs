//! The per-chain pipeline: mask, effective β-carbons, partners,
//! descriptors, embedding, quantization.

use crate::asset::ModelAsset;
use crate::error::{FoldcodeError, Result};
use crate::features;
use crate::geometry::Vec3;
use crate::network::{forward_into, ForwardScratch};
use crate::partner::find_partners;
use crate::quantize::nearest_centroid;
use crate::virtual_center;

/// One chain's worth of backbone coordinates, shared by borrow.
#[derive(Debug, Clone, Copy)]
pub struct ChainCoords<'a> {
    pub ca: &'a [Vec3],
    pub n: &'a [Vec3],
    pub c: &'a [Vec3],
    pub cb: &'a [Vec3],
}

/// Discrete structural states for one chain, in residue order.
///
/// Codes below `invalid_state` index the asset's centroid table; the
/// sentinel marks residues that could not be embedded (terminals,
/// degenerate geometry, chains shorter than three residues).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateSequence {
    states: Vec<u8>,
    invalid_state: u8,
}

impl StateSequence {
    /// One state code per residue.
    pub fn states(&self) -> &[u8] {
        &self.states
    }

    /// The sentinel code used for unassignable residues.
    pub fn invalid_state(&self) -> u8 {
        self.invalid_state
    }

    /// Number of residues.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the chain was empty.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Whether residue `i` received a real (non-sentinel) state.
    pub fn is_valid(&self, i: usize) -> bool {
        self.states[i] != self.invalid_state
    }

    /// Number of residues with a real state.
    pub fn valid_count(&self) -> usize {
        self.states
            .iter()
            .filter(|&&s| s != self.invalid_state)
            .count()
    }

    /// Consume into the raw state bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.states
    }

    /// A one-line description for logs and reports.
    pub fn summary(&self) -> String {
        format!(
            "StateSequence — {} residue(s), {} assigned, sentinel {}",
            self.len(),
            self.valid_count(),
            self.invalid_state,
        )
    }
}

/// Converts backbone coordinates into state sequences against one asset.
///
/// The encoder owns only scratch buffers; the asset is borrowed and
/// read-only, so one asset can back an encoder per worker thread.
/// Buffers are reused across calls and resized once per chain.
#[derive(Debug)]
pub struct Encoder<'a> {
    asset: &'a ModelAsset,
    cb_eff: Vec<Vec3>,
    valid: Vec<bool>,
    scratch: ForwardScratch,
}

impl<'a> Encoder<'a> {
    /// Create an encoder backed by `asset`.
    pub fn new(asset: &'a ModelAsset) -> Encoder<'a> {
        Encoder {
            asset,
            cb_eff: Vec::new(),
            valid: Vec::new(),
            scratch: ForwardScratch::new(),
        }
    }

    /// The asset this encoder evaluates.
    pub fn asset(&self) -> &ModelAsset {
        self.asset
    }

    /// Encode one chain of length L given its Cα, N, C and Cβ arrays.
    ///
    /// A Cβ entry with any non-finite component is treated as missing
    /// and replaced by the synthesized virtual center. Chains shorter
    /// than three residues yield an all-sentinel sequence.
    ///
    /// # Errors
    ///
    /// [`FoldcodeError::InputShapeMismatch`] when the four arrays have
    /// unequal lengths. Geometric degeneracies never fail the call;
    /// they invalidate single residues.
    pub fn encode_chain(
        &mut self,
        ca: &[Vec3],
        n: &[Vec3],
        c: &[Vec3],
        cb: &[Vec3],
    ) -> Result<StateSequence> {
        let len = ca.len();
        if n.len() != len || c.len() != len || cb.len() != len {
            return Err(FoldcodeError::InputShapeMismatch {
                ca: len,
                n: n.len(),
                c: c.len(),
                cb: cb.len(),
            });
        }

        let sentinel = self.asset.invalid_state();

        self.valid.clear();
        self.valid
            .extend((0..len).map(|i| ca[i].is_finite() && n[i].is_finite() && c[i].is_finite()));

        self.fill_effective_cb(ca, n, c, cb);

        let mut states = vec![sentinel; len];
        if len < 3 {
            return Ok(StateSequence {
                states,
                invalid_state: sentinel,
            });
        }

        let partner = find_partners(&self.cb_eff, &mut self.valid, self.asset.penalty());

        for i in 1..len - 1 {
            if !self.valid[i] {
                continue;
            }
            let Some(j) = partner[i] else { continue };
            match features::descriptor(ca, i, j) {
                Ok(descriptor) => {
                    forward_into(
                        self.asset.layers(),
                        self.asset.precision(),
                        &descriptor,
                        &mut self.scratch,
                    );
                    let state = nearest_centroid(
                        self.scratch.output(),
                        self.asset.centroids(),
                        self.asset.embedding_dim(),
                    );
                    states[i] = state as u8;
                }
                Err(FoldcodeError::DegenerateGeometry(_)) => {
                    // One residue degrades; the chain survives.
                }
                Err(other) => return Err(other),
            }
        }

        Ok(StateSequence {
            states,
            invalid_state: sentinel,
        })
    }

    /// Populate the effective β-carbon array: real Cβ where finite,
    /// synthesized virtual center otherwise. Synthesis failures mark
    /// the residue invalid; the placeholder position is never read for
    /// invalid residues.
    fn fill_effective_cb(&mut self, ca: &[Vec3], n: &[Vec3], c: &[Vec3], cb: &[Vec3]) {
        self.cb_eff.clear();
        for i in 0..ca.len() {
            if !self.valid[i] {
                self.cb_eff.push(Vec3::zero());
                continue;
            }
            if cb[i].is_finite() {
                self.cb_eff.push(cb[i]);
                continue;
            }
            match virtual_center::synthesize(&ca[i], &n[i], &c[i], self.asset.virtual_center()) {
                Ok(center) => self.cb_eff.push(center),
                Err(_) => {
                    self.valid[i] = false;
                    self.cb_eff.push(Vec3::zero());
                }
            }
        }
    }
}

/// Encode many chains in parallel, one rayon worker-local encoder each.
#[cfg(feature = "parallel")]
pub fn encode_chains(
    asset: &ModelAsset,
    chains: &[ChainCoords<'_>],
) -> Vec<Result<StateSequence>> {
    use rayon::prelude::*;

    chains
        .par_iter()
        .map_init(
            || Encoder::new(asset),
            |encoder, chain| encoder.encode_chain(chain.ca, chain.n, chain.c, chain.cb),
        )
        .collect()
}
