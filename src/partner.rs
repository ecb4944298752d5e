//! Partner selection: for each residue, the interior residue whose
//! effective β-carbon minimizes a composite spatial/sequence cost.

use crate::geometry::Vec3;

/// Sequence-separation penalty shape. The asset picks the variant; the
/// selection algorithm itself is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PenaltyKind {
    /// f(d) = min(d, clip)
    ClippedLinear,
    /// f(d) = ln(min(d, clip) + 1)
    ClippedLog,
}

impl PenaltyKind {
    /// Wire tag used in the serialized asset.
    pub fn tag(&self) -> u8 {
        match self {
            PenaltyKind::ClippedLinear => 0,
            PenaltyKind::ClippedLog => 1,
        }
    }

    /// Inverse of [`PenaltyKind::tag`].
    pub fn from_tag(tag: u8) -> Option<PenaltyKind> {
        match tag {
            0 => Some(PenaltyKind::ClippedLinear),
            1 => Some(PenaltyKind::ClippedLog),
            _ => None,
        }
    }
}

/// Weighted, clipped sequence-separation penalty added to the spatial
/// distance during partner selection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequencePenalty {
    pub kind: PenaltyKind,
    pub weight: f64,
    pub clip: f64,
}

impl SequencePenalty {
    /// Penalty contribution for a sequence separation of `separation`.
    pub fn cost(&self, separation: usize) -> f64 {
        let d = (separation as f64).min(self.clip);
        let f = match self.kind {
            PenaltyKind::ClippedLinear => d,
            PenaltyKind::ClippedLog => (d + 1.0).ln(),
        };
        self.weight * f
    }
}

/// Pick a partner for every valid interior residue.
///
/// `cb_eff` holds the effective β-carbon (real or synthesized) per
/// residue; `valid` marks residues whose backbone survived the geometry
/// checks. Candidates are valid interior residues `j != i`; the partner
/// minimizes `|cb_eff[i] - cb_eff[j]| + penalty(|j - i|)`, with ties
/// broken by smallest separation, then smallest index. Terminal residues
/// and residues left without a candidate are marked invalid in place.
///
/// Chains shorter than three residues have no interior and come back
/// fully invalid.
pub fn find_partners(
    cb_eff: &[Vec3],
    valid: &mut [bool],
    penalty: &SequencePenalty,
) -> Vec<Option<usize>> {
    let len = cb_eff.len();
    debug_assert_eq!(len, valid.len());
    let mut partner = vec![None; len];

    if len < 3 {
        for v in valid.iter_mut() {
            *v = false;
        }
        return partner;
    }
    valid[0] = false;
    valid[len - 1] = false;

    for i in 1..len - 1 {
        if !valid[i] {
            continue;
        }
        let mut best: Option<(f64, usize, usize)> = None;
        for j in 1..len - 1 {
            if j == i || !valid[j] {
                continue;
            }
            let sep = i.abs_diff(j);
            let cost = cb_eff[i].distance_to(&cb_eff[j]) + penalty.cost(sep);
            let better = match best {
                None => true,
                Some((bc, bs, _)) => cost < bc || (cost == bc && sep < bs),
            };
            if better {
                best = Some((cost, sep, j));
            }
        }
        match best {
            Some((_, _, j)) => partner[i] = Some(j),
            None => valid[i] = false,
        }
    }

    partner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_penalty() -> SequencePenalty {
        SequencePenalty {
            kind: PenaltyKind::ClippedLinear,
            weight: 0.0,
            clip: 4.0,
        }
    }

    fn line(n: usize, spacing: f64) -> Vec<Vec3> {
        (0..n)
            .map(|i| Vec3::new(i as f64 * spacing, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn penalty_shapes() {
        let lin = SequencePenalty {
            kind: PenaltyKind::ClippedLinear,
            weight: 2.0,
            clip: 4.0,
        };
        assert!((lin.cost(2) - 4.0).abs() < 1e-12);
        assert!((lin.cost(9) - 8.0).abs() < 1e-12); // clipped at 4

        let log = SequencePenalty {
            kind: PenaltyKind::ClippedLog,
            weight: 1.0,
            clip: 100.0,
        };
        assert!((log.cost(1) - 2.0_f64.ln()).abs() < 1e-12);
        assert!(log.cost(3) < log.cost(7));
    }

    #[test]
    fn straight_line_prefers_nearest_then_lower_index() {
        let cb = line(6, 3.8);
        let mut valid = vec![true; 6];
        let partner = find_partners(&cb, &mut valid, &no_penalty());
        // i=2: j=1 and j=3 are equidistant with equal separation; the
        // scan order settles on the smaller index.
        assert_eq!(partner[2], Some(1));
        assert_eq!(partner[1], Some(2)); // j=0 is terminal, excluded
        assert_eq!(partner[4], Some(3));
        assert_eq!(partner[0], None);
        assert_eq!(partner[5], None);
        assert!(!valid[0] && !valid[5]);
        assert!(valid[1..5].iter().all(|&v| v));
    }

    #[test]
    fn penalty_pulls_partner_closer_in_sequence() {
        // Residue 2 is spatially nearest to residue 5, but a strong
        // sequence penalty makes the adjacent residue cheaper.
        let cb = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(20.0, 0.0, 0.0),
            Vec3::new(40.0, 0.0, 0.0),
            Vec3::new(60.0, 0.0, 0.0),
            Vec3::new(21.0, 0.0, 0.0),
            Vec3::new(80.0, 0.0, 0.0),
        ];
        let mut spatial_valid = vec![true; 7];
        let spatial = find_partners(&cb, &mut spatial_valid, &no_penalty());
        assert_eq!(spatial[2], Some(5));

        let mut valid = vec![true; 7];

        let strong = SequencePenalty {
            kind: PenaltyKind::ClippedLinear,
            weight: 10.0,
            clip: 8.0,
        };
        let biased = find_partners(&cb, &mut valid, &strong);
        assert_eq!(biased[2], Some(1));
    }

    #[test]
    fn invalid_candidates_are_skipped() {
        let cb = line(6, 3.8);
        let mut valid = vec![true; 6];
        valid[1] = false;
        let partner = find_partners(&cb, &mut valid, &no_penalty());
        assert_eq!(partner[2], Some(3));
        assert_eq!(partner[1], None);
    }

    #[test]
    fn short_chains_have_no_partners() {
        for n in 0..3 {
            let cb = line(n, 3.8);
            let mut valid = vec![true; n];
            let partner = find_partners(&cb, &mut valid, &no_penalty());
            assert!(partner.iter().all(|p| p.is_none()));
            assert!(valid.iter().all(|&v| !v));
        }
    }

    #[test]
    fn lone_interior_residue_is_invalidated() {
        // Three residues: the single interior residue has no interior
        // candidate besides itself.
        let cb = line(3, 3.8);
        let mut valid = vec![true; 3];
        let partner = find_partners(&cb, &mut valid, &no_penalty());
        assert_eq!(partner[1], None);
        assert!(!valid[1]);
    }
}
