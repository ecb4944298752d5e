//! The 10-slot conformational descriptor for a residue pair.
//!
//! Slot order is a positional protocol with the trained network: the
//! first layer of every shipped asset is indexed against this table.

use crate::error::{FoldcodeError, Result};
use crate::geometry::Vec3;

/// Number of descriptor slots.
pub const FEATURE_CNT: usize = 10;

/// Slot semantics, in wire order. u1/u2 are the backbone tangents into
/// and out of residue i, u3/u4 the same for its partner j, u5 the unit
/// separation from Cα(i) to Cα(j).
///
/// Slot 8 clips the separation at 4 while slot 9 log-scales it without
/// clipping; the asymmetry is part of the trained descriptor, not an
/// oversight.
pub const FEATURE_SLOTS: [&str; FEATURE_CNT] = [
    "cos(u1,u2)",
    "cos(u3,u4)",
    "cos(u1,u5)",
    "cos(u3,u5)",
    "cos(u1,u4)",
    "cos(u2,u3)",
    "cos(u1,u3)",
    "ca_distance",
    "clipped_separation",
    "log_separation",
];

/// Clip applied to the signed sequence separation in slot 8.
const SEPARATION_CLIP: f64 = 4.0;

/// Compute the descriptor for residue `i` with partner `j`.
///
/// Both indices must be interior (neighbors in range); the caller's
/// partner selection guarantees this.
///
/// # Errors
///
/// [`FoldcodeError::DegenerateGeometry`] when any participating Cα is
/// non-finite or consecutive Cα atoms coincide. The encoder downgrades
/// this to an INVALID state for the one residue.
pub fn descriptor(ca: &[Vec3], i: usize, j: usize) -> Result<[f64; FEATURE_CNT]> {
    debug_assert!(i >= 1 && i + 1 < ca.len());
    debug_assert!(j >= 1 && j + 1 < ca.len());
    debug_assert_ne!(i, j);

    for &k in &[i - 1, i, i + 1, j - 1, j, j + 1] {
        if !ca[k].is_finite() {
            return Err(FoldcodeError::DegenerateGeometry(format!(
                "non-finite alpha-carbon at residue {k}"
            )));
        }
    }

    let u1 = ca[i].sub(&ca[i - 1]).unit()?;
    let u2 = ca[i + 1].sub(&ca[i]).unit()?;
    let u3 = ca[j].sub(&ca[j - 1]).unit()?;
    let u4 = ca[j + 1].sub(&ca[j]).unit()?;
    let u5 = ca[j].sub(&ca[i]).unit()?;

    let sep = j as f64 - i as f64;
    let sign = sep.signum();

    Ok([
        u1.dot(&u2),
        u3.dot(&u4),
        u1.dot(&u5),
        u3.dot(&u5),
        u1.dot(&u4),
        u2.dot(&u3),
        u1.dot(&u3),
        ca[i].distance_to(&ca[j]),
        sign * sep.abs().min(SEPARATION_CLIP),
        sign * (sep.abs() + 1.0).ln(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    // Zigzag in the xz-plane: tangents alternate, nothing is collinear.
    fn zigzag(n: usize) -> Vec<Vec3> {
        (0..n)
            .map(|i| Vec3::new(3.5 * i as f64, 0.0, 0.5 * if i % 2 == 0 { 1.0 } else { -1.0 }))
            .collect()
    }

    #[test]
    fn slot_table_is_complete() {
        assert_eq!(FEATURE_SLOTS.len(), FEATURE_CNT);
    }

    #[test]
    fn cosines_are_bounded() {
        let ca = zigzag(12);
        let f = descriptor(&ca, 3, 7).unwrap();
        for &cosine in &f[0..7] {
            assert!(cosine.abs() <= 1.0 + 1e-12, "cosine out of range: {cosine}");
        }
    }

    #[test]
    fn distance_slot_matches_geometry() {
        let ca = zigzag(12);
        let f = descriptor(&ca, 3, 7).unwrap();
        assert!((f[7] - ca[3].distance_to(&ca[7])).abs() < 1e-12);
    }

    #[test]
    fn separation_slots_sign_and_clip() {
        let ca = zigzag(16);

        let fwd = descriptor(&ca, 3, 10).unwrap();
        assert!((fwd[8] - 4.0).abs() < 1e-12); // clipped from 7
        assert!((fwd[9] - 8.0_f64.ln()).abs() < 1e-12); // unclipped

        let bwd = descriptor(&ca, 10, 3).unwrap();
        assert!((bwd[8] + 4.0).abs() < 1e-12);
        assert!((bwd[9] + 8.0_f64.ln()).abs() < 1e-12);

        let near = descriptor(&ca, 5, 7).unwrap();
        assert!((near[8] - 2.0).abs() < 1e-12); // below the clip
    }

    #[test]
    fn translation_leaves_descriptor_unchanged() {
        let ca = zigzag(12);
        let t = Vec3::new(-7.0, 11.0, 3.3);
        let shifted: Vec<Vec3> = ca.iter().map(|p| p.add(&t)).collect();
        let a = descriptor(&ca, 4, 8).unwrap();
        let b = descriptor(&shifted, 4, 8).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn coincident_neighbors_are_degenerate() {
        let mut ca = zigzag(12);
        ca[5] = ca[4];
        assert!(descriptor(&ca, 5, 8).is_err());
        // Pairs that do not touch the coincident tangent still work.
        assert!(descriptor(&ca, 8, 2).is_ok());
    }

    #[test]
    fn non_finite_ca_is_degenerate() {
        let mut ca = zigzag(12);
        ca[7] = Vec3::new(f64::NAN, 0.0, 0.0);
        assert!(descriptor(&ca, 6, 3).is_err()); // i+1 is non-finite
        assert!(descriptor(&ca, 3, 9).is_ok());
    }
}
