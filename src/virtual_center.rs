//! Pseudo-Cβ synthesis for residues with no resolved β-carbon.
//!
//! The placement runs in two steps: a tetrahedral approximation of the
//! β-carbon from the backbone Cα, N and C atoms, followed by two
//! axis-angle rotations that move the approximated atom to the trained
//! virtual-center position. The composition and constants are frozen;
//! algebraically equivalent rewrites produce floating-point-distinguishable
//! positions and would invalidate the trained centroid table, so changes
//! here require a new asset version.

use crate::error::Result;
use crate::geometry::Vec3;

/// Cα-Cβ bond length used by the tetrahedral approximation, in Angstrom.
/// This is the full-precision constant the centroid table was trained
/// with; it is often quoted rounded to 1.5336.
const CBETA_BOND_LENGTH: f64 = 1.5336837;

/// Placement parameters carried by the model asset.
///
/// `alpha_deg` rotates about the normal of the N-Cα-Cβ plane, `beta_deg`
/// about the Cα-N axis. `distance` multiplies the (unnormalized) Cα→Cβ
/// vector, so the center sits at `distance * |Cβ - Cα|` from Cα.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualCenterParams {
    pub alpha_deg: f64,
    pub beta_deg: f64,
    pub distance: f64,
}

/// Tetrahedral approximation of the β-carbon position.
///
/// Treats Cα and its four ligands as an ideal tetrahedron and places the
/// β-carbon opposite the backbone substituents.
///
/// # Errors
///
/// [`crate::FoldcodeError::DegenerateGeometry`] when the backbone atoms are
/// coincident or collinear.
pub fn approx_cbeta(ca: &Vec3, n: &Vec3, c: &Vec3) -> Result<Vec3> {
    let v1 = c.sub(ca).unit()?;
    let v2 = n.sub(ca).unit()?;
    let b1 = v2.add(&v1.scale(1.0 / 3.0));
    let u1 = b1.unit()?;
    let u2 = v1.cross(&b1).unit()?;

    let dir = v1.scale(-1.0 / 3.0).add(
        &u1.scale(-0.5)
            .sub(&u2.scale(3.0_f64.sqrt() / 2.0))
            .scale(8.0_f64.sqrt() / 3.0),
    );
    Ok(ca.add(&dir.scale(CBETA_BOND_LENGTH)))
}

/// Synthesize the virtual center for a residue whose Cβ is missing.
///
/// Approximates the β-carbon, then rotates the Cα→Cβ vector by
/// `params.alpha_deg` about the N-Cα-Cβ plane normal and by
/// `params.beta_deg` about the Cα-N axis, scaling by `params.distance`.
/// Deterministic for finite inputs; the construction is chiral.
pub fn synthesize(ca: &Vec3, n: &Vec3, c: &Vec3, params: &VirtualCenterParams) -> Result<Vec3> {
    let cb = approx_cbeta(ca, n, c)?;
    place_center(ca, &cb, n, params)
}

/// Rotate an existing Cα→Cβ vector into the virtual-center position.
pub fn place_center(
    ca: &Vec3,
    cb: &Vec3,
    n: &Vec3,
    params: &VirtualCenterParams,
) -> Result<Vec3> {
    let alpha = params.alpha_deg.to_radians();
    let beta = params.beta_deg.to_radians();

    let v = cb.sub(ca);
    let n_dir = n.sub(ca);

    let k = v.cross(&n_dir).unit()?;
    let v = v.rotate_about(&k, alpha);

    let k = n_dir.unit()?;
    let v = v.rotate_about(&k, beta);

    Ok(ca.add(&v.scale(params.distance)))
}
