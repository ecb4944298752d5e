//! Discretization of protein backbone geometry into a structural alphabet.
//!
//! Given per-residue backbone coordinates (Cα, N, C, Cβ), `foldcode`
//! emits one discrete state per residue from a 20-state alphabet, so
//! that structure similarity can be searched with plain sequence tools:
//!
//! - **Geometry** — 3-vector primitives and axis-angle rotation in [`geometry`]
//! - **Virtual centers** — pseudo-Cβ synthesis for glycine and unresolved
//!   side chains in [`virtual_center`]
//! - **Partner selection** — composite spatial/sequence cost in [`partner`]
//! - **Descriptors** — the 10-slot residue-pair feature vector in [`features`]
//! - **Embedding** — a small dense network in [`network`], quantized
//!   against the asset's centroid table in [`quantize`]
//! - **Assets** — the frozen weight/centroid bundle in [`asset`]
//!
//! Structure parsing, database writing and state-to-letter mapping are
//! deliberately out of scope; the encoder is a pure function from
//! coordinate slices to a [`StateSequence`].
//!
//! # Quick start
//!
//! ```
//! use foldcode::{
//!     Activation, Encoder, Layer, ModelAsset, PenaltyKind, Precision,
//!     SequencePenalty, Vec3, VirtualCenterParams,
//! };
//!
//! // A minimal synthetic asset: one identity layer, 20 centroids.
//! let layer = Layer::new(2, 10, Activation::Identity, vec![0.0; 20], vec![0.0; 2])?;
//! let centroids: Vec<f64> = (0..40).map(|i| i as f64).collect();
//! let asset = ModelAsset::new(
//!     Precision::Double,
//!     VirtualCenterParams { alpha_deg: 270.0, beta_deg: 0.0, distance: 2.0 },
//!     SequencePenalty { kind: PenaltyKind::ClippedLinear, weight: 0.0, clip: 4.0 },
//!     2,
//!     centroids,
//!     vec![layer],
//! )?;
//!
//! // Two residues are too short to embed: both come back as the sentinel.
//! let ca = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(3.8, 0.0, 0.0)];
//! let n = [Vec3::new(-1.0, 0.5, 0.0), Vec3::new(2.8, 0.5, 0.0)];
//! let c = [Vec3::new(1.0, 0.5, 0.2), Vec3::new(4.8, 0.5, 0.2)];
//! let cb = [Vec3::new(f64::NAN, 0.0, 0.0), Vec3::new(f64::NAN, 0.0, 0.0)];
//!
//! let mut encoder = Encoder::new(&asset);
//! let seq = encoder.encode_chain(&ca, &n, &c, &cb)?;
//! assert_eq!(seq.states(), &[asset.invalid_state(), asset.invalid_state()]);
//! # Ok::<(), foldcode::FoldcodeError>(())
//! ```

pub mod asset;
pub mod encoder;
pub mod error;
pub mod features;
pub mod geometry;
pub mod network;
pub mod partner;
pub mod quantize;
pub mod virtual_center;

pub use asset::ModelAsset;
#[cfg(feature = "parallel")]
pub use encoder::encode_chains;
pub use encoder::{ChainCoords, Encoder, StateSequence};
pub use error::{FoldcodeError, Result};
pub use features::{FEATURE_CNT, FEATURE_SLOTS};
pub use geometry::Vec3;
pub use network::{forward, Activation, Layer, Precision};
pub use partner::{find_partners, PenaltyKind, SequencePenalty};
pub use quantize::nearest_centroid;
pub use virtual_center::VirtualCenterParams;
