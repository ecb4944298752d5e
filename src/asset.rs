//! The frozen model asset: network layers, centroid table, and the
//! geometric constants the encoder shares with the trained weights.
//!
//! Serialized assets are a single little-endian blob:
//!
//! ```text
//! magic            4 bytes  "FCAS"
//! version          u32      format version (currently 1)
//! float width      u8       4 (f32) or 8 (f64)
//! penalty kind     u8       sequence-penalty variant tag
//! feature dim      u32      descriptor width consumed by layer 0
//! embedding dim    u32      output width of the last layer
//! state count      u32      centroid rows (the alphabet size)
//! layer count      u32
//! vc alpha, beta, distance      3 floats
//! penalty weight, penalty clip  2 floats
//! centroids        state count * embedding dim floats, row-major
//! per layer:       rows u32, cols u32, activation u8,
//!                  rows*cols weight floats, rows bias floats
//! ```
//!
//! Loading is a single validated pass that fully materializes every
//! buffer; truncated or dimensionally inconsistent blobs are rejected,
//! never partially loaded.

use sha2::{Digest, Sha256};

use crate::error::{FoldcodeError, Result};
use crate::features::FEATURE_CNT;
use crate::network::{Activation, Layer, Precision};
use crate::partner::{PenaltyKind, SequencePenalty};
use crate::virtual_center::VirtualCenterParams;

const MAGIC: [u8; 4] = *b"FCAS";
const FORMAT_VERSION: u32 = 1;

/// Alphabet sizes must leave room for the INVALID sentinel in a u8.
const MAX_STATE_COUNT: usize = 254;

/// Immutable bundle of everything the encoder needs besides coordinates.
///
/// Built once (from bytes or via [`ModelAsset::new`]) and then shared by
/// borrow across any number of encoders and threads.
#[derive(Debug, Clone)]
pub struct ModelAsset {
    precision: Precision,
    embedding_dim: usize,
    state_count: usize,
    virtual_center: VirtualCenterParams,
    penalty: SequencePenalty,
    /// Row-major `state_count * embedding_dim` centroid table.
    centroids: Vec<f64>,
    layers: Vec<Layer>,
}

impl ModelAsset {
    /// Assemble an asset from parts, validating all dimension chains.
    pub fn new(
        precision: Precision,
        virtual_center: VirtualCenterParams,
        penalty: SequencePenalty,
        embedding_dim: usize,
        centroids: Vec<f64>,
        layers: Vec<Layer>,
    ) -> Result<ModelAsset> {
        if embedding_dim == 0 {
            return Err(FoldcodeError::AssetMalformed(
                "embedding dimension must be positive".into(),
            ));
        }
        if centroids.is_empty() || centroids.len() % embedding_dim != 0 {
            return Err(FoldcodeError::AssetMalformed(format!(
                "centroid table holds {} values, not a multiple of embedding dim {}",
                centroids.len(),
                embedding_dim
            )));
        }
        let state_count = centroids.len() / embedding_dim;
        if state_count > MAX_STATE_COUNT {
            return Err(FoldcodeError::AssetMalformed(format!(
                "{state_count} states exceed the {MAX_STATE_COUNT}-state limit"
            )));
        }
        validate_layer_chain(&layers, FEATURE_CNT, embedding_dim)?;

        Ok(ModelAsset {
            precision,
            embedding_dim,
            state_count,
            virtual_center,
            penalty,
            centroids,
            layers,
        })
    }

    /// Parse a serialized asset.
    ///
    /// # Errors
    ///
    /// [`FoldcodeError::AssetMalformed`] on truncation, unknown tags, or
    /// any dimension mismatch.
    pub fn from_bytes(data: &[u8]) -> Result<ModelAsset> {
        let mut pos = 0usize;

        let magic = read_bytes::<4>(data, &mut pos)?;
        if magic != MAGIC {
            return Err(FoldcodeError::AssetMalformed("bad magic".into()));
        }
        let version = read_u32_le(data, &mut pos)?;
        if version != FORMAT_VERSION {
            return Err(FoldcodeError::AssetMalformed(format!(
                "unsupported format version {version}"
            )));
        }
        let precision = Precision::from_width(read_u8(data, &mut pos)?)
            .ok_or_else(|| FoldcodeError::AssetMalformed("bad float width".into()))?;
        let penalty_kind = PenaltyKind::from_tag(read_u8(data, &mut pos)?)
            .ok_or_else(|| FoldcodeError::AssetMalformed("bad penalty tag".into()))?;

        let feature_dim = read_u32_le(data, &mut pos)? as usize;
        if feature_dim != FEATURE_CNT {
            return Err(FoldcodeError::AssetMalformed(format!(
                "asset expects {feature_dim}-wide descriptors, this build produces {FEATURE_CNT}"
            )));
        }
        let embedding_dim = read_u32_le(data, &mut pos)? as usize;
        let state_count = read_u32_le(data, &mut pos)? as usize;
        let layer_count = read_u32_le(data, &mut pos)? as usize;
        if state_count == 0 || state_count > MAX_STATE_COUNT {
            return Err(FoldcodeError::AssetMalformed(format!(
                "state count {state_count} out of range"
            )));
        }

        let virtual_center = VirtualCenterParams {
            alpha_deg: read_float(data, &mut pos, precision)?,
            beta_deg: read_float(data, &mut pos, precision)?,
            distance: read_float(data, &mut pos, precision)?,
        };
        let penalty = SequencePenalty {
            kind: penalty_kind,
            weight: read_float(data, &mut pos, precision)?,
            clip: read_float(data, &mut pos, precision)?,
        };

        let centroid_len = state_count
            .checked_mul(embedding_dim)
            .ok_or_else(|| FoldcodeError::AssetMalformed("centroid table overflows".into()))?;
        let centroids = read_float_array(data, &mut pos, precision, centroid_len)?;

        let mut layers = Vec::with_capacity(layer_count.min(1024));
        for _ in 0..layer_count {
            let rows = read_u32_le(data, &mut pos)? as usize;
            let cols = read_u32_le(data, &mut pos)? as usize;
            let activation = Activation::from_tag(read_u8(data, &mut pos)?)
                .ok_or_else(|| FoldcodeError::AssetMalformed("bad activation tag".into()))?;
            let weight_len = rows
                .checked_mul(cols)
                .ok_or_else(|| FoldcodeError::AssetMalformed("weight matrix overflows".into()))?;
            let weights = read_float_array(data, &mut pos, precision, weight_len)?;
            let biases = read_float_array(data, &mut pos, precision, rows)?;
            layers.push(Layer::new(rows, cols, activation, weights, biases)?);
        }

        if pos != data.len() {
            return Err(FoldcodeError::AssetMalformed(format!(
                "{} trailing bytes after last layer",
                data.len() - pos
            )));
        }

        ModelAsset::new(
            precision,
            virtual_center,
            penalty,
            embedding_dim,
            centroids,
            layers,
        )
    }

    /// Serialize the asset; the exact inverse of [`ModelAsset::from_bytes`].
    ///
    /// With single precision declared, float payloads are written as f32
    /// and round accordingly.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.push(self.precision.width() as u8);
        out.push(self.penalty.kind.tag());
        out.extend_from_slice(&(FEATURE_CNT as u32).to_le_bytes());
        out.extend_from_slice(&(self.embedding_dim as u32).to_le_bytes());
        out.extend_from_slice(&(self.state_count as u32).to_le_bytes());
        out.extend_from_slice(&(self.layers.len() as u32).to_le_bytes());

        for v in [
            self.virtual_center.alpha_deg,
            self.virtual_center.beta_deg,
            self.virtual_center.distance,
            self.penalty.weight,
            self.penalty.clip,
        ] {
            write_float(&mut out, v, self.precision);
        }
        for &v in &self.centroids {
            write_float(&mut out, v, self.precision);
        }
        for layer in &self.layers {
            out.extend_from_slice(&(layer.rows as u32).to_le_bytes());
            out.extend_from_slice(&(layer.cols as u32).to_le_bytes());
            out.push(layer.activation.tag());
            for &w in &layer.weights {
                write_float(&mut out, w, self.precision);
            }
            for &b in &layer.biases {
                write_float(&mut out, b, self.precision);
            }
        }
        out
    }

    /// SHA-256 of the canonical serialized form, as a hex string.
    /// Deployments use this to pin the exact frozen asset.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_bytes());
        hex::encode(hasher.finalize())
    }

    /// Declared evaluation precision.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Embedding width produced by the network.
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Alphabet size (number of centroids).
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// The sentinel state code for residues that cannot be embedded.
    pub fn invalid_state(&self) -> u8 {
        self.state_count as u8
    }

    /// Virtual-center placement parameters.
    pub fn virtual_center(&self) -> &VirtualCenterParams {
        &self.virtual_center
    }

    /// Partner-selection sequence penalty.
    pub fn penalty(&self) -> &SequencePenalty {
        &self.penalty
    }

    /// Flat row-major centroid table.
    pub fn centroids(&self) -> &[f64] {
        &self.centroids
    }

    /// One centroid row.
    pub fn centroid(&self, state: usize) -> &[f64] {
        &self.centroids[state * self.embedding_dim..(state + 1) * self.embedding_dim]
    }

    /// The ordered layer stack.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

fn validate_layer_chain(layers: &[Layer], input_dim: usize, output_dim: usize) -> Result<()> {
    let first = layers.first().ok_or_else(|| {
        FoldcodeError::AssetMalformed("asset declares no network layers".into())
    })?;
    if first.cols != input_dim {
        return Err(FoldcodeError::AssetMalformed(format!(
            "layer 0 consumes {} inputs, descriptor provides {}",
            first.cols, input_dim
        )));
    }
    for (idx, pair) in layers.windows(2).enumerate() {
        if pair[1].cols != pair[0].rows {
            return Err(FoldcodeError::AssetMalformed(format!(
                "layer {} emits {} values but layer {} consumes {}",
                idx,
                pair[0].rows,
                idx + 1,
                pair[1].cols
            )));
        }
    }
    let last = layers.last().unwrap();
    if last.rows != output_dim {
        return Err(FoldcodeError::AssetMalformed(format!(
            "last layer emits {} values, centroid table is {}-wide",
            last.rows, output_dim
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Binary reading helpers
// ---------------------------------------------------------------------------

fn read_bytes<const N: usize>(data: &[u8], pos: &mut usize) -> Result<[u8; N]> {
    let end = pos
        .checked_add(N)
        .filter(|&e| e <= data.len())
        .ok_or_else(|| FoldcodeError::AssetMalformed("unexpected end of asset data".into()))?;
    let mut buf = [0u8; N];
    buf.copy_from_slice(&data[*pos..end]);
    *pos = end;
    Ok(buf)
}

fn read_u8(data: &[u8], pos: &mut usize) -> Result<u8> {
    Ok(read_bytes::<1>(data, pos)?[0])
}

fn read_u32_le(data: &[u8], pos: &mut usize) -> Result<u32> {
    Ok(u32::from_le_bytes(read_bytes::<4>(data, pos)?))
}

fn read_float(data: &[u8], pos: &mut usize, precision: Precision) -> Result<f64> {
    match precision {
        Precision::Single => Ok(f32::from_le_bytes(read_bytes::<4>(data, pos)?) as f64),
        Precision::Double => Ok(f64::from_le_bytes(read_bytes::<8>(data, pos)?)),
    }
}

fn read_float_array(
    data: &[u8],
    pos: &mut usize,
    precision: Precision,
    count: usize,
) -> Result<Vec<f64>> {
    // Bound the byte span against the blob before allocating, so a
    // hostile header cannot request an absurd buffer.
    let in_bounds = count
        .checked_mul(precision.width())
        .and_then(|b| pos.checked_add(b))
        .is_some_and(|end| end <= data.len());
    if !in_bounds {
        return Err(FoldcodeError::AssetMalformed(
            "unexpected end of asset data".into(),
        ));
    }
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(read_float(data, pos, precision)?);
    }
    Ok(out)
}

fn write_float(out: &mut Vec<u8>, value: f64, precision: Precision) {
    match precision {
        Precision::Single => out.extend_from_slice(&(value as f32).to_le_bytes()),
        Precision::Double => out.extend_from_slice(&value.to_le_bytes()),
    }
}
