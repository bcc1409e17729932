//! Inner-product nearest-neighbor index over historical change fragments.
//!
//! A flat index: vectors are stored contiguously and scanned exhaustively
//! per query. Inner product equals cosine similarity because all stored and
//! query vectors are L2-normalized by their producers.
//!
//! Persistence is a binary blob (header + raw little-endian f32 data) plus
//! a JSON metadata sidecar at `<path>.meta.json`. Both files must be
//! present and hold the same entry count to load.

pub mod error;
pub mod model;


pub use error::{IndexError, IndexResult};
pub use model::{HunkMeta, RetrievalHit};

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use tracing::info;

/// Suffix appended to the blob path for the metadata sidecar.
pub const META_SUFFIX: &str = ".meta.json";

const BLOB_MAGIC: &[u8; 4] = b"DSIX";
const BLOB_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Flat inner-product index with per-entry metadata.
#[derive(Debug, Default)]
pub struct HunkIndex {
    dim: usize,
    /// Row-major `size * dim` matrix. Empty until built or loaded.
    vectors: Vec<f32>,
    metadata: Vec<HunkMeta>,
    built: bool,
}

impl HunkIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: Vec::new(),
            metadata: Vec::new(),
            built: false,
        }
    }

    /// Number of stored entries, 0 if never built.
    pub fn size(&self) -> usize {
        self.metadata.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Stores `vectors` and `metadata` in parallel order, replacing any
    /// previous contents wholesale.
    pub fn build(&mut self, vectors: &[Vec<f32>], metadata: Vec<HunkMeta>) -> IndexResult<()> {
        if vectors.len() != metadata.len() {
            return Err(IndexError::LengthMismatch {
                vectors: vectors.len(),
                metadata: metadata.len(),
            });
        }

        for vector in vectors {
            if vector.len() != self.dim {
                return Err(IndexError::DimensionMismatch {
                    expected: self.dim,
                    actual: vector.len(),
                });
            }
        }

        let mut flat = Vec::with_capacity(vectors.len() * self.dim);
        for vector in vectors {
            flat.extend_from_slice(vector);
        }

        self.vectors = flat;
        self.metadata = metadata;
        self.built = true;

        Ok(())
    }

    /// Returns up to `k` `(score, metadata)` matches sorted by score
    /// descending. `k` is clamped to the number of stored entries; `k = 0`
    /// or an empty index yields an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<RetrievalHit>> {
        if !self.built {
            return Err(IndexError::NotBuilt);
        }

        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let k = k.min(self.size());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(idx, row)| {
                let score: f32 = row.iter().zip(query.iter()).map(|(a, b)| a * b).sum();
                (score, idx)
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, idx)| RetrievalHit::from_meta(score, &self.metadata[idx]))
            .collect())
    }

    /// Writes the blob at `path` and the metadata sidecar at
    /// `<path>.meta.json`.
    pub fn save(&self, path: &Path) -> IndexResult<()> {
        if !self.built {
            return Err(IndexError::NotBuilt);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut blob = Vec::with_capacity(HEADER_LEN + self.vectors.len() * 4);
        blob.extend_from_slice(BLOB_MAGIC);
        blob.extend_from_slice(&BLOB_VERSION.to_le_bytes());
        blob.extend_from_slice(&(self.dim as u32).to_le_bytes());
        blob.extend_from_slice(&(self.size() as u64).to_le_bytes());
        for value in &self.vectors {
            blob.extend_from_slice(&value.to_le_bytes());
        }
        fs::write(path, blob)?;

        let sidecar = serde_json::to_vec(&self.metadata)?;
        fs::write(sidecar_path(path), sidecar)?;

        Ok(())
    }

    /// Restores an index from the blob at `path` plus its metadata sidecar.
    pub fn load(path: &Path) -> IndexResult<Self> {
        let blob = fs::read(path)?;

        if blob.len() < HEADER_LEN {
            return Err(IndexError::Corrupt {
                reason: format!("blob too short: {} bytes", blob.len()),
            });
        }
        if &blob[0..4] != BLOB_MAGIC {
            return Err(IndexError::Corrupt {
                reason: "bad magic".to_string(),
            });
        }

        let version = u32::from_le_bytes(blob[4..8].try_into().expect("4-byte slice"));
        if version != BLOB_VERSION {
            return Err(IndexError::Corrupt {
                reason: format!("unsupported blob version {version}"),
            });
        }

        let dim = u32::from_le_bytes(blob[8..12].try_into().expect("4-byte slice")) as usize;
        let count = u64::from_le_bytes(blob[12..20].try_into().expect("8-byte slice")) as usize;

        if dim == 0 {
            return Err(IndexError::Corrupt {
                reason: "zero dimension".to_string(),
            });
        }

        let data = &blob[HEADER_LEN..];
        let expected_bytes = dim
            .checked_mul(count)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| IndexError::Corrupt {
                reason: "entry count overflow".to_string(),
            })?;
        if data.len() != expected_bytes {
            return Err(IndexError::Corrupt {
                reason: format!(
                    "expected {expected_bytes} bytes of vector data, got {}",
                    data.len()
                ),
            });
        }

        let vectors: Vec<f32> = data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().expect("4-byte chunk")))
            .collect();

        let sidecar = sidecar_path(path);
        let metadata: Vec<HunkMeta> = serde_json::from_slice(&fs::read(&sidecar)?)?;

        if metadata.len() != count {
            return Err(IndexError::SidecarMismatch {
                blob: count,
                sidecar: metadata.len(),
                path: sidecar,
            });
        }

        info!(entries = count, dim, path = %path.display(), "Hunk index loaded");

        Ok(Self {
            dim,
            vectors,
            metadata,
            built: true,
        })
    }
}

fn sidecar_path(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(META_SUFFIX);
    std::path::PathBuf::from(os)
}
