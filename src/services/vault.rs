//! Encrypted at-rest container for captured training samples.
//!
//! Samples are serialized to JSON, passed through the host [`Encryptor`],
//! and stamped with a SHA-256 digest of the ciphertext. `open` refuses any
//! batch whose digest no longer matches.

use crate::error::{DuctusError, Result};
use crate::services::encryption::Encryptor;
use crate::services::storage::ArtifactStore;
use crate::types::LabeledSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Encrypted batch of labeled samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedBatch {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sample_count: usize,
    /// Hex SHA-256 of `ciphertext`
    pub digest: String,
    pub ciphertext: Vec<u8>,
}

pub struct SampleVault {
    encryptor: Arc<dyn Encryptor>,
}

impl SampleVault {
    pub fn new(encryptor: Arc<dyn Encryptor>) -> Self {
        Self { encryptor }
    }

    pub fn seal(&self, samples: &[LabeledSample]) -> Result<SealedBatch> {
        let plaintext = serde_json::to_vec(samples)?;
        let ciphertext = self.encryptor.encrypt(&plaintext)?;
        Ok(SealedBatch {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            sample_count: samples.len(),
            digest: digest(&ciphertext),
            ciphertext,
        })
    }

    pub fn open(&self, batch: &SealedBatch) -> Result<Vec<LabeledSample>> {
        if digest(&batch.ciphertext) != batch.digest {
            return Err(DuctusError::Encryption(format!(
                "digest mismatch for batch {}",
                batch.id
            )));
        }
        let plaintext = self.encryptor.decrypt(&batch.ciphertext)?;
        let samples: Vec<LabeledSample> = serde_json::from_slice(&plaintext)?;
        if samples.len() != batch.sample_count {
            return Err(DuctusError::Encryption(format!(
                "batch {} declares {} samples but holds {}",
                batch.id,
                batch.sample_count,
                samples.len()
            )));
        }
        Ok(samples)
    }

    /// Seal and hand the batch to the artifact store
    pub async fn archive(
        &self,
        samples: &[LabeledSample],
        store: &dyn ArtifactStore,
    ) -> Result<SealedBatch> {
        let batch = self.seal(samples)?;
        store.save_sealed_batch(&batch).await?;
        debug!("Archived {} samples as batch {}", batch.sample_count, batch.id);
        Ok(batch)
    }
}

fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
