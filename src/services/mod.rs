//! External collaborators of the pipeline
//!
//! Consent, encryption and storage are owned by the host application; this
//! layer defines their interfaces plus simple implementations for the CLI
//! and tests.

pub mod consent;
pub mod encryption;
pub mod storage;
pub mod vault;

pub use consent::{ConsentGate, ConsentPurpose, ConsentRecord, StaticConsent};
pub use encryption::{Encryptor, PassthroughEncryptor};
pub use storage::{ArtifactStore, FileArtifactStore, MemoryArtifactStore};
pub use vault::{SampleVault, SealedBatch};
