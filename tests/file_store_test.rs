//! File-backed artifact store tests

mod common;

use common::{artifact_with, ConstantClassifier};
use ductus_core::deployment::registry::{RollbackSignals, RollbackTrigger};
use ductus_core::services::vault::SampleVault;
use ductus_core::types::{LabeledSample, SampleMetadata, SampleSource};
use ductus_core::{
    ArtifactStore, FileArtifactStore, IntegrationOrchestrator, ModelRegistry,
    PassthroughEncryptor, PipelineConfig, ShapeLabel, StrokeNormalizer,
};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_artifacts_and_recommendations_written_as_json() {
    let dir = TempDir::new().unwrap();
    let store = FileArtifactStore::new(dir.path());

    let artifact = artifact_with(Arc::new(ConstantClassifier(ShapeLabel::Oval)), 0.7);
    let location = store.save_artifact(&artifact.record).await.unwrap();
    assert!(location.ends_with(&format!("{}.json", artifact.id())));
    let content = std::fs::read_to_string(&location).unwrap();
    assert!(content.contains("\"accuracy\": 0.7"));

    let integration = IntegrationOrchestrator::new(
        PipelineConfig::default(),
        Arc::new(ModelRegistry::new()),
    );
    let recommendation = integration.recommend(&artifact, None).await;
    let location = store.save_recommendation(&recommendation).await.unwrap();
    assert!(location.contains("recommendations"));
    assert!(std::fs::read_to_string(&location)
        .unwrap()
        .contains("\"should_deploy\": false"));
}

#[tokio::test]
async fn test_rollback_log_is_append_only() {
    let dir = TempDir::new().unwrap();
    let store = FileArtifactStore::new(dir.path());
    let registry = ModelRegistry::with_active(artifact_with(
        Arc::new(ConstantClassifier(ShapeLabel::Circle)),
        0.7,
    ));

    for i in 0..3 {
        registry
            .promote(artifact_with(Arc::new(ConstantClassifier(ShapeLabel::Line)), 0.8))
            .await;
        let record = registry
            .rollback(
                format!("rollback {}", i),
                RollbackTrigger::Manual,
                RollbackSignals {
                    baseline_accuracy: 0.8,
                    current_accuracy: None,
                    threshold: 0.76,
                },
            )
            .await
            .unwrap();
        store.append_rollback(&record).await.unwrap();
    }

    let reloaded = FileArtifactStore::new(dir.path());
    let log = reloaded.load_rollbacks().await.unwrap();
    let reasons: Vec<_> = log.iter().map(|r| r.reason.as_str()).collect();
    assert_eq!(reasons, vec!["rollback 0", "rollback 1", "rollback 2"]);
    assert_eq!(log, registry.rollback_log().await);
}

#[tokio::test]
async fn test_sealed_batch_archived_and_reopened() {
    let dir = TempDir::new().unwrap();
    let store = FileArtifactStore::new(dir.path());
    let vault = SampleVault::new(Arc::new(PassthroughEncryptor));

    let stroke = StrokeNormalizer::new(16)
        .normalize(&common::horizontal_line())
        .unwrap();
    let samples = vec![LabeledSample::new(
        stroke,
        ShapeLabel::Line,
        SampleMetadata::new(SampleSource::Real),
    )];

    let batch = vault.archive(&samples, &store).await.unwrap();
    let saved = std::fs::read_dir(dir.path().join("samples")).unwrap().count();
    assert_eq!(saved, 1);
    let reopened = vault.open(&batch).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened[0].id, samples[0].id);
    assert_eq!(reopened[0].label, ShapeLabel::Line);
    assert_eq!(reopened[0].stroke.len(), 16);
}
