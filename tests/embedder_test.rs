mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use findings::config::EmbeddingConfig;
use findings::embedding::{
    create_provider, Embedder, EmbeddingOutput, EmbeddingProvider, ExtractOptions, Pooling,
};
use findings::RetrievalError;
use helpers::{embedder_with, StubProvider};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn every_output_shape_normalizes_to_a_flat_vector() {
    let expected = vec![0.1f32, 0.2, 0.3, 0.4];
    let shapes = [
        EmbeddingOutput::Tensor {
            data: expected.clone(),
            dims: vec![1, 4],
        },
        EmbeddingOutput::Nested(vec![expected.clone()]),
        EmbeddingOutput::Flat(expected.clone()),
        EmbeddingOutput::Json(json!([[0.1, 0.2, 0.3, 0.4]])),
    ];

    for shape in shapes {
        let vector = embedder_with(shape).embedding_vector("sepsis").await.unwrap();
        assert_eq!(vector.len(), expected.len());
        for (a, b) in vector.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_use_initializes_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let embedder = Arc::new(Embedder::with_factory(ExtractOptions::default(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        // Simulate a slow model load so callers overlap.
        std::thread::sleep(std::time::Duration::from_millis(50));
        Ok(Arc::new(StubProvider::returning(EmbeddingOutput::Flat(vec![0.6, 0.8])))
            as Arc<dyn EmbeddingProvider>)
    }));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let embedder = Arc::clone(&embedder);
            tokio::spawn(async move { embedder.embedding_vector(&format!("query {i}")).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), vec![0.6, 0.8]);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_first_caller_does_not_restart_initialization() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let embedder = Arc::new(Embedder::with_factory(ExtractOptions::default(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(300));
        Ok(Arc::new(StubProvider::returning(EmbeddingOutput::Flat(vec![0.6, 0.8])))
            as Arc<dyn EmbeddingProvider>)
    }));

    let first = {
        let embedder = Arc::clone(&embedder);
        tokio::spawn(async move { embedder.embedding_vector("syncope").await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    first.abort();
    assert!(first.await.unwrap_err().is_cancelled());

    let vector = embedder.embedding_vector("syncope").await.unwrap();
    assert_eq!(vector, vec![0.6, 0.8]);
    assert!(embedder.is_initialized());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_provider_surfaces_as_embedding_error() {
    let config = EmbeddingConfig {
        provider: "cloud-magic".into(),
        ..EmbeddingConfig::default()
    };
    assert!(create_provider(&config).is_err());

    let embedder = Embedder::new(&config);
    let err = embedder.embedding_vector("x").await.unwrap_err();
    assert!(matches!(err, RetrievalError::Embedding(ref m) if m.contains("cloud-magic")));
}

#[tokio::test]
async fn local_provider_without_model_files_fails_cleanly() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = EmbeddingConfig {
        cache_dir: tmp.path().to_string_lossy().into_owned(),
        ..EmbeddingConfig::default()
    };

    let err = Embedder::new(&config).embedding_vector("x").await.unwrap_err();
    assert!(err.to_string().contains("findings model download"), "got {err}");
}

#[tokio::test]
async fn remote_provider_posts_inputs_and_coerces_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pipeline/feature-extraction"))
        .and(header("authorization", "Bearer hf-test"))
        .and(body_json(json!({ "inputs": "atrial fibrillation", "normalize": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[0.25, -0.5, 0.75]])))
        .expect(1)
        .mount(&server)
        .await;

    let config = EmbeddingConfig {
        provider: "remote".into(),
        endpoint: format!("{}/pipeline/feature-extraction", server.uri()),
        api_token: Some("hf-test".into()),
        ..EmbeddingConfig::default()
    };

    let embedder = Embedder::new(&config);
    let vector = embedder.embedding_vector("atrial fibrillation").await.unwrap();
    assert_eq!(vector, vec![0.25, -0.5, 0.75]);
}

#[tokio::test]
async fn remote_provider_http_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let config = EmbeddingConfig {
        provider: "remote".into(),
        endpoint: server.uri(),
        ..EmbeddingConfig::default()
    };
    let provider = create_provider(&config).unwrap();
    let options = ExtractOptions {
        pooling: Pooling::Mean,
        normalize: false,
    };
    let err = provider.extract("x", &options).await.unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("429") && message.contains("rate limited"), "got {message}");
}

#[test]
fn remote_provider_requires_endpoint() {
    let config = EmbeddingConfig {
        provider: "remote".into(),
        ..EmbeddingConfig::default()
    };
    assert!(create_provider(&config).is_err());
}

#[tokio::test]
async fn remote_provider_honours_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([0.1, 0.2]))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = EmbeddingConfig {
        provider: "remote".into(),
        endpoint: server.uri(),
        timeout_secs: 1,
        ..EmbeddingConfig::default()
    };
    let started = std::time::Instant::now();
    let err = Embedder::new(&config).embedding_vector("x").await.unwrap_err();
    assert!(matches!(err, RetrievalError::Embedding(_)), "got {err:?}");
    assert!(started.elapsed() < std::time::Duration::from_secs(4));
}
