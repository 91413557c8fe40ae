//! The external wireframe generator seam (SPEC_FULL §11): out of scope per
//! §1, modeled as a narrow async trait at the integration boundary.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use loom_core::error::{LoomError, Result};

/// `(prompt) -> wireframe_json`, call-and-wait, out of scope for the core
/// (§6 external generator contract).
#[async_trait]
pub trait WireframeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Value>;
}

/// Builds the placeholder wireframe §4.4 mandates when generation
/// fails during session creation: "a container with a single text element
/// naming the original prompt".
pub fn placeholder_wireframe(prompt: &str) -> Value {
    json!({
        "type": "container",
        "elements": [
            {"id": "placeholder-1", "type": "text", "text": prompt}
        ],
        "children": [
            {"type": "text", "id": "placeholder-1", "text": prompt}
        ]
    })
}

/// A generator that always returns the placeholder wireframe. Used in
/// tests and as the documented create-path fallback.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderGenerator;

#[async_trait]
impl WireframeGenerator for PlaceholderGenerator {
    async fn generate(&self, prompt: &str) -> Result<Value> {
        Ok(placeholder_wireframe(prompt))
    }
}

/// Wraps any `WireframeGenerator` with a hard deadline
/// (`GENERATOR_TIMEOUT_SECONDS`, §5 suspension-point description).
pub struct TimeoutGenerator<G> {
    inner: G,
    timeout: Duration,
}

impl<G: WireframeGenerator> TimeoutGenerator<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<G: WireframeGenerator> WireframeGenerator for TimeoutGenerator<G> {
    async fn generate(&self, prompt: &str) -> Result<Value> {
        match tokio::time::timeout(self.timeout, self.inner.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "generator call timed out");
                Err(LoomError::generator("generator call timed out"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn placeholder_generator_names_the_prompt() {
        let generator = PlaceholderGenerator;
        let wireframe = generator.generate("a login form").await.unwrap();
        assert_eq!(wireframe["type"], "container");
        assert_eq!(wireframe["elements"][0]["text"], "a login form");
    }

    struct SlowGenerator;

    #[async_trait]
    impl WireframeGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str) -> Result<Value> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(json!({}))
        }
    }

    #[tokio::test]
    async fn timeout_generator_surfaces_generator_fault() {
        let generator = TimeoutGenerator::new(SlowGenerator, Duration::from_millis(5));
        let err = generator.generate("prompt").await.unwrap_err();
        assert!(matches!(err, LoomError::Generator(_)));
    }
}
