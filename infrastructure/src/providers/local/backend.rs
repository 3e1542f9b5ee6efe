//! Local backend adapter

use super::model::LocalModel;
use async_trait::async_trait;
use bridge_application::{BackendFault, InferenceBackend};
use bridge_domain::{BackendKind, BackendReply, BackendRequest};
use std::sync::Arc;
use tracing::{debug, error};

/// Runs a [`LocalModel`] off the async runtime.
///
/// Any model error, or a panic inside the model, is a fault: the local
/// model is assumed unusable afterwards.
pub struct LocalBackend {
    model: Arc<dyn LocalModel>,
}

impl LocalBackend {
    pub fn new(model: Arc<dyn LocalModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl InferenceBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn describe(&self) -> String {
        self.model.describe()
    }

    async fn complete(&self, request: &BackendRequest) -> Result<BackendReply, BackendFault> {
        let model = Arc::clone(&self.model);
        let request = request.clone();

        let outcome = tokio::task::spawn_blocking(move || model.generate(&request))
            .await
            .map_err(|e| {
                error!("Local inference worker crashed: {}", e);
                BackendFault::WorkerCrashed(e.to_string())
            })?;

        match outcome {
            Ok(text) => {
                debug!(chars = text.len(), "Local reply generated");
                Ok(BackendReply::Text(text))
            }
            Err(e) => {
                error!("Local model failed: {}", e);
                Err(BackendFault::Model(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::local::LocalModelError;
    use bridge_domain::{Request, SamplingConfig};
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<Vec<Result<String, LocalModelError>>>,
        seen: Mutex<Vec<BackendRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, LocalModelError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LocalModel for ScriptedModel {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        fn generate(&self, request: &BackendRequest) -> Result<String, LocalModelError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies.lock().unwrap().remove(0)
        }
    }

    struct PanickingModel;

    impl LocalModel for PanickingModel {
        fn describe(&self) -> String {
            "panicking".to_string()
        }

        fn generate(&self, _request: &BackendRequest) -> Result<String, LocalModelError> {
            panic!("native abort");
        }
    }

    fn request(query: &str) -> BackendRequest {
        BackendRequest::new(
            "You are JC-AI. Be brief.",
            &Request::from_raw(query).unwrap(),
            SamplingConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_generates_text() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(" Four.\n".to_string())]));
        let backend = LocalBackend::new(model.clone());

        let reply = backend.complete(&request("what is 2+2")).await.unwrap();
        assert_eq!(reply, BackendReply::Text(" Four.\n".to_string()));
        assert_eq!(backend.kind(), BackendKind::Local);
        assert_eq!(backend.describe(), "scripted");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].query, "what is 2+2");
        assert_eq!(seen[0].sampling.max_tokens, 50);
    }

    #[tokio::test]
    async fn test_model_error_is_fault() {
        let model = Arc::new(ScriptedModel::new(vec![Err(LocalModelError::Generation(
            "decode failed".to_string(),
        ))]));
        let backend = LocalBackend::new(model);

        let fault = backend.complete(&request("hello")).await.unwrap_err();
        assert!(matches!(fault, BackendFault::Model(ref m) if m.contains("decode failed")));
    }

    #[tokio::test]
    async fn test_panic_is_worker_crash() {
        let backend = LocalBackend::new(Arc::new(PanickingModel));

        let fault = backend.complete(&request("hello")).await.unwrap_err();
        assert!(matches!(fault, BackendFault::WorkerCrashed(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = LocalModelError::PromptTooLong {
            prompt: 600,
            context: 512,
        };
        assert_eq!(
            err.to_string(),
            "Prompt of 600 tokens does not fit a 512-token context"
        );
        assert!(LocalModelError::Unavailable.to_string().contains("llama"));
    }
}
