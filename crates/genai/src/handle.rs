//! Once-initialized shared model handle.
//!
//! The adapter is built lazily on the first turn that needs it and then
//! reused for the process lifetime. It holds connection state only, so a
//! single instance is safe to share across concurrent turns; all
//! conversation context travels in the request.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::google::GeminiModel;
use crate::traits::DialogueModel;
use ll_domain::config::GenAiConfig;
use ll_domain::error::Result;

/// Lazily-initialized handle to the generative model.
pub struct ModelHandle {
    config: GenAiConfig,
    cell: OnceCell<Arc<dyn DialogueModel>>,
}

impl ModelHandle {
    /// A handle that will build a [`GeminiModel`] from `config` on first use.
    pub fn new(config: GenAiConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// A handle pre-seeded with an existing model. Used by tests to inject
    /// scripted models; never touches the network.
    pub fn with_model(model: Arc<dyn DialogueModel>) -> Self {
        let cell = OnceCell::new();
        cell.set(model).ok();
        Self {
            config: GenAiConfig::default(),
            cell,
        }
    }

    /// The shared model, building it on first call.
    ///
    /// A failed initialization (e.g. missing API key) is not cached, so a
    /// later call can succeed once the environment is fixed.
    pub async fn get(&self) -> Result<Arc<dyn DialogueModel>> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                let model = GeminiModel::from_config(&self.config)?;
                tracing::info!(model = %model.model_id(), "generative model initialized");
                Ok::<_, ll_domain::error::Error>(Arc::new(model) as Arc<dyn DialogueModel>)
            })
            .await?;
        Ok(model.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DialogueRequest;
    use ll_domain::dialogue::{Completion, CompletionStatus};

    struct FixedModel;

    #[async_trait::async_trait]
    impl DialogueModel for FixedModel {
        async fn complete(&self, _req: &DialogueRequest) -> Result<Completion> {
            Ok(Completion {
                text: "ok".into(),
                status: CompletionStatus::NormalStop,
            })
        }

        fn model_id(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn preseeded_handle_returns_same_instance() {
        let handle = ModelHandle::with_model(Arc::new(FixedModel));
        let a = handle.get().await.unwrap();
        let b = handle.get().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.model_id(), "fixed");
    }

    #[tokio::test]
    async fn failed_init_is_not_cached() {
        let config = GenAiConfig {
            api_key: None,
            api_key_env: "LL_TEST_HANDLE_MISSING_KEY".into(),
            ..Default::default()
        };
        let handle = ModelHandle::new(config);

        assert!(handle.get().await.is_err());

        // Key appears later; the handle initializes on retry.
        std::env::set_var("LL_TEST_HANDLE_MISSING_KEY", "now-present");
        assert!(handle.get().await.is_ok());
        std::env::remove_var("LL_TEST_HANDLE_MISSING_KEY");
    }
}
