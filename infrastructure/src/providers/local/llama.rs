//! llama.cpp engine for GGUF models

use super::model::{LocalModel, LocalModelError, LocalModelParams, generation_budget};
use bridge_domain::{BackendRequest, SamplingConfig};
use llama_cpp_2::{
    context::params::LlamaContextParams,
    llama_backend::LlamaBackend,
    llama_batch::LlamaBatch,
    model::{AddBos, LlamaChatMessage, LlamaModel, Special, params::LlamaModelParams},
    sampling::LlamaSampler,
};
use std::num::NonZeroU32;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Tokens considered by the repetition penalty.
const PENALTY_WINDOW: i32 = 64;

/// Temperature used when sampling is enabled but none is configured.
const DEFAULT_TEMPERATURE: f32 = 0.8;

/// A GGUF model loaded once and shared by every session.
///
/// Each request gets a fresh context; `generation` serializes them so
/// only one decode runs at a time.
pub struct LlamaCppModel {
    backend: LlamaBackend,
    model: LlamaModel,
    params: LocalModelParams,
    generation: Mutex<()>,
}

impl LlamaCppModel {
    pub fn load(params: LocalModelParams) -> Result<Self, LocalModelError> {
        let load_error = |message: String| LocalModelError::Load {
            path: params.model_path.clone(),
            message,
        };

        let backend = LlamaBackend::init().map_err(|e| load_error(e.to_string()))?;
        let model = LlamaModel::load_from_file(&backend, &params.model_path, &LlamaModelParams::default())
            .map_err(|e| load_error(e.to_string()))?;

        info!(
            path = %params.model_path.display(),
            context = params.context_size,
            threads = params.threads,
            "Loaded local model"
        );

        Ok(Self {
            backend,
            model,
            params,
            generation: Mutex::new(()),
        })
    }

    fn prompt(&self, request: &BackendRequest) -> String {
        let messages = [("system", &request.system_prompt), ("user", &request.query)]
            .into_iter()
            .map(|(role, content)| LlamaChatMessage::new(role.to_string(), content.clone()))
            .collect::<Result<Vec<_>, _>>();

        let templated = messages.ok().and_then(|messages| {
            let template = self.model.chat_template(None).ok()?;
            self.model
                .apply_chat_template(&template, &messages, true)
                .ok()
        });

        templated.unwrap_or_else(|| {
            format!(
                "System: {}\nUser: {}\nAssistant:",
                request.system_prompt, request.query
            )
        })
    }

    fn sampler(sampling: &SamplingConfig) -> LlamaSampler {
        let mut stages = Vec::new();

        if let Some(penalty) = sampling.repeat_penalty {
            stages.push(LlamaSampler::penalties(PENALTY_WINDOW, penalty, 0.0, 0.0));
        }

        let temperature = sampling.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if temperature <= f32::EPSILON {
            stages.push(LlamaSampler::greedy());
            return LlamaSampler::chain_simple(stages);
        }

        if let Some(top_p) = sampling.top_p {
            stages.push(LlamaSampler::top_p(top_p, 1));
        }
        stages.push(LlamaSampler::temp(temperature));

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        stages.push(LlamaSampler::dist(seed));

        LlamaSampler::chain_simple(stages)
    }
}

impl LocalModel for LlamaCppModel {
    fn describe(&self) -> String {
        format!(
            "{} (ctx {}, {} threads)",
            self.params.model_path.display(),
            self.params.context_size,
            self.params.threads
        )
    }

    fn generate(&self, request: &BackendRequest) -> Result<String, LocalModelError> {
        let _guard = self
            .generation
            .lock()
            .map_err(|_| LocalModelError::Generation("generation lock poisoned".to_string()))?;

        let threads = i32::try_from(self.params.threads).unwrap_or(i32::MAX);
        let context_params = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(self.params.context_size))
            .with_n_threads(threads)
            .with_n_threads_batch(threads);
        let mut context = self
            .model
            .new_context(&self.backend, context_params)
            .map_err(|e| LocalModelError::Context(e.to_string()))?;

        let prompt = self.prompt(request);
        let tokens = self
            .model
            .str_to_token(&prompt, AddBos::Always)
            .map_err(|e| LocalModelError::Generation(e.to_string()))?;

        let budget = generation_budget(tokens.len(), context.n_ctx(), request.sampling.max_tokens)?;

        let mut batch = LlamaBatch::new(tokens.len(), 1);
        let last = tokens.len() - 1;
        for (i, token) in tokens.iter().enumerate() {
            batch
                .add(*token, i as i32, &[0], i == last)
                .map_err(|e| LocalModelError::Generation(e.to_string()))?;
        }
        context
            .decode(&mut batch)
            .map_err(|e| LocalModelError::Generation(e.to_string()))?;

        let mut sampler = Self::sampler(&request.sampling);
        let mut position = tokens.len() as i32;
        let mut output = Vec::new();

        for _ in 0..budget {
            let token = sampler.sample(&context, batch.n_tokens() - 1);
            sampler.accept(token);

            if self.model.is_eog_token(token) {
                break;
            }

            let bytes = self
                .model
                .token_to_bytes(token, Special::Tokenize)
                .map_err(|e| LocalModelError::Generation(e.to_string()))?;
            output.extend_from_slice(&bytes);

            batch.clear();
            batch
                .add(token, position, &[0], true)
                .map_err(|e| LocalModelError::Generation(e.to_string()))?;
            position += 1;

            context
                .decode(&mut batch)
                .map_err(|e| LocalModelError::Generation(e.to_string()))?;
        }

        debug!(
            prompt_tokens = tokens.len(),
            generated_bytes = output.len(),
            "Local generation finished"
        );

        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}
