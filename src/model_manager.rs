use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use kdam::BarExt;
use tokenizers::{
    PaddingParams,
    PaddingStrategy,
    Tokenizer,
    TruncationParams,
};

use crate::{
    embedding::{Embedding, SentenceEncoder},
    error::{Error, Result},
};

pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const MODEL_ENV_VAR: &str = "CLAIMMATCH_MODEL";
pub const DEFAULT_BATCH_SIZE: usize = 32;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Select the best available compute device.
///
/// Uses CUDA when compiled with the `cuda` feature, Metal when compiled with
/// the `metal` feature, and falls back to CPU otherwise.
fn default_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            return device;
        }
    }

    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            return device;
        }
    }

    Device::Cpu
}

struct LoadedModel {
    bert: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Manages the sentence encoder lifecycle, supporting lazy loading on first
/// use.
pub struct ModelManager {
    model: Option<LoadedModel>,
    model_id: String,
    batch_size: usize,
    show_progress: bool,
}

impl ModelManager {
    /// Creates a `ModelManager` for a Hugging Face repo id or a local
    /// directory holding `config.json`, `tokenizer.json` and
    /// `model.safetensors`.
    ///
    /// Nothing is loaded until the first call to `encode`.
    pub fn with_model_id(model_id: String) -> Self {
        Self {
            model: None,
            model_id,
            batch_size: DEFAULT_BATCH_SIZE,
            show_progress: true,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Returns `true` if the model has already been loaded into memory.
    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Ensures the model is loaded, downloading from HuggingFace Hub if needed.
    fn ensure_loaded(&mut self) -> Result<&LoadedModel> {
        if self.model.is_none() {
            tracing::info!(model = %self.model_id, "loading sentence encoder");
            let loaded = load_model(&self.model_id).map_err(|reason| {
                Error::ModelLoad {
                    model: self.model_id.clone(),
                    reason,
                }
            })?;
            self.model = Some(loaded);
        }

        self.model.as_ref().ok_or_else(|| Error::ModelLoad {
            model: self.model_id.clone(),
            reason: "model unavailable after loading".to_string(),
        })
    }
}

impl SentenceEncoder for ModelManager {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn encode(&mut self, texts: &[String]) -> Result<Vec<Embedding>> {
        let batch_size = self.batch_size;
        let show_progress = self.show_progress;
        let model = self.ensure_loaded()?;

        let batches = texts.len().div_ceil(batch_size);
        let mut bar = kdam::tqdm!(
            total = batches,
            desc = "Encoding",
            unit = " batch",
            disable = !show_progress
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(batch_size) {
            embeddings.extend(encode_batch(model, chunk)?);
            let _ = bar.update(1);
        }
        if show_progress {
            eprintln!();
        }

        Ok(embeddings)
    }
}

/// Run one padded batch through the encoder and mean-pool the token states.
fn encode_batch(model: &LoadedModel, texts: &[String]) -> Result<Vec<Embedding>> {
    let encodings = model
        .tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| Error::Encode(format!("tokenization failed: {e}")))?;

    let mut ids = Vec::with_capacity(encodings.len());
    let mut type_ids = Vec::with_capacity(encodings.len());
    let mut masks = Vec::with_capacity(encodings.len());
    for encoding in &encodings {
        ids.push(Tensor::new(encoding.get_ids(), &model.device)?);
        type_ids.push(Tensor::new(encoding.get_type_ids(), &model.device)?);
        masks.push(Tensor::new(encoding.get_attention_mask(), &model.device)?);
    }

    let input_ids = Tensor::stack(&ids, 0)?;
    let token_type_ids = Tensor::stack(&type_ids, 0)?;
    let attention_mask = Tensor::stack(&masks, 0)?;

    // hidden: [batch, tokens, hidden]
    let hidden =
        model
            .bert
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

    let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.maximum(1e-9)?;
    let pooled = summed.broadcast_div(&counts)?;

    Ok(pooled.to_vec2::<f32>()?)
}

fn load_model(model_id: &str) -> std::result::Result<LoadedModel, String> {
    let (config_path, tokenizer_path, weights_path) = resolve_files(model_id)?;

    let config_text = std::fs::read_to_string(&config_path)
        .map_err(|e| format!("cannot read {}: {e}", config_path.display()))?;
    let config: BertConfig = serde_json::from_str(&config_text)
        .map_err(|e| format!("unsupported model config: {e}"))?;

    let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| format!("cannot load tokenizer: {e}"))?;
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        ..Default::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: config.max_position_embeddings,
            ..Default::default()
        }))
        .map_err(|e| format!("cannot configure truncation: {e}"))?;

    let device = default_device();
    // SAFETY: the weights file is not modified while mapped.
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(
            &[weights_path],
            DType::F32,
            &device,
        )
    }
    .map_err(|e| format!("cannot map weights: {e}"))?;
    let bert = BertModel::load(vb, &config)
        .map_err(|e| format!("cannot build model: {e}"))?;

    tracing::debug!(?device, hidden = config.hidden_size, "model ready");
    Ok(LoadedModel {
        bert,
        tokenizer,
        device,
    })
}

/// Locate the model files, either in a local directory or through the HF
/// cache (downloading on a miss).
fn resolve_files(
    model_id: &str,
) -> std::result::Result<(PathBuf, PathBuf, PathBuf), String> {
    let local = Path::new(model_id);
    if local.is_dir() {
        let files = (
            local.join(CONFIG_FILE),
            local.join(TOKENIZER_FILE),
            local.join(WEIGHTS_FILE),
        );
        for path in [&files.0, &files.1, &files.2] {
            if !path.is_file() {
                return Err(format!("missing {}", path.display()));
            }
        }
        return Ok(files);
    }

    let api = hf_hub::api::sync::Api::new()
        .map_err(|e| format!("cannot reach Hugging Face Hub: {e}"))?;
    let repo = api.model(model_id.to_string());
    let fetch = |name: &str| {
        repo.get(name).map_err(|e| format!("cannot fetch {name}: {e}"))
    };
    Ok((
        fetch(CONFIG_FILE)?,
        fetch(TOKENIZER_FILE)?,
        fetch(WEIGHTS_FILE)?,
    ))
}
