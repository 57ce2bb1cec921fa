//! Tokenizer adapter
//!
//! Wraps a pretrained `tokenizers::Tokenizer` and turns a batch of strings
//! into padded id and attention-mask matrices.

use crate::config::TokenizerConfig;
use crate::model_loader::resolve_tokenizer_path;
use candle_core::{Device, Tensor};
use emocheck_core::{Error, Result};
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

/// Padded token ids and attention mask for a batch, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBatch {
    ids: Vec<u32>,
    mask: Vec<u32>,
    batch_size: usize,
    seq_len: usize,
}

impl TokenBatch {
    /// Number of sequences
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Padded length shared by every row
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Ids of one row, padding included
    pub fn ids(&self, row: usize) -> &[u32] {
        &self.ids[row * self.seq_len..(row + 1) * self.seq_len]
    }

    /// Mask of one row: 1 for real tokens, 0 for padding
    pub fn mask(&self, row: usize) -> &[u32] {
        &self.mask[row * self.seq_len..(row + 1) * self.seq_len]
    }

    /// `[batch, length]` u32 tensor of ids
    pub fn ids_tensor(&self, device: &Device) -> candle_core::Result<Tensor> {
        Tensor::from_slice(&self.ids, (self.batch_size, self.seq_len), device)
    }

    /// `[batch, length]` u32 tensor of the attention mask
    pub fn mask_tensor(&self, device: &Device) -> candle_core::Result<Tensor> {
        Tensor::from_slice(&self.mask, (self.batch_size, self.seq_len), device)
    }
}

/// Pretrained subword tokenizer with padding and truncation applied
#[derive(Clone)]
pub struct TokenizerAdapter {
    tokenizer: Tokenizer,
    pad_id: u32,
    vocab_size: usize,
}

impl TokenizerAdapter {
    /// Resolve the configured source (downloading if needed) and load it
    pub fn load(config: &TokenizerConfig) -> Result<Self> {
        let path = resolve_tokenizer_path(&config.source)?;
        Self::from_path(&path, config)
    }

    /// Load from `tokenizer.json`, `vocab.txt`, or a directory holding either
    pub fn from_path(path: &Path, config: &TokenizerConfig) -> Result<Self> {
        let tokenizer = read_tokenizer(path)?;
        Self::new(tokenizer, config)
    }

    /// Configure padding and truncation on an already-built tokenizer
    pub fn new(mut tokenizer: Tokenizer, config: &TokenizerConfig) -> Result<Self> {
        // the tokenizer's own padding setup takes precedence over the configured token
        let pad_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id(&config.pad_token))
            .ok_or_else(|| {
                Error::tokenizer(format!(
                    "Tokenizer has no padding token '{}' and no padding configuration",
                    config.pad_token
                ))
            })?;
        let pad_token = tokenizer
            .id_to_token(pad_id)
            .unwrap_or_else(|| config.pad_token.clone());

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id,
            pad_token,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..Default::default()
            }))
            .map_err(|e| Error::tokenizer(format!("Failed to configure truncation: {}", e)))?;

        let vocab_size = tokenizer.get_vocab_size(false);
        info!(
            "Tokenizer ready (vocab_size={}, pad_id={}, max_length={})",
            vocab_size, pad_id, config.max_length
        );

        Ok(Self {
            tokenizer,
            pad_id,
            vocab_size,
        })
    }

    /// Reserved id used to fill sequences to the batch length
    pub fn pad_id(&self) -> u32 {
        self.pad_id
    }

    /// Base vocabulary size, i.e. the embedding table's row count
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Tokenize a batch, padding every row to the longest one.
    ///
    /// A batch whose rows are all empty is padded to length 1 so downstream
    /// layers always see at least one position.
    pub fn tokenize<S: AsRef<str>>(&self, texts: &[S]) -> Result<TokenBatch> {
        let inputs: Vec<&str> = texts.iter().map(|t| t.as_ref()).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| Error::tokenizer(format!("Tokenization failed: {}", e)))?;

        let batch_size = encodings.len();
        let seq_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);

        if seq_len == 0 {
            debug!("All {} inputs tokenized to nothing; using a single pad position", batch_size);
            return Ok(TokenBatch {
                ids: vec![self.pad_id; batch_size],
                mask: vec![0; batch_size],
                batch_size,
                seq_len: batch_size.min(1),
            });
        }

        let mut ids = Vec::with_capacity(batch_size * seq_len);
        let mut mask = Vec::with_capacity(batch_size * seq_len);
        for encoding in &encodings {
            if encoding.len() != seq_len {
                return Err(Error::tokenizer(format!(
                    "Padded encoding has length {} but the batch length is {}",
                    encoding.len(),
                    seq_len
                )));
            }
            ids.extend_from_slice(encoding.get_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        debug!("Tokenized batch of {} into length {}", batch_size, seq_len);
        Ok(TokenBatch {
            ids,
            mask,
            batch_size,
            seq_len,
        })
    }
}

fn read_tokenizer(path: &Path) -> Result<Tokenizer> {
    if path.is_dir() {
        let tokenizer_json = path.join("tokenizer.json");
        if tokenizer_json.exists() {
            return read_tokenizer(&tokenizer_json);
        }
        let vocab_txt = path.join("vocab.txt");
        if vocab_txt.exists() {
            return read_tokenizer(&vocab_txt);
        }
        return Err(Error::tokenizer(format!(
            "No tokenizer found in {} (tried tokenizer.json, vocab.txt)",
            path.display()
        )));
    }

    if path.extension().and_then(|e| e.to_str()) == Some("txt") {
        debug!("Building WordPiece tokenizer from {}", path.display());
        return wordpiece_from_vocab(path);
    }

    debug!("Loading tokenizer from {}", path.display());
    Tokenizer::from_file(path).map_err(|e| {
        Error::tokenizer(format!(
            "Failed to load tokenizer from {}: {}",
            path.display(),
            e
        ))
    })
}

/// BERT-style uncased tokenizer assembled from a bare `vocab.txt`
fn wordpiece_from_vocab(vocab_path: &Path) -> Result<Tokenizer> {
    use tokenizers::models::wordpiece::WordPiece;
    use tokenizers::normalizers::BertNormalizer;
    use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
    use tokenizers::processors::bert::BertProcessing;

    let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
        .unk_token("[UNK]".to_string())
        .build()
        .map_err(|e| Error::tokenizer(format!("Failed to build WordPiece model: {}", e)))?;

    let mut tokenizer = Tokenizer::new(wordpiece);
    tokenizer.with_normalizer(Some(BertNormalizer::default()));
    tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));

    let special = |token: &str| {
        tokenizer
            .token_to_id(token)
            .map(|id| (token.to_string(), id))
            .ok_or_else(|| Error::tokenizer(format!("vocab.txt has no {} token", token)))
    };
    let sep = special("[SEP]")?;
    let cls = special("[CLS]")?;
    tokenizer.with_post_processor(Some(BertProcessing::new(sep, cls)));

    Ok(tokenizer)
}
