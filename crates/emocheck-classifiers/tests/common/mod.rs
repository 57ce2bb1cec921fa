//! Offline fixtures: a tiny vocabulary and randomly initialised weights
//! with the reference architecture.

#![allow(dead_code)]

use candle_core::{DType, Device, Tensor};
use emocheck_classifiers::model_loader::expected_shapes;
use emocheck_classifiers::{
    ArchitectureConfig, DeviceSpec, EmocheckConfig, ModelConfig, TokenizerConfig, TokenizerSource,
};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const VOCAB: &[&str] = &[
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "i", "am", "so", "happy", "today", "sad", "angry", "love",
    "you", "scared", "wow", "not", "feel", "really", "what", "a", "surprise",
];

/// Model and tokenizer artifacts written to a temporary directory
pub struct Fixture {
    pub dir: TempDir,
    pub tokenizer_path: PathBuf,
    pub model_path: PathBuf,
}

impl Fixture {
    /// WordPiece `vocab.txt` tokenizer and well-formed weights
    pub fn new() -> Self {
        Self::with_tensors(|_| {})
    }

    /// Same as [`Fixture::new`] but lets the caller tamper with the tensors first
    pub fn with_tensors(tamper: impl FnOnce(&mut HashMap<String, Tensor>)) -> Self {
        Self::build("emotion_cnn_model.safetensors", tamper, |tensors, path| {
            candle_core::safetensors::save(tensors, path).unwrap()
        })
    }

    /// Weights saved as a PyTorch `state_dict` checkpoint (`emotion_cnn_model.pt`)
    pub fn pytorch_with_tensors(tamper: impl FnOnce(&mut HashMap<String, Tensor>)) -> Self {
        Self::build("emotion_cnn_model.pt", tamper, write_torch_state_dict)
    }

    fn build(
        model_file: &str,
        tamper: impl FnOnce(&mut HashMap<String, Tensor>),
        save: impl FnOnce(&HashMap<String, Tensor>, &Path),
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let tokenizer_path = dir.path().join("vocab.txt");
        let mut vocab = std::fs::File::create(&tokenizer_path).unwrap();
        for token in VOCAB {
            writeln!(vocab, "{}", token).unwrap();
        }

        let mut tensors = reference_tensors(VOCAB.len());
        tamper(&mut tensors);

        let model_path = dir.path().join(model_file);
        save(&tensors, &model_path);

        Self {
            dir,
            tokenizer_path,
            model_path,
        }
    }

    /// Writes a whitespace WordLevel `tokenizer.json`, which adds no special tokens
    pub fn write_word_level_tokenizer(&self) -> PathBuf {
        let vocab: serde_json::Map<String, serde_json::Value> = VOCAB
            .iter()
            .enumerate()
            .map(|(id, token)| (token.to_string(), serde_json::json!(id)))
            .collect();

        let tokenizer = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": { "type": "Lowercase" },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let path = self.dir.path().join("tokenizer.json");
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer).unwrap()).unwrap();
        path
    }

    /// CPU configuration pointing at the fixture artifacts
    pub fn config(&self) -> EmocheckConfig {
        let mut config = EmocheckConfig {
            model: ModelConfig {
                path: self.model_path.clone(),
                ..Default::default()
            },
            tokenizer: TokenizerConfig {
                source: TokenizerSource::Local {
                    path: self.tokenizer_path.clone(),
                },
                ..Default::default()
            },
            ..Default::default()
        };
        config.inference.device = DeviceSpec::Cpu;
        config
    }
}

/// Random weights in the reference shapes, padding row zeroed
pub fn reference_tensors(vocab_size: usize) -> HashMap<String, Tensor> {
    let dev = Device::Cpu;
    let arch = ArchitectureConfig::default();

    let mut tensors: HashMap<String, Tensor> = expected_shapes(&arch, vocab_size)
        .into_iter()
        .map(|(name, shape)| {
            let tensor = Tensor::randn(0f32, 0.5, shape, &dev).unwrap();
            (name, tensor)
        })
        .collect();

    let table = &tensors["embedding.weight"];
    let zeros = Tensor::zeros((1, arch.embedding_dim), DType::F32, &dev).unwrap();
    let table = table
        .slice_assign(&[0..1, 0..arch.embedding_dim], &zeros)
        .unwrap();
    tensors.insert("embedding.weight".to_string(), table);
    tensors
}

/// Writes f32 tensors in the zip layout produced by `torch.save(model.state_dict(), path)`:
/// `archive/data.pkl` holds an `OrderedDict` of `_rebuild_tensor_v2` calls whose
/// storages live in `archive/data/<key>` as raw little-endian floats.
pub fn write_torch_state_dict(tensors: &HashMap<String, Tensor>, path: &Path) {
    let mut names: Vec<&String> = tensors.keys().collect();
    names.sort();

    let mut pickle = vec![0x80, 2];
    pickle.extend_from_slice(b"ccollections\nOrderedDict\n)R(");
    for (key, name) in names.iter().enumerate() {
        let dims = tensors[*name].dims();
        let numel: usize = dims.iter().product();

        push_unicode(&mut pickle, name);
        pickle.extend_from_slice(b"ctorch._utils\n_rebuild_tensor_v2\n(");

        // persistent id of the storage: ('storage', FloatStorage, key, 'cpu', numel)
        pickle.push(b'(');
        push_unicode(&mut pickle, "storage");
        pickle.extend_from_slice(b"ctorch\nFloatStorage\n");
        push_unicode(&mut pickle, &key.to_string());
        push_unicode(&mut pickle, "cpu");
        push_int(&mut pickle, numel);
        pickle.extend_from_slice(b"tQ");

        push_int(&mut pickle, 0);
        push_tuple(&mut pickle, dims);
        push_tuple(&mut pickle, &contiguous_strides(dims));
        pickle.push(0x89);
        pickle.extend_from_slice(b"ccollections\nOrderedDict\n)R");
        pickle.extend_from_slice(b"tR");
    }
    pickle.extend_from_slice(b"u.");

    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    zip.start_file("archive/data.pkl", options).unwrap();
    zip.write_all(&pickle).unwrap();
    zip.start_file("archive/version", options).unwrap();
    zip.write_all(b"3\n").unwrap();

    for (key, name) in names.iter().enumerate() {
        let values: Vec<f32> = tensors[*name].flatten_all().unwrap().to_vec1().unwrap();
        zip.start_file(format!("archive/data/{}", key), options).unwrap();
        for value in values {
            zip.write_all(&value.to_le_bytes()).unwrap();
        }
    }
    zip.finish().unwrap();
}

fn push_unicode(out: &mut Vec<u8>, value: &str) {
    out.push(b'X');
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value.as_bytes());
}

fn push_int(out: &mut Vec<u8>, value: usize) {
    out.push(b'J');
    out.extend_from_slice(&(value as i32).to_le_bytes());
}

fn push_tuple(out: &mut Vec<u8>, values: &[usize]) {
    out.push(b'(');
    for value in values {
        push_int(out, *value);
    }
    out.push(b't');
}

fn contiguous_strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; dims.len()];
    for i in (0..dims.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * dims[i + 1];
    }
    strides
}
