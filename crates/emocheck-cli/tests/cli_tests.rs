//! End-to-end runs of the `emocheck` binary against offline artifacts

use assert_cmd::Command;
use candle_core::{DType, Device, Tensor};
use emocheck_classifiers::model_loader::expected_shapes;
use emocheck_classifiers::ArchitectureConfig;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

const VOCAB: &[&str] = &[
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "i", "am", "so", "happy", "today",
];

const LABELS: [&str; 6] = ["sadness", "joy", "love", "anger", "fear", "surprise"];

fn write_artifacts(dir: &Path) -> (PathBuf, PathBuf) {
    let vocab_path = dir.join("vocab.txt");
    let mut vocab = std::fs::File::create(&vocab_path).unwrap();
    for token in VOCAB {
        writeln!(vocab, "{}", token).unwrap();
    }

    let arch = ArchitectureConfig::default();
    let mut tensors: HashMap<String, Tensor> = expected_shapes(&arch, VOCAB.len())
        .into_iter()
        .map(|(name, shape)| (name, Tensor::randn(0f32, 0.5, shape, &Device::Cpu).unwrap()))
        .collect();
    // a clean artifact keeps stderr quiet
    let zeros = Tensor::zeros((1, arch.embedding_dim), DType::F32, &Device::Cpu).unwrap();
    let table = tensors["embedding.weight"]
        .slice_assign(&[0..1, 0..arch.embedding_dim], &zeros)
        .unwrap();
    tensors.insert("embedding.weight".to_string(), table);
    let model_path = dir.join("emotion_cnn_model.safetensors");
    candle_core::safetensors::save(&tensors, &model_path).unwrap();

    (model_path, vocab_path)
}

fn emocheck(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("emocheck").unwrap();
    cmd.current_dir(dir)
        .env_remove("EMOCHECK_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_text_output() {
    let dir = tempfile::tempdir().unwrap();
    let (model, vocab) = write_artifacts(dir.path());

    let assert = emocheck(dir.path())
        .args(["--text", "I am so happy today", "--device", "cpu"])
        .arg("--model")
        .arg(&model)
        .arg("--tokenizer")
        .arg(&vocab)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "");
    let predicted = lines[1].strip_prefix("Predicted: ").unwrap();
    assert!(LABELS.contains(&predicted));
    assert_eq!(lines[2], "Confidence:");

    let mut total = 0.0f32;
    for (line, label) in lines[3..].iter().zip(LABELS) {
        let value = line.strip_prefix(&format!("  {}: ", label)).unwrap();
        assert_eq!(value.split('.').nth(1).map(str::len), Some(4));
        total += value.parse::<f32>().unwrap();
    }
    assert_eq!(lines.len(), 3 + LABELS.len());
    assert!((total - 1.0).abs() < 1e-3);
}

#[test]
fn test_stderr_is_quiet_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let (model, vocab) = write_artifacts(dir.path());

    let assert = emocheck(dir.path())
        .args(["--text", "happy", "--device", "cpu"])
        .arg("--model")
        .arg(&model)
        .arg("--tokenizer")
        .arg(&vocab)
        .assert()
        .success();
    assert!(
        assert.get_output().stderr.is_empty(),
        "{}",
        String::from_utf8_lossy(&assert.get_output().stderr)
    );

    let assert = emocheck(dir.path())
        .args(["--text", "happy", "--device", "cpu", "--verbose"])
        .arg("--model")
        .arg(&model)
        .arg("--tokenizer")
        .arg(&vocab)
        .assert()
        .success();
    assert!(!assert.get_output().stderr.is_empty());
}

#[test]
fn test_json_output_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let (model, vocab) = write_artifacts(dir.path());
    std::fs::write(
        dir.path().join("emocheck.yaml"),
        format!(
            "model:\n  path: {}\n  name: tiny\ntokenizer:\n  source:\n    type: local\n    path: {}\ninference:\n  device: cpu\n",
            model.display(),
            vocab.display()
        ),
    )
    .unwrap();

    let assert = emocheck(dir.path())
        .args(["--text", "happy", "--format", "json"])
        .assert()
        .success();

    let value: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(value["model"], "tiny");
    assert!(LABELS.contains(&value["label"].as_str().unwrap()));
    assert_eq!(value["confidence"].as_object().unwrap().len(), LABELS.len());
}

#[test]
fn test_missing_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, vocab) = write_artifacts(dir.path());

    let assert = emocheck(dir.path())
        .args(["--text", "hello", "--model", "missing.safetensors", "--device", "cpu"])
        .arg("--tokenizer")
        .arg(&vocab)
        .assert()
        .failure();

    let output = assert.get_output();
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.safetensors"));
}

#[test]
fn test_empty_text_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    emocheck(dir.path())
        .args(["--text", ""])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_missing_text_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    emocheck(dir.path()).assert().failure().code(2);
}
