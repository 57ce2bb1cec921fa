use clap::{Parser, ValueEnum};
use emocheck_classifiers::{DeviceSpec, PoolingMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "emocheck")]
#[command(
    author,
    version,
    about = "Classify the emotion expressed in a piece of text"
)]
pub struct Cli {
    /// Text to classify
    #[arg(long, value_parser = parse_text)]
    pub text: String,

    /// Model weights (.safetensors, or a PyTorch .pt/.pth/.bin state dict)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Tokenizer: path to tokenizer.json / vocab.txt, or a Hugging Face Hub id
    #[arg(long)]
    pub tokenizer: Option<String>,

    /// Compute device: auto, cpu, cuda[:N] or metal[:N]
    #[arg(long, value_parser = parse_device)]
    pub device: Option<DeviceSpec>,

    /// Pooling over positions: mean or masked-mean
    #[arg(long, value_parser = parse_pooling)]
    pub pooling: Option<PoolingMode>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Configuration file (YAML)
    #[arg(short, long, env = "EMOCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn parse_text(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("text must not be empty".to_string());
    }
    Ok(s.to_string())
}

fn parse_device(s: &str) -> Result<DeviceSpec, String> {
    s.parse().map_err(|e: emocheck_core::Error| e.to_string())
}

fn parse_pooling(s: &str) -> Result<PoolingMode, String> {
    s.parse()
}
