use anyhow::Context;
use clap::Parser;
use emocheck_classifiers::prelude::*;
use emocheck_cli::{output, settings, Cli};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = settings::load(&cli)?;
    debug!("Effective configuration: {:?}", config);

    let classifier = EmotionClassifier::load(&config).context("failed to load emotion classifier")?;
    debug!(
        "Model '{}' ({:?}, vocab_size={}) on {:?}",
        classifier.metadata().name,
        classifier.metadata().format,
        classifier.metadata().vocab_size,
        classifier.device()
    );
    let result = classifier
        .classify(&cli.text)
        .context("failed to classify text")?;
    debug!(
        "Classified as {} ({:.4}) in {}us",
        result.label(),
        result.score(),
        result.latency_us
    );

    println!("{}", output::render(&result, cli.format)?);
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = log_filter(verbose);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Default directives when `RUST_LOG` is unset; stdout stays reserved for results
fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "emocheck=debug,emocheck_cli=debug,emocheck_classifiers=debug"
    } else {
        "emocheck=warn,emocheck_cli=warn,emocheck_classifiers=warn"
    }
}
