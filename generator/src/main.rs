mod cli;

use anyhow::{bail, Context as _};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wsdlgen::Config;
use wsdlgen_xsd::{BuiltinOverwriteAction, RedefinitionPolicy};

fn config(cli: &cli::Cli) -> Config {
    let mut config = Config::default()
        .max_input_args(cli.max_input_args)
        .max_output_args(cli.max_output_args)
        .package_name(cli.package_name.as_str())
        .builtin_overwrite(match cli.builtin_overwrite {
            cli::BuiltinOverwriteAction::Deny => BuiltinOverwriteAction::Deny,
            cli::BuiltinOverwriteAction::Warn => BuiltinOverwriteAction::Warn,
            cli::BuiltinOverwriteAction::Allow => BuiltinOverwriteAction::Allow,
        })
        .redefinition_policy(match cli.redefinition {
            cli::Redefinition::LastWins => RedefinitionPolicy::LastWins,
            cli::Redefinition::FirstWins => RedefinitionPolicy::FirstWins,
        });
    if let Some(namespace) = &cli.target_namespace {
        config = config.target_namespace(namespace.as_str());
    }
    if let Some(header) = &cli.header {
        config = config.header(header.as_str());
    }
    config
}

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let texts = cli
        .files
        .iter()
        .map(|path| {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let documents = texts
        .iter()
        .zip(&cli.files)
        .map(|(text, path)| {
            let options = roxmltree::ParsingOptions {
                allow_dtd: cli.allow_dtd,
                ..Default::default()
            };
            roxmltree::Document::parse_with_options(text, options)
                .with_context(|| format!("parsing {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let generated = wsdlgen::compile(&config(&cli), &documents)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, &generated.source)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(output = %path.display(), "wrote client");
        }
        None => print!("{}", generated.source),
    }

    for failure in &generated.failures {
        error!("{failure}");
    }
    if !generated.failures.is_empty() {
        bail!("{} operation(s) could not be generated", generated.failures.len());
    }
    Ok(())
}
