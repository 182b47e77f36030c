use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum BuiltinOverwriteAction {
    Deny,
    Warn,
    Allow,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Redefinition {
    /// The declaration read last is kept
    LastWins,
    /// The declaration read first is kept
    FirstWins,
}

#[derive(Parser)]
#[clap(version, about)]
pub struct Cli {
    /// The WSDL document, followed by any schema documents it needs
    #[clap(required = true)]
    pub files: Vec<PathBuf>,

    /// Only emit types of this namespace
    #[clap(long = "ns")]
    pub target_namespace: Option<String>,

    /// Wrap the inputs of operations taking more arguments than this into a struct
    #[clap(short = 'i', long, default_value_t = 4)]
    pub max_input_args: usize,

    /// Wrap the outputs of operations returning more values than this into a struct
    #[clap(short = 'r', long, default_value_t = 4)]
    pub max_output_args: usize,

    #[clap(long, default_value = "ws")]
    pub package_name: String,

    /// First line of the generated module documentation [default: "Package <package-name>"]
    #[clap(long)]
    pub header: Option<String>,

    #[clap(long, help = "Allow a XML Document Type Definition (DTD) to occur")]
    pub allow_dtd: bool,

    #[clap(long, value_enum, default_value = "deny")]
    pub builtin_overwrite: BuiltinOverwriteAction,

    /// Which declaration wins when several documents declare the same name
    #[clap(long, value_enum, default_value = "last-wins")]
    pub redefinition: Redefinition,

    /// Write the generated code here instead of standard output
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[clap(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["wsdlgen", "service.wsdl", "types.xsd"]);
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.max_input_args, 4);
        assert_eq!(cli.max_output_args, 4);
        assert_eq!(cli.package_name, "ws");
        assert!(matches!(cli.builtin_overwrite, BuiltinOverwriteAction::Deny));
        assert!(matches!(cli.redefinition, Redefinition::LastWins));
    }

    #[test]
    fn thresholds_and_namespace() {
        let cli = Cli::parse_from([
            "wsdlgen",
            "-i",
            "2",
            "-r",
            "1",
            "--ns",
            "urn:spell",
            "--redefinition",
            "first-wins",
            "service.wsdl",
        ]);
        assert_eq!(cli.max_input_args, 2);
        assert_eq!(cli.max_output_args, 1);
        assert_eq!(cli.target_namespace.as_deref(), Some("urn:spell"));
        assert!(matches!(cli.redefinition, Redefinition::FirstWins));
    }

    #[test]
    fn files_are_required() {
        assert!(Cli::try_parse_from(["wsdlgen"]).is_err());
    }
}
