//! Command line interface of `hydrac`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// hydrac - compiles ESTree syntax trees into Hydra IR modules
#[derive(Parser, Debug)]
#[command(name = "hydrac")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging for the driver and the compiler
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: ./hydra.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile ESTree JSON files into .ir modules and .tir dumps
    #[command(alias = "c")]
    Compile(CompileArgs),

    /// Print a decoded .ir module
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct CompileArgs {
    /// ESTree JSON files, one program each
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the outputs (default: next to each input)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Do not write the binary module
    #[arg(long)]
    pub no_binary: bool,

    /// Do not write the text dump
    #[arg(long)]
    pub no_text: bool,

    /// Worker threads; 0 uses one per CPU
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// The module to decode
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile_command() {
        let cli = Cli::try_parse_from(["hydrac", "-v", "compile", "a.json", "b.json", "-j", "2", "--no-text"]).unwrap();
        assert!(cli.verbose);
        let Commands::Compile(args) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.inputs, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(args.jobs, Some(2));
        assert!(args.no_text);
        assert!(!args.no_binary);
    }

    #[test]
    fn test_compile_requires_inputs() {
        assert!(Cli::try_parse_from(["hydrac", "compile"]).is_err());
    }

    #[test]
    fn test_parse_inspect_command() {
        let cli = Cli::try_parse_from(["hydrac", "inspect", "main.ir", "--config", "ci.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ci.toml")));
        assert!(matches!(cli.command, Commands::Inspect(InspectArgs { file }) if file == PathBuf::from("main.ir")));
    }
}
