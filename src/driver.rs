//! Compiles input files and inspects module files.

use crate::config::Config;
use anyhow::{Context, Result, bail};
use hydra_compiler::bytecode::ModuleReader;
use hydra_compiler::ir::DecodedFunction;
use hydra_compiler::{FunctionIds, compile_json};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of compiling one input file.
#[derive(Debug)]
pub struct Outcome {
    /// The input file
    pub input: PathBuf,
    /// Files written, or why the input failed
    pub result: Result<Vec<PathBuf>>,
}

/// Compiles every input on a worker pool. Failures are reported per file;
/// the returned error covers inputs that would share an output path and
/// setting up the pool.
pub fn compile_files(inputs: &[PathBuf], config: &Config) -> Result<Vec<Outcome>> {
    check_output_paths(inputs, config)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .context("starting the worker pool")?;
    debug!(files = inputs.len(), workers = pool.current_num_threads(), "compiling");

    if let Some(dir) = &config.out_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let ids = FunctionIds::new();
    Ok(pool.install(|| {
        inputs
            .par_iter()
            .map(|input| Outcome {
                input: input.clone(),
                result: compile_file(input, config, &ids),
            })
            .collect()
    }))
}

/// Compiles one ESTree JSON file and writes the configured outputs.
pub fn compile_file(input: &Path, config: &Config, ids: &FunctionIds) -> Result<Vec<PathBuf>> {
    let source = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let name = module_name(input);
    let module = compile_json(&source, &name, ids).with_context(|| format!("compiling {}", input.display()))?;

    let stem = output_stem(input, config.out_dir.as_deref());
    let mut written = Vec::new();
    if config.emit_binary {
        let path = stem.with_extension("ir");
        module
            .dump()
            .and_then(|bytecode| bytecode.store(&path))
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    if config.emit_text {
        let path = stem.with_extension("tir");
        fs::write(&path, module.to_string()).with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    info!(input = %input.display(), functions = module.functions().len(), "compiled");
    Ok(written)
}

/// Renders a module file: its sections, string pool and functions.
pub fn inspect(path: &Path) -> Result<String> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let module = ModuleReader::parse(&data).with_context(|| format!("parsing {}", path.display()))?;

    let mut out = String::new();
    writeln!(out, "module {}", path.display())?;
    for section in module.sections() {
        writeln!(out, "  section {:?} at {} ({} bytes)", section.kind, section.offset, section.payload.len())?;
    }
    writeln!(out, "\nstrings")?;
    for (offset, text) in module.strings()? {
        writeln!(out, "  {offset:>6}  {text:?}")?;
    }
    for section in module.functions() {
        let function = DecodedFunction::decode(section, &module)?;
        write!(out, "\n{function}")?;
    }
    Ok(out)
}

/// `main.js.json` compiles as module `main.js`.
fn module_name(input: &Path) -> String {
    let file = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file.strip_suffix(".json") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => file,
    }
}

/// Rejects inputs that map to the same output stem.
fn check_output_paths(inputs: &[PathBuf], config: &Config) -> Result<()> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    for input in inputs {
        let stem = output_stem(input, config.out_dir.as_deref());
        if let Some(previous) = seen.insert(stem.clone(), input) {
            bail!(
                "{} and {} would both be written to {}",
                previous.display(),
                input.display(),
                stem.display()
            );
        }
    }
    Ok(())
}

/// Output path without extension: `main.js.json` becomes `main`, placed in
/// `out_dir` or next to the input.
fn output_stem(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let name = module_name(input);
    let stem = Path::new(&name)
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| name.clone().into());
    match out_dir {
        Some(dir) => dir.join(stem),
        None => input.with_file_name(stem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = r#"{
        "type": "Program",
        "body": [{
            "type": "VariableDeclaration",
            "kind": "const",
            "declarations": [{
                "type": "VariableDeclarator",
                "id": { "type": "Identifier", "name": "answer" },
                "init": { "type": "Literal", "value": 42 }
            }]
        }]
    }"#;

    const UNSUPPORTED: &str = r#"{
        "type": "Program",
        "body": [{ "type": "ClassDeclaration", "id": { "type": "Identifier", "name": "C" } }]
    }"#;

    #[test]
    fn test_output_names() {
        assert_eq!(module_name(Path::new("src/main.js.json")), "main.js");
        assert_eq!(module_name(Path::new("tree.json")), "tree");
        assert_eq!(output_stem(Path::new("src/main.js.json"), None), PathBuf::from("src/main"));
        assert_eq!(
            output_stem(Path::new("src/main.js.json"), Some(Path::new("build"))),
            PathBuf::from("build/main")
        );
    }

    #[test]
    fn test_compile_writes_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("answer.js.json");
        fs::write(&input, PROGRAM).unwrap();

        let outcomes = compile_files(&[input], &Config::default()).unwrap();
        let written = outcomes[0].result.as_ref().unwrap();
        assert_eq!(written.len(), 2);

        let text = fs::read_to_string(dir.path().join("answer.tir")).unwrap();
        assert!(text.starts_with("module \"answer.js\""));
        assert!(text.contains("number 42"));

        let listing = inspect(&dir.path().join("answer.ir")).unwrap();
        assert!(listing.contains("\"#main\""));
    }

    #[test]
    fn test_failures_do_not_stop_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        fs::write(&good, PROGRAM).unwrap();
        fs::write(&bad, UNSUPPORTED).unwrap();
        let out = dir.path().join("out");
        let config = Config {
            out_dir: Some(out.clone()),
            emit_text: false,
            jobs: 2,
            ..Config::default()
        };

        let outcomes = compile_files(&[bad, good], &config).unwrap();
        let err = outcomes[0].result.as_ref().unwrap_err();
        let compile_error = err.downcast_ref::<hydra_compiler::Error>().unwrap();
        assert_eq!(compile_error.category(), hydra_compiler::ErrorCategory::Unsupported);
        assert!(outcomes[1].result.is_ok());
        assert!(out.join("good.ir").exists());
        assert!(!out.join("good.tir").exists());
    }

    #[test]
    fn test_function_ids_are_unique_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let inputs: Vec<PathBuf> = (0..4)
            .map(|i| {
                let path = dir.path().join(format!("m{i}.json"));
                fs::write(&path, PROGRAM).unwrap();
                path
            })
            .collect();
        let config = Config {
            emit_binary: false,
            ..Config::default()
        };
        compile_files(&inputs, &config).unwrap();

        let mut ids: Vec<String> = inputs
            .iter()
            .map(|input| {
                let text = fs::read_to_string(input.with_extension("tir")).unwrap();
                text.lines()
                    .find(|line| line.starts_with("function "))
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap()
                    .to_string()
            })
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_colliding_outputs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let inputs: Vec<PathBuf> = ["a", "b"]
            .iter()
            .map(|sub| {
                let path = dir.path().join(sub).join("main.js.json");
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, PROGRAM).unwrap();
                path
            })
            .collect();
        let out = dir.path().join("out");
        let config = Config {
            out_dir: Some(out.clone()),
            ..Config::default()
        };

        let err = compile_files(&inputs, &config).unwrap_err();
        assert!(err.to_string().contains("would both be written to"));
        assert!(!out.join("main.ir").exists());

        // next to their inputs the same names do not collide
        let outcomes = compile_files(&inputs, &Config::default()).unwrap();
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
    }
}
