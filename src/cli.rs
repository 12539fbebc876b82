//! Minimal CLI: look values up along paths, or check documents against a
//! shape inferred from samples.
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use json_shield::infer::Inference;
use json_shield::{Chain, Path, TypeTag};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// safe lookups and shape checks over JSON/NDJSON documents
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve an optional-chaining path in each document
    Get(GetOut),
    /// validate each document against the shape of one or more samples
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GetOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// path to resolve, e.g. `pets[0]?.name`
    #[arg(long, short)]
    path: Path,

    /// coerce the result to this tag (string, integer, float, boolean, ...)
    #[arg(long)]
    cast: Option<TypeTag>,

    /// fail when a required step of the path finds nothing
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// sample documents the expected shape is inferred from
    #[arg(long, num_args = 1.., required = true)]
    like: Vec<String>,

    /// accept keys the samples never had
    #[arg(long)]
    allow_additional: bool,

    /// print failures as JSON lines instead of text
    #[arg(long)]
    json: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Feeds every selected document to `apply`, labelled by its source.
    fn load_process(&self, mut apply: impl FnMut(&str, Value) -> anyhow::Result<()>) -> anyhow::Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            if self.ndjson {
                for (line_no, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let label = format!("{source_path_str}:{}", line_no + 1);
                    let json_value = serde_json::from_str::<Value>(line)
                        .with_context(|| format!("failed to parse NDJSON line ({label})"))?;
                    if let Some(selected) = self.select(json_value, &label) {
                        apply(&label, selected)?;
                    }
                }
            } else {
                let json_value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                if let Some(selected) = self.select(json_value, &source_path_str) {
                    apply(&source_path_str, selected)?;
                }
            }
        }
        Ok(())
    }

    fn select(&self, value: Value, label: &str) -> Option<Value> {
        let Some(pointer) = self.json_pointer.as_deref() else {
            return Some(value);
        };
        let selected = value.pointer(pointer).cloned();
        if selected.is_none() {
            tracing::warn!(%label, %pointer, "json pointer selected nothing; skipping document");
        }
        selected
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Get(target) => target.run(),
            Command::Check(target) => target.run(),
        }
    }
}

impl GetOut {
    fn run(&self) -> anyhow::Result<()> {
        self.input_settings.load_process(|label, document| {
            let chain = Chain::new(&document);
            let found = if self.strict {
                chain.resolve(&self.path).with_context(|| format!("in {label}"))?
            } else {
                chain.find(&self.path)
            };
            let output = match (self.cast, found) {
                (Some(tag), _) => chain.ensure_cast_value(&self.path, tag),
                (None, Some(value)) => value.clone(),
                (None, None) => Value::Null,
            };
            println!("{output}");
            Ok(())
        })
    }
}

impl CheckOut {
    fn run(&self) -> anyhow::Result<()> {
        let mut inference = Inference::new();
        let samples = InputSettings { input: self.like.clone(), ..self.input_settings.clone() };
        samples.load_process(|_, sample| {
            inference.observe_value(&sample);
            Ok(())
        })?;
        if inference.samples() == 0 {
            bail!("no sample documents to infer a shape from");
        }
        let mut schema = inference.solve();
        if self.allow_additional {
            schema = schema.with_additional_properties();
        }

        let (mut passed, mut failed) = (0_usize, 0_usize);
        self.input_settings.load_process(|label, document| {
            match schema.error(&document) {
                None => {
                    passed += 1;
                    if !self.json {
                        println!("{} {label}", "✔".green());
                    }
                }
                Some(error) => {
                    failed += 1;
                    if self.json {
                        let report = serde_json::json!({"document": label, "error": error});
                        println!("{report}");
                    } else {
                        println!("{} {label}: {}", "✘".red(), error.to_string().red());
                    }
                }
            }
            Ok(())
        })?;

        tracing::info!(passed, failed, "check finished");
        if failed > 0 {
            bail!("{failed} of {} documents failed validation", passed + failed);
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
