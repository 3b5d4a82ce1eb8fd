mod config;
mod logging;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use sootview::frontend::location_for_path;
use sootview::model::SootClass;
use sootview::modifier::Modifier;
use sootview::source::{AnalysisInputLocation, SourceType};
use sootview::{JavaLanguage, JavaView, Project};
use tracing::info;

use crate::config::Config;
use crate::logging::init_logging;

const DEFAULT_JAVA_VERSION: u32 = 8;

/// CLI arguments for sootview execution.
#[derive(Parser, Debug)]
#[command(
    name = "sootview",
    about = "Resolve JVM class files and JAR files into a deterministic JSON class report.",
    version
)]
struct Cli {
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    #[arg(long, value_name = "PATH")]
    classpath: Vec<PathBuf>,
    /// JSON file with `java_version`, `classpath` and `location_options`.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long, value_name = "N")]
    java_version: Option<u32>,
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
}

impl Cli {
    fn log_directive(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.timing {
            "info"
        } else {
            "warn"
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_directive());
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let mut classpath = cli.classpath.clone();
    classpath.extend(config.classpath.iter().cloned());

    if !cli.input.exists() {
        anyhow::bail!("input not found: {}", cli.input.display());
    }
    for entry in &classpath {
        if !entry.exists() {
            anyhow::bail!("classpath entry not found: {}", entry.display());
        }
    }

    let started_at = Instant::now();
    let java_version = cli
        .java_version
        .or(config.java_version)
        .unwrap_or(DEFAULT_JAVA_VERSION);
    let view = build_view(&cli.input, &classpath, java_version, config)?;
    let classes = view.get_classes().context("failed to resolve classes")?;
    let report = build_report(&view, &classes);

    let mut writer = output_writer(cli.output.as_deref())?;
    serde_json::to_writer_pretty(&mut writer, &report)
        .context("failed to serialize class report")?;
    writer
        .write_all(b"\n")
        .context("failed to write class report")?;

    if cli.timing {
        info!(
            total_ms = started_at.elapsed().as_millis() as u64,
            classes = classes.len(),
            locations = report.locations.len(),
            "timing"
        );
    }

    Ok(())
}

fn build_view(
    input: &Path,
    classpath: &[PathBuf],
    java_version: u32,
    config: Config,
) -> Result<JavaView> {
    let language = JavaLanguage::new(java_version);
    let primary_location = input_location(input, &language)?;
    let mut builder = Project::builder(language).add_input_location(primary_location);

    // Keep deterministic ordering by sorting classpath entries.
    let mut classpath_entries = classpath.to_vec();
    classpath_entries.sort_by(|a, b| path_key(a).cmp(&path_key(b)));
    classpath_entries.dedup();

    for entry in classpath_entries {
        let location = input_location(&entry, &language)?;
        builder = builder.add_library_location(location);
    }

    let project = builder.build();
    Ok(project.create_view_with_options(Box::new(
        move |location: &dyn AnalysisInputLocation| config.options_for(location.name()),
    )))
}

fn input_location(
    path: &Path,
    language: &JavaLanguage,
) -> Result<Arc<dyn AnalysisInputLocation>> {
    location_for_path(path, language)
        .with_context(|| format!("unsupported input file: {}", path.display()))
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}

#[derive(Debug, Serialize)]
struct Report {
    tool: ToolInfo,
    language: String,
    locations: Vec<String>,
    classes: Vec<ClassReport>,
}

#[derive(Debug, Serialize)]
struct ToolInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ClassReport {
    name: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    modifiers: Vec<Modifier>,
    field_count: usize,
    method_count: usize,
    location: String,
    source_type: SourceType,
}

fn build_report(view: &JavaView, classes: &[Arc<SootClass>]) -> Report {
    let language = view.project().language();
    Report {
        tool: ToolInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        },
        language: format!("{} {}", language.name(), language.version()),
        locations: view
            .project()
            .locations()
            .iter()
            .map(|location| location.name().to_string())
            .collect(),
        classes: classes
            .iter()
            .map(|class| ClassReport {
                name: view.quoted_name_of(&class.class_type().to_string()),
                superclass: class
                    .superclass()
                    .map(|superclass| view.quoted_name_of(&superclass.to_string())),
                interfaces: class
                    .interfaces()
                    .iter()
                    .map(|interface| view.quoted_name_of(&interface.to_string()))
                    .collect(),
                modifiers: class.modifiers().iter().copied().collect(),
                field_count: class.fields().len(),
                method_count: class.methods().len(),
                location: class.input_location().to_string(),
                source_type: class.source_type(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sootview::frontend::{DeclaredClassSource, MemoryInputLocation};
    use sootview::signature::IdentifierFactory;

    fn cli(input: PathBuf, output: PathBuf) -> Cli {
        Cli {
            input,
            classpath: Vec::new(),
            config: None,
            java_version: None,
            output: Some(output),
            quiet: true,
            timing: false,
        }
    }

    #[test]
    fn report_lists_classes_with_quoted_names() {
        let factory = IdentifierFactory;
        let location = MemoryInputLocation::new("memory").with_source(
            DeclaredClassSource::new("memory", factory.class_type_from_fqn("com.example.new.App"))
                .with_superclass(factory.class_type_from_fqn("java.lang.Object")),
        );
        let view = Project::builder(JavaLanguage::new(11))
            .add_input_location(Arc::new(location))
            .build()
            .create_view();
        let classes = view.get_classes().expect("resolve classes");

        let value = serde_json::to_value(build_report(&view, &classes)).expect("serialize report");

        assert_eq!(value["tool"]["name"], "sootview");
        assert_eq!(value["language"], "Java 11");
        assert_eq!(value["locations"][0], "memory");
        assert_eq!(value["classes"][0]["name"], "com.example.'new'.App");
        assert_eq!(value["classes"][0]["superclass"], "java.lang.Object");
        assert_eq!(value["classes"][0]["modifiers"][0], "public");
        assert_eq!(value["classes"][0]["location"], "memory");
        assert_eq!(value["classes"][0]["source_type"], "application");
    }

    #[test]
    fn run_writes_report_for_empty_directory() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let input = temp_dir.path().join("classes");
        std::fs::create_dir(&input).expect("create input dir");
        let output = temp_dir.path().join("report.json");

        run(cli(input, output.clone())).expect("run");

        let text = std::fs::read_to_string(&output).expect("read report");
        let value: serde_json::Value = serde_json::from_str(&text).expect("parse report");
        assert!(value["classes"].as_array().expect("classes").is_empty());
        assert_eq!(value["language"], "Java 8");
    }

    #[test]
    fn run_applies_config_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let input = temp_dir.path().join("classes");
        let lib = temp_dir.path().join("lib");
        std::fs::create_dir(&input).expect("create input dir");
        std::fs::create_dir(&lib).expect("create lib dir");
        let config_path = temp_dir.path().join("sootview.json");
        let config = serde_json::json!({
            "java_version": 17,
            "classpath": [lib.to_string_lossy()],
        });
        std::fs::write(&config_path, config.to_string()).expect("write config");
        let output = temp_dir.path().join("report.json");
        let mut args = cli(input, output.clone());
        args.config = Some(config_path);

        run(args).expect("run");

        let text = std::fs::read_to_string(&output).expect("read report");
        let value: serde_json::Value = serde_json::from_str(&text).expect("parse report");
        assert_eq!(value["language"], "Java 17");
        assert_eq!(2, value["locations"].as_array().expect("locations").len());
    }

    #[test]
    fn run_rejects_missing_and_unsupported_inputs() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let output = temp_dir.path().join("report.json");
        let text_file = temp_dir.path().join("notes.txt");
        std::fs::write(&text_file, b"text").expect("write notes");

        assert!(run(cli(temp_dir.path().join("missing"), output.clone())).is_err());
        assert!(run(cli(text_file, output)).is_err());
    }
}
