//! presetkit CLI
//!
//! Entry point for the `presetkit` command-line tool.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use presetkit::model::{
    ContainerRuntime, CoverageTool, CreationPackageManager, DocumentationTool, LayoutStyle,
    TypeChecker, TypingLevel,
};
use presetkit::{
    analyze_project, build_project_config, list_presets, resolved_config_schema,
    AugmentConfigBuilder, OverrideSet, ProjectAnalysis, ResolverContext, TerminalPrompter,
    UserDefaults,
};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive
const LOG_ENV: &str = "PRESETKIT_LOG";

#[derive(Parser)]
#[command(name = "presetkit")]
#[command(about = "Layered configuration for Python project scaffolding", version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the configuration for a new project
    Resolve {
        /// Name of the project to create
        project_name: String,

        /// Preset to start from
        #[arg(long, short = 'p', default_value = "empty-package")]
        preset: String,

        /// Load the preset from this file instead of the preset directories
        #[arg(long)]
        preset_file: Option<PathBuf>,

        /// Include the contributing layers in the output
        #[arg(long)]
        sources: bool,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// List available presets
    Presets {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Analyze an existing Python project
    Analyze {
        /// Project directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Build the configuration for adding tooling to an existing project
    AugmentConfig {
        /// Project directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Ask about missing and uncertain values
        #[arg(long, short = 'i')]
        interactive: bool,

        /// Supply a value (key=value), may be repeated
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Print the JSON Schema of the resolved configuration
    Schema {
        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Manage user defaults
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the current user defaults
    Show,

    /// Write a starter user defaults file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the user defaults file path
    Path,
}

#[derive(Args)]
struct OverrideArgs {
    #[arg(long)]
    testing: Option<bool>,
    #[arg(long)]
    formatting: Option<bool>,
    #[arg(long)]
    radon: Option<bool>,
    #[arg(long)]
    pre_commit: Option<bool>,
    #[arg(long)]
    version_bumping: Option<bool>,
    #[arg(long)]
    python_version: Option<String>,
    #[arg(long)]
    type_checker: Option<TypeChecker>,
    #[arg(long)]
    typing: Option<TypingLevel>,
    #[arg(long)]
    layout: Option<LayoutStyle>,
    #[arg(long)]
    package_manager: Option<CreationPackageManager>,
    #[arg(long)]
    docker: Option<bool>,
    #[arg(long)]
    devcontainer: Option<bool>,
    #[arg(long)]
    container_runtime: Option<ContainerRuntime>,
    #[arg(long)]
    coverage: Option<bool>,
    #[arg(long)]
    coverage_tool: Option<CoverageTool>,
    #[arg(long)]
    coverage_threshold: Option<u32>,
    #[arg(long)]
    docs: Option<bool>,
    #[arg(long)]
    docs_tool: Option<DocumentationTool>,
    #[arg(long)]
    docs_gh_pages: Option<bool>,
    #[arg(long)]
    tox: Option<bool>,

    /// Additional runtime dependency, may be repeated
    #[arg(long = "package", value_name = "PKG")]
    packages: Vec<String>,

    /// Additional development dependency, may be repeated
    #[arg(long = "dev-package", value_name = "PKG")]
    dev_packages: Vec<String>,
}

impl From<OverrideArgs> for OverrideSet {
    fn from(args: OverrideArgs) -> Self {
        OverrideSet {
            testing_enabled: args.testing,
            formatting_enabled: args.formatting,
            radon_enabled: args.radon,
            pre_commit_enabled: args.pre_commit,
            version_bumping_enabled: args.version_bumping,
            python_version: args.python_version,
            type_checker: args.type_checker,
            typing_level: args.typing,
            layout: args.layout,
            package_manager: args.package_manager,
            docker_enabled: args.docker,
            devcontainer_enabled: args.devcontainer,
            container_runtime: args.container_runtime,
            coverage_enabled: args.coverage,
            coverage_tool: args.coverage_tool,
            coverage_threshold: args.coverage_threshold,
            docs_enabled: args.docs,
            docs_tool: args.docs_tool,
            docs_deploy_gh_pages: args.docs_gh_pages,
            tox_enabled: args.tox,
            extra_packages: args.packages,
            extra_dev_packages: args.dev_packages,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Resolve {
            project_name,
            preset,
            preset_file,
            sources,
            overrides,
        } => {
            run_resolve(&project_name, &preset, preset_file.as_deref(), sources, overrides.into());
        }
        Commands::Presets { json } => run_presets(json),
        Commands::Analyze { dir, json } => run_analyze(&dir, json),
        Commands::AugmentConfig {
            dir,
            interactive,
            set,
        } => run_augment_config(&dir, interactive, &set),
        Commands::Schema { output } => run_schema(output.as_deref()),
        Commands::Config { action } => match action {
            ConfigCommands::Show => run_config_show(),
            ConfigCommands::Init { force } => run_config_init(force),
            ConfigCommands::Path => println!("{}", context().user_config_path.display()),
        },
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn context() -> ResolverContext {
    ResolverContext::from_env().unwrap_or_else(|e| fail(e))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(format!("serializing output: {}", e)),
    }
}

fn run_resolve(
    project_name: &str,
    preset: &str,
    preset_file: Option<&Path>,
    with_sources: bool,
    overrides: OverrideSet,
) {
    let ctx = context();
    let project = build_project_config(&ctx, project_name, preset, &overrides, preset_file)
        .unwrap_or_else(|e| fail(e));

    if with_sources {
        print_json(&project);
    } else {
        print_json(&project.config);
    }
}

fn run_presets(json_output: bool) {
    let presets = list_presets(&context());

    if json_output {
        print_json(&presets);
        return;
    }

    if presets.is_empty() {
        println!("No presets found.");
        return;
    }

    println!("Available presets ({} total):\n", presets.len());
    for preset in presets {
        let marker = if preset.user { " (user)" } else { "" };
        println!("  {}{}", preset.name, marker);
        if !preset.description.is_empty() {
            println!("    {}", preset.description);
        }
    }
}

fn run_analyze(dir: &Path, json_output: bool) {
    if !dir.is_dir() {
        fail(format!("not a directory: {}", dir.display()));
    }
    let analysis = analyze_project(dir);

    if json_output {
        print_json(&analysis);
    } else {
        print_analysis(&analysis);
    }
}

fn print_analysis(analysis: &ProjectAnalysis) {
    println!("Project: {}\n", analysis.project_dir.display());

    println!("Detected:");
    for (name, detected) in analysis.detections() {
        if let Some(d) = detected {
            let value = match &d.value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("  {:<16} {:<12} [{}] {}", name, value, d.confidence, d.source);
        }
    }

    println!("\nStructure:");
    println!("  tests dir:      {}", yes_no(analysis.has_tests_dir));
    println!("  test files:     {}", analysis.existing_tests.len());
    println!("  workflows:      {}", analysis.existing_workflows.len());
    println!("  dependabot:     {}", yes_no(analysis.has_dependabot));
    println!("  .gitignore:     {}", yes_no(analysis.has_gitignore));
    println!("  src layout:     {}", yes_no(analysis.has_src_layout));
    if !analysis.source_dirs.is_empty() {
        println!("  source dirs:    {}", analysis.source_dirs.join(", "));
    }

    if !analysis.missing_fields.is_empty() {
        println!("\nMissing:");
        for field in &analysis.missing_fields {
            let kind = if field.required { "required" } else { "optional" };
            match &field.default {
                Some(default) => println!(
                    "  {:<16} {} ({}, default: {})",
                    field.name, field.description, kind, default
                ),
                None => println!("  {:<16} {} ({})", field.name, field.description, kind),
            }
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn run_augment_config(dir: &Path, interactive: bool, set: &[String]) {
    if !dir.is_dir() {
        fail(format!("not a directory: {}", dir.display()));
    }
    let analysis = analyze_project(dir);

    let mut builder = AugmentConfigBuilder::new(&analysis);
    for pair in set {
        let Some((key, value)) = pair.split_once('=') else {
            fail(format!("expected KEY=VALUE, got '{}'", pair));
        };
        builder = builder.supplied(key.trim(), value.trim());
    }

    let config = if interactive {
        let mut prompter = TerminalPrompter::stdio();
        builder.build_interactive(&mut prompter)
    } else {
        builder.build()
    };

    print_json(&config);
}

fn run_schema(output: Option<&Path>) {
    let schema = resolved_config_schema();
    let json = serde_json::to_string_pretty(&schema)
        .unwrap_or_else(|e| fail(format!("serializing schema: {}", e)));

    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, format!("{}\n", json)) {
                fail(format!("writing {}: {}", path.display(), e));
            }
            eprintln!("Wrote schema to {}", path.display());
        }
        None => println!("{}", json),
    }
}

fn run_config_show() {
    let ctx = context();
    let path = &ctx.user_config_path;
    if !path.exists() {
        println!("No user defaults at {}", path.display());
        println!("Run `presetkit config init` to create one.");
        return;
    }

    let defaults = UserDefaults::load(path);
    println!("User defaults ({}):\n", path.display());
    if defaults.is_empty() {
        println!("  (none set)");
    }
    for (key, value) in defaults.values() {
        println!("  {} = {}", key, value);
    }
}

fn run_config_init(force: bool) {
    let ctx = context();
    let path = &ctx.user_config_path;
    if path.exists() && !force {
        fail(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            fail(format!("creating {}: {}", parent.display(), e));
        }
    }
    if let Err(e) = fs::write(path, UserDefaults::template()) {
        fail(format!("writing {}: {}", path.display(), e));
    }
    println!("Created {}", path.display());
}
