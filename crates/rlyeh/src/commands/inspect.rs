//! Inspect command - shows what the tree passes do to a file

use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use console::style;
use rlyeh_transform::lift::SkipReason;
use rlyeh_transform::{BuildMode, Plugin, TransformReport};
use serde_json::json;

use crate::{Context, OutputFormat};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// JavaScript or TypeScript file to instrument
    pub input: PathBuf,

    /// Build mode to run in (default: from config, then NODE_ENV)
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// File path passed to the runtime (default: the canonical input path)
    #[arg(long)]
    pub resource_path: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Mode {
    Development,
    Production,
}

impl From<Mode> for BuildMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Development => BuildMode::Development,
            Mode::Production => BuildMode::Production,
        }
    }
}

pub fn run(args: InspectArgs, ctx: &Context) -> Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let resource_path = match args.resource_path {
        Some(path) => path,
        None => args
            .input
            .canonicalize()
            .unwrap_or_else(|_| args.input.clone())
            .to_string_lossy()
            .to_string(),
    };

    let filename = args.input.to_string_lossy();
    let parsed = rlyeh_parser::parse_module(
        &source,
        &filename,
        rlyeh_parser::Dialect::from_filename(&filename),
    )?;
    let mut module = parsed.module;

    let mut options = ctx.config.options();
    if let Some(mode) = args.mode {
        options.build_mode = Some(mode.into());
    }
    let plugin = Plugin::new(&serde_json::Value::Null, &options)?;
    let report = plugin.transform(&mut module, &resource_path);

    match ctx.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "file": resource_path,
                    "buildMode": plugin.build_mode(),
                    "warnings": parsed.warnings,
                    "registration": report.registration,
                    "lifting": report.lifting,
                }))?
            );
        }
        OutputFormat::Text => {
            if !ctx.quiet {
                print_text(&resource_path, plugin.build_mode(), &report, ctx.use_color);
            }
        }
    }

    Ok(())
}

fn heading(text: &str, use_color: bool) -> String {
    if use_color {
        style(text).bold().to_string()
    } else {
        text.to_string()
    }
}

fn print_text(file: &str, mode: BuildMode, report: &TransformReport, use_color: bool) {
    println!("{}", heading(file, use_color));

    if mode.is_production() {
        println!("  production build, nothing instrumented");
        return;
    }

    println!("\n{}", heading("Registered", use_color));
    if report.registration.entries.is_empty() {
        println!("  (none)");
    }
    for entry in &report.registration.entries {
        if entry.name == entry.local {
            println!("  {}", entry.name);
        } else {
            println!("  {} (as {})", entry.name, entry.local);
        }
    }
    for skipped in &report.registration.skipped {
        let line = format!("  {} skipped ({:?})", skipped.name, skipped.kind);
        if use_color {
            println!("{}", style(line).dim());
        } else {
            println!("{}", line);
        }
    }

    println!("\n{}", heading("Lifted", use_color));
    if report.lifting.lifted.is_empty() {
        println!("  (none)");
    }
    for lifted in &report.lifting.lifted {
        let class = lifted.class.as_deref().unwrap_or("<anonymous>");
        let form = match lifted.form {
            rlyeh_transform::lift::LiftForm::Field => "field",
            rlyeh_transform::lift::LiftForm::ConstructorAssignment => "constructor",
        };
        let asynchrony = if lifted.is_async { " async" } else { "" };
        println!(
            "  {}.{} -> {} ({}{})",
            class, lifted.member, lifted.method, form, asynchrony
        );
    }
    for skipped in &report.lifting.skipped {
        let class = skipped.class.as_deref().unwrap_or("<anonymous>");
        let reason = match skipped.reason {
            SkipReason::OptOut(construct) => format!("uses {}", construct),
            SkipReason::AsyncField => "async arrow field".to_string(),
        };
        let line = format!("  {}.{} not lifted: {}", class, skipped.member, reason);
        if use_color {
            println!("{}", style(line).yellow());
        } else {
            println!("{}", line);
        }
    }
}
