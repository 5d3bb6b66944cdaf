//! Append command - runs the loader adapter over emitted code

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use rlyeh_loader::{append, AppendRequest, SourceMapJson, TemplateCache, TemplateSource};
use serde_json::json;

use crate::{Context, OutputFormat};

#[derive(Args, Debug)]
pub struct AppendArgs {
    /// Emitted module code
    pub input: PathBuf,

    /// Source map of the input (default: an identity map is generated)
    #[arg(long)]
    pub map: Option<PathBuf>,

    /// Path registered with the runtime (default: the canonical input path)
    #[arg(long)]
    pub resource_path: Option<String>,

    /// Do not produce a source map
    #[arg(long)]
    pub no_source_map: bool,

    /// Tagger fragment to use instead of the configured one
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Output file (default: stdout; the map goes to <output>.map)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: AppendArgs, ctx: &Context) -> Result<()> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let map = match &args.map {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read source map {}", path.display()))?;
            Some(SourceMapJson::from_json(&json)?)
        }
        None => None,
    };
    let resource_path = match &args.resource_path {
        Some(path) => path.clone(),
        None => args
            .input
            .canonicalize()
            .unwrap_or_else(|_| args.input.clone())
            .to_string_lossy()
            .to_string(),
    };

    let template = TemplateCache::new(match &args.template {
        Some(path) => TemplateSource::File(path.clone()),
        None => ctx.config.template_source(),
    });

    let output = append(
        AppendRequest {
            text: &text,
            map,
            resource_path: &resource_path,
            source_map: ctx.config.loader.source_map && !args.no_source_map,
        },
        &template,
    )?;

    let map_path = args.output.as_deref().map(map_path_for);

    match (&args.output, &map_path) {
        (Some(out), Some(map_out)) => {
            fs::write(out, &output.code)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            if let Some(map) = &output.map {
                fs::write(map_out, map)
                    .with_context(|| format!("Failed to write {}", map_out.display()))?;
            }
        }
        _ => {
            if matches!(ctx.format, OutputFormat::Text) {
                print!("{}", output.code);
            }
        }
    }

    if drops_map(args.output.as_deref(), ctx.format, output.map.is_some()) {
        log::warn!(
            "source map for {} not written; pass -o/--output to write it to <output>.map",
            resource_path
        );
    }

    match ctx.format {
        OutputFormat::Json => {
            let mut report = json!({
                "file": resource_path,
                "output": args.output,
                "map": map_path.filter(|_| output.map.is_some()),
            });
            if args.output.is_none() {
                report["code"] = json!(output.code);
                report["sourceMap"] = json!(output.map);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            if !ctx.quiet {
                if let Some(out) = &args.output {
                    eprintln!("Wrote {}", out.display());
                }
            }
        }
    }

    Ok(())
}

/// Where the merged map goes for a given output file.
fn map_path_for(out: &Path) -> PathBuf {
    let mut path = out.as_os_str().to_owned();
    path.push(".map");
    PathBuf::from(path)
}

/// Text output on stdout has nowhere to put the map; JSON output carries it
/// in the report.
fn drops_map(output: Option<&Path>, format: OutputFormat, has_map: bool) -> bool {
    has_map && output.is_none() && matches!(format, OutputFormat::Text)
}
