//! The `oriel analyze` command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use serde_json::json;

use oriel_analyzer::{Analyzer, AnalyzerOptions, FsUrlLoader, QueryOptions, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Entry document, as a package-relative URL
    pub url: String,

    /// Package root directory documents load from
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Include features from documents outside the package root
    #[arg(long)]
    pub external_packages: bool,

    /// Follow lazy imports in queries
    #[arg(long)]
    pub lazy_imports: bool,
}

pub fn run(args: AnalyzeArgs) -> i32 {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("error: failed to start runtime: {error}");
            return 1;
        }
    };
    runtime.block_on(run_inner(args))
}

async fn run_inner(args: AnalyzeArgs) -> i32 {
    let loader = Arc::new(FsUrlLoader::new(args.root.clone()));
    let analyzer = Analyzer::new(AnalyzerOptions::new(loader));

    let document = match analyzer.analyze(&args.url).await {
        Ok(document) => document,
        Err(error) => {
            eprintln!("error: {error}");
            return 1;
        }
    };

    let options = QueryOptions::default()
        .with_imported(true)
        .with_lazy_imports(args.lazy_imports)
        .with_external_packages(args.external_packages);
    let features = document.get_features(&options);
    let warnings = document.get_warnings(&options);

    match args.format {
        OutputFormat::Text => {
            for feature in &features {
                let identifiers = feature.identifiers();
                let names: Vec<&str> = identifiers.iter().map(|id| id.as_str()).collect();
                println!(
                    "{:24} {:32} {}",
                    feature.kinds().join(","),
                    names.join(","),
                    feature.source_range()
                );
            }
            if !warnings.is_empty() {
                println!();
                for warning in &warnings {
                    println!("{warning}");
                }
            }
            println!();
            println!("{}", summary(features.len(), &warnings));
        }
        OutputFormat::Json => {
            let report = json!({
                "url": args.url,
                "features": features.iter().map(|feature| json!({
                    "kinds": feature.kinds(),
                    "identifiers": feature.identifiers().to_vec(),
                    "sourceRange": feature.source_range(),
                })).collect::<Vec<_>>(),
                "warnings": warnings,
            });
            println!("{}", serde_json::to_string_pretty(&report).expect("report is serializable"));
        }
    }

    let error_count = warnings.iter().filter(|w| w.severity == Severity::Error).count();
    if error_count > 0 {
        1
    } else {
        0
    }
}

fn summary(feature_count: usize, warnings: &[oriel_analyzer::Warning]) -> String {
    let error_count = warnings.iter().filter(|w| w.severity == Severity::Error).count();
    let warning_count = warnings.iter().filter(|w| w.severity == Severity::Warning).count();

    let mut parts = Vec::new();
    if error_count > 0 {
        parts.push(format!(
            "{} error{}",
            error_count,
            if error_count == 1 { "" } else { "s" }
        ));
    }
    if warning_count > 0 {
        parts.push(format!(
            "{} warning{}",
            warning_count,
            if warning_count == 1 { "" } else { "s" }
        ));
    }

    if parts.is_empty() {
        format!("{feature_count} features, no problems found")
    } else {
        format!("{feature_count} features, {}", parts.join(", "))
    }
}
