use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scu::analyzer::{Analysis, Inventory, PodCheck};
use scu::cache::VersionCache;
use scu::cli::Args;
use scu::config::Config;
use scu::detector::ProjectDetector;
use scu::report::Report;
use scu::resolver::VersionResolver;
use scu_core::{NOT_AVAILABLE, TableRenderer, TableRow};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::from_args(&args);
    if !config.show_colors {
        colored::control::set_override(false);
    }
    run_project_mode(&config).await
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_project_mode(config: &Config) -> Result<()> {
    let project_path = &config.project_root;

    // Validate project path exists
    if !project_path.exists() {
        anyhow::bail!("Project path does not exist: {}", project_path.display());
    }

    if !project_path.is_dir() {
        anyhow::bail!("Project path is not a directory: {}", project_path.display());
    }

    // 1. Discover modules, project files and pods
    let detector = ProjectDetector::new(project_path.clone());
    let detected = detector.detect();
    let project_name = detected
        .primary_project
        .as_deref()
        .and_then(Path::file_stem)
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| detector.root_name());

    // 2. Parse every declaration
    let inventory = Inventory::collect(&detected);
    tracing::info!(
        modules = inventory.module_count(),
        unique = inventory.canonical.len(),
        app = inventory.app_dependencies.len(),
        pods = inventory.pods.len(),
        "dependencies collected"
    );

    // 3. Resolve latest versions
    let cache = VersionCache::open(&config.cache_file);
    let mut resolver = VersionResolver::new(config.mode, cache, &config.tokens);

    let progress_bar = ProgressBar::new(inventory.lookup_count() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        progress_bar.set_style(style.progress_chars("#>-"));
    }
    if config.json {
        progress_bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let analysis = inventory
        .resolve(&mut resolver, |done, _total| {
            progress_bar.set_position(done as u64);
        })
        .await;
    progress_bar.finish_and_clear();
    resolver.close();

    // 4. Write the report
    let report = Report::new(&project_name, project_path, config.mode, &analysis);
    let report_path = report.write_to_dir(&config.output_dir)?;

    if config.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    // 5. Display results
    print_tables(&analysis, config.show_colors);

    println!(
        "{} modules, {} unique dependencies, {} app dependencies, {} pods, {} conflicts, {} outdated",
        analysis.module_count(),
        analysis.dependencies.len(),
        analysis.app_dependencies.len(),
        analysis.pods.len(),
        analysis.conflicts.len(),
        analysis.outdated_count(),
    );
    println!("Report written to {}", report_path.display().to_string().cyan());

    Ok(())
}

fn print_tables(analysis: &Analysis, show_colors: bool) {
    let renderer = TableRenderer::new(show_colors);

    if analysis.dependencies.is_empty() && analysis.app_dependencies.is_empty() && analysis.pods.is_empty() {
        println!("{}", "No dependencies found".dimmed());
        println!();
    }

    renderer.render("Module dependencies", &analysis.dependencies);

    let app_title = match analysis.app_strategy {
        Some(strategy) => format!("App dependencies (project file: {strategy})"),
        None => "App dependencies".to_string(),
    };
    renderer.render(&app_title, &analysis.app_dependencies);

    let pod_rows: Vec<TableRow> = analysis.pods.iter().map(pod_row).collect();
    renderer.render_rows("CocoaPods", &pod_rows);

    renderer.render_conflicts(&analysis.conflicts);
    if !analysis.conflicts.is_empty() {
        println!();
    }
}

fn pod_row(pod: &PodCheck) -> TableRow {
    TableRow {
        name: pod.name.clone(),
        current: pod
            .installed_version
            .clone()
            .or_else(|| pod.declared_version.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        latest: pod.latest.to_string(),
        status: pod.status,
    }
}
