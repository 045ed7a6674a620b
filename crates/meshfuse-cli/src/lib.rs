//! # Meshfuse CLI
//!
//! Command-line interface for the meshfuse clustering and mesh-combining
//! engine.
//!
//! ## Commands
//! - `materials` - Count objects per material
//! - `cluster` - Cluster a scene and print the cluster summary
//! - `combine` - Cluster and merge a scene, optionally writing a JSON report

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use meshfuse_cluster::{ClusterSummary, cluster_objects, material_census};
use meshfuse_combine::{GeometryAggregator, MeshStats};
use meshfuse_core::{Diagnostics, MeshFuseConfig, RenderableObject, Scene, SceneDescription, Severity};

/// Meshfuse scene clustering and mesh combining
#[derive(Parser)]
#[command(name = "meshfuse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Count objects and triangles per material
    Materials {
        /// Scene description file
        #[arg(short, long)]
        scene: PathBuf,
    },

    /// Cluster a scene and print the summary
    Cluster {
        /// Scene description file
        #[arg(short, long)]
        scene: PathBuf,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Cluster a scene and merge every cluster
    Combine {
        /// Scene description file
        #[arg(short, long)]
        scene: PathBuf,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write a JSON report of the combined meshes
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
}

/// JSON report written by `combine --report`
#[derive(Debug, Serialize)]
pub struct CombineReport {
    pub objects: usize,
    pub clusters: usize,
    pub combined_clusters: usize,
    pub meshes: Vec<MeshStats>,
    pub notices: Vec<String>,
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Materials { scene } => {
            let scene = load_scene(&scene)?;
            let objects: Vec<_> = scene.objects.iter().collect();
            println!("{} objects", objects.len());
            for count in material_census(&objects) {
                println!(
                    "  {:<24} {:>6} objects {:>10} triangles",
                    scene.material_name(count.material),
                    count.objects,
                    count.triangles
                );
            }
        }

        Commands::Cluster { scene, config } => {
            let scene = load_scene(&scene)?;
            let config = load_config(config.as_deref())?;
            let mut diagnostics = Diagnostics::new();

            let summary = summarize_scene(&scene, &config, &mut diagnostics)?;
            print!("{}", summary);
            print_warnings(&diagnostics);
        }

        Commands::Combine { scene, config, report } => {
            let scene = load_scene(&scene)?;
            let config = load_config(config.as_deref())?;
            let mut diagnostics = Diagnostics::new();

            let result = combine_scene(&scene, &config, &mut diagnostics)?;
            for mesh in &result.meshes {
                let lod = mesh.lod_level.map_or_else(|| String::from("-"), |l| format!("LOD{}", l));
                println!(
                    "  {:<24} {:<5} {:>7} vertices {:>7} triangles {:?} indices, {} sources",
                    scene.material_name(mesh.material),
                    lod,
                    mesh.vertices,
                    mesh.triangles,
                    mesh.index_format,
                    mesh.sources.len()
                );
            }
            print_warnings(&diagnostics);

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&result).context("Failed to serialize report")?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                log::info!("Report written to {}", path.display());
            }
        }
    }

    Ok(())
}

/// Load and resolve a scene description
pub fn load_scene(path: &Path) -> Result<Scene> {
    let scene = SceneDescription::load(path)
        .and_then(SceneDescription::build)
        .with_context(|| format!("Failed to load scene {}", path.display()))?;
    log::info!("Loaded {} objects from {}", scene.objects.len(), path.display());
    Ok(scene)
}

/// Load a configuration file, or validate the defaults
pub fn load_config(path: Option<&Path>) -> Result<MeshFuseConfig> {
    match path {
        Some(path) => {
            MeshFuseConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => {
            let config = MeshFuseConfig::default();
            config.clustering.validate().context("Invalid default configuration")?;
            Ok(config)
        }
    }
}

/// Objects that pass the configured filter, in scene order
fn select_objects<'a>(scene: &'a Scene, config: &MeshFuseConfig) -> Vec<&'a RenderableObject> {
    let objects = config.filter.apply(&scene.objects);
    log::info!(
        "{} of {} objects pass the filter",
        objects.len(),
        scene.objects.len()
    );
    objects
}

/// Cluster summary for a scene
pub fn summarize_scene(scene: &Scene, config: &MeshFuseConfig, diagnostics: &mut Diagnostics) -> Result<ClusterSummary> {
    let objects = select_objects(scene, config);
    let set = cluster_objects(&objects, &scene.lod_groups, &config.clustering, diagnostics)
        .context("Clustering failed")?;
    Ok(set.summary(config.clustering.triangle_limit))
}

/// Cluster and merge a scene
pub fn combine_scene(scene: &Scene, config: &MeshFuseConfig, diagnostics: &mut Diagnostics) -> Result<CombineReport> {
    let objects = select_objects(scene, config);
    let set = cluster_objects(&objects, &scene.lod_groups, &config.clustering, diagnostics)
        .context("Clustering failed")?;

    let aggregator = GeometryAggregator::new(config.post.clone());
    let combined = aggregator.combine_set(&set, diagnostics);

    Ok(CombineReport {
        objects: objects.len(),
        clusters: set.len(),
        combined_clusters: combined.len(),
        meshes: combined
            .iter()
            .flat_map(|c| c.meshes())
            .map(|mesh| mesh.stats())
            .collect(),
        notices: diagnostics.notices().iter().map(|n| n.to_string()).collect(),
    })
}

fn print_warnings(diagnostics: &Diagnostics) {
    let warnings = diagnostics.warning_count();
    if warnings > 0 {
        println!("{} warning(s):", warnings);
        for notice in diagnostics.notices().iter().filter(|n| n.severity == Severity::Warning) {
            println!("  {}", notice.message);
        }
    }
}
