//! cosine-cluster: group CSV vectors by direction with cosine k-means
//!
//! This is the main entrypoint that orchestrates data loading, model fitting,
//! visualization, and prediction.

use anyhow::Result;
use clap::Parser;
use cosine_cluster::algorithm::normalize_rows;
use cosine_cluster::{load_vectors, viz, Args, CosineCluster, CosineClusterModel, VectorData};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_target(false)
        .init();

    if args.verbose {
        println!("cosine-cluster - directional k-means");
        println!("====================================\n");
    }

    if let Some(values) = args.parse_predict_vector()? {
        run_prediction_mode(&args, &values)?;
    } else {
        run_full_pipeline(&args)?;
    }

    Ok(())
}

fn fit_model(args: &Args, data: &VectorData) -> Result<CosineClusterModel> {
    let mut engine = CosineCluster::with_max_num_iterations(args.clusters, args.max_iters)?;
    if let Some(seed) = args.seed {
        engine = engine.with_seed(seed);
    }
    Ok(engine.fit(&data.features, args.random_init)?)
}

/// Fit on the input file, then report the group of one vector
fn run_prediction_mode(args: &Args, values: &[f64]) -> Result<()> {
    println!("=== Prediction Mode ===");
    println!("Input vector: {:?}", values);

    let start_time = Instant::now();

    if args.verbose {
        println!("\nLoading training data from: {}", args.input);
    }
    let data = load_vectors(&args.input, !args.no_header)?;
    let vector = data.to_feature_vector(values)?;

    if args.verbose {
        println!("Loaded {} vectors", data.n_rows());
        println!("\nFitting cosine k-means with {} clusters...", args.clusters);
    }

    let model = fit_model(args, &data)?;
    let cluster = model.predict_row(&vector)?;

    let elapsed = start_time.elapsed();

    println!("\n✓ Predicted Cluster: {}", cluster);
    println!("  Processing time: {:.2}s", elapsed.as_secs_f64());

    let cluster_sizes = model.cluster_sizes();
    let cluster_percentage = (cluster_sizes[cluster] as f64 / data.n_rows() as f64) * 100.0;

    println!("\nCluster {} details:", cluster);
    println!(
        "  Size: {} vectors ({:.1}% of total)",
        cluster_sizes[cluster], cluster_percentage
    );
    println!("  Center (unit norm): {:.3}", model.cluster_centers.row(cluster));

    Ok(())
}

/// Run full clustering pipeline
fn run_full_pipeline(args: &Args) -> Result<()> {
    println!("=== Full Clustering Pipeline ===\n");

    let start_time = Instant::now();

    if args.verbose {
        println!("Step 1: Loading data");
        println!("  Input file: {}", args.input);
    }

    let data_start = Instant::now();
    let data = load_vectors(&args.input, !args.no_header)?;
    let data_time = data_start.elapsed();

    println!(
        "✓ Data loaded: {} vectors x {} features",
        data.n_rows(),
        data.n_features()
    );
    if args.verbose {
        println!("  Loading time: {:.2}s", data_time.as_secs_f64());
    }

    if args.verbose {
        println!("\nStep 2: Fitting cosine k-means");
        println!("  Number of clusters: {}", args.clusters);
        println!("  Max iterations: {}", args.max_iters);
        println!(
            "  Initialization: {}",
            if args.random_init { "random" } else { "first rows" }
        );
    }

    let model_start = Instant::now();
    let model = fit_model(args, &data)?;
    let model_time = model_start.elapsed();

    println!("✓ Model fitted in {} rounds", model.n_rounds);
    if args.verbose {
        println!("  Fitting time: {:.2}s", model_time.as_secs_f64());
        println!("  Converged: {}", model.clusters_converged());
    }

    let normalized = normalize_rows(&data.features)?;

    if args.no_plot {
        viz::print_cluster_statistics(&data, &normalized, &model);
    } else {
        if args.verbose {
            println!("\nStep 3: Generating visualizations");
            println!("  Output file: {}", args.output);
        }

        let viz_start = Instant::now();
        viz::generate_visualization_report(&data, &normalized, &model, &args.output)?;
        let viz_time = viz_start.elapsed();

        println!("\n✓ Visualizations generated");
        if args.verbose {
            println!("  Visualization time: {:.2}s", viz_time.as_secs_f64());
        }
    }

    let total_time = start_time.elapsed();
    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());
    if !args.no_plot {
        println!("Main plot saved to: {}", args.output);
        println!("Cluster sizes saved to: {}", viz::sizes_chart_path(&args.output));
    }

    Ok(())
}
