//! Visualization functions using Plotters for cluster analysis

use crate::data::VectorData;
use crate::model::CosineClusterModel;
use ndarray::{Array2, ArrayView1};
use plotters::prelude::*;
use std::path::Path;

/// Color palette for different clusters
static CLUSTER_COLORS: [RGBColor; 6] = [RED, BLUE, GREEN, MAGENTA, CYAN, YELLOW];

fn cluster_color(cluster: usize) -> &'static RGBColor {
    CLUSTER_COLORS.get(cluster).unwrap_or(&BLACK)
}

/// First two coordinates of a row; 1-d data is drawn on the x axis
fn project(row: ArrayView1<f64>) -> (f64, f64) {
    (
        row.get(0).copied().unwrap_or(0.0),
        row.get(1).copied().unwrap_or(0.0),
    )
}

/// Scatter plot of normalized rows on the unit circle, colored by cluster
///
/// # Arguments
/// * `normalized` - Unit-norm rows in fit order
/// * `model` - Fitted model with cluster assignments
/// * `output_path` - Path to save the SVG plot
/// * `plot_title` - Title for the plot
pub fn create_cluster_visualization(
    normalized: &Array2<f64>,
    model: &CosineClusterModel,
    output_path: &str,
    plot_title: Option<&str>,
) -> crate::AppResult<()> {
    let title = plot_title.unwrap_or("Cosine Clusters: first two normalized coordinates");

    let root = SVGBackend::new(output_path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-1.2f64..1.2f64, -1.2f64..1.2f64)?;

    chart
        .configure_mesh()
        .x_desc("Coordinate 0")
        .y_desc("Coordinate 1")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    // Unit circle guide
    chart.draw_series(LineSeries::new(
        (0..=200).map(|step| {
            let angle = step as f64 / 200.0 * std::f64::consts::TAU;
            (angle.cos(), angle.sin())
        }),
        &BLACK.mix(0.3),
    ))?;

    for (row, &cluster) in normalized.outer_iter().zip(model.cluster_indices.iter()) {
        chart.draw_series(std::iter::once(Circle::new(
            project(row),
            4,
            cluster_color(cluster).filled(),
        )))?;
    }

    // Centers as larger squares
    for (cluster_id, center) in model.cluster_centers.outer_iter().enumerate() {
        let (x, y) = project(center);
        let color = cluster_color(cluster_id);

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - 0.04, y - 0.04), (x + 0.04, y + 0.04)],
                color.filled(),
            )))?
            .label(format!("Cluster {} center", cluster_id))
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    println!("Cluster visualization saved to: {}", output_path);

    Ok(())
}

/// Bar chart of cluster sizes
pub fn create_cluster_size_chart(model: &CosineClusterModel, output_path: &str) -> crate::AppResult<()> {
    let cluster_sizes = model.cluster_sizes();
    let max_size = cluster_sizes.iter().copied().max().unwrap_or(1).max(1) as f64;

    let root = SVGBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cluster Sizes", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(model.n_clusters as f64 - 0.5), 0f64..(max_size * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Cluster ID")
        .y_desc("Number of Vectors")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (cluster_id, &size) in cluster_sizes.iter().enumerate() {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(cluster_id as f64 - 0.4, 0.0), (cluster_id as f64 + 0.4, size as f64)],
            cluster_color(cluster_id).filled(),
        )))?;
    }

    root.present()?;
    println!("Cluster size chart saved to: {}", output_path);

    Ok(())
}

/// `plots/out.svg` -> `plots/out_sizes.svg`
pub fn sizes_chart_path(base_output_path: &str) -> String {
    let path = Path::new(base_output_path);
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cluster_plot".to_string());

    path.with_file_name(format!("{}_sizes.svg", stem))
        .to_string_lossy()
        .into_owned()
}

/// Print cluster statistics to console
pub fn print_cluster_statistics(data: &VectorData, normalized: &Array2<f64>, model: &CosineClusterModel) {
    println!("\n=== Cluster Statistics ===");
    println!("Number of clusters: {}", model.n_clusters);
    println!("Total vectors: {}", data.n_rows());
    println!(
        "Rounds: {} ({})",
        model.n_rounds,
        if model.clusters_converged() {
            "converged"
        } else {
            "iteration cap reached"
        }
    );
    println!("Inertia (n - sum of best cosine similarities): {:.4}", model.inertia);

    let silhouette_score = model.silhouette_sample(normalized, 100);
    println!("Silhouette score (sample): {:.3}", silhouette_score);

    let cluster_sizes = model.cluster_sizes();
    println!("\nCluster sizes:");
    for (i, &size) in cluster_sizes.iter().enumerate() {
        let percentage = (size as f64 / data.n_rows() as f64) * 100.0;
        println!("  Cluster {}: {} vectors ({:.1}%)", i, size, percentage);
    }

    println!("\nCluster centers (unit norm):");
    println!("  Cluster | {}", data.column_names.join(" | "));
    for (i, center) in model.cluster_centers.outer_iter().enumerate() {
        let values: Vec<String> = center.iter().map(|value| format!("{:.3}", value)).collect();
        println!("  {:7} | {}", i, values.join(" | "));
    }
}

/// Write the scatter plot and size chart, then print statistics
pub fn generate_visualization_report(
    data: &VectorData,
    normalized: &Array2<f64>,
    model: &CosineClusterModel,
    base_output_path: &str,
) -> crate::AppResult<()> {
    create_cluster_visualization(normalized, model, base_output_path, None)?;
    create_cluster_size_chart(model, &sizes_chart_path(base_output_path))?;
    print_cluster_statistics(data, normalized, model);

    Ok(())
}
