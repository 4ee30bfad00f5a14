//! Command-line interface definitions and argument parsing

use clap::Parser;

/// Cluster vectors by direction using cosine-similarity k-means
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file (numeric columns only)
    #[arg(short, long, default_value = "data.csv")]
    pub input: String,

    /// Treat the first CSV line as data instead of a header
    #[arg(long)]
    pub no_header: bool,

    /// Number of clusters
    #[arg(short = 'k', long, default_value = "4")]
    pub clusters: usize,

    /// Output path for the SVG cluster plot
    #[arg(short, long, default_value = "cluster_plot.svg")]
    pub output: String,

    /// Skip writing plots
    #[arg(long)]
    pub no_plot: bool,

    /// Prediction mode: comma-separated feature values of one vector
    /// Example: --predict "0.2,0.9,0.1"
    #[arg(short, long)]
    pub predict: Option<String>,

    /// Iteration cap; the loop may run one round past it
    #[arg(long, default_value = "20")]
    pub max_iters: usize,

    /// Start from random unit centers instead of the first k rows
    #[arg(long)]
    pub random_init: bool,

    /// Seed for --random-init
    #[arg(long)]
    pub seed: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the vector given with `--predict`
    pub fn parse_predict_vector(&self) -> crate::AppResult<Option<Vec<f64>>> {
        let Some(ref predict_str) = self.predict else {
            return Ok(None);
        };

        let values = predict_str
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| anyhow::anyhow!("Invalid feature value: {}", part))
            })
            .collect::<anyhow::Result<Vec<f64>>>()?;

        Ok(Some(values))
    }

    /// Default tracing filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "cosine_cluster=debug"
        } else {
            "cosine_cluster=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            input: "test.csv".to_string(),
            no_header: false,
            clusters: 2,
            output: "test.svg".to_string(),
            no_plot: false,
            predict: Some("0.5, 1,-2e-1".to_string()),
            max_iters: 20,
            random_init: false,
            seed: None,
            verbose: false,
        }
    }

    #[test]
    fn test_parse_predict_vector() {
        let mut args = args();

        let result = args.parse_predict_vector().unwrap();
        assert_eq!(result, Some(vec![0.5, 1.0, -0.2]));

        args.predict = None;
        assert_eq!(args.parse_predict_vector().unwrap(), None);

        args.predict = Some("1.0,abc".to_string());
        assert!(args.parse_predict_vector().is_err());
    }

    #[test]
    fn test_defaults_from_command_line() {
        let args = Args::try_parse_from(["cosine-cluster", "-i", "vectors.csv", "-k", "3"]).unwrap();

        assert_eq!(args.input, "vectors.csv");
        assert_eq!(args.clusters, 3);
        assert_eq!(args.max_iters, 20);
        assert!(!args.random_init);
        assert_eq!(args.log_filter(), "cosine_cluster=info");
    }
}
