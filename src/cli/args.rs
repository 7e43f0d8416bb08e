use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "data_relay")]
#[command(about = "A multi-producer / multi-consumer record relay tool")]
#[command(version)]
pub struct Cli {
    /// Number of producer tasks
    #[arg(short, long, default_value = "10")]
    pub producers: usize,

    /// Number of consumer tasks
    #[arg(short, long, default_value = "20")]
    pub consumers: usize,

    /// Maximum bytes per record
    #[arg(short = 'b', long, default_value = "20")]
    pub record_bytes: usize,

    /// Queue capacity (unbounded if omitted)
    #[arg(short = 'q', long)]
    pub queue_capacity: Option<usize>,

    /// Records produced per producer before shutting down
    #[arg(short, long, default_value = "100")]
    pub records: usize,

    /// Run for a fixed duration in milliseconds instead of a record budget
    #[arg(short = 'd', long, conflicts_with = "records")]
    pub duration_ms: Option<u64>,

    /// Read records from a device or file instead of the simulated source
    #[arg(long)]
    pub device: Option<PathBuf>,

    /// Write a JSON run summary to this path
    #[arg(short = 'o', long)]
    pub summary_out: Option<PathBuf>,

    /// Abandon the backlog on shutdown instead of draining it
    #[arg(long)]
    pub no_drain: bool,

    /// Print each processed byte
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress progress output
    #[arg(long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arguments() {
        let cli = Cli::parse_from(["data_relay"]);

        assert_eq!(cli.producers, 10);
        assert_eq!(cli.consumers, 20);
        assert_eq!(cli.record_bytes, 20);
        assert_eq!(cli.records, 100);
        assert_eq!(cli.queue_capacity, None);
        assert_eq!(cli.duration_ms, None);
        assert!(!cli.no_drain);
        assert!(!cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_custom_arguments() {
        let cli = Cli::parse_from([
            "data_relay",
            "--producers",
            "2",
            "--consumers",
            "3",
            "--record-bytes",
            "64",
            "--queue-capacity",
            "8",
            "--device",
            "/dev/xyz",
            "--summary-out",
            "summary.json",
            "--no-drain",
            "--quiet",
        ]);

        assert_eq!(cli.producers, 2);
        assert_eq!(cli.consumers, 3);
        assert_eq!(cli.record_bytes, 64);
        assert_eq!(cli.queue_capacity, Some(8));
        assert_eq!(cli.device, Some(PathBuf::from("/dev/xyz")));
        assert_eq!(cli.summary_out, Some(PathBuf::from("summary.json")));
        assert!(cli.no_drain);
        assert!(cli.quiet);
    }

    #[test]
    fn test_duration_conflicts_with_records() {
        let result = Cli::try_parse_from([
            "data_relay",
            "--records",
            "10",
            "--duration-ms",
            "500",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duration_mode() {
        let cli = Cli::parse_from(["data_relay", "--duration-ms", "500"]);
        assert_eq!(cli.duration_ms, Some(500));
    }
}
