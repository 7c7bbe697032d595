use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::utils::constants::{DEFAULT_PROBE_SPAN_DAYS, DEFAULT_PROBE_STEP_MONTHS};

#[derive(Parser)]
#[command(name = "aqs-pipeline")]
#[command(about = "Fetch, normalize and align AQS air-quality data into hourly modelling datasets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Settings file [default: ./aqs-pipeline.toml if present]")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the hourly criteria-pollutant and meteorological dataset for one site
    Dataset {
        #[arg(long, help = "State code, e.g. 06")]
        state: String,

        #[arg(long, help = "County code, e.g. 037")]
        county: String,

        #[arg(long, help = "Site code, e.g. 1103")]
        site: String,

        #[arg(long, help = "First day, YYYYMMDD")]
        begin: String,

        #[arg(long, help = "Last day, YYYYMMDD")]
        end: String,

        #[arg(
            short,
            long,
            help = "Output file path [default: output/dataset-{site}-{YYMMDD}.{ext}]"
        )]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,

        #[arg(short, long, default_value = "snappy")]
        compression: String,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Build the hourly VOC dataset for the compounds with an emissions counterpart
    Vocs {
        #[arg(long, help = "State code, e.g. 06")]
        state: String,

        #[arg(long, help = "County code, e.g. 037")]
        county: String,

        #[arg(long, help = "Site code, e.g. 1103")]
        site: String,

        #[arg(long, help = "First day, YYYYMMDD")]
        begin: String,

        #[arg(long, help = "Last day, YYYYMMDD")]
        end: String,

        #[arg(
            short,
            long,
            help = "Output file path [default: output/vocs-{site}-{YYMMDD}.csv]"
        )]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Probe which sites in a county report which variables
    Probe {
        #[arg(long, help = "State code, e.g. 06")]
        state: String,

        #[arg(long, help = "County code, e.g. 037")]
        county: String,

        #[arg(long, default_value = "20180101", help = "First day, YYYYMMDD")]
        begin: String,

        #[arg(long, default_value = "20181231", help = "Last day, YYYYMMDD")]
        end: String,

        #[arg(long, default_value_t = DEFAULT_PROBE_STEP_MONTHS)]
        step_months: u32,

        #[arg(long, default_value_t = DEFAULT_PROBE_SPAN_DAYS)]
        span_days: u32,
    },

    /// Display information about a Parquet dataset
    Inspect {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },
}
