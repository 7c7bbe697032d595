use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::cli::args::{Cli, Commands, OutputFormat};
use crate::config::Settings;
use crate::error::Result;
use crate::models::{final_compounds, MergedTable, NamedSite, SiteId, COMPOUND_MAPPINGS};
use crate::processors::{fetch_registry, AvailabilityProbe, DatasetBuilder, IntegrityChecker};
use crate::readers::{AqsClient, RecordSource};
use crate::utils::constants::{CRITERIA_POLLUTANTS, MET_VARS, PARAM_CLASS_PAMS_VOC};
use crate::utils::progress::ProgressReporter;
use crate::utils::{generate_default_output_filename, DateRange};
use crate::writers::{CsvWriter, ParquetWriter};

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Dataset {
            state,
            county,
            site,
            begin,
            end,
            output,
            format,
            compression,
            max_workers,
        } => {
            let settings = Settings::load(cli.config.as_deref())?;
            let site = SiteId::new(&state, &county, &site);
            let range = DateRange::from_yyyymmdd(&begin, &end)?;
            let output = output
                .unwrap_or_else(|| generate_default_output_filename("dataset", &site, format.extension()));

            println!("Building dataset for site {}", site);
            println!("Date range: {}", range);
            println!("Output file: {}", output.display());

            let client = AqsClient::new(&settings)?;
            let registry = fetch_registry(&client).await?;

            let variables: Vec<String> = CRITERIA_POLLUTANTS
                .iter()
                .chain(MET_VARS.iter())
                .map(|v| v.to_string())
                .collect();

            let progress = ProgressReporter::new(variables.len() as u64, "Fetching variables...", false);
            let builder = DatasetBuilder::new(max_workers).with_duplicate_policy(settings.duplicate_policy);
            let (table, report) = builder
                .build_dataset(&client, &registry, &site, range, &variables, Some(&progress))
                .await?;

            println!("\n{}", report.generate_summary());
            print_integrity(&table);

            match format {
                OutputFormat::Csv => write_csv(&table, &output)?,
                OutputFormat::Parquet => {
                    let writer = ParquetWriter::new().with_compression(&compression)?;
                    create_parent(&output)?;
                    writer.write_table(&table, &output)?;
                    println!("\n{}", writer.get_file_info(&output)?.summary());
                }
            }

            println!("Dataset complete!");
        }

        Commands::Vocs {
            state,
            county,
            site,
            begin,
            end,
            output,
            max_workers,
        } => {
            let settings = Settings::load(cli.config.as_deref())?;
            let site = SiteId::new(&state, &county, &site);
            let range = DateRange::from_yyyymmdd(&begin, &end)?;
            let output = output.unwrap_or_else(|| generate_default_output_filename("vocs", &site, "csv"));

            let client = AqsClient::new(&settings)?;
            let registry = fetch_registry(&client).await?;

            let measurable: Vec<String> = client
                .fetch_code_registry(PARAM_CLASS_PAMS_VOC)
                .await?
                .into_iter()
                .map(|entry| entry.value_represented)
                .collect();
            let (compounds, emission_keys) = final_compounds(COMPOUND_MAPPINGS, &measurable);

            println!("Building VOC dataset for site {}", site);
            println!(
                "{} measurable VOCs, {} with an emissions counterpart ({})",
                measurable.len(),
                compounds.len(),
                emission_keys.join(", ")
            );

            let progress = ProgressReporter::new(compounds.len() as u64, "Fetching compounds...", false);
            let builder = DatasetBuilder::new(max_workers).with_duplicate_policy(settings.duplicate_policy);
            let (table, report) = builder
                .build_voc_dataset(&client, &registry, &site, range, &compounds, Some(&progress))
                .await?;

            println!("\n{}", report.generate_summary());
            print_integrity(&table);
            write_csv(&table, &output)?;

            println!("VOC dataset complete!");
        }

        Commands::Probe {
            state,
            county,
            begin,
            end,
            step_months,
            span_days,
        } => {
            let settings = Settings::load(cli.config.as_deref())?;
            let range = DateRange::from_yyyymmdd(&begin, &end)?;
            let windows = range.sampling_windows(step_months, span_days)?;

            let client = Arc::new(AqsClient::new(&settings)?);
            let registry = fetch_registry(client.as_ref()).await?;

            println!("Searching county {} in state {}...", county, state);
            let sites: Vec<NamedSite> = client
                .fetch_sites(&state, &county)
                .await?
                .into_iter()
                .map(|entry| {
                    NamedSite::new(
                        SiteId::new(&state, &county, &format!("{:04}", entry.code)),
                        &entry.value_represented,
                    )
                })
                .collect();
            println!("Found {} sites.", sites.len());

            let names: Vec<String> = CRITERIA_POLLUTANTS
                .iter()
                .chain(MET_VARS.iter())
                .map(|v| v.to_string())
                .collect();
            let variables = registry.resolve_known(&names);

            let total = (sites.len() * variables.len() * windows.len()) as u64;
            let progress = ProgressReporter::new(total, "Probing availability...", false);

            let matrix = AvailabilityProbe::from_settings(&settings)
                .probe(client, &sites, &variables, &windows, Some(&progress))
                .await?;

            println!("\n{}", matrix.summary());
        }

        Commands::Inspect { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;

            println!("\nFile Details:");
            println!("{}", file_info.summary());

            if sample > 0 {
                println!("\nSample Rows (showing up to {}):", sample);
                match writer.read_table(&file) {
                    Ok(table) => {
                        print_integrity(&table);
                        for (i, (instant, values)) in table.rows().take(sample).enumerate() {
                            let cells: Vec<String> = table
                                .columns()
                                .iter()
                                .zip(values)
                                .map(|(name, value)| match value {
                                    Some(v) => format!("{}={}", name.trim_end(), v),
                                    None => format!("{}=-", name.trim_end()),
                                })
                                .collect();
                            println!("{}. {}: {}", i + 1, instant, cells.join(", "));
                        }
                    }
                    Err(e) => println!("Error reading sample data: {}", e),
                }
            }
        }
    }

    Ok(())
}

fn print_integrity(table: &MergedTable) {
    let checker = IntegrityChecker::new();
    let report = checker.check_table(table);
    println!("\n{}", checker.generate_summary(&report));
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_csv(table: &MergedTable, output: &Path) -> Result<()> {
    println!("Writing {} rows to {}...", table.len(), output.display());
    CsvWriter::new().write_table(table, output)?;
    info!(rows = table.len(), path = %output.display(), "Wrote CSV");
    Ok(())
}
