//! survey - Repository Survey Analysis CLI
//!
//! Command-line interface for cross-tabulating repository survey data.

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use repo_survey::crosstab::TableOrder;
use repo_survey::data::Dataset;
use repo_survey::error::Result;
use repo_survey::pipeline::{run_crosstab_test, Pipeline, PipelineConfig};
use repo_survey::profile::category_shares;
use repo_survey::report::{
    format_chisq, format_shares, format_table, to_structured, OutputFormat, ReportConfig,
};
use repo_survey::test::{ChiSquareConfig, Observed};
use std::path::{Path, PathBuf};

/// CLI-friendly output format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    /// Human-readable tables
    Text,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Text => OutputFormat::Text,
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Yaml => OutputFormat::Yaml,
        }
    }
}

/// Repository Survey Analysis
#[derive(Parser)]
#[command(name = "survey")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline from a YAML configuration file
    Run {
        /// Path to pipeline configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to survey CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Column identifying each record (e.g., "name")
        #[arg(short, long)]
        key_field: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: CliFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cross-tabulate two fields and test them for independence
    Crosstab {
        /// Path to survey CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Grouping field (table rows)
        #[arg(short, long)]
        group: String,

        /// Category field (table columns)
        #[arg(short = 'C', long)]
        category: String,

        /// Column identifying each record
        #[arg(short, long)]
        key_field: Option<String>,

        /// Category label whose proportion orders the rows
        #[arg(long)]
        sort_by: Option<String>,

        /// Sort rows largest proportion first
        #[arg(long)]
        descending: bool,

        /// Test raw counts instead of row proportions
        #[arg(long)]
        counts: bool,

        /// Apply Yates' continuity correction for 2x2 tables
        #[arg(long)]
        yates: bool,

        /// Decimal places in text output
        #[arg(long, default_value = "4")]
        precision: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: CliFormat,
    },

    /// Show the share of records per level of a field
    Shares {
        /// Path to survey CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Field to count
        #[arg(short = 'F', long)]
        field: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: CliFormat,
    },

    /// Generate an example pipeline configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "pipeline.yaml")]
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            data,
            key_field,
            format,
            output,
        } => cmd_run(&config, &data, key_field.as_deref(), format.into(), output.as_deref()),

        Commands::Crosstab {
            data,
            group,
            category,
            key_field,
            sort_by,
            descending,
            counts,
            yates,
            precision,
            format,
        } => {
            let mut order = TableOrder::new().descending(descending);
            order.sort_by = sort_by;
            let config = ChiSquareConfig {
                observed: if counts {
                    Observed::Counts
                } else {
                    Observed::Proportions
                },
                yates_correction: yates,
            };
            let report = ReportConfig {
                precision,
                max_rows: None,
            };
            cmd_crosstab(
                &data,
                &group,
                &category,
                key_field.as_deref(),
                order,
                config,
                &report,
                format.into(),
            )
        }

        Commands::Shares {
            data,
            field,
            format,
        } => cmd_shares(&data, &field, format.into()),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load(data_path: &Path, key_field: Option<&str>) -> Result<Dataset> {
    info!("Loading survey data from {:?}...", data_path);
    let data = Dataset::from_csv(data_path, key_field)?;
    info!(
        "Loaded {} records x {} columns",
        data.len(),
        data.columns().len()
    );
    Ok(data)
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            info!("Writing report to {:?}...", path);
            std::fs::write(path, text)?;
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Run a pipeline from configuration
fn cmd_run(
    config_path: &Path,
    data_path: &Path,
    key_field: Option<&str>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    info!("Loading pipeline configuration from {:?}...", config_path);
    let config_str = std::fs::read_to_string(config_path)?;
    let config = PipelineConfig::from_yaml(&config_str)?;

    let data = load(data_path, key_field)?;

    let report = Pipeline::from_config(&config).run(&data)?;
    info!("Done! {} outputs produced", report.len());

    let text = match format {
        OutputFormat::Text => report.to_text(&config.report),
        structured => to_structured(&report, structured)?,
    };
    emit(&text, output)
}

/// Cross-tabulate and test a pair of fields
fn cmd_crosstab(
    data_path: &Path,
    group: &str,
    category: &str,
    key_field: Option<&str>,
    order: TableOrder,
    config: ChiSquareConfig,
    report: &ReportConfig,
    format: OutputFormat,
) -> Result<()> {
    let data = load(data_path, key_field)?;
    let (table, result) = run_crosstab_test(&data, group, category, order, config)?;

    match format {
        OutputFormat::Text => {
            let title = format!("{} by {}", category, group);
            println!("{}", format_table(&table, &title, report));
            println!(
                "{}",
                format_chisq(&result, &format!("{} vs {}", group, category), report)
            );
        }
        structured => {
            let combined = serde_json::json!({ "table": table, "chi_square": result });
            println!("{}", to_structured(&combined, structured)?);
        }
    }
    Ok(())
}

/// Show category shares of a field
fn cmd_shares(data_path: &Path, field: &str, format: OutputFormat) -> Result<()> {
    let data = load(data_path, None)?;
    let shares = category_shares(&data, field)?;

    match format {
        OutputFormat::Text => print!("{}", format_shares(&shares, &ReportConfig::default())),
        structured => println!("{}", to_structured(&shares, structured)?),
    }
    Ok(())
}

/// Write an example pipeline configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let russell_group = [
        "University of Birmingham",
        "University of Bristol",
        "University of Cambridge",
        "Cardiff University",
        "Durham University",
        "University of Edinburgh",
        "University of Exeter",
        "University of Glasgow",
        "Imperial College London",
        "King's College London",
        "University of Leeds",
        "University of Liverpool",
        "London School of Economics & Political Science",
        "University of Manchester",
        "Newcastle University",
        "University of Nottingham",
        "University of Oxford",
        "Queen Mary, University of London",
        "Queen's University Belfast",
        "University of Sheffield",
        "University of Southampton",
        "University College London",
        "University of Warwick",
        "University of York",
    ];
    let by_software = || {
        TableOrder::new()
            .sort_by("Contains software")
            .column_order(&[
                "Contains software",
                "Does not contain software",
                "No direct software search capability",
            ])
    };

    let pipeline = Pipeline::new()
        .name("repository-software")
        .select(&[
            "ris_software_enum",
            "metadataFormat",
            "Manual_Num_sw_records",
            "Category",
        ])
        .category_shares("Category")
        .crosstab("ris_software_enum", "Category", by_software())
        .independence_test("Software records by RIS framework", ChiSquareConfig::default())
        .crosstab("metadataFormat", "Category", by_software())
        .independence_test("Software records by metadata format", ChiSquareConfig::default())
        .membership("Russell_member", &russell_group)
        .crosstab("Russell_member", "Category", by_software())
        .independence_test(
            "Membership of Russell Group vs Software in repository",
            ChiSquareConfig::default(),
        )
        .cumulative_percentage("Manual_Num_sw_records")
        .filter_greater_than("Manual_Num_sw_records", 0.0)
        .sort_by("Manual_Num_sw_records", true)
        .head(20)
        .show_dataset(Some("Top 20 institutions by number of software records"));

    let config = pipeline.to_config(Some(
        "Software records in UK academic institutional repositories",
    ));
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    info!("Example configuration written to {:?}", output_path);
    println!("{}", yaml);

    Ok(())
}
