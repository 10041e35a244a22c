use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use tabviz::catalog::{ChartSpec, ChartType};
use tabviz::data::Dataset;
use tabviz::loader;
use tabviz::runtime;
use tabviz::{OutputFormat, RenderOptions};

#[derive(Parser, Debug)]
#[command(name = "tabviz")]
#[command(about = "Build chart descriptions and PNG charts from tabular data", long_about = None)]
struct Args {
    /// Input table: csv, xlsx, xls, or json file ("-" reads CSV from stdin)
    file: Option<String>,

    /// Chart to build, by name (see --list-charts)
    #[arg(long)]
    chart: Option<String>,

    /// Bind a chart role to a column, as ROLE=COLUMN (repeatable)
    #[arg(long = "role", value_name = "ROLE=COLUMN")]
    roles: Vec<String>,

    /// Output format: json (chart description) or png
    #[arg(long, default_value = "json")]
    format: String,

    /// Write the output to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Output width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Override the generated chart title
    #[arg(long)]
    title: Option<String>,

    /// List every chart type, marking the ones the loaded data can feed
    #[arg(long)]
    list_charts: bool,

    /// Show the inferred column types and exit
    #[arg(long)]
    columns: bool,

    /// Print a ready-to-run invocation for the named chart
    #[arg(long, value_name = "CHART")]
    suggest: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The catalog listing works without data.
    if args.list_charts && args.file.is_none() {
        print_catalog(None);
        return Ok(());
    }

    let file = match args.file.as_deref() {
        Some(file) => file,
        None => bail!("no input file given (pass a path, or '-' for CSV on stdin)"),
    };
    let dataset = if file == "-" {
        let stdin = io::stdin();
        loader::read_csv(stdin.lock()).context("reading CSV from stdin")?
    } else {
        loader::load_dataset(file)?
    };

    if args.columns {
        print_columns(&dataset);
        return Ok(());
    }
    if args.list_charts {
        print_catalog(Some(&dataset));
        return Ok(());
    }
    if let Some(name) = args.suggest.as_deref() {
        return print_suggestion(&dataset, name, file);
    }

    let chart: ChartType = match args.chart.as_deref() {
        Some(name) => name.parse()?,
        None => bail!("no chart requested (pass --chart NAME, or --list-charts to browse)"),
    };
    let mut spec = ChartSpec::new(chart);
    for raw in &args.roles {
        let (role, column) = parse_role_binding(raw)?;
        spec = spec.bind(role, column);
    }

    let description = runtime::build_chart(&dataset, &spec)?;
    let options = RenderOptions {
        width: args.width,
        height: args.height,
        format: parse_format(&args.format)?,
        title: args.title.clone(),
    };

    let bytes = match options.format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&description)
                .context("serializing chart description")?;
            json.push('\n');
            json.into_bytes()
        }
        OutputFormat::Png => runtime::render_chart(&description, &options)?,
    };
    write_output(&bytes, args.out.as_deref())
}

fn parse_role_binding(raw: &str) -> Result<(&str, &str)> {
    if let Some((role, column)) = raw.split_once('=') {
        let (role, column) = (role.trim(), column.trim());
        if !role.is_empty() && !column.is_empty() {
            return Ok((role, column));
        }
    }
    bail!("role binding '{raw}' is not in ROLE=COLUMN form")
}

fn parse_format(raw: &str) -> Result<OutputFormat> {
    match raw.to_ascii_lowercase().as_str() {
        "json" => Ok(OutputFormat::Json),
        "png" => Ok(OutputFormat::Png),
        _ => bail!("unsupported output format '{raw}' (expected json or png)"),
    }
}

/// Role list for one chart, optional roles marked with '?'.
fn role_signature(chart: ChartType) -> String {
    let parts: Vec<String> = chart
        .requirement()
        .roles
        .iter()
        .map(|role_spec| {
            if role_spec.required {
                role_spec.role.to_string()
            } else {
                format!("{}?", role_spec.role)
            }
        })
        .collect();
    parts.join(", ")
}

fn print_catalog(dataset: Option<&Dataset>) {
    let applicable = dataset.map(runtime::applicable_charts);
    for chart in ChartType::ALL {
        let marker = match &applicable {
            Some(list) if list.contains(&chart) => '*',
            _ => ' ',
        };
        println!("{marker} {:<20} roles: {}", chart.name(), role_signature(chart));
        println!("      {}", chart.description());
    }
    if applicable.is_some() {
        println!();
        println!("* = every required role can be filled from the loaded columns");
    }
}

fn print_columns(dataset: &Dataset) {
    for column in &dataset.columns {
        println!("{:<24} {}", column.name, column.ctype);
    }
}

fn print_suggestion(dataset: &Dataset, name: &str, file: &str) -> Result<()> {
    let chart: ChartType = name.parse()?;
    let spec = match runtime::suggest_spec(dataset, chart) {
        Some(spec) => spec,
        None => bail!(
            "{} needs column types the data does not provide (see --columns)",
            chart.name()
        ),
    };

    let mut invocation = format!("tabviz {file} --chart '{name}'");
    for role_spec in chart.requirement().roles {
        if let Some(column) = spec.binding(role_spec.role) {
            invocation.push_str(&format!(" --role '{}={column}'", role_spec.role));
        }
    }
    println!("{invocation}");
    Ok(())
}

fn write_output(bytes: &[u8], out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("writing '{}'", path.display()))
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(bytes).context("writing output to stdout")?;
            handle.flush().context("flushing stdout")
        }
    }
}
