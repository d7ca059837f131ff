//! This module contains the main entrypoint to the eda cli.

use anyhow::{format_err, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use eda_dataframe::{Column, ColumnType, DataFrame, LoadOptions};
use eda_models::{Config, ModelName, ModelType};
use std::path::{Path, PathBuf};

mod report;

#[derive(Parser)]
#[clap(
	about = "Explore a tabular dataset from the command line.",
	version,
	disable_help_subcommand = true
)]
struct Options {
	#[clap(short, long, global = true, help = "print debug logs")]
	verbose: bool,
	#[clap(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	#[clap(name = "info")]
	Info(InfoOptions),
	#[clap(name = "describe")]
	Describe(DescribeOptions),
	#[clap(name = "fit")]
	Fit(FitOptions),
	#[clap(name = "params")]
	Params(ParamsOptions),
	#[clap(name = "convert")]
	Convert(ConvertOptions),
}

#[derive(Parser, Debug)]
#[clap(about = "list the columns of a dataset and their types")]
struct InfoOptions {
	#[clap(help = "the path to your .csv, .tsv or .txt file")]
	file: PathBuf,
	#[clap(flatten)]
	edits: EditOptions,
}

#[derive(Parser, Debug)]
#[clap(about = "compute descriptive statistics and frequency tables")]
#[clap(long_about = "compute the summary statistics and grouped frequency table of the x and y columns")]
struct DescribeOptions {
	#[clap(help = "the path to your .csv, .tsv or .txt file")]
	file: PathBuf,
	#[clap(short, long, help = "the name of the x column", required_unless_present = "y")]
	x: Option<String>,
	#[clap(short, long, help = "the name of the y column")]
	y: Option<String>,
	#[clap(long, help = "standardize the x column before describing it")]
	standardize_x: bool,
	#[clap(long, help = "standardize the y column before describing it")]
	standardize_y: bool,
	#[clap(flatten)]
	edits: EditOptions,
	#[clap(short, long, help = "the directory to write <column>_stats.csv and <column>_freq.csv to")]
	output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[clap(about = "fit a model to two columns")]
#[clap(long_about = "fit a model to two columns and print its cross validated scores or clustering scores")]
struct FitOptions {
	#[clap(help = "the path to your .csv, .tsv or .txt file")]
	file: PathBuf,
	#[clap(short, long, help = "the name of the x column")]
	x: String,
	#[clap(short, long, help = "the name of the y column")]
	y: String,
	#[clap(flatten)]
	model: ModelOptions,
	#[clap(long, help = "model parameters as a JSON object, such as '{\"n_neighbors\": 3}'")]
	params: Option<String>,
	#[clap(flatten)]
	edits: EditOptions,
}

#[derive(Parser, Debug)]
#[clap(about = "print the parameters a model will be fit with")]
struct ParamsOptions {
	#[clap(flatten)]
	model: ModelOptions,
}

#[derive(Parser, Debug)]
#[clap(about = "rename and retype columns and save the result")]
struct ConvertOptions {
	#[clap(help = "the path to your .csv, .tsv or .txt file")]
	file: PathBuf,
	#[clap(short, long, help = "the path to write the dataset to")]
	output: PathBuf,
	#[clap(flatten)]
	edits: EditOptions,
}

#[derive(Args, Debug)]
struct ModelOptions {
	#[clap(long, help = "one of classification, regression or clustering")]
	model_type: ModelType,
	#[clap(short, long, help = "one of linear, knn or kmeans")]
	model: ModelName,
	#[clap(short, long, help = "the path to a .json or .yaml config file")]
	config: Option<PathBuf>,
}

/// Renames are applied before retypes, so `--retype` refers to columns by their new names.
#[derive(Args, Debug)]
struct EditOptions {
	#[clap(long, value_name = "OLD=NEW", help = "rename a column")]
	rename: Vec<Assignment>,
	#[clap(long, value_name = "COLUMN=TYPE", help = "convert a column to integer, float, datetime or text")]
	retype: Vec<Assignment>,
}

#[derive(Debug, Clone)]
struct Assignment {
	name: String,
	value: String,
}

impl std::str::FromStr for Assignment {
	type Err = String;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.split_once('=') {
			Some((name, value)) if !name.is_empty() => Ok(Assignment {
				name: name.to_owned(),
				value: value.to_owned(),
			}),
			_ => Err(format!("expected NAME=VALUE, got \"{}\"", s)),
		}
	}
}

fn main() {
	let options = Options::parse();
	init_logger(options.verbose);
	let result = match options.command {
		Command::Info(options) => cli_info(options),
		Command::Describe(options) => cli_describe(options),
		Command::Fit(options) => cli_fit(options),
		Command::Params(options) => cli_params(options),
		Command::Convert(options) => cli_convert(options),
	};
	if let Err(error) = result {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn init_logger(verbose: bool) {
	let level = if verbose { "debug" } else { "info" };
	let env = env_logger::Env::default().default_filter_or(format!("eda={}", level));
	env_logger::Builder::from_env(env)
		.format_module_path(false)
		.format_timestamp(None)
		.init();
}

fn cli_info(options: InfoOptions) -> Result<()> {
	let dataframe = load(&options.file, &options.edits)?;
	print!("{}", report::info(&dataframe));
	Ok(())
}

fn cli_describe(options: DescribeOptions) -> Result<()> {
	let dataframe = load(&options.file, &options.edits)?;
	let selections = [
		(options.x.as_deref(), options.standardize_x),
		(options.y.as_deref(), options.standardize_y),
	];
	for (name, standardize) in selections.iter() {
		let name = match name {
			Some(name) => *name,
			None => continue,
		};
		let column = find_column(&dataframe, name)?;
		let column = if *standardize {
			let number_column = column.as_number().ok_or_else(|| {
				format_err!("column \"{}\" must be a number column to be standardized", name)
			})?;
			Column::Number(number_column.standardized())
		} else {
			column.clone()
		};
		let stats = eda_stats::compute_summary_stats(column.view())?;
		let table = eda_stats::compute_frequency_table(column.view())?;
		print!("{}", report::describe(name, &stats, &table));
		if let Some(output) = options.output.as_ref() {
			let paths = eda_stats::export_column_stats(output, name, &stats, &table)?;
			eprintln!(
				"Statistics were written to {} and {}.",
				paths.stats.display(),
				paths.frequency.display()
			);
		}
	}
	Ok(())
}

fn cli_fit(options: FitOptions) -> Result<()> {
	let dataframe = load(&options.file, &options.edits)?;
	let mut config = load_config(options.model.config.as_deref())?;
	if let Some(params) = options.params.as_ref() {
		let params: serde_json::Value =
			serde_json::from_str(params).context("failed to parse model parameters")?;
		let warnings = config.apply_model_params(options.model.model, &params)?;
		if !warnings.is_empty() {
			eprintln!("{} parameters were skipped.", warnings.len());
		}
	}
	let x = find_column(&dataframe, &options.x)?;
	let y = find_column(&dataframe, &options.y)?;
	let output = eda_models::fit(
		x.view(),
		y.view(),
		options.model.model_type,
		options.model.model,
		&config,
	)?;
	print!("{}", output.summary(1));
	Ok(())
}

fn cli_params(options: ParamsOptions) -> Result<()> {
	options.model.model_type.check_model(options.model.model)?;
	let config = load_config(options.model.config.as_deref())?;
	let params = config.model_params(options.model.model)?;
	println!("{}", serde_json::to_string_pretty(&params)?);
	Ok(())
}

fn cli_convert(options: ConvertOptions) -> Result<()> {
	let dataframe = load(&options.file, &options.edits)?;
	dataframe.to_path(&options.output)?;
	eprintln!("Your dataset was written to {}.", options.output.display());
	Ok(())
}

fn load(path: &Path, edits: &EditOptions) -> Result<DataFrame> {
	let mut dataframe = DataFrame::from_path(path, LoadOptions::default())?;
	log::debug!(
		"loaded {} rows and {} columns from {}",
		dataframe.nrows(),
		dataframe.ncols(),
		path.display()
	);
	for rename in edits.rename.iter() {
		dataframe.rename_column(&rename.name, &rename.value)?;
	}
	for retype in edits.retype.iter() {
		let column_type: ColumnType = retype.value.parse()?;
		dataframe.convert_column(&retype.name, column_type)?;
		log::debug!("converted column \"{}\" to {}", retype.name, column_type);
	}
	Ok(dataframe)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
	match path {
		Some(path) => Config::from_path(path),
		None => Ok(Config::default()),
	}
}

fn find_column<'a>(dataframe: &'a DataFrame, name: &str) -> Result<&'a Column> {
	dataframe
		.column(name)
		.ok_or_else(|| format_err!("no column named \"{}\"", name))
}
