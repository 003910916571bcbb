use std::collections::BTreeSet;
use std::error::Error;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use recipe_assistant::{load_config, FormatStyle, Pipeline, PipelineResult, RunOptions};

#[derive(Debug, Parser)]
#[command(
    name = "recipe-assistant",
    version,
    about = "Find, scale and format recipes from the web"
)]
struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full pipeline for a food request
    Run(RunArgs),
    /// List search candidates for a query
    Search(SearchArgs),
    /// Extract the recipe on a single page
    Extract {
        #[arg(value_name = "URL")]
        url: String,

        /// Read JSON-LD or recipe-card markup instead of asking the model
        #[arg(long)]
        structured: bool,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// What to cook, e.g. "vegan pancakes for 6 people"
    #[arg(value_name = "REQUEST")]
    request: Vec<String>,

    /// Dietary restrictions: vegan, vegetarian, keto, paleo, gluten-free,
    /// dairy-free, nut-free, soy-free, sugar-free, low-carb, high-protein
    #[arg(long, value_delimiter = ',')]
    diet: Vec<String>,

    /// Scale the recipe to this many servings
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    servings: Option<u32>,

    /// Output style: cookbook, simple, detailed or blogger
    #[arg(long)]
    style: Option<FormatStyle>,

    /// File name for the markdown output
    #[arg(long)]
    output: Option<String>,

    /// Stop after extraction and scaling
    #[arg(long)]
    no_format: bool,
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[arg(value_name = "QUERY")]
    query: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    diet: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.as_str().to_lowercase()),
    )
    .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Box<dyn Error>> {
    let config = load_config(cli.config.as_deref())?;
    let pipeline = Pipeline::builder().config(config).build()?;

    match cli.command {
        Command::Run(args) => {
            let options = RunOptions {
                restrictions: normalize_diet(&args.diet),
                servings: args.servings,
                style: args.style,
                output_filename: args.output,
                format: !args.no_format,
            };
            let result = pipeline.run_with(&args.request.join(" "), &options).await;
            print_result(&result)?;
            Ok(result.is_success())
        }
        Command::Search(args) => {
            let restrictions: Vec<String> = normalize_diet(&args.diet).into_iter().collect();
            let candidates = pipeline
                .search(&args.query.join(" "), &restrictions)
                .await?;
            if candidates.is_empty() {
                println!("No recipes found.");
                return Ok(false);
            }
            for (index, candidate) in candidates.iter().enumerate() {
                println!("{}. {} [{}]", index + 1, candidate.title, candidate.source);
                println!("   {}", candidate.url);
                println!("   {}", candidate.description);
            }
            Ok(true)
        }
        Command::Extract { url, structured } => {
            let recipe = if structured {
                pipeline.extract_structured(&url).await?
            } else {
                pipeline.extract(&url).await?
            };
            println!("{}", serde_json::to_string_pretty(&recipe)?);
            Ok(recipe.is_usable())
        }
    }
}

fn normalize_diet(diet: &[String]) -> BTreeSet<String> {
    diet.iter()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

fn print_result(result: &PipelineResult) -> Result<(), serde_json::Error> {
    match result {
        PipelineResult::Formatted(formatted) => {
            println!("{}", formatted.content);
            println!();
            println!("Saved to {}", formatted.file_path);
        }
        PipelineResult::Scaled(scaled) => {
            println!("{}", serde_json::to_string_pretty(scaled)?);
        }
        PipelineResult::Extracted(recipe) => {
            println!("{}", serde_json::to_string_pretty(recipe)?);
        }
        PipelineResult::Failure(err) => {
            eprintln!("Failed during {}: {}", err.stage(), err);
        }
    }
    Ok(())
}
