use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use review_confidence::config::Config;
use review_confidence::diagnostics::sink_for;
use review_confidence::estimate::{estimate_confidence_with, RatingEvidence};
use review_confidence::logging;
use review_confidence::normalize::{Normalizer, SeparatorPolicy};
use review_confidence::page::{format_number, Annotation, PageAnnotator};

#[derive(Parser)]
#[command(name = "review-confidence")]
#[command(about = "Bayesian confidence ratings for Amazon listings")]
#[command(version = "0.1.0")]
struct Cli {
    /// Emit per-widget diagnostics (overrides config.toml)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the confidence rating for a star average and review count
    Estimate {
        /// Average star rating, 0 to 5
        #[arg(long)]
        rating: f64,
        /// Number of reviews behind the rating
        #[arg(long)]
        count: u64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Parse rating and/or count text the way the page widgets are parsed
    Parse {
        #[arg(long)]
        rating_text: Option<String>,
        #[arg(long)]
        count_text: Option<String>,
        /// strip_both, comma_decimal or period_decimal (defaults to config)
        #[arg(long)]
        policy: Option<SeparatorPolicy>,
    },
    /// Replay a saved listing page and print the annotations it would get
    Annotate {
        /// Saved HTML page
        file: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load().context("loading configuration")?;
    config.debug |= cli.debug;

    logging::init_logging(config.debug);
    let sink = sink_for(config.debug);

    match cli.command {
        Commands::Estimate {
            rating,
            count,
            json,
        } => {
            if !(0.0..=5.0).contains(&rating) {
                warn!("Rating {} is outside 0..=5; result will not be meaningful", rating);
            }
            let result = estimate_confidence_with(rating, count, sink.as_ref());
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let evidence = RatingEvidence::from_rating(rating, count);
                println!("Rating:      {} out of 5 from {} reviews", format_number(rating), count);
                println!(
                    "Evidence:    {:.2} good / {:.2} bad",
                    evidence.good_ratings, evidence.bad_ratings
                );
                println!("Original:    {}%", format_number(result.original_percent));
                println!("Confidence:  {}%", format_number(result.confidence_percent));
                println!("Correction:  {}%", format_number(result.correction));
            }
        }
        Commands::Parse {
            rating_text,
            count_text,
            policy,
        } => {
            let normalizer = Normalizer::new(policy.unwrap_or(config.separator_policy));
            if rating_text.is_none() && count_text.is_none() {
                anyhow::bail!("nothing to parse: pass --rating-text and/or --count-text");
            }
            println!("policy: {}", normalizer.policy().as_str());
            if let Some(text) = rating_text {
                match normalizer.parse_rating(&text) {
                    Ok(rating) => println!("rating: {}", format_number(rating)),
                    Err(e) => println!("rating: {}", e),
                }
            }
            if let Some(text) = count_text {
                match normalizer.parse_count(&text) {
                    Ok(count) => println!("count: {}", count),
                    Err(e) => println!("count: {}", e),
                }
            }
        }
        Commands::Annotate { file, json } => {
            let html = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let annotator = PageAnnotator::new(Normalizer::new(config.separator_policy), sink);
            let report = annotator.annotate_html(&html);
            info!(
                file = %file.display(),
                annotated = report.annotations.len(),
                skipped = report.skipped,
                "Annotated page"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for annotation in &report.annotations {
                    match annotation {
                        Annotation::Listing { asin, badge, .. } => {
                            println!("listing {}: {}", asin, badge)
                        }
                        Annotation::Popover {
                            rating_text,
                            count_text,
                            ..
                        } => println!("popover: {} | {}", rating_text, count_text),
                    }
                }
                println!(
                    "{} annotated, {} skipped",
                    report.annotations.len(),
                    report.skipped
                );
            }
        }
    }
    Ok(())
}
