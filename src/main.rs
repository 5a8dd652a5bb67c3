//! CLI interface for globeguide

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use globeguide::render::{render_essentials, render_lookup};
use globeguide::{
    build_provider_links, default_pipeline, parse_optional_date, Language, LookupConfig, Query,
    QueryDraft,
};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "globeguide")]
#[command(about = "Travel essentials, weather and Wikivoyage highlights for a destination")]
#[command(version)]
pub struct Cli {
    /// Write JSON logs to a daily rolling file in this directory instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print booking and transport links for a destination
    Links {
        /// Destination city
        #[arg(short, long, default_value = "Paris")]
        destination: String,
        /// Check-in date (YYYY-MM-DD)
        #[arg(long)]
        checkin: Option<String>,
        /// Check-out date (YYYY-MM-DD)
        #[arg(long)]
        checkout: Option<String>,
        /// Number of adults
        #[arg(long, default_value = "2")]
        adults: u32,
        /// Display language (en, es, fr, hi)
        #[arg(short, long, default_value = "en")]
        lang: String,
        /// Print the raw provider map as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up weather and Wikivoyage highlights for a destination
    Explore {
        /// Destination city
        #[arg(short, long, default_value = "Paris")]
        destination: String,
        /// Display language (en, es, fr, hi)
        #[arg(short, long, default_value = "en")]
        lang: String,
        /// Number of forecast days to show
        #[arg(long, default_value = "3")]
        days: usize,
        /// Output file for the final state as JSON
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Type destinations line by line; each new line replaces the previous lookup.
    /// `:lang <code>` switches the display language.
    Interactive {
        /// Display language (en, es, fr, hi)
        #[arg(short, long, default_value = "en")]
        lang: String,
    },
}

/// Install the tracing subscriber: stderr by default, JSON file when asked
fn init_logging(log_dir: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("globeguide=info"));

    match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "globeguide.log");
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(file_appender)
                        .with_ansi(false)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true)
                        .json(),
                )
                .init();
            info!("Logging initialized - logs will be written to {}/globeguide.log.*", dir.display());
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    match cli.command {
        Commands::Links {
            destination,
            checkin,
            checkout,
            adults,
            lang,
            json,
        } => {
            let language = lang.parse::<Language>()?;
            let query = Query::new(destination)
                .with_dates(
                    parse_optional_date(checkin.as_deref().unwrap_or(""))?,
                    parse_optional_date(checkout.as_deref().unwrap_or(""))?,
                )
                .with_party_size(adults);
            // Same rules as submitting the search form
            let query = QueryDraft::from(&query).submit()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&build_provider_links(&query))?);
            } else {
                print!("{}", render_essentials(&query, language));
            }
        }
        Commands::Explore {
            destination,
            lang,
            days,
            output,
        } => {
            let language = lang.parse::<Language>()?;
            let config = LookupConfig::default().with_forecast_days(days);
            let query = QueryDraft {
                destination,
                ..QueryDraft::from(&Query::default())
            }
            .submit()?;

            println!("Looking up {}...", query.destination);
            let pipeline = default_pipeline(&config)?;
            pipeline.dispatch(&query.destination, language).finished().await;
            let state = pipeline.snapshot();

            print!("{}", render_essentials(&query, language));
            println!();
            print!("{}", render_lookup(&state, language, &config.sections));

            if let Some(output_file) = output {
                let json = serde_json::to_string_pretty(&state)?;
                fs::write(&output_file, &json)
                    .with_context(|| format!("Failed to write {}", output_file))?;
                println!("\nResults saved to {}", output_file);
            }
        }
        Commands::Interactive { lang } => {
            run_interactive(lang.parse::<Language>()?).await?;
        }
    }

    Ok(())
}

/// One line typed in interactive mode
#[derive(Debug, PartialEq)]
enum InputLine {
    Language(Language),
    Checkin(String),
    Checkout(String),
    Adults(u32),
    Destination(String),
}

impl FromStr for InputLine {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            return Ok(InputLine::Destination(line.to_string()));
        };
        let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
        let arg = arg.trim();
        match name {
            "lang" => Ok(InputLine::Language(arg.parse()?)),
            "checkin" => Ok(InputLine::Checkin(arg.to_string())),
            "checkout" => Ok(InputLine::Checkout(arg.to_string())),
            "adults" => Ok(InputLine::Adults(
                arg.parse().with_context(|| format!("Invalid party size: {}", arg))?,
            )),
            other => anyhow::bail!("Unknown command :{}", other),
        }
    }
}

impl InputLine {
    /// Apply the edit to the current form and commit it
    fn apply(self, query: &Query, language: &mut Language) -> Result<Query> {
        let mut draft = QueryDraft::from(query);
        match self {
            InputLine::Language(lang) => *language = lang,
            InputLine::Checkin(date) => draft.checkin = date,
            InputLine::Checkout(date) => draft.checkout = date,
            InputLine::Adults(adults) => draft.party_size = adults,
            InputLine::Destination(destination) => draft.destination = destination,
        }
        Ok(draft.submit()?)
    }
}

async fn run_interactive(mut language: Language) -> Result<()> {
    let config = LookupConfig::default();
    let pipeline = default_pipeline(&config)?;
    let mut updates = pipeline.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "{} - {}",
        globeguide::translate(language, "title"),
        globeguide::translate(language, "tagline")
    );
    println!(
        "{} (:lang <code>, :checkin <date>, :checkout <date>, :adults <n>, Ctrl-D to quit)",
        globeguide::translate(language, "destination")
    );

    let mut query = Query::default();
    print!("{}", render_essentials(&query, language));
    pipeline.dispatch(&query.destination, language);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }

                let edited = line
                    .parse::<InputLine>()
                    .and_then(|input| input.apply(&query, &mut language));
                match edited {
                    Ok(next) => query = next,
                    Err(e) => {
                        eprintln!("{}", e);
                        continue;
                    }
                }
                debug!(destination = %query.destination, %language, "Dispatching lookup");
                println!();
                print!("{}", render_essentials(&query, language));
                pipeline.dispatch(&query.destination, language);
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                println!("\n{}", render_lookup(&state, language, &config.sections));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(&[
            "globeguide",
            "links",
            "--destination", "Lisbon",
            "--checkin", "2025-05-01",
            "--adults", "3",
        ]);

        assert!(cli.is_ok());

        if let Ok(Cli { command: Commands::Links { destination, checkin, adults, lang, .. }, .. }) = cli {
            assert_eq!(destination, "Lisbon");
            assert_eq!(checkin.as_deref(), Some("2025-05-01"));
            assert_eq!(adults, 3);
            assert_eq!(lang, "en");
        }
    }

    #[test]
    fn test_explore_defaults() {
        let cli = Cli::try_parse_from(&["globeguide", "explore"]).unwrap();
        match cli.command {
            Commands::Explore { destination, days, output, .. } => {
                assert_eq!(destination, "Paris");
                assert_eq!(days, 3);
                assert!(output.is_none());
            }
            _ => panic!("expected explore"),
        }
    }

    #[test]
    fn test_global_log_file_flag() {
        let cli = Cli::try_parse_from(&["globeguide", "interactive", "--log-file", "logs"]).unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("logs")));
    }

    #[test]
    fn test_input_line_parsing() {
        assert_eq!("  Lisbon ".parse::<InputLine>().unwrap(), InputLine::Destination("Lisbon".to_string()));
        assert_eq!(":lang fr".parse::<InputLine>().unwrap(), InputLine::Language(Language::Fr));
        assert_eq!(":adults 4".parse::<InputLine>().unwrap(), InputLine::Adults(4));
        assert_eq!(
            ":checkin 2025-05-01".parse::<InputLine>().unwrap(),
            InputLine::Checkin("2025-05-01".to_string())
        );
        assert!(":lang xx".parse::<InputLine>().is_err());
        assert!(":adults many".parse::<InputLine>().is_err());
        assert!(":nap".parse::<InputLine>().is_err());
    }

    #[test]
    fn test_input_line_edits_the_current_query() {
        let mut language = Language::En;
        let query = Query::new("Lisbon");

        let query = InputLine::Checkin("2025-05-01".to_string()).apply(&query, &mut language).unwrap();
        let query = InputLine::Adults(3).apply(&query, &mut language).unwrap();
        assert_eq!(query.destination, "Lisbon");
        assert_eq!(query.checkin, parse_optional_date("2025-05-01").unwrap());
        assert_eq!(query.party_size, 3);

        let query = InputLine::Language(Language::Hi).apply(&query, &mut language).unwrap();
        assert_eq!(language, Language::Hi);
        assert_eq!(query.party_size, 3);

        let earlier = InputLine::Checkout("2025-04-01".to_string()).apply(&query, &mut language);
        assert!(earlier.is_err());
    }
}
