//! Command-line front end for the shipping news pipeline.
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//!
//! # Classify crawled articles, then index them
//! seabrief analyze crawled.json --output analyzed.json
//! seabrief ingest analyzed.json
//!
//! # Or both at once, stamping today's date on undated articles
//! seabrief pipeline crawled.json --analyzed analyzed.json
//!
//! # Query the store
//! seabrief search "capesize iron ore" --group coal_import_group --from 2025-07-01
//! seabrief ask "최근 Supramax 운임 전망은?" --role 그룹장 --group steel_export_group
//! seabrief browse --category container --limit 10
//! seabrief stats
//! seabrief rebuild
//! ```
//!
//! Settings come from `seabrief.toml` and `SEABRIEF__*` environment variables; see
//! [`seabrief_cli::settings`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seabrief_analyzer::{ArticleAnalyzer, LlmClassifier};
use seabrief_assistant::{Assistant, Role, UserMeta};
use seabrief_cli::{API_KEY_VAR, Settings, load_settings, report};
use seabrief_core::{AnalyzedArticle, ArticleRecord, Group, read_articles, write_articles};
use seabrief_openai::OpenAI;
use seabrief_rag::{NewsIndex, SearchFilters, parse_date};
use serde::Serialize;
use time::{Date, OffsetDateTime};
use tracing_subscriber::EnvFilter;

/// Shipping and steel news: classify, index, search and ask.
#[derive(Parser, Debug)]
#[command(name = "seabrief", version, about)]
struct Cli {
    /// Settings file. Defaults to ./seabrief.toml when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Vector store directory, overriding the settings.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify crawled articles into analyzed articles.
    Analyze {
        /// JSON array of crawled articles.
        input: PathBuf,
        /// Where to write the analyzed articles.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Add analyzed articles to the vector store.
    Ingest {
        /// JSON array of analyzed articles.
        input: PathBuf,
    },
    /// Classify crawled articles and add them to the vector store.
    Pipeline {
        /// JSON array of crawled articles.
        input: PathBuf,
        /// Also keep the analyzed articles in this file.
        #[arg(long)]
        analyzed: Option<PathBuf>,
    },
    /// Semantic search, newest first.
    Search {
        /// Search text.
        query: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Number of results.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Answer a question from the indexed news.
    Ask {
        /// The question.
        question: String,
        /// Position of the asker (사장, 실장, 그룹장, 리더, 담당자 or the English names).
        #[arg(long, default_value = "staff")]
        role: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Add glossary entries regardless of the question.
        #[arg(long)]
        glossary: bool,
        /// Print the full answer record as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the newest stored articles matching the filters.
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
        /// Number of articles.
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Show store size, consistency and facets.
    Stats {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Re-embed every logged article into a fresh index.
    Rebuild,
}

#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
    /// Keep articles with this category (repeatable).
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Keep articles with this event (repeatable).
    #[arg(long = "event")]
    events: Vec<String>,
    /// Keep articles in this group (repeatable); for `ask`, the asker's groups.
    #[arg(long = "group")]
    groups: Vec<Group>,
    /// First day, YYYY-MM-DD.
    #[arg(long, value_parser = parse_day)]
    from: Option<Date>,
    /// Last day, YYYY-MM-DD.
    #[arg(long, value_parser = parse_day)]
    to: Option<Date>,
}

impl FilterArgs {
    fn to_filters(&self) -> SearchFilters {
        let mut filters = SearchFilters::new()
            .categories(self.categories.iter().cloned())
            .events(self.events.iter().cloned())
            .groups(self.groups.iter().copied());
        if self.from.is_some() || self.to.is_some() {
            filters = filters.date_range(
                self.from.unwrap_or(Date::MIN),
                self.to.unwrap_or(Date::MAX),
            );
        }
        filters
    }
}

fn parse_day(value: &str) -> Result<Date, String> {
    parse_date(value).ok_or_else(|| format!("`{value}` is not a YYYY-MM-DD date"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(store) = &cli.store {
        settings.store.directory.clone_from(store);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log.level)),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(
        store = %settings.store.directory.display(),
        index = ?settings.store.index,
        chat_model = %settings.openai.chat_model,
        "Settings loaded"
    );

    match cli.command {
        Command::Analyze { input, output } => {
            let analyzed = analyze(&settings, &input).await?;
            write_articles(&output, &analyzed)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{}", report::render_quality(&analyzed));
        }
        Command::Ingest { input } => {
            let articles: Vec<AnalyzedArticle> = read_articles(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let index = open_index(&settings, true)?;
            let outcome = index.ingest_with_report(articles).await?;
            println!("{}", report::render_ingest(&outcome));
        }
        Command::Pipeline { input, analyzed } => {
            let mut articles = analyze(&settings, &input).await?;
            stamp_missing_dates(&mut articles, OffsetDateTime::now_utc().date());
            println!("{}", report::render_quality(&articles));
            if let Some(path) = analyzed {
                write_articles(&path, &articles)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            let index = open_index(&settings, true)?;
            let outcome = index.ingest_with_report(articles).await?;
            println!("{}", report::render_ingest(&outcome));
        }
        Command::Search {
            query,
            filters,
            top_k,
            json,
        } => {
            let index = open_index(&settings, true)?;
            let top_k = top_k.unwrap_or(settings.store.top_k);
            let hits = index.retrieve(&query, &filters.to_filters(), top_k).await?;
            if json {
                print_json(&hits)?;
            } else {
                print!("{}", report::render_hits(&hits));
            }
        }
        Command::Ask {
            question,
            role,
            filters,
            glossary,
            json,
        } => {
            let index = open_index(&settings, true)?;
            let llm = settings
                .openai_builder(api_key(true)?)
                .temperature(settings.openai.answer_temperature)
                .max_tokens(Some(settings.openai.answer_max_tokens))
                .build();
            let assistant = Assistant::new(index, llm, settings.assistant_config());

            let mut user = UserMeta::new(Role::parse_lossy(&role), filters.groups.iter().copied())
                .with_filters(filters.to_filters());
            if glossary {
                user = user.with_glossary();
            }

            let answer = assistant.answer_detailed(&question, &user).await;
            if json {
                print_json(&answer)?;
            } else {
                println!("{}", answer.text);
            }
        }
        Command::Browse {
            filters,
            limit,
            json,
        } => {
            let index = open_index(&settings, false)?;
            let articles = index.browse(&filters.to_filters(), limit);
            if json {
                print_json(&articles)?;
            } else {
                print!("{}", report::render_articles(&articles));
            }
        }
        Command::Stats { json } => {
            let index = open_index(&settings, false)?;
            let stats = index.stats();
            let facets = index.facets();
            if json {
                print_json(&serde_json::json!({ "stats": stats, "facets": facets }))?;
            } else {
                print!("{}", report::render_stats(&stats, &facets));
            }
        }
        Command::Rebuild => {
            let index = open_index(&settings, true)?;
            let outcome = index.rebuild().await.context("Rebuild failed")?;
            println!("{}", report::render_rebuild(&outcome));
        }
    }
    Ok(())
}

fn api_key(required: bool) -> Result<String> {
    match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ if !required => Ok(String::new()),
        _ => anyhow::bail!("{API_KEY_VAR} is not set"),
    }
}

/// Opens the store. Commands that never embed pass `needs_key = false`.
fn open_index(settings: &Settings, needs_key: bool) -> Result<NewsIndex<OpenAI>> {
    let embedder = settings.openai_builder(api_key(needs_key)?).build();
    Ok(NewsIndex::new(embedder, settings.rag_config()))
}

async fn analyze(settings: &Settings, input: &Path) -> Result<Vec<AnalyzedArticle>> {
    let records: Vec<ArticleRecord> =
        read_articles(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let llm = settings
        .openai_builder(api_key(true)?)
        .temperature(settings.openai.classify_temperature)
        .max_tokens(Some(settings.openai.classify_max_tokens))
        .build();
    let analyzer = ArticleAnalyzer::new(LlmClassifier::new(llm), settings.analyzer_config());
    Ok(analyzer.analyze_batch(&records).await)
}

fn stamp_missing_dates(articles: &mut [AnalyzedArticle], today: Date) {
    for article in articles.iter_mut().filter(|a| a.date.trim().is_empty()) {
        article.date = today.to_string();
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
