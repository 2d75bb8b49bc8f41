//! Command-line front end for VerifyNews.
//!
//! Reads configuration from the environment (and `.env`), then runs one
//! command against the configured Appwrite project and Gemini model.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use verifynews_common::{AppConfig, Article, Veracity, VerificationRecord, VoteDirection};
use verifynews_core::{
    signup_with_form, AppwriteAuth, AuthProvider, GeminiOracle, OAuthProvider, SignupForm, Submission,
    TrendingFeed, VerificationService, Verifier, VerifyNewsError,
};

#[derive(Parser)]
#[command(name = "verifynews")]
#[command(about = "Check news claims and browse saved verifications")]
#[command(version)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the oracle about a claim and save the verdict
    Verify {
        /// The claim to check
        query: String,

        /// Article text to judge the claim against
        #[arg(long, default_value = "")]
        content: String,

        /// URL of the article the claim came from
        #[arg(long)]
        article_url: Option<String>,

        /// Title of that article
        #[arg(long, requires = "article_url")]
        article_title: Option<String>,

        /// Title for the saved verification
        #[arg(long)]
        title: Option<String>,

        /// Owner of the verification
        #[arg(long, env = "VERIFYNEWS_USER_ID")]
        user_id: Option<String>,
    },

    /// Show a verification by slug and count the view
    Show { slug: String },

    /// List the most recent verifications
    Recent {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },

    /// List one user's verifications
    History {
        user_id: String,

        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },

    /// Record a view without printing the record
    View { id: String },

    /// Vote a verification up or down
    Vote {
        id: String,

        #[arg(value_enum)]
        direction: Direction,
    },

    /// Totals per verdict
    Stats,

    /// Poll recent verifications and print new misinformation alerts
    Watch {
        /// Seconds between polls
        #[arg(long, default_value_t = 30)]
        interval: u64,

        /// How many recent records each poll looks at
        #[arg(long, default_value_t = 20)]
        window: u32,

        /// Alerts kept in the feed
        #[arg(long, default_value_t = TrendingFeed::DEFAULT_CAPACITY)]
        capacity: usize,
    },

    /// Create an account with email and password
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long, env = "VERIFYNEWS_PASSWORD", hide_env_values = true)]
        password: String,

        /// Defaults to the password when omitted
        #[arg(long)]
        confirm_password: Option<String>,

        #[arg(long, default_value = "")]
        name: String,
    },

    /// Print the URL that starts a social login
    SocialLogin { provider: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for VoteDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => VoteDirection::Up,
            Direction::Down => VoteDirection::Down,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<VerifyNewsError>() {
                Some(err) => {
                    tracing::error!(kind = ?err.kind(), error = %err, "Command failed");
                    eprintln!("Error: {}", err.user_message());
                }
                None => {
                    tracing::error!(error = %e, "Command failed");
                    eprintln!("Error: {e:#}");
                }
            }
            ExitCode::from(1)
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env()?;
    let service = Arc::new(VerificationService::from_config(&config));
    let out = Output { json: cli.json };

    match cli.command {
        Commands::Verify {
            query,
            content,
            article_url,
            article_title,
            title,
            user_id,
        } => {
            let oracle = GeminiOracle::from_config(&config)
                .ok_or(VerifyNewsError::NotConfigured("verification oracle"))?;
            tracing::info!(model = oracle.model(), "Verifying claim");

            let article = article_url.map(|url| Article {
                title: article_title.unwrap_or_else(|| url.clone()),
                url,
                snippet: String::new(),
            });
            let verifier = Verifier::new(Arc::new(oracle), service);
            let submitted = verifier
                .submit(Submission {
                    query,
                    content,
                    user_id,
                    article,
                    title,
                })
                .await?;

            out.print(&submitted, || {
                let r = &submitted.result;
                println!("{} ({}% confident)", verdict_label(r.veracity), r.confidence);
                println!("{}", r.explanation);
                for source in &r.sources {
                    println!("  - {}: {}", source.name, source.url);
                }
                println!("Saved as {}", submitted.slug);
            })
        }

        Commands::Show { slug } => {
            let record = service
                .view_by_slug(&slug)
                .await?
                .ok_or_else(|| anyhow!("No verification found for \"{slug}\""))?;

            out.print(&record, || print_record(&record))
        }

        Commands::Recent { limit } => {
            let records = service.get_recent(limit).await?;
            out.print(&records, || print_list(&records))
        }

        Commands::History { user_id, limit } => {
            let records = service.get_history(&user_id, limit).await?;
            out.print(&records, || print_list(&records))
        }

        Commands::View { id } => {
            let record = service.get_by_id(&id).await?;
            service.increment_view_count(&record.id, record.view_count).await?;
            let views = record.view_count.saturating_add(1);
            out.print(&serde_json::json!({ "id": id, "viewCount": views }), || {
                println!("{views} views")
            })
        }

        Commands::Vote { id, direction } => {
            service.vote_on_verification(&id, direction.into()).await?;
            let record = service.get_by_id(&id).await?;
            out.print(&record, || {
                println!("▲ {}  ▼ {}  score {}", record.upvotes, record.downvotes, record.score())
            })
        }

        Commands::Stats => {
            let stats = service.stats().await?;
            out.print(&stats, || {
                println!("Total verifications: {}", stats.total);
                for v in Veracity::ALL {
                    println!(
                        "  {:<10} {:>6}  ({:.1}%)",
                        verdict_label(v),
                        stats.count(v),
                        stats.share(v)
                    );
                }
            })
        }

        Commands::Watch {
            interval,
            window,
            capacity,
        } => watch(&service, &out, interval, window, capacity).await,

        Commands::Signup {
            email,
            password,
            confirm_password,
            name,
        } => {
            let auth = AppwriteAuth::from_config(&config);
            let form = SignupForm {
                name,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            };
            let account = signup_with_form(&auth, &form).await?;
            out.print(&account, || println!("Account created for {}", account.email))
        }

        Commands::SocialLogin { provider } => {
            let provider: OAuthProvider = provider
                .parse()
                .map_err(|e: String| VerifyNewsError::validation(e))?;
            let auth = AppwriteAuth::from_config(&config);
            let url = auth.social_login(provider)?;
            out.print(&serde_json::json!({ "provider": provider.as_str(), "url": url }), || {
                println!("{url}")
            })
        }
    }
}

async fn watch(
    service: &VerificationService,
    out: &Output,
    interval: u64,
    window: u32,
    capacity: usize,
) -> Result<()> {
    let mut feed = TrendingFeed::new(capacity);
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    tracing::info!(interval, window, capacity, "Watching for trending misinformation");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A failed poll is logged and retried on the next tick.
                match feed.refresh(service, window).await {
                    Ok(raised) => {
                        for alert in raised.iter().rev() {
                            out.print(alert, || {
                                println!(
                                    "[{:?}] {} ({} {}%) /{}",
                                    alert.severity,
                                    alert.headline,
                                    alert.veracity,
                                    alert.confidence,
                                    alert.slug
                                )
                            })?;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Trending refresh failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(alerts = feed.len(), "Stopping watch");
                return Ok(());
            }
        }
    }
}

struct Output {
    json: bool,
}

impl Output {
    fn print<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}

fn verdict_label(veracity: Veracity) -> &'static str {
    match veracity {
        Veracity::True => "TRUE",
        Veracity::False => "FALSE",
        Veracity::Uncertain => "UNCERTAIN",
    }
}

fn print_record(record: &VerificationRecord) {
    println!("{}", record.headline());
    println!(
        "{} ({}% confident) · {} views · ▲ {} ▼ {}",
        verdict_label(record.veracity),
        record.confidence,
        record.view_count,
        record.upvotes,
        record.downvotes
    );
    println!();
    println!("{}", record.explanation);
    if !record.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &record.sources {
            println!("  - {}: {}", source.name, source.url);
        }
    }
}

fn print_list(records: &[VerificationRecord]) {
    if records.is_empty() {
        println!("No verifications yet.");
        return;
    }
    for record in records {
        println!(
            "{}  {:<9} {:>3}%  {}  ({})",
            record.created_at.format("%Y-%m-%d %H:%M"),
            verdict_label(record.veracity),
            record.confidence,
            record.headline(),
            record.slug
        );
    }
}
