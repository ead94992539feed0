//! CLI entry point for the camp rater.
//!
//! Provides subcommands for validating the registration sheet, listing
//! handles and contacts, building per-contest ranklists and event feeds,
//! aggregating ratings across contests and finding unseen practice gyms.

use anyhow::{Context, Result};
use camp_rater::error::{ConfigError, RatingError};
use camp_rater::feed::{self, DEFAULT_FREEZE_SECONDS, DEFAULT_REGION, FeedConfig};
use camp_rater::fetch::BasicClient;
use camp_rater::fetch::auth::ApiSig;
use camp_rater::gyms::find_unseen_gyms;
use camp_rater::infra::codeforces::{CodeforcesClient, DEFAULT_BASE_URL, JudgeHandleResolver};
use camp_rater::infra::keys::ApiCredentials;
use camp_rater::infra::sheets::CsvSheet;
use camp_rater::matching::RegionTable;
use camp_rater::output::{RatingRecord, append_record, clear_csv_files, print_json, write_lines};
use camp_rater::ranklist::{build_report, render_markdown, report_file_name};
use camp_rater::rating::{AggregateRating, RatingBook, aggregate, rate_contest};
use camp_rater::registry::{RatedHandles, Registry};
use camp_rater::services::judge_api::{CachePolicy, JudgeApi, Standings, StandingsQuery};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "camp_rater")]
#[command(about = "Team registry, ranklists and ratings for a programming camp", long_about = None)]
struct Cli {
    /// Registration sheet: a local CSV file or a published CSV export URL
    #[arg(long, env = "CAMP_SHEET", global = true, default_value = "registrations.csv")]
    sheet: String,

    /// Directory for the registry snapshot and cached judge responses
    #[arg(long, global = true, default_value = "cache")]
    cache_dir: PathBuf,

    /// Ignore cached files and fetch everything again
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    /// Base URL of the judge API
    #[arg(long, env = "CODEFORCES_API_BASE", global = true, default_value = DEFAULT_BASE_URL)]
    api_base: String,

    /// Sign judge requests with CODEFORCES_API_KEY and CODEFORCES_API_SECRET
    #[arg(long, global = true, default_value_t = false)]
    auth: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the registration sheet and summarize the registry
    Registry,
    /// Print every rejected registration
    Errors,
    /// Print member and alternate handles
    Handles {
        /// Only teams from this institute
        #[arg(long)]
        institute: Option<String>,
    },
    /// Write one file of contact emails per institute
    Emails {
        #[arg(long, default_value = "mailing-list")]
        out_dir: PathBuf,
    },
    /// Print first-member handles ordered by max rating, highest first
    SeedList,
    /// Build the institute-scoped ranklist of one contest
    Ranklist {
        contest_id: u64,

        /// Directory to write the markdown report to
        #[arg(short, long, default_value = "ranklists")]
        out_dir: PathBuf,
    },
    /// Aggregate ratings over several contests
    Rate {
        #[arg(required = true)]
        contests: Vec<u64>,

        /// Contests a team needs to qualify; also the number of best results averaged
        #[arg(
            short = 'k',
            long,
            default_value_t = 5,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        min_contests: u64,

        /// CSV file to append the final ratings to
        #[arg(long)]
        csv: Option<String>,

        /// Print the result as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate the event feed of one contest
    Feed {
        contest_id: u64,

        /// Output file, gzip-compressed when it ends in .gz
        #[arg(short, long, default_value = "feed.ndjson")]
        output: PathBuf,

        /// JSON map of `name#handle#...#` keys to regions; defaults to team institutes
        #[arg(long)]
        regions: Option<String>,

        #[arg(long, default_value_t = DEFAULT_FREEZE_SECONDS)]
        freeze_seconds: u64,

        /// Include virtual and out-of-competition participants
        #[arg(long, default_value_t = false)]
        unofficial: bool,
    },
    /// Find 5-hour ICPC gyms no registered handle has taken part in (needs --auth)
    Gyms,
}

impl Cli {
    fn cache_file(&self, name: &str) -> Option<String> {
        if self.no_cache {
            return None;
        }
        Some(self.cache_dir.join(name).to_string_lossy().into_owned())
    }
}

fn cache_policy(path: &Option<String>) -> CachePolicy<'_> {
    path.as_deref().map(CachePolicy::file).unwrap_or_default()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/camp_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("camp_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let api = match judge_client(&cli) {
        Ok(api) => api,
        Err(e) => {
            error!(error = %e, "Configuration error");
            println!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Err(e) = run(&cli, &api).await {
        error!(error = %e, "Command failed");
        println!("Error: {e:#}");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Judge client for this run. Credentials are only read with `--auth`.
fn judge_client(cli: &Cli) -> Result<CodeforcesClient, ConfigError> {
    // Gym standings are read as manager, which only signed calls may do.
    if matches!(cli.command, Commands::Gyms) && !cli.auth {
        return Err(ConfigError::AuthRequired { command: "gyms" });
    }
    let client = if cli.auth {
        let creds = ApiCredentials::from_env()?;
        CodeforcesClient::new(ApiSig {
            inner: BasicClient::new(),
            key: creds.key,
            secret: creds.secret,
        })
    } else {
        CodeforcesClient::new(BasicClient::new())
    };
    Ok(client.with_base_url(&cli.api_base))
}

async fn run(cli: &Cli, api: &CodeforcesClient) -> Result<()> {
    match &cli.command {
        Commands::Registry => {
            let registry = load_registry(cli, api).await?;
            println!("Teams registered: {}", registry.teams().len());
            println!("Rows rejected: {}", registry.error_logs().len());
            for (institute, emails) in registry.emails_by_institute() {
                let teams = registry
                    .teams()
                    .iter()
                    .filter(|t| t.institute == institute)
                    .count();
                println!("{institute}: {teams} teams, {} contacts", emails.len());
            }
        }
        Commands::Errors => {
            let registry = load_registry(cli, api).await?;
            let mut errors = registry.error_logs().to_vec();
            errors.sort_by(|a, b| {
                (&a.institute, &a.team, a.row).cmp(&(&b.institute, &b.team, b.row))
            });
            for e in &errors {
                println!("{e}");
            }
        }
        Commands::Handles { institute } => {
            let registry = load_registry(cli, api).await?;
            let handles = match institute {
                Some(institute) => registry.handles_of_institute(institute),
                None => registry.get_all_handles(),
            };
            for handle in handles {
                println!("{handle}");
            }
        }
        Commands::Emails { out_dir } => {
            let registry = load_registry(cli, api).await?;
            let removed = clear_csv_files(out_dir)
                .with_context(|| format!("clearing {}", out_dir.display()))?;
            debug!(removed, "Stale mailing lists removed");
            for (institute, emails) in registry.emails_by_institute() {
                let path = out_dir.join(format!("{institute}.csv"));
                write_lines(&path, &[emails.join(",")])?;
            }
            info!(out_dir = %out_dir.display(), "Mailing lists written");
        }
        Commands::SeedList => {
            let registry = load_registry(cli, api).await?;
            let rated = rated_handles(cli, api).await?;
            for handle in seed_list(&registry, &rated, api).await? {
                println!("{handle}");
            }
        }
        Commands::Ranklist {
            contest_id,
            out_dir,
        } => {
            let standings = contest_standings(cli, api, *contest_id).await?;
            println!("Contest identified: {}", standings.contest.name);
            let registry = load_registry(cli, api).await?;
            let report = build_report(&standings, &registry)?;

            std::fs::create_dir_all(out_dir)?;
            let path = out_dir.join(format!("{}.md", report_file_name(&report.contest_name)));
            std::fs::write(&path, render_markdown(&report))?;
            info!(path = %path.display(), teams = report.entries.len(), "Ranklist written");
        }
        Commands::Rate {
            contests,
            min_contests,
            csv,
            json,
        } => {
            let registry = load_registry(cli, api).await?;
            let mut book = RatingBook::new();
            for contest_id in contests {
                let standings = contest_standings(cli, api, *contest_id).await?;
                println!("Contest identified: {}", standings.contest.name);
                match rate_contest(*contest_id, &standings.rows, &registry) {
                    Ok(ratings) => book.add_contest(&ratings),
                    Err(e @ RatingError::EmptyContest { .. }) => {
                        warn!(contest_id, "{e}, skipping");
                    }
                }
            }

            let result = aggregate(&book, *min_contests as usize);
            if *json {
                print_json(&result)?;
            } else {
                println!("QUALIFIED TEAMS");
                print_ratings(&result.qualified);
                println!("DISQUALIFIED TEAMS");
                print_ratings(&result.disqualified);
            }

            if let Some(path) = csv {
                let records = result
                    .qualified
                    .iter()
                    .map(|r| (r, true))
                    .chain(result.disqualified.iter().map(|r| (r, false)));
                for (idx, (entry, qualified)) in records.enumerate() {
                    append_record(path, &RatingRecord::from_aggregate(idx + 1, entry, qualified))?;
                }
                info!(path = %path, "Ratings appended");
            }
        }
        Commands::Feed {
            contest_id,
            output,
            regions,
            freeze_seconds,
            unofficial,
        } => {
            let standings = contest_standings(cli, api, *contest_id).await?;
            let status_cache = cli.cache_file(&format!("status_{contest_id}.json"));
            let submissions = api
                .submissions(*contest_id, 1, 25_000, cache_policy(&status_cache))
                .await?;

            let table = match regions {
                Some(path) => RegionTable::load(path)
                    .with_context(|| format!("loading region map {path}"))?,
                None => {
                    let registry = load_registry(cli, api).await?;
                    RegionTable::from_standings(&standings.rows, &registry)
                }
            };
            info!(teams = table.len(), "Region table ready");

            let config = FeedConfig {
                freeze_duration_seconds: *freeze_seconds,
                fallback_region: DEFAULT_REGION.to_string(),
                include_virtual: *unofficial,
                include_out_of_comp: *unofficial,
            };
            let events = feed::generate(&config, &table, &standings, &submissions);
            feed::write_events(output, &events)?;
        }
        Commands::Gyms => {
            let registry = load_registry(cli, api).await?;
            let contest_cache = cli.cache_file("gym_contests.json");
            let gyms =
                find_unseen_gyms(api, &registry.get_all_handles(), contest_cache.as_deref())
                    .await?;
            for gym in gyms {
                println!("{}, {}", gym.id, gym.name);
            }
        }
    }

    Ok(())
}

async fn rated_handles(cli: &Cli, api: &CodeforcesClient) -> Result<RatedHandles> {
    match cli.cache_file("rated_users.json") {
        Some(path) => RatedHandles::load_or_fetch(api, &path).await,
        None => Ok(RatedHandles::from_users(
            api.rated_list(false, CachePolicy::default()).await?,
        )),
    }
}

/// Registry from the snapshot when usable, otherwise from the sheet.
async fn load_registry(cli: &Cli, api: &CodeforcesClient) -> Result<Registry> {
    let snapshot = (!cli.no_cache).then(|| cli.cache_dir.join("registry.json"));
    if let Some(path) = &snapshot {
        if let Some(registry) = Registry::from_snapshot(path)? {
            return Ok(registry);
        }
    }

    let rated = rated_handles(cli, api).await?;
    Registry::load_fresh(
        snapshot.as_deref(),
        &CsvSheet::new(&cli.sheet),
        &JudgeHandleResolver::new(api),
        &rated,
    )
    .await
}

async fn contest_standings(
    cli: &Cli,
    api: &CodeforcesClient,
    contest_id: u64,
) -> Result<Standings> {
    let cache = cli.cache_file(&format!("standings_{contest_id}.json"));
    api.standings(StandingsQuery::new(contest_id), cache_policy(&cache))
        .await
        .with_context(|| format!("fetching standings of contest {contest_id}"))
}

/// First-member handles ordered by max rating. Handles missing from the
/// rated list are looked up in one batch; unrated users count as 0.
async fn seed_list(
    registry: &Registry,
    rated: &RatedHandles,
    api: &CodeforcesClient,
) -> Result<Vec<String>> {
    let mut seeds: Vec<(i32, String)> = Vec::new();
    let mut unknown = Vec::new();
    let num_teams = registry.teams().len();

    for (idx, team) in registry.teams().iter().enumerate() {
        let Some(first) = team.members.first() else {
            continue;
        };
        match rated.get(&first.handle) {
            Some(user) => seeds.push((user.max_rating.unwrap_or(0), first.handle.clone())),
            None => unknown.push(first.handle.clone()),
        }
        info!("Processed {}/{}", idx + 1, num_teams);
    }

    if !unknown.is_empty() {
        for user in api.user_info(&unknown).await? {
            seeds.push((user.max_rating.unwrap_or(0), user.handle));
        }
    }

    seeds.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(seeds.into_iter().map(|(_, handle)| handle).collect())
}

fn print_ratings(ratings: &[AggregateRating]) {
    for entry in ratings {
        println!("Team: {}", entry.team.name);
        println!("Institute: {}", entry.team.institute);
        println!("Members: {}", entry.team.handles().join(", "));
        println!("Rating: {}", entry.rating);
        println!();
    }
}
