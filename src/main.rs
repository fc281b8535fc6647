use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use diesel::Connection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fareseer::clients::{HolidayApiClient, WeatherForecastClient, WeatherHistoricalClient};
use fareseer::config::Settings;
use fareseer::csv_io;
use fareseer::db::build_pool;
use fareseer::forecast::ForecastingEngine;
use fareseer::ingestion::{recompute_monthly_stats, run_holiday_ingestion, run_weather_ingestion};
use fareseer::ingestion::weather::WeatherIngestionClients;
use fareseer::orchestrator::AnalysisOrchestrator;
use fareseer::repos::{HolidayRepository, WeatherRepository};
use fareseer::storage::PgStorage;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

#[derive(Parser, Debug)]
#[command(name = "fareseer", about = "Flight price analytics engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pull one or more calendar years of holidays from the configured API.
    FetchHolidays {
        #[arg(long = "year", required = true)]
        years: Vec<i32>,
    },
    /// Pull historical + forecast weather for a province over a date range.
    FetchDailyWeather {
        #[arg(long)]
        province: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Recompute monthly weather stats for every period with stored
    /// daily rows, independent of any specific ingestion run.
    RecomputeWeatherStats {
        #[arg(long)]
        province: String,
    },
    /// Load holiday rows from a CSV file into storage.
    ImportHolidaysFromCsv { file: String },
    /// Load daily weather rows from a CSV file into storage.
    ImportDailyWeatherFromCsv { file: String },
    /// Run the HTTP transport that exposes `AnalyzeFlightPrices`.
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        interface: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "command failed");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    run_migrations(&settings.database_url).await?;
    let pool = build_pool(&settings.database_url)?;

    match cli.command {
        Command::FetchHolidays { years } => {
            let api_key = settings.iapp_api_key.clone().unwrap_or_default();
            let client = HolidayApiClient::new(settings.iapp_api_url.clone(), api_key);
            let repo = HolidayRepository::new(pool);
            for year in years {
                let report = run_holiday_ingestion(&client, &repo, year..=year).await?;
                info!(year, periods = report.periods_upserted, "holiday fetch complete");
            }
        }
        Command::FetchDailyWeather { province, start, end } => {
            let Some((_, lat, lon)) = fareseer::geo::provinces_with_coordinates()
                .into_iter()
                .find(|(p, _, _)| p.eq_ignore_ascii_case(&province))
            else {
                anyhow::bail!("unknown province: {province}");
            };

            let historical = WeatherHistoricalClient::new("https://archive-api.open-meteo.com/v1".to_string());
            let forecast = settings
                .openweathermap_api_key
                .clone()
                .map(|key| WeatherForecastClient::new("https://api.openweathermap.org/data/2.5".to_string(), key));
            let clients = WeatherIngestionClients { historical, forecast };
            let repo = WeatherRepository::new(pool);

            let today = chrono::Utc::now().date_naive();
            let report = run_weather_ingestion(&clients, &repo, start, end, settings.cutover_date(), today).await?;
            let _ = (lat, lon);
            info!(province, rows = report.daily_rows_written, "weather fetch complete");
        }
        Command::RecomputeWeatherStats { province } => {
            let repo = WeatherRepository::new(pool);
            let refreshed = recompute_monthly_stats(&repo, &province).await?;
            info!(province, periods = refreshed, "weather stats recompute complete");
        }
        Command::ImportHolidaysFromCsv { file } => {
            let entries = csv_io::read_holidays(&file)?;
            let repo = HolidayRepository::new(pool);
            let mut by_period: std::collections::HashMap<String, Vec<_>> = std::collections::HashMap::new();
            for entry in entries {
                let period = format!("{:04}-{:02}", chrono::Datelike::year(&entry.date), chrono::Datelike::month(&entry.date));
                by_period.entry(period).or_default().push(entry);
            }
            for (period, holidays) in by_period {
                let long_weekends = holidays.iter().filter(|e| fareseer::calendar::is_long_weekend(e.date)).count() as i32;
                repo.upsert(fareseer::model::HolidayStat {
                    period,
                    holidays_count: holidays.len() as i32,
                    long_weekends_count: long_weekends,
                    holiday_score: fareseer::scoring::functions::holiday_score(&holidays),
                    holidays_detail: holidays,
                })
                .await?;
            }
            info!(file, "holiday CSV import complete");
        }
        Command::ImportDailyWeatherFromCsv { file } => {
            let rows = csv_io::read_daily_weather(&file)?;
            let repo = WeatherRepository::new(pool);
            let count = rows.len();
            repo.upsert_daily(rows).await?;
            info!(file, rows = count, "daily weather CSV import complete");
        }
        Command::Serve { interface, port } => {
            let holiday_api = settings.iapp_api_key.clone().map(|key| HolidayApiClient::new(settings.iapp_api_url.clone(), key));
            let store = PgStorage::new(pool, holiday_api);
            let forecaster = std::sync::Arc::new(ForecastingEngine::new());
            let orchestrator = AnalysisOrchestrator::new(store, forecaster);
            fareseer::web::start_web_server(&interface, port, orchestrator).await?;
        }
    }

    Ok(())
}

async fn run_migrations(database_url: &str) -> anyhow::Result<()> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = diesel::PgConnection::establish(&database_url)?;
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow::anyhow!("failed to run migrations: {e}"))?;
        Ok::<(), anyhow::Error>(())
    })
    .await?
}
