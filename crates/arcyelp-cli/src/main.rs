mod display;
mod fetch;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use arcyelp_core::{
    EnrichOptions, GeometryFormat, KeepKeys, ToDocument, enrich, normalize, spatial,
};
use arcyelp_fusion::{DEFAULT_BASE_URL, FusionClient, FusionConfig, SearchParams};
use arcyelp_service::{AppState, ServiceSettings, router};
use arcyelp_store::{DocumentStore, JsonFileStore, MemoryStore};
use clap::{Args, Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "arcyelp", version, about = "Yelp businesses as an ArcGIS feature service")]
struct Cli {
    #[command(flatten)]
    api: ApiArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ApiArgs {
    /// Yelp Fusion API key.
    #[arg(long, env = "YELP_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[arg(long, env = "YELP_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    api_url: String,

    /// Upstream request timeout in seconds (0 disables it).
    #[arg(long, env = "YELP_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search around a point and print enriched businesses.
    Search {
        #[command(flatten)]
        search: SearchArgs,
        #[command(flatten)]
        enrich: EnrichArgs,
        /// Print normalised documents as JSON instead of cards.
        #[arg(long)]
        json: bool,
    },
    /// Print one business by id.
    Details { id: String },
    /// Search once per term and write the enriched results to a store.
    Fetch {
        #[command(flatten)]
        search: SearchArgs,
        #[command(flatten)]
        enrich: EnrichArgs,
        /// Extra search terms; each runs as its own search.
        #[arg(long = "terms", num_args = 1..)]
        terms: Vec<String>,
        #[arg(long, env = "ARCYELP_STORE_DIR")]
        store_dir: PathBuf,
    },
    /// Serve the feature-service endpoints.
    Serve {
        #[arg(long, env = "ARCYELP_LISTEN", default_value = "0.0.0.0:7071")]
        listen: SocketAddr,
        /// Persist documents here; kept in memory when omitted.
        #[arg(long, env = "ARCYELP_STORE_DIR")]
        store_dir: Option<PathBuf>,
        #[arg(long, default_value = "Yelp Items")]
        name: String,
        #[arg(long, default_value = "Yelp passthrough service.")]
        description: String,
        #[arg(long, env = "ARCYELP_MIN_RESOLUTION", default_value_t = 4)]
        min_resolution: u8,
        #[arg(long, env = "ARCYELP_MAX_RESOLUTION", default_value_t = 10)]
        max_resolution: u8,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    #[arg(long, allow_hyphen_values = true)]
    longitude: f64,
    #[arg(long, allow_hyphen_values = true)]
    latitude: f64,
    #[arg(long, default_value = SearchParams::DEFAULT_TERM)]
    term: String,
    /// Search radius in metres.
    #[arg(long, default_value_t = SearchParams::DEFAULT_RADIUS)]
    radius: u32,
    #[arg(long, default_value_t = SearchParams::DEFAULT_LIMIT)]
    limit: u32,
    /// best_match, rating, review_count or distance.
    #[arg(long, default_value = "distance")]
    sort_by: String,
    /// Extra upstream parameter, `key=value`. Repeatable.
    #[arg(long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,
}

impl SearchArgs {
    fn to_params(&self) -> SearchParams {
        self.params.iter().fold(
            SearchParams::new(self.longitude, self.latitude)
                .term(self.term.as_str())
                .radius(self.radius)
                .limit(self.limit)
                .sort_by(self.sort_by.as_str()),
            |p, (k, v)| p.param(k.as_str(), v.as_str()),
        )
    }
}

#[derive(Args, Debug)]
struct EnrichArgs {
    #[arg(long, env = "ARCYELP_MIN_RESOLUTION", default_value_t = 4)]
    min_resolution: u8,
    #[arg(long, env = "ARCYELP_MAX_RESOLUTION", default_value_t = 10)]
    max_resolution: u8,
    /// geojson, arcgis or native.
    #[arg(long, default_value = "geojson")]
    format: GeometryFormat,
}

impl EnrichArgs {
    fn to_options(&self) -> anyhow::Result<EnrichOptions> {
        Ok(EnrichOptions::new(
            resolution_range(self.min_resolution, self.max_resolution)?,
            self.format,
        ))
    }
}

fn resolution_range(min: u8, max: u8) -> anyhow::Result<std::ops::RangeInclusive<u8>> {
    if min > max {
        bail!("minimum resolution {min} is above maximum {max}");
    }
    spatial::resolution(max).context("maximum resolution")?;
    Ok(min..=max)
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    if k.trim().is_empty() {
        return Err(format!("empty key in {s:?}"));
    }
    Ok((k.trim().to_string(), v.to_string()))
}

impl ApiArgs {
    fn client(&self) -> anyhow::Result<FusionClient> {
        let key = self
            .api_key
            .as_deref()
            .context("no API key: pass --api-key or set YELP_API_KEY")?;
        Ok(FusionClient::new(self.config(key))?)
    }

    fn config(&self, key: &str) -> FusionConfig {
        let config = FusionConfig::new(key).with_base_url(self.api_url.as_str());
        if self.timeout_secs > 0 {
            config.with_timeout(Duration::from_secs(self.timeout_secs))
        } else {
            config
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Search {
            search,
            enrich: enrich_args,
            json,
        } => {
            let client = cli.api.client()?;
            let options = enrich_args.to_options()?;
            let records = client.search(&search.to_params()).await.context("searching")?;
            let outcome = enrich(&records, &options).context("enriching")?;
            let keep = KeepKeys::default();

            for record in &outcome.records {
                let normalized = normalize(record, &keep)?;
                if json {
                    println!("{}", serde_json::to_string(normalized.as_document())?);
                } else {
                    display::print_business_card(&normalized);
                }
            }
            eprintln!(
                "{} businesses, {} without coordinates",
                outcome.records.len(),
                outcome.failures.len()
            );
        }
        Command::Details { id } => {
            let client = cli.api.client()?;
            let record = client.details(&id).await.with_context(|| format!("fetching {id}"))?;
            println!("{}", serde_json::to_string_pretty(&record.to_document()?)?);
        }
        Command::Fetch {
            search,
            enrich: enrich_args,
            terms,
            store_dir,
        } => {
            let client = cli.api.client()?;
            let options = enrich_args.to_options()?;
            let store = JsonFileStore::open(&store_dir)
                .await
                .with_context(|| format!("opening {}", store_dir.display()))?;

            eprintln!("Fetching around ({}, {})", search.longitude, search.latitude);
            let stats =
                fetch::run_fetch_pipeline(&client, &store, &search.to_params(), &terms, &options)
                    .await?;
            eprintln!(
                "Done: {} fetched, {} unique, {} stored, {} skipped in {:.1}s",
                stats.fetched, stats.unique, stats.stored, stats.skipped, stats.elapsed_secs
            );
        }
        Command::Serve {
            listen,
            store_dir,
            name,
            description,
            min_resolution,
            max_resolution,
        } => {
            let store: Arc<dyn DocumentStore> = match &store_dir {
                Some(dir) => Arc::new(
                    JsonFileStore::open(dir)
                        .await
                        .with_context(|| format!("opening {}", dir.display()))?,
                ),
                None => Arc::new(MemoryStore::new()),
            };
            let settings = ServiceSettings {
                name,
                description,
                resolutions: resolution_range(min_resolution, max_resolution)?.collect(),
                keep_keys: KeepKeys::default(),
            };

            let mut state = AppState::new(settings).with_store(store);
            match cli.api.api_key.as_deref() {
                Some(key) => state = state.with_fusion(FusionClient::new(cli.api.config(key))?),
                None => tracing::warn!("YELP_API_KEY not set; live queries will return 503"),
            }

            let listener = tokio::net::TcpListener::bind(listen)
                .await
                .with_context(|| format!("binding {listen}"))?;
            info!(%listen, store = ?store_dir, "arcyelp serving");
            axum::serve(listener, router(state)).await?;
        }
    }

    Ok(())
}
