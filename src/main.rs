// Deck Debater - pitch deck review gateway and client
// Main entry point

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deck_debater::backend::{DeckFile, SpeechRequest};
use deck_debater::config::{default_config_path, load_config_from, Config};
use deck_debater::personas::{PersonaCatalog, PersonaCategory};
use deck_debater::review::{DeckGateway, GatewayClient, ReviewSession, DEFAULT_CONCURRENCY};
use deck_debater::server::GatewayServer;
use deck_debater::session::RecordOutcome;
use deck_debater::views::{ConsensusView, CritiqueView, ResultsView};

#[derive(Parser, Debug)]
#[command(name = "deck-debater")]
#[command(about = "Pitch deck review with AI expert personas")]
#[command(version)]
struct Cli {
    /// Debug-level logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.deck-debater/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway server
    Serve {
        /// Address to bind, e.g. 127.0.0.1:3000
        #[arg(long)]
        bind: Option<String>,

        /// Base URL of the analysis service
        #[arg(long)]
        backend_url: Option<String>,
    },

    /// List the built-in persona catalog by category
    Personas {
        /// Load the catalog from a TOML file instead
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Upload a deck, analyze it through a running gateway and write the report
    Review {
        /// The .pptx deck to review
        deck: PathBuf,

        /// Gateway base URL (default: http://<configured bind address>)
        #[arg(long)]
        gateway: Option<String>,

        /// Persona ids to use, comma separated (default: all)
        #[arg(long, value_delimiter = ',')]
        personas: Vec<String>,

        /// 0-based slide indices to analyze, comma separated (default: all)
        #[arg(long, value_delimiter = ',')]
        slides: Vec<usize>,

        /// Report file or directory (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Continue with a placeholder deck if the upload fails
        #[arg(long)]
        demo_fallback: bool,

        /// Reload the persona catalog from the analysis service first
        #[arg(long)]
        refresh_personas: bool,

        /// Slides analyzed at once
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Synthesize a persona's voice to an MP3 file
    Speak {
        #[arg(long)]
        persona: String,

        #[arg(long)]
        text: String,

        #[arg(long, default_value = "audio.mp3")]
        out: PathBuf,

        #[arg(long)]
        gateway: Option<String>,
    },

    /// Report gateway, analysis service and credential status
    Health {
        #[arg(long)]
        gateway: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("deck_debater={default_level},tower_http={default_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config.clone().or_else(default_config_path);
    let mut config = load_config_from(config_path.as_deref())?;

    match cli.command {
        Command::Serve { bind, backend_url } => {
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            if let Some(url) = backend_url {
                config.backend.base_url = url;
            }
            config.validate().context("Invalid command-line overrides")?;
            GatewayServer::new(config)?.serve().await
        }
        Command::Personas { catalog } => {
            let catalog = match catalog {
                Some(path) => PersonaCatalog::load(&path)?,
                None => PersonaCatalog::builtin()?,
            };
            print_catalog(&catalog);
            Ok(())
        }
        Command::Review {
            deck,
            gateway,
            personas,
            slides,
            out,
            demo_fallback,
            refresh_personas,
            concurrency,
        } => {
            let client = gateway_client(&config, gateway)?;
            let options = ReviewOptions {
                personas,
                slides,
                out,
                demo_fallback,
                refresh_personas,
                concurrency,
            };
            run_review(client, &deck, options).await
        }
        Command::Speak {
            persona,
            text,
            out,
            gateway,
        } => {
            let client = gateway_client(&config, gateway)?;
            let request = SpeechRequest {
                text,
                persona_id: persona,
            };
            let audio = client.speak(&request).await?;
            tokio::fs::write(&out, &audio)
                .await
                .with_context(|| format!("Failed to write audio to {}", out.display()))?;
            println!("Wrote {} bytes to {}", audio.len(), out.display());
            Ok(())
        }
        Command::Health { gateway } => {
            let client = gateway_client(&config, gateway)?;
            run_health(&client).await
        }
    }
}

fn gateway_client(config: &Config, gateway: Option<String>) -> Result<GatewayClient> {
    let url = gateway.unwrap_or_else(|| format!("http://{}", config.server.bind_address));
    GatewayClient::new(url, config.backend.request_timeout())
}

struct ReviewOptions {
    personas: Vec<String>,
    slides: Vec<usize>,
    out: Option<PathBuf>,
    demo_fallback: bool,
    refresh_personas: bool,
    concurrency: usize,
}

async fn run_review(client: GatewayClient, deck_path: &Path, options: ReviewOptions) -> Result<()> {
    let bytes = tokio::fs::read(deck_path)
        .await
        .with_context(|| format!("Failed to read deck {}", deck_path.display()))?;
    let file_name = deck_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("Deck path has no file name")?;

    let mut review = ReviewSession::new(client, PersonaCatalog::builtin()?)
        .with_demo_fallback(options.demo_fallback)
        .with_concurrency(options.concurrency);

    if options.refresh_personas {
        match review.refresh_personas().await {
            Ok(count) => println!("Loaded {} personas from the analysis service", count),
            Err(e) => tracing::warn!("Keeping built-in personas: {}", e),
        }
    }

    if !options.personas.is_empty() {
        let unknown: Vec<&String> = options
            .personas
            .iter()
            .filter(|id| !review.store().catalog().contains(id))
            .collect();
        if !unknown.is_empty() {
            tracing::warn!("Ignoring unknown personas: {:?}", unknown);
        }
        review.store_mut().replace_selection(&options.personas);
    }

    let info = match review.upload(DeckFile::new(file_name, bytes)).await {
        Ok(info) => info,
        Err(e) if e.is_local() => bail!("{}", e),
        Err(e) => return Err(anyhow::Error::new(e).context("Upload failed")),
    };
    println!(
        "{}{}: {} slides, {} words, {} with notes",
        info.deck_name,
        if info.placeholder { " (placeholder)" } else { "" },
        info.summary.total_slides,
        info.summary.total_words,
        info.summary.slides_with_notes
    );

    let analyses = if options.slides.is_empty() {
        review.analyze_all().await?
    } else {
        review.analyze_slides(&options.slides).await?
    };

    let mut applied: Vec<usize> = Vec::new();
    for analysis in analyses {
        match analysis.outcome {
            Ok(RecordOutcome::Applied) => applied.push(analysis.slide_index),
            Ok(other) => println!("Slide {}: result discarded ({:?})", analysis.slide_index + 1, other),
            Err(e) if e.is_local() => println!("Slide {}: skipped ({})", analysis.slide_index + 1, e),
            Err(e) => println!("Slide {}: analysis failed: {}", analysis.slide_index + 1, e),
        }
    }
    applied.sort_unstable();

    for index in applied {
        if let Some(view) = CritiqueView::for_slide(review.store(), index) {
            println!("\n{}", view);
        }
        if let Some(view) = ConsensusView::for_slide(review.store(), index) {
            if view.has_feedback() {
                println!("{}", view);
            }
        }
    }

    let results = ResultsView::from_store(review.store());
    println!("\n{}", results);
    if !results.has_results() {
        bail!("No slides were analyzed");
    }

    let target = options.out.unwrap_or_else(|| PathBuf::from("."));
    let path = review.report().write(&target)?;
    println!("Report: {}", path.display());
    Ok(())
}

async fn run_health(client: &GatewayClient) -> Result<()> {
    println!("Gateway: {}", client.base_url());
    match client.credential_loaded().await {
        Ok(true) => println!("Credential: loaded"),
        Ok(false) => println!("Credential: missing"),
        Err(e) => bail!("Gateway is not reachable: {}", e),
    }
    match client.health().await {
        Ok(status) => println!("Analysis service: {}", status),
        Err(e) => println!("Analysis service: unavailable ({})", e),
    }
    Ok(())
}

fn print_catalog(catalog: &PersonaCatalog) {
    for category in PersonaCategory::ALL {
        let personas: Vec<_> = catalog.in_category(category).collect();
        if personas.is_empty() {
            continue;
        }
        println!("{}:", category);
        for persona in personas {
            println!("  {} {:<20} {} ({})", persona.emoji, persona.id, persona.name, persona.role);
        }
    }
}
