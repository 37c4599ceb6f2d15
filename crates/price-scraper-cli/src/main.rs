use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use price_scraper_core::{
    acquire::{self, SourceSpec},
    client::{self, ApiKey, ClientSettings},
    config::{self, ScraperConfig},
    decode,
    narrow::{NarrowPolicy, Narrowing, DEFAULT_CONTAINER},
    pipeline::{self, RunError, RunReport},
    prompt, LlmProvider, PriceScraperResponse, ScrapeError,
};

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_hint() -> Style   { Style::new().color256(243) }         // soft gray
fn s_err() -> Style    { Style::new().color256(167) }         // red
fn s_price() -> Style  { Style::new().color256(109) }         // teal
fn s_label() -> Style  { Style::new().color256(146) }         // muted lavender

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "price-scraper",
    about = "Extract per-model token prices from a vendor pricing page with an LLM",
    version,
    after_help = "examples:\n  \
        price-scraper                                        (data/claude.html via Gemini)\n  \
        price-scraper --local-html pages/openai.html --provider claude\n  \
        price-scraper --url https://example.com/pricing --container '#prices'\n  \
        price-scraper --url https://example.com/pricing --render --wait-for main\n  \
        price-scraper prompt                                 (show the system prompt)\n  \
        price-scraper decode reply.json                      (check a saved LLM reply)"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to an HTML page containing pricing.
    #[arg(long, default_value = "data/claude.html")]
    local_html: PathBuf,

    /// Fetch the page from this URL instead of a local file.
    #[arg(long, conflicts_with = "local_html")]
    url: Option<String>,

    /// Render the URL in headless Chromium before extracting.
    #[arg(long, requires = "url")]
    render: bool,

    /// CSS selector that must be visible before a rendered page is captured.
    #[arg(long, default_value = DEFAULT_CONTAINER)]
    wait_for: String,

    /// Seconds to wait for --wait-for to become visible.
    #[arg(long, requires = "render")]
    render_timeout: Option<u64>,

    /// CSS selector of the container sent to the LLM [default: main].
    #[arg(long, conflicts_with = "no_narrow")]
    container: Option<String>,

    /// Send the whole page instead of one container.
    #[arg(long)]
    no_narrow: bool,

    /// Send the whole page when the container is missing instead of failing.
    #[arg(long)]
    fallback_full_page: bool,

    /// LLM used for scraping: gemini or claude [default: gemini].
    #[arg(long, short)]
    provider: Option<LlmProvider>,

    /// Model used for scraping prices [default depends on provider].
    #[arg(long)]
    scraper_model: Option<String>,

    /// API key; defaults to $GEMINI_API_KEY or $ANTHROPIC_API_KEY.
    #[arg(long)]
    api_key: Option<String>,

    /// Retry transient LLM failures this many times.
    #[arg(long)]
    retries: Option<u32>,

    /// Per-request timeout in seconds for page fetches and LLM calls.
    #[arg(long)]
    timeout: Option<u64>,

    /// Settings file [default: <config dir>/price-scraper/config.toml].
    #[arg(long)]
    config: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug).
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the system prompt sent to the LLM.
    Prompt,
    /// Decode a saved LLM reply and print the prices.
    Decode {
        /// File holding the raw reply text.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Prompt) => {
            println!("{}", prompt::system_prompt());
            Ok(())
        }
        Some(Commands::Decode { ref file }) => cmd_decode(file),
        None => cmd_scrape(&cli).await,
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ── Settings ─────────────────────────────────────────────────────────

/// Flags over config file over built-in defaults.
#[derive(Debug)]
struct Settings {
    source: SourceSpec,
    narrowing: Narrowing,
    provider: LlmProvider,
    model: String,
    client: ClientSettings,
    fetch_timeout: Duration,
}

fn resolve(cli: &Cli, cfg: ScraperConfig) -> Settings {
    let provider = cli.provider.or(cfg.provider).unwrap_or_default();
    let model = cli
        .scraper_model
        .clone()
        .or(cfg.model)
        .unwrap_or_else(|| provider.default_model().to_string());

    let timeout = cli.timeout.or(cfg.timeout_secs);
    let fetch_timeout = timeout
        .map(Duration::from_secs)
        .unwrap_or(acquire::DEFAULT_FETCH_TIMEOUT);

    let source = match &cli.url {
        Some(url) if cli.render => SourceSpec::Rendered {
            url: url.clone(),
            wait_for: cli.wait_for.clone(),
            timeout: cli
                .render_timeout
                .or(cfg.render_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(acquire::DEFAULT_RENDER_TIMEOUT),
            chromium_path: cfg.chromium_path.map(PathBuf::from),
        },
        Some(url) => SourceSpec::Http { url: url.clone() },
        None => SourceSpec::File(cli.local_html.clone()),
    };

    let policy = if cli.fallback_full_page || cfg.fallback_full_page.unwrap_or(false) {
        NarrowPolicy::FallbackToFullPage
    } else {
        NarrowPolicy::Strict
    };
    let narrowing = if cli.no_narrow {
        Narrowing::disabled()
    } else {
        Narrowing {
            selector: Some(
                cli.container
                    .clone()
                    .or(cfg.container)
                    .unwrap_or_else(|| DEFAULT_CONTAINER.to_string()),
            ),
            policy,
        }
    };

    let base_url = match provider {
        LlmProvider::Gemini => cfg.gemini_base_url,
        LlmProvider::Claude => cfg.claude_base_url,
    };
    let client = ClientSettings {
        base_url,
        timeout: timeout
            .map(Duration::from_secs)
            .unwrap_or(client::DEFAULT_TIMEOUT),
        max_tokens: cfg.max_tokens.unwrap_or(client::DEFAULT_MAX_TOKENS),
        max_retries: cli.retries.or(cfg.max_retries).unwrap_or(0),
    };

    Settings {
        source,
        narrowing,
        provider,
        model,
        client,
        fetch_timeout,
    }
}

// ── Scrape ───────────────────────────────────────────────────────────

async fn cmd_scrape(cli: &Cli) -> anyhow::Result<()> {
    let cfg = config::load_config_or_default(cli.config.as_deref())?;
    let settings = resolve(cli, cfg);

    // The key is read once here and injected; the core never looks at the environment.
    let key_value = cli
        .api_key
        .clone()
        .or_else(|| std::env::var(settings.provider.key_env()).ok());
    let key = match ApiKey::require(key_value, settings.provider) {
        Ok(k) => k,
        Err(e) => fail(&e),
    };
    let source = match acquire::build_source(settings.source.clone(), settings.fetch_timeout) {
        Ok(s) => s,
        Err(e) => fail(&e),
    };
    let extractor =
        client::build_extractor(settings.provider, &settings.model, key, &settings.client);

    let term = Term::stderr();
    let interactive = term.is_term() && cli.verbose == 0;
    if interactive {
        term.write_line(&format!(
            "{}",
            s_dim().apply_to(format!(
                "extracting prices via {} ({})...",
                settings.provider, settings.model
            ))
        ))?;
    }

    let result = pipeline::run(source.as_ref(), extractor.as_ref(), &settings.narrowing).await;

    if interactive {
        term.clear_last_lines(1)?;
    }

    match result {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            report_failure(&e);
            std::process::exit(1);
        }
    }
}

// ── Decode ───────────────────────────────────────────────────────────

fn cmd_decode(file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", file.display()))?;
    match decode::decode(&raw) {
        Ok(resp) => {
            println!();
            print_prices(&resp);
            println!();
            Ok(())
        }
        Err(e) => {
            report_failure(&RunError {
                stage: pipeline::Stage::Decode,
                source: ScrapeError::Decode(e),
            });
            std::process::exit(1);
        }
    }
}

// ── Output ───────────────────────────────────────────────────────────

fn print_report(report: &RunReport) {
    println!();
    println!(
        "{}  {}",
        s_header().apply_to("extracted prices"),
        s_hint().apply_to(&report.source)
    );
    println!("{}", sep(64));
    print_prices(&report.response);
    println!("{}", sep(64));

    let u = &report.usage;
    let row = |label: &str, value: String| {
        println!("  {:<26} {}", s_label().apply_to(label), value);
    };
    row("scraper", format!("{} ({})", report.provider, report.model));
    row("input token count", u.prompt_tokens.to_string());
    row("tokens generated", u.completion_tokens.to_string());
    row(
        "output tokens per second",
        format!("{:.2}", u.tokens_per_second()),
    );
    row("extraction time", fmt_duration(u.elapsed));
    row("total execution time", fmt_duration(report.total_elapsed));
    println!();
}

fn print_prices(resp: &PriceScraperResponse) {
    if resp.is_empty() {
        println!("  {}", s_dim().apply_to("no model prices found on the page"));
        return;
    }

    let cheapest = resp.cheapest_output().map(|m| m.model_name.as_str());

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("  Model").fg(Color::AnsiValue(243)),
        Cell::new("Input / 1M").fg(Color::AnsiValue(243)),
        Cell::new("Output / 1M").fg(Color::AnsiValue(243)),
    ]);
    for mp in &resp.model_prices {
        let name_color = if Some(mp.model_name.as_str()) == cheapest {
            Color::AnsiValue(114)
        } else {
            Color::AnsiValue(252)
        };
        table.add_row(vec![
            Cell::new(format!("  {}", mp.model_name)).fg(name_color),
            Cell::new(mp.input_token_price.to_string()).fg(Color::AnsiValue(109)),
            Cell::new(mp.output_token_price.to_string()).fg(Color::AnsiValue(109)),
        ]);
    }
    println!("{table}");

    let dupes = resp.duplicate_names();
    if !dupes.is_empty() {
        println!(
            "  {}",
            s_hint().apply_to(format!("listed more than once: {}", dupes.join(", ")))
        );
    }
    println!(
        "  {}",
        s_price().apply_to(format!("{} models", resp.len()))
    );
}

fn report_failure(e: &RunError) {
    eprintln!("{}", s_err().apply_to(format!("error: {e}")));
    if let ScrapeError::Decode(d) = &e.source {
        eprintln!();
        eprintln!("{}", s_dim().apply_to("--- raw reply ---"));
        eprintln!("{}", d.raw);
        eprintln!("{}", s_dim().apply_to("---"));
    }
    if matches!(e.source, ScrapeError::ContainerNotFound { .. }) {
        eprintln!(
            "{}",
            s_hint().apply_to("  try --container <selector>, --fallback-full-page or --no-narrow")
        );
    }
}

fn fail(e: &ScrapeError) -> ! {
    eprintln!("{}", s_err().apply_to(format!("error: {e}")));
    std::process::exit(1);
}

fn fmt_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs >= 1.0 {
        format!("{secs:.2}s")
    } else {
        format!("{}ms", d.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["price-scraper"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("args should parse")
    }

    #[test]
    fn defaults_read_local_claude_page_with_gemini() {
        let s = resolve(&parse(&[]), ScraperConfig::default());
        assert_eq!(s.source, SourceSpec::File("data/claude.html".into()));
        assert_eq!(s.provider, LlmProvider::Gemini);
        assert_eq!(s.model, "gemini-1.5-flash-latest");
        assert_eq!(s.narrowing, Narrowing::default());
        assert_eq!(s.client.max_retries, 0);
    }

    #[test]
    fn flags_override_config_file() {
        let cfg = ScraperConfig {
            provider: Some(LlmProvider::Gemini),
            model: Some("from-config".into()),
            container: Some("#cfg".into()),
            max_retries: Some(5),
            ..Default::default()
        };
        let s = resolve(
            &parse(&["--provider", "claude", "--container", "#flag", "--retries", "1"]),
            cfg,
        );
        assert_eq!(s.provider, LlmProvider::Claude);
        assert_eq!(s.model, "from-config");
        assert_eq!(s.narrowing.selector.as_deref(), Some("#flag"));
        assert_eq!(s.client.max_retries, 1);
    }

    #[test]
    fn provider_default_model_used_when_unset() {
        let s = resolve(&parse(&["--provider", "claude"]), ScraperConfig::default());
        assert_eq!(s.model, LlmProvider::Claude.default_model());
    }

    #[test]
    fn url_with_render_builds_rendered_source() {
        let s = resolve(
            &parse(&["--url", "https://x.test/p", "--render", "--wait-for", "#t", "--render-timeout", "5"]),
            ScraperConfig::default(),
        );
        match s.source {
            SourceSpec::Rendered { url, wait_for, timeout, .. } => {
                assert_eq!(url, "https://x.test/p");
                assert_eq!(wait_for, "#t");
                assert_eq!(timeout, Duration::from_secs(5));
            }
            other => panic!("expected rendered source, got {other:?}"),
        }
    }

    #[test]
    fn url_without_render_is_plain_fetch() {
        let s = resolve(&parse(&["--url", "https://x.test/p"]), ScraperConfig::default());
        assert_eq!(s.source, SourceSpec::Http { url: "https://x.test/p".into() });
    }

    #[test]
    fn render_requires_url() {
        assert!(Cli::try_parse_from(["price-scraper", "--render"]).is_err());
    }

    #[test]
    fn no_narrow_disables_container() {
        let s = resolve(&parse(&["--no-narrow"]), ScraperConfig::default());
        assert!(s.narrowing.selector.is_none());
    }

    #[test]
    fn fallback_from_config_or_flag() {
        let cfg = ScraperConfig {
            fallback_full_page: Some(true),
            ..Default::default()
        };
        assert_eq!(
            resolve(&parse(&[]), cfg).narrowing.policy,
            NarrowPolicy::FallbackToFullPage
        );
        assert_eq!(
            resolve(&parse(&["--fallback-full-page"]), ScraperConfig::default()).narrowing.policy,
            NarrowPolicy::FallbackToFullPage
        );
    }
}
