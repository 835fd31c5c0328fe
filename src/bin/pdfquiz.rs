//! CLI binary for pdfquiz.
//!
//! A thin shim over the library crate: `serve` runs the HTTP API,
//! `generate` runs the pipeline once for a file or URL, `inspect` prints
//! document facts without calling a model.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdfquiz::pipeline::input::load_input;
use pdfquiz::{
    generate_quiz, inspect, AppState, Db, GenerationProgressCallback, LlmQuizGenerator,
    ProgressCallback, QuizConfig,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that narrates the pipeline stages on stderr.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_extracted(&self, pages: usize, chars: usize) {
        self.bar.println(format!(
            "  {} {} pages with text  {}",
            green("✓"),
            pages,
            dim(&format!("{chars} chars"))
        ));
    }

    fn on_generation_start(&self, prompt_chars: usize) {
        self.bar.set_prefix("Generating");
        self.bar
            .set_message(format!("waiting for the model ({prompt_chars} prompt chars)"));
    }

    fn on_generation_complete(&self, questions: usize, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {} questions  {}",
            green("✓"),
            questions,
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0))
        ));
        self.bar.set_prefix("Done");
        self.bar.finish_and_clear();
    }

    fn on_generation_error(&self, error: &str) {
        self.bar.println(format!("  {} {}", red("✗"), red(error)));
        self.bar.finish_and_clear();
    }

    fn on_saved(&self, quiz_id: i64) {
        eprintln!("{} saved as quiz {}", green("✔"), bold(&quiz_id.to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP API
  pdfquiz serve --address 0.0.0.0:3000 --database-url sqlite://quizzes.db

  # Generate a quiz once and print it as JSON
  pdfquiz generate notes.pdf

  # Generate from a URL and store the result
  pdfquiz generate https://example.com/paper.pdf --save

  # Page count and metadata (no API key needed)
  pdfquiz inspect notes.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          Provider secret, read on every generation
  PDFQUIZ_DATABASE_URL    SQLite URL (default sqlite://pdfquiz.db)
  PDFQUIZ_ADDRESS         Bind address for `serve` (default 127.0.0.1:3000)
  PDFQUIZ_MODEL           Model ID (default gpt-4.1-nano)
  PDFQUIZ_PROVIDER        Provider name (default openai)
  RUST_LOG                Overrides --verbose / --quiet
"#;

/// Generate multiple-choice quizzes from PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdfquiz",
    version,
    about = "Generate multiple-choice quizzes from PDF documents with LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFQUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFQUIZ_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        /// The address to bind to.
        #[arg(short, long, env = "PDFQUIZ_ADDRESS", default_value = "127.0.0.1:3000")]
        address: String,

        #[command(flatten)]
        db: DbArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Generate one quiz from a PDF file or URL and print it as JSON.
    Generate {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Store the quiz in the database as well.
        #[arg(long)]
        save: bool,

        /// Disable the progress spinner.
        #[arg(long, env = "PDFQUIZ_NO_PROGRESS")]
        no_progress: bool,

        /// HTTP download timeout in seconds.
        #[arg(long, env = "PDFQUIZ_DOWNLOAD_TIMEOUT", default_value_t = 120)]
        download_timeout: u64,

        #[command(flatten)]
        db: DbArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Print page count and metadata of a PDF.
    Inspect {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct DbArgs {
    /// SQLite database URL.
    #[arg(long, env = "PDFQUIZ_DATABASE_URL", default_value = "sqlite://pdfquiz.db")]
    database_url: String,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// LLM model ID.
    #[arg(long, env = "PDFQUIZ_MODEL", default_value = pdfquiz::config::DEFAULT_MODEL)]
    model: String,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "PDFQUIZ_PROVIDER", default_value = pdfquiz::config::DEFAULT_PROVIDER)]
    provider: String,

    /// Environment variable holding the provider secret.
    #[arg(long, env = "PDFQUIZ_API_KEY_ENV", default_value = pdfquiz::config::DEFAULT_API_KEY_ENV)]
    api_key_env: String,

    /// Characters of document text placed in the prompt.
    #[arg(long, env = "PDFQUIZ_TEXT_BUDGET", default_value_t = pdfquiz::config::DEFAULT_TEXT_BUDGET)]
    text_budget: usize,

    /// Separator between text runs of one page.
    #[arg(long, env = "PDFQUIZ_PAGE_SEPARATOR", default_value = " ")]
    page_separator: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDFQUIZ_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "PDFQUIZ_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, env = "PDFQUIZ_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Largest accepted upload in bytes.
    #[arg(long, env = "PDFQUIZ_MAX_UPLOAD", default_value_t = 20 * 1024 * 1024)]
    max_upload: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve { address, db, llm } => {
            let config = Arc::new(build_config(&llm, None)?);
            let db = open_db(&db).await?;
            let generator =
                LlmQuizGenerator::new(Arc::clone(&config)).context("Failed to set up generator")?;

            let state = AppState {
                db: db.clone(),
                generator: Arc::new(generator),
                config,
            };
            pdfquiz::server::serve(&address, state)
                .await
                .with_context(|| format!("Server on {address} failed"))?;
            db.close().await;
        }

        Command::Generate {
            input,
            save,
            no_progress,
            download_timeout,
            db,
            llm,
        } => {
            let progress: Option<ProgressCallback> = if !cli.quiet && !no_progress {
                Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
            } else {
                None
            };
            let config = Arc::new(build_config(&llm, progress)?);
            let bytes = load_input(&input, download_timeout)
                .await
                .with_context(|| format!("Failed to load {input}"))?;
            let generator =
                LlmQuizGenerator::new(Arc::clone(&config)).context("Failed to set up generator")?;

            let output = generate_quiz(&bytes, &config, &generator)
                .await
                .context("Quiz generation failed")?;

            if save {
                let db = open_db(&db).await?;
                let quiz_id = db.save_quiz(&output.quiz).await.context("Failed to save quiz")?;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_saved(quiz_id);
                }
                let stored = db.get_quiz(quiz_id).await.context("Failed to read quiz back")?;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&stored).context("Failed to serialise quiz")?
                );
                db.close().await;
            } else {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output.quiz).context("Failed to serialise quiz")?
                );
            }

            if !cli.quiet {
                eprintln!(
                    "   {} questions  /  ~{} tokens in, ~{} tokens out  /  ~${:.5}  —  {}ms total",
                    output.stats.question_count,
                    dim(&output.usage.estimated_input_tokens.to_string()),
                    dim(&output.usage.estimated_output_tokens.to_string()),
                    output.usage.estimated_cost_usd,
                    output.stats.total_ms,
                );
            }
        }

        Command::Inspect { input, json } => {
            let bytes = load_input(&input, 120)
                .await
                .with_context(|| format!("Failed to load {input}"))?;
            let info = inspect(&bytes).await.context("Failed to inspect PDF")?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&info).context("Failed to serialize metadata")?
                );
            } else {
                println!("File:         {}", input);
                if let Some(ref t) = info.title {
                    println!("Title:        {}", t);
                }
                if let Some(ref a) = info.author {
                    println!("Author:       {}", a);
                }
                println!("Pages:        {}", info.page_count);
                println!("PDF Version:  {}", info.pdf_version);
                println!("Encrypted:    {}", info.encrypted);
            }
        }
    }

    Ok(())
}

async fn open_db(args: &DbArgs) -> Result<Db> {
    Db::connect(&args.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", args.database_url))
}

/// Map CLI args to `QuizConfig`.
fn build_config(llm: &LlmArgs, progress: Option<ProgressCallback>) -> Result<QuizConfig> {
    let mut builder = QuizConfig::builder()
        .model(&llm.model)
        .provider_name(&llm.provider)
        .api_key_env(&llm.api_key_env)
        .text_budget(llm.text_budget)
        .page_separator(&llm.page_separator)
        .temperature(llm.temperature)
        .max_tokens(llm.max_tokens)
        .api_timeout_secs(llm.api_timeout)
        .max_upload_bytes(llm.max_upload);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
