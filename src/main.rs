use dotenvy::dotenv;
use prompt_painter::bot::handlers::{self, Command};
use prompt_painter::bot::{CallbackRouter, ImageCache, ImagePipeline, TelegramTransport};
use prompt_painter::config::Settings;
use prompt_painter::inference::{GenerationClient, HttpTokenRotator, TokenManager, TokenRefresher};
use prompt_painter::translate::{GoogleTranslate, PromptTranslator};
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting secrets from log output
struct RedactionPatterns {
    token1: Regex,
    token2: Regex,
    token3: Regex,
    bearer: Regex,
    cookie: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token1: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            token2: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token3: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
            bearer: Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9._~+/=-]+")?,
            cookie: Regex::new(r#"(?i)(cookie["']?\s*[:=]\s*["']?)[^"'\r\n]+"#)?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token1
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .token2
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .token3
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        output = self.bearer.replace_all(&output, "${1}[MASKED]").to_string();
        output = self.cookie.replace_all(&output, "${1}[MASKED]").to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // The caller's buffer was fully consumed even if the redacted length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting Prompt Painter bot...");

    let settings = init_settings();

    let tokens = init_token_manager(&settings);
    let refresher = if tokens.rotates() {
        Some(TokenRefresher::start(tokens.clone(), settings.token_refresh_interval()).await)
    } else {
        info!("Token rotation is not configured, using the configured API token");
        None
    };

    let cache = ImageCache::new(settings.image_cache_ttl_secs, settings.image_cache_max_bytes);
    let pipeline = init_pipeline(&settings, tokens, cache.clone());
    let router = Arc::new(CallbackRouter::new(cache));

    let bot = Bot::new(settings.telegram_token.clone());
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline, router])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    if let Some(refresher) = refresher {
        refresher.shutdown().await;
    }
    info!("Bot stopped.");

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_token_manager(settings: &Settings) -> Arc<TokenManager> {
    let manager = match settings.rotation() {
        Some((url, cookie)) => {
            let rotator = HttpTokenRotator::new(
                url,
                cookie,
                Duration::from_secs(settings.rotation_http_timeout_secs),
            );
            TokenManager::new(settings.api_token.clone(), Arc::new(rotator))
        }
        None => TokenManager::fixed(settings.api_token.clone()),
    };
    Arc::new(manager)
}

fn init_pipeline(
    settings: &Settings,
    tokens: Arc<TokenManager>,
    cache: ImageCache,
) -> Arc<ImagePipeline> {
    let translator = PromptTranslator::new(Arc::new(GoogleTranslate::new(
        settings.translate_base_url.clone(),
        Duration::from_secs(settings.translate_http_timeout_secs),
    )));
    let generator = GenerationClient::new(
        settings.api_url.clone(),
        tokens,
        Duration::from_secs(settings.generation_http_timeout_secs),
    );

    info!(
        "Pipeline initialized (max concurrent generations: {}, cache ttl: {}s)",
        settings.max_concurrent_generations, settings.image_cache_ttl_secs
    );

    Arc::new(ImagePipeline::new(
        translator,
        Arc::new(generator),
        cache,
        settings.max_concurrent_generations,
    ))
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
) -> Result<(), teloxide::RequestError> {
    let transport = TelegramTransport::new(bot);
    let res = match cmd {
        Command::Start => handlers::start(&transport, msg.chat.id).await,
        Command::Help => handlers::help(&transport, msg.chat.id).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    pipeline: Arc<ImagePipeline>,
) -> Result<(), teloxide::RequestError> {
    let transport = TelegramTransport::new(bot);
    if let Err(e) = handlers::handle_text(&transport, &pipeline, &msg).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    router: Arc<CallbackRouter>,
) -> Result<(), teloxide::RequestError> {
    let transport = TelegramTransport::new(bot.clone());
    if let Err(e) = handlers::handle_callback(&bot, &transport, &router, q).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
