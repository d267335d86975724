use clap::{Parser, Subcommand};
use companion::backend::HttpBackend;
use companion::config::{self, Config};
use companion::draft::{self, Composer, DispatchError};
use companion::lists::{self, ReplyDraftList};
use companion::render;
use companion::session::{Feature, Session, TurnOutcome};
use companion::storage::{FileStore, KeyValueStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "inbox-companion")]
#[command(about = "Inbox Companion: to-dos, reply drafts, and email chat from your email assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory, a default config, and the session storage file.
    Init {
        /// Config file path (default: INBOX_COMPANION_CONFIG_PATH or ~/.inbox-companion/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Show to-dos extracted from your email.
    Todos {
        /// Config file path (default: INBOX_COMPANION_CONFIG_PATH or ~/.inbox-companion/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Show AI reply drafts. Pass --expand to show one draft's original message.
    Drafts {
        /// Config file path (default: INBOX_COMPANION_CONFIG_PATH or ~/.inbox-companion/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Draft id whose original message to show.
        #[arg(long, value_name = "ID")]
        expand: Option<i64>,
    },

    /// Chat with the assistant to draft an email (interactive). `/send` emails the latest reply, `/clear` starts over.
    Chat {
        /// Config file path (default: INBOX_COMPANION_CONFIG_PATH or ~/.inbox-companion/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Clear the saved conversation before starting.
        #[arg(long)]
        clear: bool,
    },

    /// Ask questions about your email. With a question, runs one turn; without, starts an interactive chat.
    Ask {
        /// Config file path (default: INBOX_COMPANION_CONFIG_PATH or ~/.inbox-companion/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Question to ask.
        question: Option<String>,
    },

    /// Turn text into a draft, preview it, and send it.
    Compose {
        /// Config file path (default: INBOX_COMPANION_CONFIG_PATH or ~/.inbox-companion/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Draft text.
        text: String,

        /// Preview only; do not send.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("inbox-companion {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init { config }) => run_init(config),
        Some(Commands::Todos { config }) => run_todos(config).await,
        Some(Commands::Drafts { config, expand }) => run_drafts(config, expand).await,
        Some(Commands::Chat { config, clear }) => run_chat(config, clear).await,
        Some(Commands::Ask { config, question }) => run_ask(config, question).await,
        Some(Commands::Compose {
            config,
            text,
            dry_run,
        }) => run_compose(config, text, dry_run).await,
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

/// Loaded config plus the backend client and session store it describes.
struct Context {
    config: Config,
    backend: HttpBackend,
    store: Arc<dyn KeyValueStore>,
}

fn open(config_path: Option<PathBuf>) -> anyhow::Result<Context> {
    let (config, path) = config::load_config(config_path)?;
    let backend = HttpBackend::from_config(&config)?;
    let storage = config::resolve_storage_path(&config, &path);
    log::debug!(
        "using backend {} and storage {}",
        backend.base_url(),
        storage.display()
    );
    Ok(Context {
        config,
        backend,
        store: Arc::new(FileStore::new(storage)),
    })
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    let dir = companion::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_todos(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let ctx = open(config_path)?;
    let outcome = lists::fetch_todos(&ctx.backend).await;
    print!("{}", render::render_todos(&outcome));
    Ok(())
}

async fn run_drafts(config_path: Option<PathBuf>, expand: Option<i64>) -> anyhow::Result<()> {
    let ctx = open(config_path)?;
    let mut list = ReplyDraftList::new(lists::fetch_reply_drafts(&ctx.backend).await);
    if let Some(id) = expand {
        if list.drafts().iter().any(|d| d.id == id) {
            list.toggle(id);
        } else {
            eprintln!("no reply draft with id {}", id);
        }
    }
    print!("{}", render::render_reply_drafts(&list));
    Ok(())
}

fn prompt(line: &mut String) -> io::Result<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    line.clear();
    Ok(io::stdin().lock().read_line(line)? != 0)
}

fn print_turn(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Answered(text) | TurnOutcome::Failed(text) => println!("< {}", text.trim()),
        TurnOutcome::Ignored => {}
    }
}

fn report_dispatch(result: Result<(), DispatchError>) {
    match result {
        Ok(()) => println!("Email sent!"),
        Err(DispatchError::Empty) => eprintln!("Draft is empty!"),
        Err(e) => {
            log::warn!("{}", e);
            eprintln!("Failed to send email");
        }
    }
}

async fn run_chat(config_path: Option<PathBuf>, clear: bool) -> anyhow::Result<()> {
    let ctx = open(config_path)?;
    let feature = Feature::draft_chat(config::resolve_system_prompt(&ctx.config));
    let mut session = Session::open(feature, ctx.store.clone());
    if clear {
        session.clear()?;
    }
    print!("{}", render::render_log(session.messages()));

    let mut line = String::new();
    while prompt(&mut line)? {
        let input = line.trim();
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        if input.eq_ignore_ascii_case("/clear") {
            session.clear()?;
            println!("(conversation cleared)");
            continue;
        }
        if input.eq_ignore_ascii_case("/send") {
            report_dispatch(draft::send_latest_reply(&ctx.backend, &session).await);
            continue;
        }
        let outcome = session.send(&ctx.backend, input).await;
        print_turn(&outcome);
    }
    Ok(())
}

async fn run_ask(config_path: Option<PathBuf>, question: Option<String>) -> anyhow::Result<()> {
    let ctx = open(config_path)?;
    let mut session = Session::open(Feature::email_search(), ctx.store.clone());

    if let Some(q) = question {
        let outcome = session.send(&ctx.backend, &q).await;
        if outcome == TurnOutcome::Ignored {
            anyhow::bail!("question is empty");
        }
        print_turn(&outcome);
        return Ok(());
    }

    print!("{}", render::render_log(session.messages()));
    let mut line = String::new();
    while prompt(&mut line)? {
        let input = line.trim();
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        let outcome = session.send(&ctx.backend, input).await;
        print_turn(&outcome);
    }
    Ok(())
}

async fn run_compose(config_path: Option<PathBuf>, text: String, dry_run: bool) -> anyhow::Result<()> {
    let ctx = open(config_path)?;
    let mut composer = Composer::new();
    composer.set_input(text);
    composer.generate();
    if composer.draft().trim().is_empty() {
        anyhow::bail!("Draft is empty!");
    }
    println!("Draft Preview:\n{}\n", composer.draft());
    if dry_run {
        return Ok(());
    }
    match composer.send(&ctx.backend).await {
        Ok(()) => {
            println!("Email sent!");
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("Failed to send email")),
    }
}
