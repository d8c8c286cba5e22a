use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use hey_application::ConversationManager;
use hey_infrastructure::HeyPaths;
use hey_interaction::{OpenAIApiAgent, config::API_KEY_ENV};

mod commands;
mod editor;
mod output;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "HEY_LOG";

#[derive(Parser, Debug)]
#[command(name = "hey")]
#[command(about = "hey - conversational chat completions from the command line", long_about = None)]
struct Cli {
    /// Without a sentence, read the prompt from stdin instead of the editor
    #[arg(long)]
    no_editor: bool,

    /// Print the reply as it arrives
    #[arg(long)]
    stream: bool,

    /// Attach an image (local file or URL); repeatable
    #[arg(long = "image", value_name = "PATH_OR_URL")]
    images: Vec<String>,

    /// Drop this many leading messages from the outbound history
    #[arg(long, default_value_t = 0)]
    trim: usize,

    /// Prompts directory (default: $HEY_PROMPTS_DIR, then ~/.prompts)
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Start a new conversation, named ID when given
    #[arg(long, value_name = "ID", num_args = 0..=1)]
    new: Option<Option<String>>,

    /// Re-open the last prompt in the editor and send it again
    #[arg(long)]
    retry: bool,

    /// List conversations
    #[arg(long)]
    convos: bool,

    /// With --convos, also show transcript files
    #[arg(long)]
    files: bool,

    /// Switch to a listed conversation (index or title)
    #[arg(long, value_name = "TOKEN")]
    set_convo: Option<String>,

    /// Print the transcript of a listed conversation
    #[arg(long, value_name = "TOKEN")]
    show: Option<String>,

    /// Delete a listed conversation and its transcript
    #[arg(long, value_name = "TOKEN")]
    delete_convo: Option<String>,

    /// Pin the active conversation
    #[arg(long)]
    pin: bool,

    /// List pinned conversations
    #[arg(long)]
    pins: bool,

    /// Switch to a pinned conversation (index or title)
    #[arg(long, value_name = "TOKEN")]
    set_pin: Option<String>,

    /// Unpin a pinned conversation (index or title)
    #[arg(long, value_name = "TOKEN")]
    unpin: Option<String>,

    /// Move every unpinned conversation into the archive
    #[arg(long)]
    archive: bool,

    /// Delete conversations that never got a title
    #[arg(long)]
    tidy: bool,

    /// Temperature in tenths, 0 to 10
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=10))]
    temp: Option<u8>,

    /// Maximum tokens per reply
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_tokens: Option<u32>,

    /// Set the system prompt of the active conversation
    #[arg(long, value_name = "PROMPT")]
    system: Option<String>,

    /// Image detail: low or high
    #[arg(long, value_name = "LEVEL")]
    detail: Option<String>,

    /// Ask for code-only replies
    #[arg(long, value_enum)]
    codify: Option<Toggle>,

    /// List available models
    #[arg(long)]
    models: bool,

    /// Choose the model (index or name from --models)
    #[arg(long, value_name = "TOKEN")]
    set_model: Option<String>,

    /// Print the current model
    #[arg(long)]
    get_model: bool,

    /// Set the editor command
    #[arg(long, value_name = "COMMAND")]
    editor: Option<String>,

    /// Show settings and the active conversation
    #[arg(long)]
    info: bool,

    /// Print the most recent transcript
    #[arg(long)]
    recent: bool,

    /// Print the active conversation record as JSON
    #[arg(long)]
    raw: bool,

    /// Restore default settings and start `main` over
    #[arg(long)]
    reset: bool,

    /// Initialize a prompts directory (default: current directory)
    #[arg(long)]
    init: bool,

    /// Quick question to the title model, not stored
    #[arg(long)]
    qk: bool,

    /// Single question to the configured model, not stored
    #[arg(long)]
    one_shot: bool,

    /// The prompt
    #[arg(trailing_var_arg = true)]
    sentence: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        self == Toggle::On
    }
}

impl Cli {
    /// The trailing words joined into one prompt, if any.
    fn sentence(&self) -> Option<String> {
        let sentence = self.sentence.join(" ");
        let sentence = sentence.trim();
        (!sentence.is_empty()).then(|| sentence.to_string())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_editor() -> String {
    std::env::var("EDITOR")
        .ok()
        .filter(|editor| !editor.trim().is_empty())
        .unwrap_or_else(|| "nvim".to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let agent = match OpenAIApiAgent::try_from_env() {
        Ok(agent) => Arc::new(agent),
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            eprintln!("Set {API_KEY_ENV} to your API key, e.g. `export {API_KEY_ENV}=sk-...`");
            return Ok(ExitCode::FAILURE);
        }
    };

    let paths = if cli.init {
        match &cli.dir {
            Some(dir) => HeyPaths::new(dir),
            None => HeyPaths::new(std::env::current_dir()?),
        }
    } else {
        HeyPaths::resolve(cli.dir.clone())?
    };

    let mut manager =
        ConversationManager::with_json_storage(paths, agent.clone(), &default_editor())?;

    if let Err(err) = commands::run(&cli, &mut manager, &agent).await {
        tracing::error!("{:#}", err);
        eprintln!("{} {:#}", "error:".red().bold(), err);
    }
    Ok(ExitCode::SUCCESS)
}
