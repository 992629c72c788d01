use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use xplayground::{ConsoleEvent, Language, LogKind, Playground, PlaygroundConfig, RunDispatch};

#[derive(Parser, Debug)]
#[clap(name = "xplayground", version, about = "Sandboxed code playground")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, global = true, help = "YAML configuration file")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a source file once and print the console
    Run {
        file: PathBuf,

        #[clap(long, short, help = "Language id (javascript, python, java, cpp)")]
        language: Option<Language>,

        #[clap(long, help = "Seconds to wait for the run to finish")]
        timeout: Option<u64>,
    },
    /// Interactive editor buffer with live console output
    Repl {
        #[clap(long, short, help = "Language id (javascript, python, java, cpp)")]
        language: Option<Language>,
    },
    /// List selectable languages and whether they run in the sandbox
    Languages,
}

const REPL_HELP: &str = "\
Plain lines are appended to the buffer.
  :run          run the buffer
  :clear        clear the console
  :lang <id>    switch language (javascript, python, java, cpp)
  :code         show the buffer
  :new          empty the buffer
  :reset        restore the starter code
  :console      print the console panel
  :help         show this help
  :quit         exit";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PlaygroundConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PlaygroundConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    match cli.command {
        Commands::Run {
            file,
            language,
            timeout,
        } => {
            let had_errors = run_file(config, &file, language, timeout).await?;
            if had_errors {
                std::process::exit(1);
            }
        }
        Commands::Repl { language } => repl(config, language).await?,
        Commands::Languages => {
            let playground = Playground::new(config)?;
            for (language, sandboxed) in playground.sandboxes().languages() {
                let status = if sandboxed { "sandboxed" } else { "not supported" };
                println!("{:<12} {:<12} {}", language.id(), language.label(), status);
            }
        }
    }
    Ok(())
}

/// Pick a language from the file extension, if it is one we know.
fn language_for_path(path: &Path) -> Option<Language> {
    match path.extension()?.to_str()? {
        "js" | "mjs" | "cjs" => Some(Language::JavaScript),
        "py" => Some(Language::Python),
        "java" => Some(Language::Java),
        "cpp" | "cc" | "cxx" | "hpp" => Some(Language::Cpp),
        _ => None,
    }
}

/// Returns whether the console holds any error entry.
async fn run_file(
    mut config: PlaygroundConfig,
    file: &Path,
    language: Option<Language>,
    timeout: Option<u64>,
) -> Result<bool> {
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    if let Some(secs) = timeout {
        config.run_timeout_secs = secs;
    }
    let language = language
        .or_else(|| language_for_path(file))
        .unwrap_or(config.default_language);

    let mut playground = Playground::new(config)?;
    playground.set_language(language);
    playground.set_code(code);
    playground.run_and_wait().await?;

    println!("{}", playground.render());
    let had_errors = playground
        .console()
        .entries()
        .iter()
        .any(|entry| entry.kind == LogKind::Error);
    playground.shutdown().await;
    Ok(had_errors)
}

async fn repl(config: PlaygroundConfig, language: Option<Language>) -> Result<()> {
    let timeout = config.run_timeout();
    let mut playground = Playground::new(config)?;
    if let Some(language) = language {
        playground.set_language(language);
    }

    let mut events = playground.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ConsoleEvent::Appended(entry)) => println!("{}", entry),
                Ok(ConsoleEvent::Cleared) => println!("(console cleared)"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "console printer fell behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    println!(
        "xplayground ({}). Type :help for commands.",
        playground.language().label()
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix(':') else {
            let mut code = playground.code().to_string();
            if !code.is_empty() {
                code.push('\n');
            }
            code.push_str(&line);
            playground.set_code(code);
            continue;
        };

        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map(|(name, arg)| (name, arg.trim()))
            .unwrap_or((command, ""));
        match name {
            "run" => {
                if let RunDispatch::Started(run_id) = playground.run().await? {
                    if let Err(err) = playground.wait_for_run(run_id, timeout).await {
                        println!("{}", err);
                    }
                }
            }
            "clear" => playground.clear_console(),
            "lang" => match arg.parse::<Language>() {
                Ok(language) => {
                    playground.set_language(language);
                    println!("language: {}", language.label());
                }
                Err(err) => println!("{}", err),
            },
            "code" => println!("{}", playground.code()),
            "new" => playground.set_code(""),
            "reset" => playground.reset_code(),
            "console" => println!("{}", playground.render()),
            "help" => println!("{}", REPL_HELP),
            "quit" | "q" | "exit" => break,
            other => println!("unknown command :{} (try :help)", other),
        }
    }

    playground.shutdown().await;
    drop(playground);
    let _ = printer.await;
    Ok(())
}
