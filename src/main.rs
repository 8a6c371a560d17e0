use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keytrial::app::{Advance, StudyApp};
use keytrial::config::Config;
use keytrial::error::StudyError;
use keytrial::export;
use keytrial::session::clock::{Clock, SystemClock};
use keytrial::store::dictionary::MemoryDictionary;
use keytrial::store::json_store::JsonStore;
use keytrial::store::{DictionaryStore, StudyStore};

#[derive(Parser)]
#[command(
    name = "keytrial",
    version,
    about = "Text-entry study runner for standard and reduced-key keyboards"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Directory holding study data")]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Dictionary CSV (word,frequency)")]
    dictionary: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Log at debug level")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a session for one participant
    Run {
        #[arg(short, long)]
        participant: String,
        #[arg(short, long, help = "Trials per keyboard type")]
        trials: Option<u32>,
        #[arg(long, help = "Seed for target word draws")]
        seed: Option<u64>,
    },
    /// Write all sessions and trials as one flat JSON table
    Export {
        #[arg(short, long, help = "Output file or directory")]
        out: Option<PathBuf>,
    },
    /// Delete all stored sessions and trials
    Clear {
        #[arg(long, help = "Confirm deletion")]
        yes: bool,
    },
    /// Show dictionary size and a few random words
    Dictionary,
    /// List stored sessions
    Sessions,
    /// Write a config file with the current settings
    InitConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load().context("loading config")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    if let Some(path) = &cli.dictionary {
        config.dictionary_path = Some(path.to_string_lossy().to_string());
    }

    match cli.command {
        Command::Run {
            participant,
            trials,
            seed,
        } => {
            if let Some(trials) = trials {
                config.trials_per_keyboard = trials;
            }
            if seed.is_some() {
                config.random_seed = seed;
            }
            config.validate();
            run_session(config, &participant)
        }
        Command::Export { out } => {
            let store = open_store(&config)?;
            let data = export::export_data(&store)?;
            let path = match out {
                Some(p) if p.is_dir() => p.join(export::default_file_name(Local::now())),
                Some(p) => p,
                None => PathBuf::from(export::default_file_name(Local::now())),
            };
            export::write_export(&data, &path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} rows to {}", data.rows.len(), path.display());
            Ok(())
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete study data without --yes");
            }
            let store = open_store(&config)?;
            let dictionary = load_dictionary(&config)?;
            let mut app = StudyApp::new(config, store, dictionary, SystemClock);
            let (sessions, trials) = app.clear_data()?;
            println!("Cleared {sessions} sessions and {trials} trials");
            Ok(())
        }
        Command::Dictionary => {
            let mut dictionary = load_dictionary(&config)?;
            println!("{} words", dictionary.word_count());
            let sample: Vec<String> = (0..5).filter_map(|_| dictionary.random_word()).collect();
            println!("sample: {}", sample.join(", "));
            Ok(())
        }
        Command::Sessions => {
            let store = open_store(&config)?;
            for session in store.all_sessions()? {
                let trials = store.trials_for_session(session.id())?;
                let ended = trials.iter().filter(|t| t.has_ended()).count();
                println!(
                    "{:>4}  {:<16} {:<10} {}  {}/{} trials",
                    session.id(),
                    session.participant_id(),
                    session.status(),
                    session.keyboard_order().to_code(),
                    ended,
                    trials.len()
                );
            }
            Ok(())
        }
        Command::InitConfig => {
            config.validate();
            config.save()?;
            println!("Wrote {}", Config::config_path().display());
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "keytrial=debug" } else { "keytrial=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_store(config: &Config) -> Result<JsonStore> {
    let dir = Path::new(&config.data_dir);
    JsonStore::open(dir).with_context(|| format!("opening study data in {}", dir.display()))
}

fn load_dictionary(config: &Config) -> Result<MemoryDictionary> {
    let dictionary = match &config.dictionary_path {
        Some(path) => MemoryDictionary::from_path(Path::new(path))?,
        None => MemoryDictionary::bundled()?,
    };
    Ok(match config.random_seed {
        Some(seed) => dictionary.with_seed(seed),
        None => dictionary,
    })
}

fn run_session(config: Config, participant: &str) -> Result<()> {
    let store = open_store(&config)?;
    let dictionary = load_dictionary(&config)?;
    let mut app = StudyApp::new(config, store, dictionary, SystemClock);
    app.begin_session(participant)?;

    println!("Type letters and press Enter. '!' accepts, '#N' picks alternate N,");
    println!("'-' clears the keys, 'q' cancels the session.");
    print_trial(&app);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        let outcome = match input {
            "q" => {
                app.cancel_session()?;
                println!("Session canceled.");
                return Ok(());
            }
            "-" => {
                app.clear_keys();
                None
            }
            "!" => Some(app.accept_autocomplete()),
            _ if input.starts_with('#') => match input[1..].parse::<usize>() {
                Ok(n) if n >= 1 => Some(app.select_alternate(n - 1)),
                _ => {
                    println!("Alternates are numbered from 1.");
                    None
                }
            },
            _ => {
                for letter in input.chars() {
                    if app.press_letter(letter)?.is_none() {
                        println!("No key carries '{letter}'.");
                    }
                }
                None
            }
        };

        match outcome {
            Some(Ok(Advance::SessionCompleted)) => {
                println!("Session complete. Thank you!");
                return Ok(());
            }
            Some(Ok(Advance::NextTrial)) => print_trial(&app),
            Some(Err(err @ (StudyError::NoAutocomplete | StudyError::AlternateOutOfRange { .. }))) => {
                println!("{err}");
            }
            Some(Err(err)) => return Err(err.into()),
            None => print_suggestions(&app),
        }
    }

    // Input closed mid-session.
    if app.session().is_some() {
        app.cancel_session()?;
    }
    Ok(())
}

fn print_trial<S: StudyStore, D: DictionaryStore, C: Clock>(app: &StudyApp<S, D, C>) {
    if let (Some(trial), Some(kb)) = (app.trial(), app.keyboard_type()) {
        println!();
        println!("[{kb}] target: {}", trial.target_word());
        let keys: Vec<&str> = kb.keys().collect();
        println!("keys: {}", keys.join(" | "));
    }
    let _ = io::stdout().flush();
}

fn print_suggestions<S: StudyStore, D: DictionaryStore, C: Clock>(app: &StudyApp<S, D, C>) {
    if app.pressed().is_empty() {
        println!("(no keys pressed)");
        return;
    }
    match app.autocomplete_split() {
        Some(split) => println!("> {}[{}]", split.typed, split.inferred),
        None => println!("> no word found"),
    }
    for (i, word) in app.visible_alternates().iter().enumerate() {
        println!("  #{} {word}", i + 1);
    }
    let _ = io::stdout().flush();
}
