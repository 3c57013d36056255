//! PagePin command line entry point.

mod replay;
mod script;

use clap::{Parser, Subcommand};
use pagepin_core::{Editor, EditorConfig, FileStorage, SequentialIds, Storage};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pagepin")]
#[command(version, about = "Replay attachment editing sessions against the PagePin engine")]
struct Args {
    /// Editor config JSON; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a session script and emit the canonical attachments
    Replay {
        /// Session script JSON
        script: PathBuf,

        /// Write the saved document here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also save into a storage directory
        #[arg(long)]
        store: Option<PathBuf>,

        /// Document id used with --store (defaults to the script's name)
        #[arg(long)]
        id: Option<String>,
    },
    /// List documents in a storage directory
    List {
        /// Storage directory; the user data directory when omitted
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Print the effective editor config
    Config,
}

fn open_storage(dir: Option<PathBuf>) -> Result<FileStorage, pagepin_core::StorageError> {
    match dir {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::default_location(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EditorConfig::from_path(path)?,
        None => EditorConfig::default(),
    };

    match args.command {
        Command::Replay { script: script_path, out, store, id } => {
            let json = std::fs::read_to_string(&script_path)
                .map_err(|e| format!("Failed to read {}: {}", script_path.display(), e))?;
            let script = script::Script::from_json(&json)?;

            let mut editor = Editor::new(config)?.with_id_generator(SequentialIds::new("a"));
            let summary = replay::replay(&mut editor, &script)?;
            log::info!("{:?}", summary);

            let document = editor.saved_document().to_json()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, document)?;
                    log::info!("Wrote {}", path.display());
                }
                None => println!("{}", document),
            }

            if let Some(dir) = store {
                let storage = FileStorage::new(dir)?;
                let id = id.unwrap_or_else(|| script.name.clone());
                pollster::block_on(editor.save(&storage, &id))?;
            }
        }
        Command::List { store } => {
            let storage = open_storage(store)?;
            for id in pollster::block_on(storage.list())? {
                println!("{}", id);
            }
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
