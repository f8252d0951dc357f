//! Terminal front-end for memopad.
//!
//! # Responsibility
//! - Stand in for the sidebar and memo panel: turn typed commands into
//!   `MemoBook` operations and print the result.
//! - Flush pending writes on `quit` or end of input.

mod command;

use clap::Parser;
use command::{Command, HELP};
use log::{info, warn};
use memopad_core::{
    core_version, init_logging, KeyValueStore, MemoBook, MemopadConfig, SqliteKvStore,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(name = "memopad", version, about = "Memo pad with debounced persistence")]
struct Cli {
    /// TOML config file; flags below override its values.
    #[arg(long, env = "MEMOPAD_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite store file.
    #[arg(long, env = "MEMOPAD_DB")]
    db: Option<PathBuf>,

    /// Debounce quiet period in milliseconds.
    #[arg(long, env = "MEMOPAD_QUIET_MS")]
    quiet_ms: Option<u64>,

    /// Storage key for the memo collection.
    #[arg(long, env = "MEMOPAD_KEY")]
    key: Option<String>,

    /// Directory for rotated log files.
    #[arg(long, env = "MEMOPAD_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "MEMOPAD_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn resolve_config(&self) -> Result<MemopadConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => MemopadConfig::from_file(path)?,
            None => MemopadConfig::default(),
        };
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
        if let Some(quiet_ms) = self.quiet_ms {
            config.quiet_period_ms = quiet_ms;
        }
        if let Some(key) = &self.key {
            config.storage_key = key.clone();
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = log_dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let log_dir = absolute(&config.log_dir)?;
    init_logging(config.log_level.as_str(), &log_dir)?;

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::open(&config.db_path)?);
    let mut book = MemoBook::open(store, &config)?;
    info!(
        "event=cli_start module=cli status=ok version={} quiet_ms={} scope={:?}",
        core_version(),
        config.quiet_period_ms,
        config.debounce_scope
    );

    println!(
        "memopad {} | {} memo(s) | `help` for commands",
        core_version(),
        book.len()
    );

    run_session(&mut book, BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}

/// Applies commands from `input` until `quit`, end of input or a read error,
/// then flushes pending writes.
///
/// A read error still flushes before it is returned.
async fn run_session<R>(book: &mut MemoBook, input: R) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut read_error = None;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!("event=cli_read module=cli status=error error={err}");
                read_error = Some(err);
                break;
            }
        };
        let command = match Command::parse(line.as_str()) {
            Ok(command) => command,
            Err(command::CommandError::Empty) => continue,
            Err(err) => {
                println!("error: {err}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(err) = apply(book, command) {
            println!("error: {err}");
        }
    }

    let written = book.flush();
    info!("event=cli_exit module=cli status=ok flushed={written}");
    match read_error {
        Some(err) => Err(err),
        None => Ok(written),
    }
}

fn apply(book: &mut MemoBook, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List => print_list(book),
        Command::Show => print_selected(book),
        Command::Add => {
            let index = book.add_memo();
            println!("added memo {index}");
        }
        Command::Select(index) => {
            book.select(index)?;
            print_selected(book);
        }
        Command::Title(title) => book.set_title(title)?,
        Command::Content(content) => book.set_content(content)?,
        Command::Delete(index) => {
            let removed = book.delete_memo(index)?;
            println!("deleted `{}`", removed.title);
        }
        Command::Flush => println!("flushed {} pending write(s)", book.flush()),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

fn print_list(book: &MemoBook) {
    if book.is_empty() {
        println!("(no memos)");
        return;
    }
    for (index, memo) in book.memos().iter().enumerate() {
        let marker = if index == book.selected_index() { '*' } else { ' ' };
        println!("{marker} {index:>3}  {}", memo.title);
    }
}

fn print_selected(book: &MemoBook) {
    match book.selected_memo() {
        Some(memo) => {
            println!("# {}", memo.title);
            println!("{}", memo.content);
        }
        None => {
            println!("No memos yet.");
            println!("Add a new memo with `add`.");
        }
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::run_session;
    use memopad_core::{KeyValueStore, Memo, MemoBook, MemopadConfig, MemoryKvStore};
    use std::sync::Arc;

    fn stored_memos(store: &MemoryKvStore) -> Vec<Memo> {
        let raw = store.get_item("memo").unwrap().unwrap();
        serde_json::from_str(raw.as_str()).unwrap()
    }

    #[tokio::test]
    async fn invalid_utf8_input_still_flushes_pending_edits() {
        let store = Arc::new(MemoryKvStore::new());
        let mut book = MemoBook::open(store.clone(), &MemopadConfig::default()).unwrap();
        let input: &[u8] = b"add\ntitle keep\n\xff\xfe\nadd\n";

        let err = run_session(&mut book, input).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);

        assert_eq!(store.write_count(), 1);
        let persisted = stored_memos(&store);
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].title, "keep");
    }

    #[tokio::test]
    async fn end_of_input_flushes_and_quit_stops_reading() {
        let store = Arc::new(MemoryKvStore::new());
        let mut book = MemoBook::open(store.clone(), &MemopadConfig::default()).unwrap();
        let input: &[u8] = b"add\ncontent body\nbogus\nquit\nadd\n";

        let written = run_session(&mut book, input).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(book.len(), 1);
        assert_eq!(stored_memos(&store)[0].content, "body");
    }
}
