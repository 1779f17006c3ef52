use anyhow::Result;
use clap::Subcommand;
use quicknotes_core::{
    query::{Direction, Query, SortField},
    schema::NoteCandidate,
    storage::{KeyValueStore, NoteStore},
};
use std::io::Write;

/// Headless operations; without one the terminal UI starts
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a note with the given title
    Add { title: String },
    /// List notes, newest first
    List {
        /// Only favorite notes
        #[arg(long)]
        favorites: bool,
    },
    /// Toggle the favorite flag of a note
    Favorite { id: String },
    /// Delete a note
    Delete { id: String },
    /// Print the note counters
    Stats,
}

pub fn run<S: KeyValueStore>(command: Command, store: &mut NoteStore<S>, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Add { title } => {
            let note = NoteCandidate::new(store.generate_id(), title).validate(store.now_millis())?;
            store.insert(note.clone())?;
            writeln!(out, "Note Added: {} ({})", note.title, note.id)?;
        }
        Command::List { favorites } => {
            let query = if favorites {
                Query::favorites().order_by(SortField::CreatedAt, Direction::Desc)
            } else {
                Query::newest_first()
            };
            let notes = store.query(&query);
            if notes.is_empty() {
                writeln!(out, "No Notes Yet")?;
            }
            for note in notes {
                let marker = if note.is_favorite { '★' } else { '☆' };
                writeln!(
                    out,
                    "{} {}  {}  {}",
                    marker,
                    note.id,
                    note.created().format("%Y-%m-%d %H:%M UTC"),
                    note.title.replace('\n', " ")
                )?;
            }
        }
        Command::Favorite { id } => {
            let note = store.toggle_favorite(&id)?;
            let verb = if note.is_favorite { "Favorited" } else { "Unfavorited" };
            writeln!(out, "{}: {}", verb, note.title)?;
        }
        Command::Delete { id } => {
            store.delete(&id)?;
            writeln!(out, "Note deleted")?;
        }
        Command::Stats => {
            let summary = store.summary();
            writeln!(out, "Total Notes: {}", summary.total)?;
            writeln!(out, "Favorite Notes: {}", summary.favorites)?;
        }
    }
    Ok(())
}
