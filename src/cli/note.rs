//! CLI `note` commands: seal and open a note to your future self.

use anyhow::Result;
use chrono::Local;

use memoir::config::MemoirConfig;
use memoir::journal::notes::{self, NoteStatus};
use memoir::journal::store;

pub enum NoteContent {
    Text(String),
    Generated { name: String },
}

pub fn seal(config: &MemoirConfig, user: &str, days: u32, content: NoteContent) -> Result<()> {
    let conn = super::open_db(config)?;
    let text = match content {
        NoteContent::Text(text) => text,
        NoteContent::Generated { name } => {
            let entries = store::list_entries(&conn, user)?;
            notes::generated_note_text(&name, &entries)
        }
    };

    let today = Local::now().date_naive();
    let note = notes::seal_note(&conn, user, &text, days, today)?;
    println!("Your note is sealed and will unlock on {}.", note.reveal_on);
    Ok(())
}

pub fn open(config: &MemoirConfig, user: &str) -> Result<()> {
    let conn = super::open_db(config)?;
    match notes::open_note(&conn, user, Local::now().date_naive())? {
        NoteStatus::Missing => println!("No note yet. Seal one with `memoir note seal`."),
        NoteStatus::Locked { reveal_on } => println!("This note will unlock on {reveal_on}."),
        NoteStatus::Unlocked(note) => {
            println!("Note from {} unlocked:", note.written_on);
            println!();
            println!("{}", note.text);
        }
    }
    Ok(())
}
