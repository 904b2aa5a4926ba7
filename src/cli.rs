//! Command line: one-shot subcommands and the handlers the shell shares

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use crate::document::DocumentKind;
use crate::pdf::{SelectionPoint, Zoom};
use crate::reader::Reader;
use crate::settings::Settings;
use crate::speech::PlaybackState;
use crate::{paths, views};

/// How long a one-shot `open` waits for its pages
const RENDER_WAIT: Duration = Duration::from_secs(30);
const SPEECH_POLL: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(name = "readhelper", version, about = "Read PDFs, Markdown and text with notes, bookmarks and translation")]
pub struct Cli {
    /// Directory for notes, bookmarks, history and the log
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Settings file (default: next to the executable, else the platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Starts the interactive shell when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a document, render it and remember it in the history
    Open {
        file: PathBuf,

        /// Write every page of a PDF as PNG into this directory
        #[arg(long, value_name = "DIR")]
        render_dir: Option<PathBuf>,

        /// Jump to this page (PDF)
        #[arg(long)]
        page: Option<usize>,

        /// Zoom factor (0.5 - 3.0)
        #[arg(long)]
        zoom: Option<f32>,
    },

    /// Notes of a document
    Notes {
        file: PathBuf,
        #[command(subcommand)]
        action: Option<NotesAction>,
    },

    /// Bookmarks of a document
    Bookmarks {
        file: PathBuf,
        #[command(subcommand)]
        action: Option<BookmarksAction>,
    },

    /// Recently opened documents
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Extract the text inside a rectangle of a PDF page
    Extract {
        file: PathBuf,
        #[command(flatten)]
        region: RegionArgs,

        /// Also copy the result to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Translate text with the configured service
    Translate {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Read text aloud, or a whole text document
    Speak {
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        text: Vec<String>,
    },

    /// Show or create the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Interactive shell (the default)
    Shell {
        /// Document to open first
        file: Option<PathBuf>,
    },
}

/// A rectangle in display pixels at the current zoom
#[derive(Args, Debug, Clone, Copy)]
pub struct RegionArgs {
    /// Page number, starting at 1
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Subcommand, Debug)]
pub enum NotesAction {
    List,
    Add {
        /// Excerpt the note refers to
        #[arg(long, default_value = "")]
        excerpt: String,
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },
    Delete {
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum BookmarksAction {
    List,
    Add {
        /// Selected text used as the label
        #[arg(long)]
        text: Option<String>,
    },
    Delete {
        id: u64,
    },
    Goto {
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    List,
    Clear,
    /// Remove the entry at a 1-based position
    Delete {
        index: usize,
    },
    /// Reopen the entry at a 1-based position
    Open {
        index: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a settings file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the settings with keys masked
    Show,
    /// Print where the settings file lives
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

/// Resolved locations for one run
pub struct Locations {
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
}

impl Locations {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            data_dir: paths::data_dir(cli.data_dir.as_deref()),
            config_path: paths::config_path(cli.config.as_deref()),
        }
    }

    pub fn load_settings(&self) -> Result<Settings> {
        Settings::load(&self.config_path)
            .with_context(|| format!("Could not load settings from {:?}", self.config_path))
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let ctx = Locations::from_cli(&cli);
    match cli.command.unwrap_or(Command::Shell { file: None }) {
        Command::Config { action } => config(&ctx, &action),
        command => run_command(&ctx, command),
    }
}

fn run_command(ctx: &Locations, command: Command) -> Result<()> {
    let mut settings = ctx.load_settings()?;
    if let Command::Open { zoom: Some(zoom), .. } = &command {
        settings.viewer.zoom = Zoom::clamp_factor(*zoom);
    }
    let mut reader = Reader::with_defaults(settings, &ctx.data_dir);

    match command {
        Command::Open {
            file,
            render_dir,
            page,
            ..
        } => {
            reader.open(&file)?;
            if let Some(page) = page {
                reader.go_to_page(page)?;
            }
            println!("{}", open_summary(&mut reader));
            if let Some(dir) = render_dir {
                let written = reader.export_pages(&dir)?;
                println!("Wrote {} pages to {}", written.len(), dir.display());
            }
            reader.close();
        }
        Command::Notes { file, action } => {
            reader.open(&file)?;
            println!("{}", notes(&mut reader, action.unwrap_or(NotesAction::List))?);
        }
        Command::Bookmarks { file, action } => {
            reader.open(&file)?;
            let out = bookmarks(&mut reader, action.unwrap_or(BookmarksAction::List))?;
            println!("{out}");
            reader.close();
        }
        Command::History { action } => {
            println!("{}", history(&mut reader, action.unwrap_or(HistoryAction::List))?);
        }
        Command::Extract { file, region, copy } => {
            reader.open(&file)?;
            reader.set_extract_mode(true)?;
            println!("{}", extract(&mut reader, region)?);
            if copy {
                reader.copy_extractions(None)?;
            }
        }
        Command::Translate { text } => {
            let text = text.join(" ");
            let outcome = reader.translate(&text)?;
            println!("{}", views::translation(&text, &outcome));
        }
        Command::Speak { file, text } => {
            if let Some(file) = file {
                reader.open(&file)?;
            }
            let text = text.join(" ");
            reader.speak(Some(text.as_str()).filter(|t| !t.is_empty()))?;
            while reader.speech_state() != PlaybackState::Idle {
                thread::sleep(SPEECH_POLL);
            }
        }
        Command::Shell { file } => {
            if let Some(file) = file {
                reader.open(&file)?;
            }
            crate::shell::run_stdio(&mut reader)?;
            reader.close();
        }
        Command::Config { action } => config(ctx, &action)?,
    }
    Ok(())
}

fn config(ctx: &Locations, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            if Settings::init(&ctx.config_path, *force)? {
                println!("Wrote {}", ctx.config_path.display());
            } else {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    ctx.config_path.display()
                );
            }
        }
        ConfigAction::Show => println!("{}", ctx.load_settings()?.masked().to_pretty_json()?),
        ConfigAction::Path => println!("{}", ctx.config_path.display()),
    }
    Ok(())
}

/// What was opened and what is on screen
pub fn open_summary(reader: &mut Reader) -> String {
    reader.wait_for_pages(RENDER_WAIT);
    let Some(open) = reader.current() else {
        return "No document is open".to_string();
    };
    let mut out = format!("{} [{}]", open.doc.name, open.doc.kind);
    match open.doc.kind {
        DocumentKind::Pdf => {
            if let Some(pdf) = open.as_pdf() {
                let placeholders = pdf.view.placeholders();
                out.push_str(&format!(
                    ", {} pages at {} ({}x{} px), page {}, rendered {:?}",
                    pdf.view.page_count(),
                    pdf.view.zoom().label(),
                    placeholders.width_px,
                    placeholders.height_px,
                    pdf.view.current_page(),
                    pdf.view.pages_in(crate::pdf::PageState::Rendered),
                ));
                if let Some(error) = pdf.view.last_error() {
                    out.push_str(&format!("\nRender error: {error}"));
                }
            }
        }
        _ => {
            if let Some(html) = reader.rendered_html() {
                out.push('\n');
                out.push_str(&html);
            }
        }
    }
    out
}

pub fn notes(reader: &mut Reader, action: NotesAction) -> Result<String> {
    Ok(match action {
        NotesAction::List => views::notes_list(reader.notes()),
        NotesAction::Add { excerpt, content } => {
            let note = reader.add_note(&excerpt, &content.join(" "))?;
            format!("Added note {}", note.id)
        }
        NotesAction::Delete { id } => {
            reader.delete_note(id)?;
            format!("Deleted note {id}")
        }
    })
}

pub fn bookmarks(reader: &mut Reader, action: BookmarksAction) -> Result<String> {
    Ok(match action {
        BookmarksAction::List => views::bookmarks_list(reader.bookmarks()),
        BookmarksAction::Add { text } => {
            let bookmark = reader.add_bookmark(text.as_deref())?;
            format!("Added bookmark {} \"{}\"", bookmark.id, bookmark.text)
        }
        BookmarksAction::Delete { id } => {
            reader.delete_bookmark(id)?;
            format!("Deleted bookmark {id}")
        }
        BookmarksAction::Goto { id } => views::navigation(&reader.goto_bookmark(id)?),
    })
}

pub fn history(reader: &mut Reader, action: HistoryAction) -> Result<String> {
    Ok(match action {
        HistoryAction::List => views::history_list(&reader.history()?),
        HistoryAction::Clear => {
            reader.clear_history()?;
            "History cleared".to_string()
        }
        HistoryAction::Delete { index } => {
            let entry = history_entry(reader, index)?;
            reader.remove_history(&entry)?;
            format!("Removed {entry}")
        }
        HistoryAction::Open { index } => {
            if index == 0 {
                bail!("History positions start at 1");
            }
            reader.open_history(index - 1)?;
            open_summary(reader)
        }
    })
}

fn history_entry(reader: &Reader, index: usize) -> Result<String> {
    let entries = reader.history()?;
    index
        .checked_sub(1)
        .and_then(|i| entries.get(i))
        .map(|e| e.file_path.clone())
        .with_context(|| format!("No history entry #{index}"))
}

/// Draw the rectangle as a drag from its top-left to its bottom-right corner
pub fn extract(reader: &mut Reader, region: RegionArgs) -> Result<String> {
    let start = SelectionPoint {
        page: region.page,
        x: region.x,
        y: region.y,
    };
    let end = SelectionPoint {
        x: region.x + region.width,
        y: region.y + region.height,
        ..start
    };
    reader.begin_region(start)?;
    reader.drag_region(end);
    let outcome = reader.finish_region()?;
    info!("Extraction on page {}: {outcome:?}", region.page);
    Ok(views::extraction_outcome(&outcome))
}

/// Directory for the log file, created if needed
pub fn log_dir(cli: &Cli) -> Result<PathBuf> {
    let dir = paths::data_dir(cli.data_dir.as_deref());
    std::fs::create_dir_all(&dir).with_context(|| format!("Could not create {dir:?}"))?;
    Ok(dir)
}

/// Log file inside `dir`
pub fn log_file(dir: &Path) -> PathBuf {
    dir.join(paths::LOG_FILENAME)
}
