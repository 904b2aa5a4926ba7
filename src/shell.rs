//! Line-oriented interactive shell over one [`Reader`]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, warn};

use crate::cli::{self, BookmarksAction, HistoryAction, NotesAction, RegionArgs, Toggle};
use crate::reader::Reader;
use crate::views;

const PROMPT: &str = "readhelper> ";

#[derive(Parser, Debug)]
#[command(name = "readhelper", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Open a document (replaces the current one)
    Open { file: PathBuf },
    /// Close the current document
    Close,
    /// What is open and what is going on
    Status,
    Notes {
        #[command(subcommand)]
        action: Option<NotesAction>,
    },
    Bookmarks {
        #[command(subcommand)]
        action: Option<BookmarksAction>,
    },
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Turn region extraction on or off
    ExtractMode { state: Toggle },
    /// Extract a rectangle (display pixels) of a PDF page
    Region {
        #[command(flatten)]
        region: RegionArgs,
    },
    Extractions {
        #[command(subcommand)]
        action: Option<ExtractionsAction>,
    },
    Zoom { direction: ZoomDirection },
    /// Scroll by a number of pixels (negative scrolls up)
    Scroll {
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Jump to a PDF page
    Page { page: usize },
    Translate {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Read text aloud; without text reads the document or the latest extraction
    Speak { text: Vec<String> },
    Pause,
    Resume,
    Stop,
    #[command(alias = "exit")]
    Quit,
}

#[derive(Subcommand, Debug)]
enum ExtractionsAction {
    List,
    /// Copy one extraction, or all of them, to the clipboard
    Copy { id: Option<u64> },
    Delete { id: u64 },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ZoomDirection {
    In,
    Out,
}

/// Result of one shell line
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Output(String),
    Quit,
}

/// Parse and run one line; failures become output, never a shell exit
pub fn execute(reader: &mut Reader, line: &str) -> Step {
    let Some(words) = shlex::split(line) else {
        return Step::Output("error: unbalanced quotes".to_string());
    };
    if words.is_empty() {
        return Step::Output(String::new());
    }
    let parsed = match ShellLine::try_parse_from(&words) {
        Ok(parsed) => parsed,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            return Step::Output(e.render().to_string());
        }
        Err(e) => return Step::Output(e.render().to_string().trim_end().to_string()),
    };
    if matches!(parsed.command, ShellCommand::Quit) {
        return Step::Quit;
    }
    debug!("Shell command: {:?}", parsed.command);
    match dispatch(reader, parsed.command) {
        Ok(out) => Step::Output(out),
        Err(e) => {
            warn!("Shell command failed: {e:#}");
            Step::Output(format!("error: {e:#}"))
        }
    }
}

fn dispatch(reader: &mut Reader, command: ShellCommand) -> anyhow::Result<String> {
    Ok(match command {
        ShellCommand::Open { file } => {
            reader.open(&file)?;
            cli::open_summary(reader)
        }
        ShellCommand::Close => {
            reader.close();
            "Closed".to_string()
        }
        ShellCommand::Status => status(reader),
        ShellCommand::Notes { action } => {
            cli::notes(reader, action.unwrap_or(NotesAction::List))?
        }
        ShellCommand::Bookmarks { action } => {
            cli::bookmarks(reader, action.unwrap_or(BookmarksAction::List))?
        }
        ShellCommand::History { action } => {
            cli::history(reader, action.unwrap_or(HistoryAction::List))?
        }
        ShellCommand::ExtractMode { state } => {
            reader.set_extract_mode(state.is_on())?;
            format!("Extraction mode {}", if state.is_on() { "on" } else { "off" })
        }
        ShellCommand::Region { region } => cli::extract(reader, region)?,
        ShellCommand::Extractions { action } => match action.unwrap_or(ExtractionsAction::List) {
            ExtractionsAction::List => views::extractions_list(reader.extractions()),
            ExtractionsAction::Copy { id } => {
                let text = reader.copy_extractions(id)?;
                format!("Copied {} characters", text.chars().count())
            }
            ExtractionsAction::Delete { id } => {
                reader.delete_extraction(id)?;
                format!("Deleted extraction #{id}")
            }
        },
        ShellCommand::Zoom { direction } => {
            let factor = match direction {
                ZoomDirection::In => reader.zoom_in()?,
                ZoomDirection::Out => reader.zoom_out()?,
            };
            format!("Zoom {}%", (factor * 100.0).round())
        }
        ShellCommand::Scroll { delta } => format!("Offset {}", reader.scroll(delta)?),
        ShellCommand::Page { page } => {
            reader.go_to_page(page)?;
            cli::open_summary(reader)
        }
        ShellCommand::Translate { text } => {
            let text = text.join(" ");
            let outcome = reader.translate(&text)?;
            views::translation(&text, &outcome)
        }
        ShellCommand::Speak { text } => {
            let text = text.join(" ");
            reader.speak(Some(text.as_str()).filter(|t| !t.is_empty()))?;
            "Speaking".to_string()
        }
        ShellCommand::Pause => match reader.pause_speech()? {
            true => "Paused".to_string(),
            false => "Nothing is being read".to_string(),
        },
        ShellCommand::Resume => match reader.resume_speech()? {
            true => "Resumed".to_string(),
            false => "Nothing is paused".to_string(),
        },
        ShellCommand::Stop => {
            reader.stop_speech();
            "Stopped".to_string()
        }
        ShellCommand::Quit => String::new(),
    })
}

fn status(reader: &mut Reader) -> String {
    let speech = reader.speech_state();
    let extract_mode = reader.session().extract_mode();
    let mut out = match reader.current() {
        Some(open) => format!("{} [{}]", open.doc.path.display(), open.doc.kind),
        None => "No document open".to_string(),
    };
    if let Some(position) = reader.position() {
        match position.page {
            Some(page) => out.push_str(&format!(", page {page}")),
            None => out.push_str(&format!(", offset {}", position.scroll_offset)),
        }
    }
    out.push_str(&format!(
        "\nnotes: {}, bookmarks: {}, extractions: {}, extract mode: {}, speech: {speech:?}",
        reader.notes().len(),
        reader.bookmarks().len(),
        reader.extractions().len(),
        if extract_mode { "on" } else { "off" },
    ));
    out
}

/// Read commands from `input` until it ends or `quit`
pub fn run<R: BufRead, W: Write>(reader: &mut Reader, input: R, output: &mut W) -> io::Result<()> {
    write!(output, "{PROMPT}")?;
    output.flush()?;
    for line in input.lines() {
        match execute(reader, &line?) {
            Step::Quit => break,
            Step::Output(text) if text.is_empty() => {}
            Step::Output(text) => writeln!(output, "{text}")?,
        }
        write!(output, "{PROMPT}")?;
        output.flush()?;
    }
    writeln!(output)?;
    Ok(())
}

pub fn run_stdio(reader: &mut Reader) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run(reader, stdin.lock(), &mut stdout)
}
