//! Interactive chat loop.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docchat::{ChatBackend, ChatSession, Role, Turn};

const USER_AVATAR: &str = "👨‍💻";
const MODEL_AVATAR: &str = "🔵";

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    /// Blank line
    Empty,
    /// `/quit` or `/exit`
    Quit,
    /// `/reset`: back to the greeting
    Reset,
    /// `/save FILE`: export the transcript
    Save(&'a str),
    /// `/help`
    Help,
    /// Unrecognized slash command
    Unknown(&'a str),
    /// Anything else is a question
    Message(&'a str),
}

impl<'a> ReplCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return ReplCommand::Message(line);
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "quit" | "exit" => ReplCommand::Quit,
            "reset" | "clear" => ReplCommand::Reset,
            "save" if !arg.is_empty() => ReplCommand::Save(arg),
            "help" => ReplCommand::Help,
            _ => ReplCommand::Unknown(line),
        }
    }
}

/// Run the chat loop on stdin until `/quit` or end of input.
pub async fn run<B: ChatBackend>(
    session: &mut ChatSession<B>,
    image_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    run_with_input(session, image_dir, io::stdin().lock()).await
}

/// Run the chat loop reading lines from `input`.
///
/// Only failures to read input or write the prompt end the loop; everything
/// else is reported and the session carries on.
pub async fn run_with_input<B: ChatBackend, R: BufRead>(
    session: &mut ChatSession<B>,
    image_dir: &Path,
    mut input: R,
) -> Result<(), Box<dyn std::error::Error>> {
    print_help();
    for turn in session.conversation().turns() {
        print_turn(turn, image_dir);
    }

    loop {
        print!("\n{} {} ", USER_AVATAR, "you ›".bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            println!();
            break;
        }

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => print_help(),
            ReplCommand::Reset => {
                session.reset();
                println!("{}", "History cleared.".dimmed());
                for turn in session.conversation().turns() {
                    print_turn(turn, image_dir);
                }
            }
            ReplCommand::Save(path) => match save_transcript(session, Path::new(path)) {
                Ok(()) => println!("{} {}", "Saved to".green(), path),
                Err(e) => report(&e),
            },
            ReplCommand::Unknown(command) => {
                println!("{} {} (try /help)", "Unknown command".yellow(), command);
            }
            ReplCommand::Message(text) => {
                let spinner = spinner();
                let result = session.submit(text).await;
                spinner.finish_and_clear();

                match result {
                    Ok(turn) => print_turn(turn, image_dir),
                    Err(e) => report(&e),
                }
            }
        }
    }

    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Thinking...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn report(error: &dyn std::error::Error) {
    eprintln!("{}: {}", "Error".red().bold(), error);
}

/// Print a turn; image write failures are reported, the answer still shows.
fn print_turn(turn: &Turn, image_dir: &Path) {
    match turn.role {
        Role::User => println!("\n{} {} {}", USER_AVATAR, "you ›".bold(), turn.content),
        Role::Model => println!("\n{} {} {}", MODEL_AVATAR, "bot ›".cyan().bold(), turn.content),
    }

    let (Some(page), false) = (turn.cited_page, turn.images.is_empty()) else {
        return;
    };
    match save_images(turn, page, image_dir) {
        Ok(paths) => {
            for path in paths {
                println!(
                    "   {} {}",
                    format!("🖼️  page {}:", page).dimmed(),
                    path.display()
                );
            }
        }
        Err(e) => report(&e),
    }
}

/// Write the transcript as JSON.
pub fn save_transcript<B: ChatBackend>(session: &ChatSession<B>, path: &Path) -> docchat::Result<()> {
    fs::write(path, session.conversation().to_json()?)?;
    Ok(())
}

/// Write a turn's images as `page-N-K.png` under `dir`.
pub fn save_images(turn: &Turn, page: u32, dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    turn.images
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let path = dir.join(image.suggested_filename(page, index));
            fs::write(&path, &image.data)?;
            Ok(path)
        })
        .collect()
}

fn print_help() {
    println!("{}", "Ask anything about the document.".cyan().bold());
    println!(
        "{}",
        "Commands: /reset  clear history · /save FILE  export transcript · /quit  exit".dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use docchat::chat::ChatRequest;
    use docchat::model::{DocumentContext, ImageSource, Page, PageImage};
    use docchat::SessionConfig;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("   \n"), ReplCommand::Empty);
        assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/exit\n"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/reset"), ReplCommand::Reset);
        assert_eq!(
            ReplCommand::parse("/save  chat.json "),
            ReplCommand::Save("chat.json")
        );
        assert_eq!(ReplCommand::parse("/save"), ReplCommand::Unknown("/save"));
        assert_eq!(ReplCommand::parse("/dance"), ReplCommand::Unknown("/dance"));
        assert_eq!(
            ReplCommand::parse("What is DPI?\n"),
            ReplCommand::Message("What is DPI?")
        );
    }

    struct Scripted(Mutex<Vec<&'static str>>);

    #[async_trait]
    impl ChatBackend for Scripted {
        async fn generate(&self, _request: &ChatRequest<'_>) -> docchat::Result<String> {
            Ok(self.0.lock().unwrap().remove(0).to_string())
        }
    }

    fn cited_context() -> Arc<DocumentContext> {
        let mut ctx = DocumentContext::empty();
        let mut page = Page::new(1, "figure");
        page.images
            .push(PageImage::png(vec![1], 1, 1, ImageSource::FullPage));
        ctx.push_page(page);
        Arc::new(ctx)
    }

    #[tokio::test]
    async fn test_local_write_failures_keep_session_alive() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the image directory should be
        let image_dir = dir.path().join("not-a-dir");
        fs::write(&image_dir, b"").unwrap();

        let backend = Scripted(Mutex::new(vec!["first [PAGE: 1]", "second"]));
        let mut session = ChatSession::new(backend, cited_context(), SessionConfig::default());
        let script = "/save /nonexistent/dir/t.json\nwhat is on page 1?\nand then?\n/quit\n";

        run_with_input(&mut session, &image_dir, script.as_bytes())
            .await
            .unwrap();

        // greeting + two question/answer pairs
        assert_eq!(session.conversation().len(), 5);
        assert_eq!(session.conversation().last().unwrap().content, "second");
    }

    #[test]
    fn test_save_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Scripted(Mutex::new(Vec::new()));
        let session = ChatSession::new(backend, cited_context(), SessionConfig::default());

        let path = dir.path().join("chat.json");
        save_transcript(&session, &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("\"role\": \"model\""));

        let missing = dir.path().join("missing").join("chat.json");
        assert!(save_transcript(&session, &missing).is_err());
    }

    #[test]
    fn test_save_images() {
        let dir = tempfile::tempdir().unwrap();
        let turn = Turn::model("see [PAGE: 2]").with_citation(
            Some(2),
            vec![
                PageImage::png(vec![1, 2], 1, 1, ImageSource::FullPage),
                PageImage::png(vec![3], 1, 1, ImageSource::FullPage),
            ],
        );

        let paths = save_images(&turn, 2, dir.path()).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("page-2-1.png"));
        assert_eq!(fs::read(&paths[1]).unwrap(), vec![3]);
    }
}
