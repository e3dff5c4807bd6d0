//! docchat CLI - chat with a PDF, answers cite their page

mod repl;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docchat::chat::{DEFAULT_MODEL, DEFAULT_PERSONA};
use docchat::extract::{extract_document, load_cached};
use docchat::{
    ChatBackend, ChatSession, DocumentContext, ExtractOptions, GeminiClient, PdfiumBackend,
    SessionConfig,
};

#[derive(Parser)]
#[command(name = "docchat")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Chat with a PDF; answers cite the page they come from", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(flatten)]
    chat: ChatArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the interactive chat (the default command).
#[derive(Args)]
struct ChatArgs {
    /// PDF document to answer from
    #[arg(long, env = "DOCCHAT_PDF", default_value = "Graphic.pdf")]
    pdf: PathBuf,

    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "DOCCHAT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Override the API base URL
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Request timeout in seconds (none by default)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Where cited page images are written
    #[arg(long, value_name = "DIR", default_value = "docchat_images")]
    image_dir: PathBuf,

    /// File with a custom persona instruction
    #[arg(long, value_name = "FILE")]
    persona: Option<PathBuf>,

    /// Directory containing the PDFium library
    #[arg(long, env = "PDFIUM_DIR", value_name = "DIR")]
    pdfium_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract page-tagged text and page images to a directory
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Directory containing the PDFium library
        #[arg(long, env = "PDFIUM_DIR", value_name = "DIR")]
        pdfium_dir: Option<PathBuf>,
    },

    /// Show what would be fed to the model
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Directory containing the PDFium library
        #[arg(long, env = "PDFIUM_DIR", value_name = "DIR")]
        pdfium_dir: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    // Must run before parsing so `env = ...` arguments see .env values
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract {
            input,
            output,
            pdfium_dir,
        }) => cmd_extract(&input, output.as_deref(), pdfium_dir.as_deref()),
        Some(Commands::Info { input, pdfium_dir }) => cmd_info(&input, pdfium_dir.as_deref()),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => cmd_chat(cli.chat),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_chat(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let persona = match &args.persona {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_PERSONA.to_string(),
    };

    let pb = spinner(format!("Reading {}...", args.pdf.display()));
    let (context, error) = load_cached(
        &args.pdf,
        args.pdfium_dir.as_deref(),
        &ExtractOptions::default(),
    );
    pb.finish_and_clear();

    // Extraction failures are reported once; chat continues with an empty document
    match error {
        Some(e) => eprintln!("{}: {}", "Error".red().bold(), e),
        None => println!(
            "{} {} ({} pages, {} images)",
            "Loaded".green(),
            args.pdf.display(),
            context.page_count,
            context.image_count()
        ),
    }

    let mut client = GeminiClient::new(args.api_key).with_model(args.model);
    if let Some(base) = args.api_base {
        client = client.with_api_base(base);
    }
    if let Some(secs) = args.timeout {
        client = client.with_timeout(Duration::from_secs(secs))?;
    }
    if client.check_credentials().is_err() {
        eprintln!(
            "{}",
            "GOOGLE_API_KEY is not set; questions will be rejected until it is.".yellow()
        );
    }

    log::info!(
        "Model {}, images written to {}",
        client.model(),
        args.image_dir.display()
    );

    let config = SessionConfig::new().with_persona(persona);
    let mut session = ChatSession::new(client, context, config);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(repl::run(&mut session, &args.image_dir))
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    pdfium_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    });

    let pb = spinner("Extracting pages...".to_string());
    let context = extract(input, pdfium_dir)?;
    pb.finish_and_clear();

    fs::create_dir_all(&output_dir)?;
    fs::write(output_dir.join("context.txt"), &context.full_text)?;

    let images_dir = output_dir.join("images");
    fs::create_dir_all(&images_dir)?;
    let mut count = 0;
    for (page, images) in &context.page_images {
        for (index, image) in images.iter().enumerate() {
            fs::write(
                images_dir.join(image.suggested_filename(*page, index)),
                &image.data,
            )?;
            count += 1;
        }
    }

    println!("\n{}", "Output files:".green().bold());
    println!("  {} context.txt", "├─".dimmed());
    println!("  {} images/ ({} files)", "└─".dimmed(), count);

    Ok(())
}

fn cmd_info(input: &Path, pdfium_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let context = extract(input, pdfium_dir)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), context.page_count);
    println!("{}: {}", "Characters".bold(), context.full_text.chars().count());
    println!("{}: {}", "Images".bold(), context.image_count());

    println!();
    println!("{}", "Images per Page".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (page, images) in &context.page_images {
        let crops = images.iter().filter(|i| !i.is_full_page()).count();
        if crops > 0 {
            println!("  {:>4}: {} cropped", page, crops);
        } else {
            println!("  {:>4}: full page", page);
        }
    }

    Ok(())
}

fn extract(input: &Path, pdfium_dir: Option<&Path>) -> docchat::Result<DocumentContext> {
    let backend = match pdfium_dir {
        Some(dir) => PdfiumBackend::bind(Some(dir))?,
        None => PdfiumBackend::bind_default()?,
    };
    extract_document(&backend, input, &ExtractOptions::default())
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn cmd_version() {
    println!("{} {}", "docchat".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Chat with a PDF, answers cite their page");
    println!();
    println!("License: MIT");
}
