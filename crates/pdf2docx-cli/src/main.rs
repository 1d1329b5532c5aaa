use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pdf2docx_core::docx::paragraph_texts;
use pdf2docx_core::{PageRange, PdfBackend, convert_with_fallback, docx_file_name};
use pdf2docx_mupdf::{MupdfBackend, MupdfConverter};
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Convert PDF documents into editable Word documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a PDF to DOCX, falling back to plain text when layout fails
    Convert {
        /// Path to the PDF to convert
        input: PathBuf,

        /// Output path (default: input with a .docx extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// First page to convert, 0-based
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Page to stop before, 0-based (default: last page)
        #[arg(long)]
        end: Option<usize>,
    },

    /// Print the extracted text of a PDF
    Extract {
        /// Path to the PDF
        input: PathBuf,

        /// Write the text to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Convert {
            input,
            output,
            start,
            end,
        } => convert(&input, output, start, end, color),
        Command::Extract { input, output } => extract(&input, output),
    }
}

fn convert(
    input: &Path,
    output: Option<PathBuf>,
    start: usize,
    end: Option<usize>,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !input.is_file() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let range = PageRange::new(start, end)?;
    let output = match output {
        Some(path) => path,
        None => default_output(input)?,
    };

    let mut stdout = std::io::stdout();
    let result = convert_with_fallback(
        &MupdfConverter::new(),
        &MupdfBackend::new(),
        input,
        &output,
        range,
    );
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            output::print_failure(&mut std::io::stderr(), &e.to_string(), color)?;
            std::process::exit(1);
        }
    };

    let paragraphs = paragraph_texts(&output)?.len();
    output::print_conversion(&mut stdout, input, &output, outcome, paragraphs, color)?;
    Ok(())
}

fn extract(input: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let text = MupdfBackend::new().extract_text(input)?;

    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(std::fs::File::create(output_path)?)
    } else {
        Box::new(std::io::stdout())
    };
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// `<dir>/<stem>.docx` next to the input.
fn default_output(input: &Path) -> anyhow::Result<PathBuf> {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(docx_file_name)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot derive an output name from {}; pass --output",
                input.display()
            )
        })?;
    Ok(input.with_file_name(name))
}
