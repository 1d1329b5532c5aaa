use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use pdf2docx_core::ConversionOutcome;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the result of a conversion.
pub fn print_conversion(
    w: &mut dyn Write,
    input: &Path,
    output: &Path,
    outcome: ConversionOutcome,
    paragraphs: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Converting {}...", input.display())?;
    let status = match outcome {
        ConversionOutcome::Converted => "[CONVERTED]",
        ConversionOutcome::TextExtracted => "[TEXT ONLY]",
    };
    if color.enabled() {
        match outcome {
            ConversionOutcome::Converted => write!(w, "{} ", status.green().bold())?,
            ConversionOutcome::TextExtracted => write!(w, "{} ", status.yellow().bold())?,
        }
    } else {
        write!(w, "{} ", status)?;
    }
    writeln!(w, "{}", outcome.message())?;
    writeln!(w, "  Output: {}", output.display())?;
    if color.enabled() {
        writeln!(w, "{}", format!("  {} paragraph(s)", paragraphs).dimmed())?;
    } else {
        writeln!(w, "  {} paragraph(s)", paragraphs)?;
    }
    Ok(())
}

/// Print a failure line.
pub fn print_failure(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "[FAILED]".red().bold(), message)
    } else {
        writeln!(w, "[FAILED] {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_conversion_summary() {
        let mut buf = Vec::new();
        print_conversion(
            &mut buf,
            Path::new("in.pdf"),
            Path::new("in.docx"),
            ConversionOutcome::TextExtracted,
            1,
            ColorMode(false),
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Converting in.pdf...\n[TEXT ONLY] Text extracted successfully\n  Output: in.docx\n  1 paragraph(s)\n"
        );
    }

    #[test]
    fn plain_failure_line() {
        let mut buf = Vec::new();
        print_failure(&mut buf, "Text extraction yielded no content.", ColorMode(false)).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "[FAILED] Text extraction yielded no content.\n"
        );
    }
}
