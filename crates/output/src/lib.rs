use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use colored::Colorize;

/// Operator-facing output. Everything the interactive flows print goes
/// through here so it can be captured. Clones share one sink, so a clone can
/// be handed to code that reports failures on its own.
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
    color: bool,
}

impl Console {
    pub fn new(out: Box<dyn Write + Send>, color: bool) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
            color,
        }
    }

    pub fn stdout(color: bool) -> Self {
        Self::new(Box::new(io::stdout()), color)
    }

    pub fn line(&self, text: impl AsRef<str>) -> Result<()> {
        self.emit(&format!("{}\n", text.as_ref()))
    }

    /// A heading followed by one `Label: value` line per field.
    pub fn record(&self, title: &str, fields: &[(&str, &str)]) -> Result<()> {
        let mut block = format!("{title}\n");
        for (label, value) in fields {
            block.push_str(&format!("{label}: {value}\n"));
        }
        self.emit(&block)
    }

    pub fn success(&self, text: impl AsRef<str>) -> Result<()> {
        let mark = if self.color {
            "✓".green().to_string()
        } else {
            "✓".to_string()
        };
        self.line(format!("{mark} {}", text.as_ref()))
    }

    pub fn warn(&self, text: impl AsRef<str>) -> Result<()> {
        let mark = if self.color {
            "!".yellow().bold().to_string()
        } else {
            "!".to_string()
        };
        self.line(format!("{mark} {}", text.as_ref()))
    }

    pub fn error(&self, text: impl AsRef<str>) -> Result<()> {
        let label = if self.color {
            "Error:".red().bold().to_string()
        } else {
            "Error:".to_string()
        };
        self.line(format!("{label} {}", text.as_ref()))
    }

    fn emit(&self, text: &str) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("console output is poisoned"))?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_record_layout() {
        let buffer = Buffer::default();
        let console = Console::new(Box::new(buffer.clone()), false);
        console
            .record("Project already exists:", &[("Name", "demo"), ("Key", "DEM")])
            .unwrap();
        assert_eq!(buffer.text(), "Project already exists:\nName: demo\nKey: DEM\n");
    }

    #[test]
    fn test_plain_markers() {
        let buffer = Buffer::default();
        let console = Console::new(Box::new(buffer.clone()), false);
        console.success("done").unwrap();
        console.warn("careful").unwrap();
        console.error("failed").unwrap();
        assert_eq!(buffer.text(), "✓ done\n! careful\nError: failed\n");
    }

    #[test]
    fn test_clones_share_the_sink() {
        let buffer = Buffer::default();
        let console = Console::new(Box::new(buffer.clone()), false);
        let reporter = console.clone();
        console.line("first").unwrap();
        reporter.warn("Error fetching data: boom").unwrap();
        assert_eq!(buffer.text(), "first\n! Error fetching data: boom\n");
    }

    #[test]
    fn test_colored_success_keeps_text() {
        let buffer = Buffer::default();
        let console = Console::new(Box::new(buffer.clone()), true);
        console.success("Repository created successfully.").unwrap();
        assert!(buffer.text().contains("Repository created successfully."));
    }
}
