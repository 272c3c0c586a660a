//! Output abstraction for testable printing

use crate::Result;
use std::sync::{Arc, Mutex};

/// Output abstraction for printing results
pub trait Output: Send + Sync {
    /// Print normal output
    fn print(&self, msg: &str) -> Result<()>;

    /// Print formatted JSON
    fn print_json(&self, data: &serde_json::Value) -> Result<()> {
        self.print(&serde_json::to_string_pretty(data)?)
    }

    /// Print error message
    fn error(&self, msg: &str) -> Result<()>;

    /// Print success message
    fn success(&self, msg: &str) -> Result<()> {
        self.print(&format!("✅ {}", msg))
    }

    /// Print info message
    fn info(&self, msg: &str) -> Result<()> {
        self.print(&format!("ℹ️  {}", msg))
    }
}

/// Standard console output implementation
pub struct ConsoleOutput;

impl Output for ConsoleOutput {
    fn print(&self, msg: &str) -> Result<()> {
        println!("{}", msg);
        Ok(())
    }

    fn error(&self, msg: &str) -> Result<()> {
        eprintln!("❌ {}", msg);
        Ok(())
    }
}

/// Output that records everything written to it
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    messages: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// All printed messages joined by newlines
    pub fn text(&self) -> String {
        self.messages().join("\n")
    }
}

impl Output for CapturedOutput {
    fn print(&self, msg: &str) -> Result<()> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(msg.to_string());
        }
        Ok(())
    }

    fn error(&self, msg: &str) -> Result<()> {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(msg.to_string());
        }
        Ok(())
    }
}
