//! Interactive input port.
//!
//! Business logic takes a `&mut dyn Prompt` so tests can feed canned input;
//! the terminal implementation wraps dialoguer.

use anyhow::{Context, Result};
use dialoguer::{Password, Select};

/// Source of interactive operator input.
pub trait Prompt {
    /// Read a masked secret.
    fn secret(&mut self, label: &str) -> Result<String>;

    /// Single-select among `items`, returning the chosen index.
    fn select(&mut self, label: &str, items: &[String]) -> Result<usize>;
}

/// Terminal-backed prompt.
#[derive(Debug, Default)]
pub struct TermPrompt;

impl Prompt for TermPrompt {
    fn secret(&mut self, label: &str) -> Result<String> {
        Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
            .with_context(|| format!("read '{}' from prompt", label))
    }

    fn select(&mut self, label: &str, items: &[String]) -> Result<usize> {
        Select::new()
            .with_prompt(label)
            .items(items)
            .default(0)
            .interact()
            .context("select entry")
    }
}
