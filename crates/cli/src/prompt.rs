use anyhow::{bail, Result};
use bitbucket_admin_output::Console;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use tracing::info;

/// Source of operator answers.
pub trait Prompter {
    /// Free text; an empty answer is allowed.
    fn input(&mut self, message: &str) -> Result<String>;

    /// Position of the chosen item. `items` is never empty.
    fn select(&mut self, message: &str, items: &[String]) -> Result<usize>;
}

/// Keyboard-driven prompts on the controlling terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn input(&mut self, message: &str) -> Result<String> {
        let value: String = Input::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty(true)
            .interact_text()?;
        Ok(value)
    }

    fn select(&mut self, message: &str, items: &[String]) -> Result<usize> {
        let index = Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(items)
            .default(0)
            .interact()?;
        Ok(index)
    }
}

/// A fixed menu entry.
pub trait MenuItem: Copy {
    fn label(&self) -> &'static str;
}

/// Prompter and console for one interactive run.
pub struct Session<'a> {
    pub prompter: &'a mut dyn Prompter,
    pub console: &'a mut Console,
}

impl<'a> Session<'a> {
    pub fn new(prompter: &'a mut dyn Prompter, console: &'a mut Console) -> Self {
        Self { prompter, console }
    }

    pub fn input(&mut self, message: &str) -> Result<String> {
        self.prompter.input(message)
    }

    pub fn menu<T: MenuItem>(&mut self, message: &str, options: &[T]) -> Result<T> {
        let labels: Vec<String> = options.iter().map(|o| o.label().to_string()).collect();
        let index = self.prompter.select(message, &labels)?;
        let Some(choice) = options.get(index) else {
            bail!("Selection {index} is out of range");
        };
        info!(prompt = message, choice = choice.label(), "Selected option");
        Ok(*choice)
    }

    /// Pick one of `items` by its label and return its position.
    ///
    /// Items are matched by label, first one in listing order. When other
    /// items share the chosen label the operator is warned, since they cannot
    /// tell them apart.
    pub fn choose_index<T>(
        &mut self,
        message: &str,
        items: &[T],
        label: impl Fn(&T) -> String,
    ) -> Result<usize> {
        if items.is_empty() {
            bail!("Nothing to choose from for: {message}");
        }

        let labels: Vec<String> = items.iter().map(label).collect();
        let picked = self.prompter.select(message, &labels)?;
        let Some(chosen) = labels.get(picked) else {
            bail!("Selection {picked} is out of range");
        };

        let duplicates = labels.iter().filter(|l| *l == chosen).count();
        let index = labels.iter().position(|l| l == chosen).unwrap_or(picked);
        if duplicates > 1 {
            self.console.warn(format!(
                "{duplicates} entries are listed as '{chosen}'; using the first one"
            ))?;
        }

        info!(prompt = message, choice = chosen.as_str(), "Selected entry");
        Ok(index)
    }

    pub fn choose<'t, T>(
        &mut self,
        message: &str,
        items: &'t [T],
        label: impl Fn(&T) -> String,
    ) -> Result<&'t T> {
        let index = self.choose_index(message, items, label)?;
        Ok(&items[index])
    }
}
