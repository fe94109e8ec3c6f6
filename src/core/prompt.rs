//! Interactive questions asked by workflow steps.
//!
//! Steps talk to a [`Prompter`]; the CLI passes the terminal-backed
//! [`PromptEngine`], tests and `--yes`-style runs pass a [`ScriptedPrompter`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::{Error, Result};

/// A yes/no confirmation prompt.
#[derive(Debug, Clone)]
pub struct YesNoPrompt {
    pub question: String,
    /// true = default yes [Y/n], false = default no [y/N]
    pub default: bool,
}

impl YesNoPrompt {
    pub fn new(question: impl Into<String>, default: bool) -> Self {
        Self {
            question: question.into(),
            default,
        }
    }
}

/// Select one option from a list.
#[derive(Debug, Clone)]
pub struct SelectPrompt {
    pub question: String,
    pub options: Vec<SelectOption>,
    pub default_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

impl SelectPrompt {
    pub fn new<I, S>(question: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question: question.into(),
            options: values.into_iter().map(SelectOption::new).collect(),
            default_index: None,
        }
    }

    pub fn default_index(mut self, index: usize) -> Self {
        self.default_index = Some(index);
        self
    }

    fn default_value(&self) -> Option<String> {
        self.default_index
            .and_then(|i| self.options.get(i))
            .map(|o| o.value.clone())
    }
}

/// Free text input.
#[derive(Debug, Clone)]
pub struct TextPrompt {
    pub question: String,
    pub default: Option<String>,
    /// Reject empty answers when there is no default.
    pub required: bool,
}

impl TextPrompt {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            default: None,
            required: true,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Apply the default to a raw answer and check it.
    fn resolve(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
        match &self.default {
            Some(default) => Some(default.clone()),
            None if self.required => None,
            None => Some(String::new()),
        }
    }
}

pub trait Prompter {
    fn input(&self, prompt: &TextPrompt) -> Result<String>;
    fn select(&self, prompt: &SelectPrompt) -> Result<String>;
    fn confirm(&self, prompt: &YesNoPrompt) -> Result<bool>;
}

impl<P: Prompter + ?Sized> Prompter for &P {
    fn input(&self, prompt: &TextPrompt) -> Result<String> {
        (**self).input(prompt)
    }

    fn select(&self, prompt: &SelectPrompt) -> Result<String> {
        (**self).select(prompt)
    }

    fn confirm(&self, prompt: &YesNoPrompt) -> Result<bool> {
        (**self).confirm(prompt)
    }
}

pub fn require_tty_for_interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Terminal prompt engine. Questions go to stderr, answers come from stdin.
/// Without a terminal every prompt resolves to its default, or fails when
/// there is none.
pub struct PromptEngine {
    interactive: bool,
}

impl PromptEngine {
    /// Create engine with automatic TTY detection.
    pub fn new() -> Self {
        Self {
            interactive: require_tty_for_interactive(),
        }
    }

    pub fn with_interactive(interactive: bool) -> Self {
        Self { interactive }
    }

    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn read_line(&self, question: &str) -> Result<String> {
        io::stderr().flush().ok();
        let mut input = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| Error::prompt_failed(question, e.to_string()))?;
        if read == 0 {
            return Err(Error::prompt_failed(question, "end of input"));
        }
        Ok(input)
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for PromptEngine {
    fn input(&self, prompt: &TextPrompt) -> Result<String> {
        if !self.interactive {
            return prompt
                .resolve("")
                .ok_or_else(|| Error::prompt_failed(&prompt.question, "no terminal and no default"));
        }

        loop {
            match &prompt.default {
                Some(default) => eprint!("{} ({}): ", prompt.question, default),
                None => eprint!("{}: ", prompt.question),
            }
            let raw = self.read_line(&prompt.question)?;
            if let Some(answer) = prompt.resolve(&raw) {
                return Ok(answer);
            }
            eprintln!("A value is required.");
        }
    }

    fn select(&self, prompt: &SelectPrompt) -> Result<String> {
        if prompt.options.is_empty() {
            return Err(Error::prompt_failed(&prompt.question, "no options to choose from"));
        }
        if !self.interactive {
            return prompt
                .default_value()
                .ok_or_else(|| Error::prompt_failed(&prompt.question, "no terminal and no default"));
        }

        eprintln!("{}", prompt.question);
        for (i, opt) in prompt.options.iter().enumerate() {
            let marker = if Some(i) == prompt.default_index {
                "*"
            } else {
                " "
            };
            eprintln!("  {}[{}] {}", marker, i + 1, opt.label);
        }

        loop {
            eprint!("Enter choice (1-{}): ", prompt.options.len());
            let raw = self.read_line(&prompt.question)?;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                if let Some(value) = prompt.default_value() {
                    return Ok(value);
                }
                continue;
            }
            let chosen = trimmed
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|n| prompt.options.get(n));
            if let Some(option) = chosen {
                return Ok(option.value.clone());
            }
            eprintln!("Invalid choice: {}", trimmed);
        }
    }

    fn confirm(&self, prompt: &YesNoPrompt) -> Result<bool> {
        if !self.interactive {
            return Ok(prompt.default);
        }

        let suffix = if prompt.default { "[Y/n]" } else { "[y/N]" };
        eprint!("{} {}: ", prompt.question, suffix);
        let raw = self.read_line(&prompt.question)?;
        let trimmed = raw.trim().to_lowercase();
        if trimmed.is_empty() {
            return Ok(prompt.default);
        }
        Ok(trimmed.starts_with('y'))
    }
}

/// Answers prompts from a fixed queue, in order.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// Questions asked so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, question: &str) -> Result<String> {
        self.asked.borrow_mut().push(question.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::prompt_failed(question, "no scripted answer left"))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &TextPrompt) -> Result<String> {
        let raw = self.next(&prompt.question)?;
        prompt
            .resolve(&raw)
            .ok_or_else(|| Error::prompt_failed(&prompt.question, "a value is required"))
    }

    fn select(&self, prompt: &SelectPrompt) -> Result<String> {
        let raw = self.next(&prompt.question)?;
        if raw.is_empty() {
            return prompt
                .default_value()
                .ok_or_else(|| Error::prompt_failed(&prompt.question, "no default option"));
        }
        prompt
            .options
            .iter()
            .find(|o| o.value == raw)
            .map(|o| o.value.clone())
            .ok_or_else(|| Error::prompt_failed(&prompt.question, format!("'{}' is not an option", raw)))
    }

    fn confirm(&self, prompt: &YesNoPrompt) -> Result<bool> {
        let raw = self.next(&prompt.question)?.trim().to_lowercase();
        if raw.is_empty() {
            return Ok(prompt.default);
        }
        Ok(raw.starts_with('y'))
    }
}
