//! Interactive prompts for runs started without a date range

use crate::error::{Error, Result};
use crate::range::{DateRange, parse_date, resolve_explicit, resolve_month};
use dialoguer::{Confirm, Input};
use std::io::{IsTerminal, stdin};

/// Range as typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeAnswer {
    /// Start date and optional end date (empty means today)
    Dates { start: String, end: Option<String> },
    /// Whole month token such as `april-2025`
    Month(String),
}

impl RangeAnswer {
    /// Interpret the first answer: a full date, else a month token
    pub fn from_start(input: &str) -> Self {
        let trimmed = input.trim();
        if parse_date(trimmed).is_ok() {
            RangeAnswer::Dates {
                start: trimmed.to_string(),
                end: None,
            }
        } else {
            RangeAnswer::Month(trimmed.to_string())
        }
    }

    pub fn needs_end(&self) -> bool {
        matches!(self, RangeAnswer::Dates { .. })
    }
}

/// Values gathered from the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAnswers {
    pub range: RangeAnswer,
    pub exclude_live_stills: bool,
}

impl PromptAnswers {
    /// Resolve the answered dates into a range
    pub fn range(&self) -> Result<DateRange> {
        match &self.range {
            RangeAnswer::Dates { start, end } => resolve_explicit(Some(start), end.as_deref()),
            RangeAnswer::Month(token) => resolve_month(token),
        }
    }
}

/// Prompt only when no range was given and someone can answer
pub fn should_prompt(has_range: bool) -> bool {
    !has_range && stdin().is_terminal()
}

/// Ask for a start date or month, an optional end date and the live still
/// toggle
pub fn ask(exclude_live_stills_default: bool) -> Result<PromptAnswers> {
    let first: String = Input::new()
        .with_prompt("Start date (mm-dd-yyyy) or month (e.g. april-2025)")
        .validate_with(|input: &String| validate_start(input))
        .interact_text()
        .map_err(prompt_error)?;

    let mut range = RangeAnswer::from_start(&first);
    if let RangeAnswer::Dates { end, .. } = &mut range {
        let answer: String = Input::new()
            .with_prompt("End date (mm-dd-yyyy, empty for today)")
            .allow_empty(true)
            .validate_with(|input: &String| {
                if input.trim().is_empty() {
                    Ok(())
                } else {
                    validate_date(input)
                }
            })
            .interact_text()
            .map_err(prompt_error)?;
        *end = optional(&answer);
    }

    let exclude_live_stills = Confirm::new()
        .with_prompt("Skip the still image of live photos?")
        .default(exclude_live_stills_default)
        .interact()
        .map_err(prompt_error)?;

    Ok(PromptAnswers {
        range,
        exclude_live_stills,
    })
}

fn validate_start(input: &str) -> std::result::Result<(), String> {
    if parse_date(input).is_ok() || resolve_month(input).is_ok() {
        return Ok(());
    }
    Err(format!(
        "'{}' is neither a mm-dd-yyyy date nor a month such as april-2025",
        input.trim()
    ))
}

fn validate_date(input: &str) -> std::result::Result<(), String> {
    parse_date(input).map(|_| ()).map_err(|e| e.to_string())
}

fn optional(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::Prompt(e.to_string())
}
