use std::{collections::HashMap, path::PathBuf};

use anyhow::Context;
use validator::ValidationErrors;

use crate::ledger::{
    domain::{
        balance::{self, BalanceJudgment},
        currency::{default_currencies, Currency},
        journal_entries::NewJournalEntryData,
    },
    http::reps,
};

pub struct CheckOpts {
    pub json: bool,
    pub path: PathBuf,
}

/// The outcome of checking a journal entry file.
pub enum CheckOutcome {
    Judged(BalanceJudgment),
    Invalid(ValidationErrors),
}

impl CheckOutcome {
    pub fn is_postable(&self) -> bool {
        match self {
            Self::Judged(judgment) => judgment.is_postable(),
            Self::Invalid(_) => false,
        }
    }
}

pub fn check_entry(
    contents: &str,
    currencies: &HashMap<String, Currency>,
) -> anyhow::Result<CheckOutcome> {
    let data: NewJournalEntryData =
        serde_json::from_str(contents).context("Failed to parse journal entry.")?;

    Ok(match data.parse_lines(currencies) {
        Ok(lines) => CheckOutcome::Judged(balance::judge(&lines)),
        Err(errors) => CheckOutcome::Invalid(errors),
    })
}

fn render_text(outcome: &CheckOutcome) -> String {
    let judgment = match outcome {
        CheckOutcome::Judged(judgment) => judgment,
        CheckOutcome::Invalid(errors) => return format!("Invalid journal entry:\n{}\n", errors),
    };

    let mut lines: Vec<String> = judgment
        .totals()
        .iter()
        .map(|totals| {
            let currency = totals.currency();

            format!(
                "{}  debits {}  credits {}  difference {}",
                currency.code(),
                currency.format_value(totals.debits()),
                currency.format_value(totals.credits()),
                currency.format_value(totals.difference()),
            )
        })
        .collect();

    lines.push(format!("valid lines: {}", judgment.valid_line_count()));
    lines.push(match judgment.ensure_postable() {
        Ok(()) => "postable".to_owned(),
        Err(reason) => format!("not postable: {}", reason),
    });

    lines.join("\n") + "\n"
}

fn render_json(outcome: &CheckOutcome) -> anyhow::Result<String> {
    let value = match outcome {
        CheckOutcome::Judged(judgment) => {
            serde_json::to_value(reps::BalanceJudgment::from(judgment))?
        }
        CheckOutcome::Invalid(errors) => serde_json::json!({
            "message": "Invalid journal entry.",
            "errors": errors
        }),
    };

    Ok(serde_json::to_string_pretty(&value)?)
}

/// Judge the journal entry in a file and print the result.
///
/// # Returns
///
/// Whether the entry could be posted.
pub async fn run(opts: CheckOpts) -> anyhow::Result<bool> {
    let contents = tokio::fs::read_to_string(&opts.path)
        .await
        .with_context(|| format!("Failed to read {}.", opts.path.display()))?;

    let outcome = check_entry(&contents, &default_currencies())?;

    if opts.json {
        println!("{}", render_json(&outcome)?);
    } else {
        print!("{}", render_text(&outcome));
    }

    Ok(outcome.is_postable())
}
