use crate::application::AppError;
use crate::domain::{Expense, format_cents, total_cents};

const CSV_DATE_FORMAT: &str = "%d/%m/%Y";
const MESSAGE_DATE_FORMAT: &str = "%d %b %Y";
const SHARE_LINK_BASE: &str = "https://wa.me/?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    /// Plain text summary meant to be pasted into a chat
    Message,
    /// Chat share link carrying the message
    Link,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Message => "message",
            ExportFormat::Link => "link",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "message" | "text" => Some(ExportFormat::Message),
            "link" => Some(ExportFormat::Link),
            _ => None,
        }
    }
}

/// Renders a selection of expenses. Selections are never empty: an empty one
/// fails with [`AppError::EmptySelection`] before anything is produced.
pub struct Exporter<'a> {
    currency_symbol: &'a str,
}

impl<'a> Exporter<'a> {
    pub fn new(currency_symbol: &'a str) -> Self {
        Self { currency_symbol }
    }

    pub fn render(&self, format: ExportFormat, selection: &[&Expense]) -> Result<String, AppError> {
        match format {
            ExportFormat::Csv => self.csv(selection),
            ExportFormat::Message => self.message(selection),
            ExportFormat::Link => self.share_link(selection),
        }
    }

    /// Quoted CSV with a header row, one line per expense, no trailing newline.
    pub fn csv(&self, selection: &[&Expense]) -> Result<String, AppError> {
        ensure_selected(selection)?;

        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(["Date", "Description", "Amount", "Paid By"])
            .map_err(export_error)?;
        for expense in selection {
            writer
                .write_record([
                    expense.expense_date.format(CSV_DATE_FORMAT).to_string(),
                    expense.description.clone(),
                    format_cents(expense.amount_cents),
                    expense.paid_by.clone(),
                ])
                .map_err(export_error)?;
        }

        let bytes = writer.into_inner().map_err(export_error)?;
        let text = String::from_utf8(bytes).map_err(export_error)?;
        Ok(text.trim_end_matches('\n').to_string())
    }

    /// One block per expense followed by the total of the selection.
    pub fn message(&self, selection: &[&Expense]) -> Result<String, AppError> {
        ensure_selected(selection)?;

        let mut blocks: Vec<String> = selection
            .iter()
            .map(|expense| {
                format!(
                    "Date: {}\nAmount: {}{}\nDescription: {}\nPaid by: {}",
                    expense.expense_date.format(MESSAGE_DATE_FORMAT),
                    self.currency_symbol,
                    format_cents(expense.amount_cents),
                    expense.description,
                    expense.paid_by,
                )
            })
            .collect();

        let total = total_cents(selection.iter().copied());
        blocks.push(format!(
            "Total: {}{}",
            self.currency_symbol,
            format_cents(total)
        ));
        Ok(blocks.join("\n\n"))
    }

    /// Link that opens a chat with the message pre-filled.
    pub fn share_link(&self, selection: &[&Expense]) -> Result<String, AppError> {
        let message = self.message(selection)?;
        let query = serde_urlencoded::to_string([("text", message.as_str())]).map_err(export_error)?;
        Ok(format!("{}{}", SHARE_LINK_BASE, query))
    }
}

fn ensure_selected(selection: &[&Expense]) -> Result<(), AppError> {
    if selection.is_empty() {
        return Err(AppError::EmptySelection);
    }
    Ok(())
}

fn export_error(err: impl std::fmt::Display) -> AppError {
    AppError::Export(err.to_string())
}
