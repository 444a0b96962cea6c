use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;

use crate::domain::{format_amount, Transaction};

const HEADERS: [&str; 7] = [
    "Date",
    "Type",
    "Amount",
    "Currency",
    "To Currency",
    "Status",
    "Description",
];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No transactions to export")]
    NothingToExport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// Tab-separated values, opens directly in spreadsheet software
    Spreadsheet,
    /// Printable HTML table (print to PDF from a browser)
    Html,
    /// Full JSON snapshot of the transactions
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Spreadsheet => "tsv",
            ExportFormat::Html => "html",
            ExportFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "tsv" | "excel" | "xls" | "spreadsheet" => Some(ExportFormat::Spreadsheet),
            "html" | "pdf" => Some(ExportFormat::Html),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    pub fn default_file_name(&self) -> String {
        format!("transactions.{}", self.as_str())
    }
}

/// JSON export envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
}

/// Renders a sequence of transactions, in the order given, to an export format.
pub struct Exporter<'a> {
    transactions: Vec<&'a Transaction>,
}

impl<'a> Exporter<'a> {
    pub fn new(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        Self {
            transactions: transactions.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Write every transaction in `format`. Returns how many were written.
    pub fn export<W: Write>(&self, format: ExportFormat, writer: W) -> Result<usize> {
        match format {
            ExportFormat::Csv => self.export_delimited(writer, b','),
            ExportFormat::Spreadsheet => self.export_delimited(writer, b'\t'),
            ExportFormat::Html => self.export_html(writer),
            ExportFormat::Json => self.export_json(writer),
        }
    }

    /// Export to CSV format
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        self.export_delimited(writer, b',')
    }

    fn export_delimited<W: Write>(&self, writer: W, delimiter: u8) -> Result<usize> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        csv_writer.write_record(HEADERS)?;

        let mut count = 0;
        for transaction in &self.transactions {
            csv_writer.write_record(&[
                transaction.timestamp.format("%Y-%m-%d").to_string(),
                transaction.transaction_type().as_str().to_string(),
                transaction.amount().to_string(),
                transaction.currency().as_str().to_string(),
                transaction
                    .to_currency()
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_default(),
                transaction.status.as_str().to_string(),
                transaction.description.clone(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export a printable HTML table
    pub fn export_html<W: Write>(&self, mut writer: W) -> Result<usize> {
        writeln!(writer, "<!DOCTYPE html>")?;
        writeln!(writer, "<html>\n<head>\n<meta charset=\"utf-8\">")?;
        writeln!(writer, "<title>Transaction History</title>")?;
        writeln!(
            writer,
            "<style>\n\
             body {{ font-family: Arial, sans-serif; margin: 20px; }}\n\
             table {{ width: 100%; border-collapse: collapse; margin-top: 20px; }}\n\
             th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}\n\
             th {{ background-color: #f2f2f2; }}\n\
             @media print {{ body {{ margin: 0; }} }}\n\
             </style>"
        )?;
        writeln!(writer, "</head>\n<body>")?;
        writeln!(writer, "<h1>Transaction History</h1>")?;
        writeln!(
            writer,
            "<p>Generated on: {}</p>",
            Utc::now().format("%Y-%m-%d")
        )?;
        writeln!(writer, "<table>\n<thead>\n<tr>")?;
        for header in HEADERS {
            writeln!(writer, "<th>{}</th>", header)?;
        }
        writeln!(writer, "</tr>\n</thead>\n<tbody>")?;

        let mut count = 0;
        for transaction in &self.transactions {
            let cells = [
                transaction.timestamp.format("%Y-%m-%d").to_string(),
                transaction.transaction_type().to_string(),
                format_amount(transaction.amount(), transaction.currency()),
                transaction.currency().to_string(),
                transaction
                    .to_currency()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                transaction.status.to_string(),
                transaction.description.clone(),
            ];
            write!(writer, "<tr>")?;
            for cell in &cells {
                write!(writer, "<td>{}</td>", escape_html(cell))?;
            }
            writeln!(writer, "</tr>")?;
            count += 1;
        }

        writeln!(writer, "</tbody>\n</table>\n</body>\n</html>")?;
        writer.flush()?;
        Ok(count)
    }

    /// Export a JSON snapshot
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let snapshot = TransactionSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            transactions: self.transactions.iter().map(|t| (*t).clone()).collect(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot.transactions.len())
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
