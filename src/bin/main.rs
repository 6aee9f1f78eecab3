// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use book_vending_rs::{Book, Machine, VendingError};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Book Vending - Run a script of operations against a vending machine
///
/// Reads operations from a CSV file and writes one report row per operation
/// to stdout. Logs go to stderr and are filtered with RUST_LOG.
#[derive(Parser, Debug)]
#[command(name = "book-vending")]
#[command(about = "Drives a coin-operated book vending machine from an operations CSV", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,arg
    /// Example: cargo run -- --credential s3cret --stock books.csv ops.csv
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Books CSV to load before the script runs
    ///
    /// Expected format: title,author,content,edition,pages
    #[arg(long, value_name = "FILE")]
    stock: Option<PathBuf>,

    /// Location-based factor applied to each book's page count
    #[arg(long, env = "VENDING_PRICING_FACTOR", default_value = "1")]
    pricing_factor: Decimal,

    /// Operator secret for restocking and emptying the vault
    #[arg(long, env = "VENDING_CREDENTIAL", hide_env_values = true)]
    credential: String,
}

fn main() {
    init_tracing();
    let args = Args::parse();

    let machine = match Machine::new(args.pricing_factor, args.credential.as_str()) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("Error creating machine: {}", e);
            process::exit(1);
        }
    };
    info!(pricing_factor = %machine.pricing_factor(), "machine ready");

    if let Some(stock) = &args.stock {
        if let Err(e) = restock_from(&machine, &args.credential, stock) {
            eprintln!("Error loading stock '{}': {}", stock.display(), e);
            process::exit(1);
        }
        info!(books = machine.len(), "stock loaded");
    }

    let file = match File::open(&args.script) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.script.display(), e);
            process::exit(1);
        }
    };

    if let Err(e) = run_script(
        &machine,
        &args.credential,
        BufReader::new(file),
        std::io::stdout(),
    ) {
        eprintln!("Error running script: {}", e);
        process::exit(1);
    }

    let status = machine.status();
    info!(
        books = status.books,
        deposited = status.deposited,
        vault = status.vault,
        "script finished"
    );
}

/// Initializes stderr logging, configurable via `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Failure of a single script operation.
#[derive(Error, Debug)]
enum ScriptError {
    #[error(transparent)]
    Vending(#[from] VendingError),

    #[error("cannot read stock: {0}")]
    Stock(#[from] csv::Error),
}

/// Raw CSV record matching the stock format.
///
/// Fields: `title, author, content, edition, pages`
#[derive(Debug, Deserialize)]
struct StockRecord {
    title: String,
    author: String,
    #[serde(default)]
    content: String,
    edition: u32,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pages: Option<u32>,
}

impl StockRecord {
    /// Derives the page count from the content when `pages` is empty.
    fn into_book(self) -> Book {
        match self.pages {
            Some(pages) => Book::with_pages(self.title, self.author, self.content, self.edition, pages),
            None => Book::new(self.title, self.author, self.content, self.edition),
        }
    }
}

/// Read books from a stock CSV reader, skipping malformed rows.
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn load_books<R: Read>(reader: R) -> Result<Vec<Book>, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut books = Vec::new();
    for result in rdr.deserialize::<StockRecord>() {
        match result {
            Ok(record) => books.push(record.into_book()),
            Err(e) => warn!(error = %e, "skipping malformed stock row"),
        }
    }
    Ok(books)
}

fn restock_from(machine: &Machine, credential: &str, path: &Path) -> Result<(), ScriptError> {
    let file = File::open(path).map_err(csv::Error::from)?;
    let books = load_books(BufReader::new(file))?;
    machine.restock(books, credential)?;
    Ok(())
}

/// Raw CSV record matching the script format.
///
/// Fields: `op, arg`
#[derive(Debug, Deserialize)]
struct ScriptRecord {
    op: String,
    #[serde(default)]
    arg: String,
}

/// A parsed script operation.
#[derive(Clone, PartialEq, Eq)]
enum Operation {
    Coin(u64),
    Cancel,
    Price(i64),
    Buy(i64),
    Catalogue,
    Restock(PathBuf),
    Withdraw(String),
}

/// Placeholder written in place of a supplied credential.
const REDACTED: &str = "***";

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coin(amount) => f.debug_tuple("Coin").field(amount).finish(),
            Self::Cancel => f.write_str("Cancel"),
            Self::Price(index) => f.debug_tuple("Price").field(index).finish(),
            Self::Buy(index) => f.debug_tuple("Buy").field(index).finish(),
            Self::Catalogue => f.write_str("Catalogue"),
            Self::Restock(path) => f.debug_tuple("Restock").field(path).finish(),
            Self::Withdraw(_) => f.debug_tuple("Withdraw").field(&REDACTED).finish(),
        }
    }
}

impl ScriptRecord {
    /// Argument as written to the report and logs; credentials are masked.
    fn public_arg(&self) -> &str {
        if self.op.eq_ignore_ascii_case("withdraw") {
            REDACTED
        } else {
            &self.arg
        }
    }

    /// Converts a script record to an operation.
    ///
    /// Returns `None` for unknown ops or unparsable arguments.
    fn to_operation(&self) -> Option<Operation> {
        match self.op.to_lowercase().as_str() {
            "coin" => self.arg.parse().ok().map(Operation::Coin),
            "cancel" => Some(Operation::Cancel),
            "price" => self.arg.parse().ok().map(Operation::Price),
            "buy" => self.arg.parse().ok().map(Operation::Buy),
            "catalogue" | "catalog" => Some(Operation::Catalogue),
            "restock" if !self.arg.is_empty() => Some(Operation::Restock(PathBuf::from(&self.arg))),
            "withdraw" => Some(Operation::Withdraw(self.arg.clone())),
            _ => None,
        }
    }
}

/// One line of the report written to stdout.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    op: &'a str,
    arg: &'a str,
    outcome: String,
    deposited: u64,
    vault: u64,
}

/// Maps a possibly negative script index onto the shelf.
fn shelf_index(machine: &Machine, index: i64) -> Result<usize, VendingError> {
    usize::try_from(index).map_err(|_| VendingError::IndexOutOfRange {
        index,
        len: machine.len(),
    })
}

/// Applies one operation, returning its outcome for the report.
fn apply(machine: &Machine, credential: &str, operation: &Operation) -> Result<String, ScriptError> {
    let outcome = match operation {
        Operation::Coin(amount) => {
            machine.insert_coin(*amount)?;
            "ok".to_string()
        }
        Operation::Cancel => machine.cancel().to_string(),
        Operation::Price(index) => machine.price_of(shelf_index(machine, *index)?)?.to_string(),
        Operation::Buy(index) => {
            let book = machine.purchase(shelf_index(machine, *index)?)?;
            book.title().to_string()
        }
        Operation::Catalogue => machine.catalogue().join("; "),
        Operation::Restock(path) => {
            restock_from(machine, credential, path)?;
            "ok".to_string()
        }
        Operation::Withdraw(supplied) => machine.withdraw(supplied)?.to_string(),
    };
    Ok(outcome)
}

/// Run a script of operations against a machine.
///
/// Malformed rows and unknown ops are skipped. Rejected operations are
/// reported with their error message and do not stop the script.
///
/// # CSV Format
///
/// Expected columns: `op, arg`
/// - `coin <amount>`: insert a coin
/// - `cancel`: return the deposited coins
/// - `price <index>`: price of a shelved book
/// - `buy <index>`: buy a shelved book
/// - `catalogue`: list the shelf
/// - `restock <path>`: load a stock CSV using the configured credential
/// - `withdraw <credential>`: empty the vault
///
/// # Example
///
/// ```csv
/// op,arg
/// coin,20
/// buy,0
/// cancel,
/// ```
///
/// # Errors
///
/// Returns a CSV error if reading the script or writing the report fails.
pub fn run_script<R: Read, W: Write>(
    machine: &Machine,
    credential: &str,
    reader: R,
    writer: W,
) -> Result<(), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);
    let mut wtr = Writer::from_writer(writer);

    for result in rdr.deserialize::<ScriptRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "skipping malformed row");
                continue;
            }
        };
        let Some(operation) = record.to_operation() else {
            warn!(op = %record.op, arg = %record.public_arg(), "skipping invalid operation");
            continue;
        };

        let outcome = match apply(machine, credential, &operation) {
            Ok(outcome) => {
                debug!(?operation, %outcome, "operation applied");
                outcome
            }
            Err(e) => {
                warn!(?operation, error = %e, "operation rejected");
                e.to_string()
            }
        };

        let status = machine.status();
        wtr.serialize(ReportRow {
            op: &record.op,
            arg: record.public_arg(),
            outcome,
            deposited: status.deposited,
            vault: status.vault,
        })?;
    }

    wtr.flush()?;
    Ok(())
}
