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

//! # Book Vending
//!
//! This library models a coin-operated book vending machine: coins go into a
//! cassette, books are priced from their page count and a location-based
//! pricing factor, and completed sales move money into a vault that only the
//! operator can empty.
//!
//! ## Core Components
//!
//! - [`Machine`]: The state holder owning the shelf, cassette and vault
//! - [`Book`]: An immutable book, priced by its page count
//! - [`Coin`]: One of the accepted denominations
//! - [`VendingError`]: Error types for rejected operations
//!
//! ## Example
//!
//! ```
//! use book_vending_rs::{Book, Machine, VendingError};
//! use rust_decimal_macros::dec;
//!
//! let machine = Machine::new(dec!(1.5), "s3cret").unwrap();
//!
//! // Only the operator can restock
//! let books = vec![Book::with_pages("Dune", "Frank Herbert", "", 1, 10)];
//! assert_eq!(machine.restock(books.clone(), "guess"), Err(VendingError::Unauthorized));
//! machine.restock(books, "s3cret").unwrap();
//!
//! // Buy a book for 15
//! machine.insert_coin(10).unwrap();
//! machine.insert_coin(5).unwrap();
//! let book = machine.purchase(0).unwrap();
//! assert_eq!(book.title(), "Dune");
//! assert!(machine.catalogue().is_empty());
//!
//! // Operator collects the takings
//! assert_eq!(machine.withdraw("s3cret"), Ok(15));
//! ```
//!
//! ## Thread Safety
//!
//! A [`Machine`] keeps all mutable state behind one lock, so it can be shared
//! behind an `Arc` and every operation is applied as a single atomic step.

mod base;
pub mod book;
pub mod error;
pub mod machine;
mod shelf;

pub use base::{Coin, Credential, PricingFactor};
pub use book::Book;
pub use error::VendingError;
pub use machine::{Machine, Status};
