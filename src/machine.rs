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

//! The vending machine state holder.
//!
//! Coins accumulate in the cassette until a purchase moves the book's price
//! into the safe (the vault) or a cancel hands them back.
//!
//! # Example
//!
//! ```
//! use book_vending_rs::{Book, Machine};
//! use rust_decimal_macros::dec;
//!
//! let machine = Machine::new(dec!(1.5), "s3cret").unwrap();
//! machine
//!     .restock(vec![Book::with_pages("Dune", "Frank Herbert", "", 1, 10)], "s3cret")
//!     .unwrap();
//!
//! machine.insert_coin(20).unwrap();
//! assert_eq!(machine.price_of(0), Ok(15));
//!
//! let book = machine.purchase(0).unwrap();
//! assert_eq!(book.title(), "Dune");
//! assert_eq!(machine.deposited(), 5);
//! assert_eq!(machine.vault(), 15);
//! ```

use crate::VendingError;
use crate::base::{Coin, Credential, PricingFactor};
use crate::book::Book;
use crate::shelf::Shelf;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

//  insert_coin ──► cassette ──purchase──► vault ──withdraw──► operator
//                     │
//                     └──cancel──► buyer
#[derive(Debug)]
struct MachineData {
    shelf: Shelf,
    /// Funds inserted for the current transaction.
    cassette: u64,
    /// Proceeds of completed sales.
    safe: u64,
}

impl MachineData {
    fn new() -> Self {
        Self {
            shelf: Shelf::new(),
            cassette: 0,
            safe: 0,
        }
    }

    fn assert_invariants(&self, pricing: PricingFactor) {
        debug_assert!(
            self.shelf.iter().all(|book| pricing.price(book.pages()).is_ok()),
            "Invariant violated: shelved book has an unrepresentable price"
        );
    }

    /// Adds a validated coin to the cassette.
    fn deposit(&mut self, coin: Coin) -> Result<(), VendingError> {
        self.cassette = self
            .cassette
            .checked_add(coin.value())
            .ok_or(VendingError::AmountOverflow)?;
        Ok(())
    }

    /// Empties the cassette, returning what it held.
    fn refund(&mut self) -> u64 {
        std::mem::take(&mut self.cassette)
    }

    /// Empties the safe, returning what it held.
    fn empty_safe(&mut self) -> u64 {
        std::mem::take(&mut self.safe)
    }

    /// Moves `price` from the cassette to the safe and hands over the book.
    ///
    /// Every check runs before the first mutation.
    fn sell(&mut self, index: usize, pricing: PricingFactor) -> Result<Book, VendingError> {
        let price = pricing.price(self.shelf.get(index)?.pages())?;
        if self.cassette < price {
            return Err(VendingError::InsufficientFunds {
                price,
                deposited: self.cassette,
            });
        }
        let safe = self
            .safe
            .checked_add(price)
            .ok_or(VendingError::AmountOverflow)?;

        let book = self.shelf.remove(index)?;
        self.cassette -= price;
        self.safe = safe;
        self.assert_invariants(pricing);
        Ok(book)
    }
}

/// Coin-operated book vending machine.
///
/// Pricing factor and credential are fixed at construction. All state lives
/// behind a single lock, so a shared machine observes every operation as one
/// atomic step.
#[derive(Debug)]
pub struct Machine {
    pricing: PricingFactor,
    credential: Credential,
    inner: Mutex<MachineData>,
}

impl Machine {
    /// Creates an empty machine.
    ///
    /// # Errors
    ///
    /// Returns [`VendingError::InvalidPricingFactor`] unless `pricing_factor > 0`.
    pub fn new(
        pricing_factor: Decimal,
        credential: impl Into<Credential>,
    ) -> Result<Self, VendingError> {
        Ok(Self {
            pricing: PricingFactor::new(pricing_factor)?,
            credential: credential.into(),
            inner: Mutex::new(MachineData::new()),
        })
    }

    /// Whether `amount` is an accepted coin denomination.
    pub fn accepts(amount: u64) -> bool {
        Coin::try_from(amount).is_ok()
    }

    pub fn pricing_factor(&self) -> Decimal {
        self.pricing.get()
    }

    /// Funds inserted for the current transaction.
    pub fn deposited(&self) -> u64 {
        self.inner.lock().cassette
    }

    /// Accumulated proceeds of completed sales.
    pub fn vault(&self) -> u64 {
        self.inner.lock().safe
    }

    /// Number of books on the shelf.
    pub fn len(&self) -> usize {
        self.inner.lock().shelf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().shelf.is_empty()
    }

    /// Inserts a coin.
    ///
    /// # Errors
    ///
    /// - [`VendingError::InvalidCoin`] - `amount` is not in [`Coin::ALL`].
    /// - [`VendingError::AmountOverflow`] - the cassette would overflow.
    pub fn insert_coin(&self, amount: u64) -> Result<(), VendingError> {
        let coin = Coin::try_from(amount)?;
        self.inner.lock().deposit(coin)
    }

    /// Cancels the current transaction and returns every deposited coin.
    pub fn cancel(&self) -> u64 {
        self.inner.lock().refund()
    }

    /// Appends `books` to the shelf in the given order.
    ///
    /// # Errors
    ///
    /// - [`VendingError::Unauthorized`] - wrong credential.
    /// - [`VendingError::AmountOverflow`] - a book's price would not fit the money type.
    pub fn restock(&self, books: Vec<Book>, credential: &str) -> Result<(), VendingError> {
        self.authorize(credential)?;
        for book in &books {
            self.pricing.price(book.pages())?;
        }

        let mut data = self.inner.lock();
        data.shelf.extend(books);
        data.assert_invariants(self.pricing);
        Ok(())
    }

    /// Empties the vault.
    ///
    /// # Errors
    ///
    /// Returns [`VendingError::Unauthorized`] on a wrong credential.
    pub fn withdraw(&self, credential: &str) -> Result<u64, VendingError> {
        self.authorize(credential)?;
        Ok(self.inner.lock().empty_safe())
    }

    /// Describes every shelved book in shelf order.
    pub fn catalogue(&self) -> Vec<String> {
        self.inner.lock().shelf.iter().map(Book::to_string).collect()
    }

    /// Returns `ceil(pages * pricing_factor)` for the book at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`VendingError::IndexOutOfRange`] unless `index < len`.
    pub fn price_of(&self, index: usize) -> Result<u64, VendingError> {
        let data = self.inner.lock();
        self.pricing.price(data.shelf.get(index)?.pages())
    }

    /// Buys the book at `index` with the deposited funds.
    ///
    /// On success the book leaves the shelf, its price moves from the
    /// deposited funds into the vault, and any change stays deposited.
    ///
    /// # Errors
    ///
    /// - [`VendingError::IndexOutOfRange`] - `index >= len` (checked first).
    /// - [`VendingError::InsufficientFunds`] - deposited funds below the price.
    pub fn purchase(&self, index: usize) -> Result<Book, VendingError> {
        self.inner.lock().sell(index, self.pricing)
    }

    /// Point-in-time snapshot of the machine, taken under one lock.
    pub fn status(&self) -> Status {
        let data = self.inner.lock();
        Status {
            books: data.shelf.len(),
            deposited: data.cassette,
            vault: data.safe,
        }
    }

    fn authorize(&self, credential: &str) -> Result<(), VendingError> {
        if self.credential.matches(credential) {
            Ok(())
        } else {
            Err(VendingError::Unauthorized)
        }
    }
}

/// Snapshot of a machine's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    pub books: usize,
    pub deposited: u64,
    pub vault: u64,
}

impl Serialize for Machine {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let status = self.status();
        let mut state = serializer.serialize_struct("Machine", 4)?;
        state.serialize_field("pricing_factor", &self.pricing)?;
        state.serialize_field("books", &status.books)?;
        state.serialize_field("deposited", &status.deposited)?;
        state.serialize_field("vault", &status.vault)?;
        state.end()
    }
}
