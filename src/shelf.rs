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

//! Ordered, index-addressed book inventory.
//!
//! Insertion order is catalogue order. Removing a book shifts every later
//! book down by one so valid indices are always `0..len`.

use crate::VendingError;
use crate::book::Book;

/// The machine's shelf of unsold books.
#[derive(Debug, Default, Clone)]
pub struct Shelf {
    books: Vec<Book>,
}

impl Shelf {
    /// Creates an empty shelf.
    pub fn new() -> Self {
        Self { books: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Returns the book at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`VendingError::IndexOutOfRange`] unless `index < len`.
    pub fn get(&self, index: usize) -> Result<&Book, VendingError> {
        self.books.get(index).ok_or_else(|| self.out_of_range(index))
    }

    /// Removes and returns the book at `index`, closing the gap.
    ///
    /// # Errors
    ///
    /// Returns [`VendingError::IndexOutOfRange`] unless `index < len`.
    pub fn remove(&mut self, index: usize) -> Result<Book, VendingError> {
        if index >= self.books.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.books.remove(index))
    }

    /// Appends books to the end, keeping their order.
    pub fn extend(&mut self, books: impl IntoIterator<Item = Book>) {
        self.books.extend(books);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Book> {
        self.books.iter()
    }

    fn out_of_range(&self, index: usize) -> VendingError {
        VendingError::IndexOutOfRange {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            len: self.books.len(),
        }
    }
}
