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

//! Books sold by the machine.
//!
//! A [`Book`] is immutable once created. It lives on the machine's shelf
//! until a purchase hands it to the buyer:
//!
//! - `OnShelf` → `Sold` (via [`Machine::purchase`](crate::Machine::purchase))
//!
//! There is no way back onto the shelf for a sold copy other than a new restock.

use std::fmt;

/// A book in the vending machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    title: String,
    author: String,
    content: String,
    edition: u32,
    pages: u32,
}

impl Book {
    /// Characters of content that fit on one printed page.
    pub const CHARS_PER_PAGE: usize = 1800;

    /// Creates a book whose page count is derived from its content.
    ///
    /// Every book has at least one page, even with empty content.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
        edition: u32,
    ) -> Self {
        let content = content.into();
        let pages = Self::pages_for(&content);
        Self {
            title: title.into(),
            author: author.into(),
            content,
            edition,
            pages,
        }
    }

    /// Creates a book with an explicit page count.
    pub fn with_pages(
        title: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
        edition: u32,
        pages: u32,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            content: content.into(),
            edition,
            pages,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn edition(&self) -> u32 {
        self.edition
    }

    /// Page count used for pricing.
    pub fn pages(&self) -> u32 {
        self.pages
    }

    fn pages_for(content: &str) -> u32 {
        let chars = content.chars().count();
        let pages = chars.div_ceil(Self::CHARS_PER_PAGE).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {}, edition {}, {} pages",
            self.title, self.author, self.edition, self.pages
        )
    }
}
