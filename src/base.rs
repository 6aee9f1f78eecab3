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

//! Core value types: coins, credentials and the pricing factor.

use crate::VendingError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::fmt;

/// A coin accepted by the machine.
///
/// Wraps the coin's value in the smallest currency unit. Only the
/// denominations in [`Coin::ALL`] can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coin(u64);

impl Coin {
    /// Accepted denominations, ascending.
    pub const ALL: [u64; 8] = [1, 2, 5, 10, 20, 50, 100, 200];

    pub fn value(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Coin {
    type Error = VendingError;

    fn try_from(amount: u64) -> Result<Self, Self::Error> {
        if Self::ALL.contains(&amount) {
            Ok(Coin(amount))
        } else {
            Err(VendingError::InvalidCoin(amount))
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared secret that authorizes restocking and emptying the vault.
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Credential(secret.into())
    }

    /// Exact, case-sensitive comparison against a caller-supplied secret.
    pub fn matches(&self, supplied: &str) -> bool {
        self.0 == supplied
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl From<&str> for Credential {
    fn from(secret: &str) -> Self {
        Credential::new(secret)
    }
}

/// Location-based multiplier from page count to price.
///
/// Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PricingFactor(Decimal);

impl PricingFactor {
    pub fn new(factor: Decimal) -> Result<Self, VendingError> {
        if factor <= Decimal::ZERO {
            return Err(VendingError::InvalidPricingFactor);
        }
        Ok(PricingFactor(factor))
    }

    pub fn get(self) -> Decimal {
        self.0
    }

    /// Returns `ceil(pages * factor)`.
    ///
    /// # Errors
    ///
    /// [`VendingError::AmountOverflow`] if the product does not fit the money type.
    pub fn price(self, pages: u32) -> Result<u64, VendingError> {
        Decimal::from(pages)
            .checked_mul(self.0)
            .map(|raw| raw.ceil())
            .and_then(|price| price.to_u64())
            .ok_or(VendingError::AmountOverflow)
    }
}

impl TryFrom<Decimal> for PricingFactor {
    type Error = VendingError;

    fn try_from(factor: Decimal) -> Result<Self, Self::Error> {
        PricingFactor::new(factor)
    }
}

impl fmt::Display for PricingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
