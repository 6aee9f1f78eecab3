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

//! Error types for vending machine operations.

use thiserror::Error;

/// Vending machine operation errors.
///
/// Every error leaves the machine exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VendingError {
    /// Amount is not one of the accepted coin denominations
    #[error("invalid coin: {0} is not an accepted denomination")]
    InvalidCoin(u64),

    /// Credential does not match the machine's secret
    #[error("unauthorized: credential does not match")]
    Unauthorized,

    /// Shelf index is outside `0..len`
    #[error("index {index} out of range for shelf of {len} books")]
    IndexOutOfRange { index: i64, len: usize },

    /// Deposited funds do not cover the book's price
    #[error("insufficient funds: price {price}, deposited {deposited}")]
    InsufficientFunds { price: u64, deposited: u64 },

    /// Pricing factor is zero or negative
    #[error("invalid pricing factor (must be positive)")]
    InvalidPricingFactor,

    /// A money counter or price does not fit the money type
    #[error("amount overflow")]
    AmountOverflow,
}

#[cfg(test)]
mod tests {
    use super::VendingError;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            VendingError::InvalidCoin(3).to_string(),
            "invalid coin: 3 is not an accepted denomination"
        );
        assert_eq!(
            VendingError::Unauthorized.to_string(),
            "unauthorized: credential does not match"
        );
        assert_eq!(
            VendingError::IndexOutOfRange { index: 2, len: 2 }.to_string(),
            "index 2 out of range for shelf of 2 books"
        );
        assert_eq!(
            VendingError::InsufficientFunds {
                price: 15,
                deposited: 10
            }
            .to_string(),
            "insufficient funds: price 15, deposited 10"
        );
        assert_eq!(
            VendingError::InvalidPricingFactor.to_string(),
            "invalid pricing factor (must be positive)"
        );
        assert_eq!(VendingError::AmountOverflow.to_string(), "amount overflow");
    }

    #[test]
    fn errors_are_cloneable() {
        let error = VendingError::Unauthorized;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
