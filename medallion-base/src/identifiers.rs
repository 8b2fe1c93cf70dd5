// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core identifiers used by the Medallion registry.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An opaque participant identity, as supplied by the execution environment.
///
/// The registry never interprets the bytes; equality is the only operation it
/// relies on. The absence of an identity ("none" in the registry rules) is
/// expressed as `Option<AccountOwner>` rather than as a reserved value.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct AccountOwner([u8; 32]);

impl AccountOwner {
    /// Creates an identity from its raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        AccountOwner(bytes)
    }

    /// The raw bytes of the identity.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for AccountOwner {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountOwner {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // The first few bytes are enough to tell identities apart in logs.
        write!(f, "{}..", hex::encode(&self.0[..8]))
    }
}

impl FromStr for AccountOwner {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let bytes = <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| IdentifierError::InvalidLength(bytes.len()))?;
        Ok(AccountOwner(bytes))
    }
}

/// The number identifying an asset within the collection.
///
/// Valid assets are numbered starting from 1; the upper bound is the
/// collection's maximum supply.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct TokenId(pub u64);

impl Display for TokenId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Minimal decimal rendering, most significant digit first; 0 prints
        // as "0".
        Display::fmt(&self.0, f)
    }
}

impl FromStr for TokenId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TokenId(s.parse()?))
    }
}

impl From<u64> for TokenId {
    fn from(value: u64) -> Self {
        TokenId(value)
    }
}

/// Error when parsing an identifier from its textual form.
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// The hexadecimal form could not be decoded.
    #[error("Invalid hexadecimal identifier: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// The decoded identifier has the wrong number of bytes.
    #[error("Identifiers are 32 bytes long, found {0}")]
    InvalidLength(usize),
    /// The decimal form of an asset number could not be parsed.
    #[error("Invalid asset number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{AccountOwner, IdentifierError, TokenId};

    #[test]
    fn account_owner_text_round_trip() {
        let owner = AccountOwner::new([0x4f; 32]);
        let text = owner.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(AccountOwner::from_str(&text).unwrap(), owner);
    }

    #[test]
    fn account_owner_rejects_wrong_length() {
        assert!(matches!(
            AccountOwner::from_str("abcd"),
            Err(IdentifierError::InvalidLength(2))
        ));
        assert!(matches!(
            AccountOwner::from_str("zz"),
            Err(IdentifierError::InvalidHex(_))
        ));
    }

    #[test]
    fn token_id_renders_minimal_decimal() {
        assert_eq!(TokenId(0).to_string(), "0");
        assert_eq!(TokenId(7).to_string(), "7");
        assert_eq!(TokenId(1204).to_string(), "1204");
        assert_eq!(TokenId::from_str("1204").unwrap(), TokenId(1204));
    }

    #[test]
    fn token_id_serialization_is_stable() {
        let bytes = bcs::to_bytes(&TokenId(3)).unwrap();
        assert_eq!(bcs::from_bytes::<TokenId>(&bytes).unwrap(), TokenId(3));
    }
}
