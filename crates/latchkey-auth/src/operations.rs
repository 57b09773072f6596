//! Operation deny-list carried in the `disops` caveat.
//!
//! Tokens allow every operation unless the issuer disabled some of them.
//! The list is written once; attenuating it further requires a new token.

use latchkey_crypto::Macaroon;
use tracing::debug;

use crate::dictionary::{CaveatDictionary, Field, Fields};
use crate::error::{AuthError, AuthResult};

const SEPARATOR: char = ',';

/// Return a copy of `macaroon` that forbids `operations`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidOperation`] for an empty name or one
/// containing `,`, and [`AuthError::FieldExists`] if the macaroon already
/// carries a deny-list.
pub fn disable_operations<S: AsRef<str>>(
    macaroon: &Macaroon,
    operations: &[S],
) -> AuthResult<Macaroon> {
    for op in operations {
        let op = op.as_ref();
        if op.is_empty() || op.contains(SEPARATOR) {
            return Err(AuthError::InvalidOperation(op.to_owned()));
        }
    }
    let joined = operations
        .iter()
        .map(|op| op.as_ref())
        .collect::<Vec<&str>>()
        .join(",");

    let mut restricted = macaroon.clone();
    CaveatDictionary::open(&mut restricted)?.put(Field::DisabledOperations, &joined)?;
    Ok(restricted)
}

/// Whether `macaroon` permits `operation`.
///
/// Allowed when no deny-list is present. A macaroon whose caveats do not
/// parse permits nothing.
#[must_use]
pub fn is_operation_allowed(macaroon: &Macaroon, operation: &str) -> bool {
    match Fields::parse(macaroon) {
        Ok(fields) => allowed_by(&fields, operation),
        Err(e) => {
            debug!(error = %e, "denying operation on unparsable caveats");
            false
        },
    }
}

/// Operations forbidden by the deny-list, in issue order.
///
/// # Errors
///
/// Same as [`Fields::parse`].
pub fn disabled_operations(macaroon: &Macaroon) -> AuthResult<Vec<String>> {
    let fields = Fields::parse(macaroon)?;
    Ok(split(&fields).map(str::to_owned).collect())
}

pub(crate) fn allowed_by(fields: &Fields, operation: &str) -> bool {
    !split(fields).any(|op| op == operation)
}

fn split(fields: &Fields) -> impl Iterator<Item = &str> {
    fields
        .get(Field::DisabledOperations)
        .unwrap_or_default()
        .split(SEPARATOR)
        .filter(|op| !op.is_empty())
}
