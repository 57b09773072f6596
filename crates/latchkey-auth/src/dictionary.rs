//! Caveats viewed as a write-once key/value dictionary.
//!
//! Every caveat is the text `key value`: the key is one of the reserved
//! [`Field`]s, the value is the rest of the caveat after the first space.
//! A key may appear at most once and is never overwritten. Anything that
//! does not parse back into exactly one key and one value is rejected.

use std::collections::BTreeMap;
use std::fmt;

use latchkey_crypto::{Caveat, Macaroon};

use crate::error::{AuthError, AuthResult};

/// Reserved caveat keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Decimal subject id the token was issued to.
    User,
    /// Client nonce for replay protection.
    Nonce,
    /// Comma-separated operations the token may not perform.
    DisabledOperations,
    /// Client timestamp in unix nanoseconds.
    Time,
}

impl Field {
    /// All reserved keys.
    pub const ALL: [Self; 4] = [Self::User, Self::Nonce, Self::DisabledOperations, Self::Time];

    /// Key as written in the caveat.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Nonce => "nonce",
            Self::DisabledOperations => "disops",
            Self::Time => "time",
        }
    }

    /// Look up a reserved key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed caveats of a macaroon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    values: BTreeMap<Field, String>,
}

impl Fields {
    /// Parse every caveat of `macaroon` without modifying it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RepeatedField`] if a key occurs twice and
    /// [`AuthError::MalformedCaveat`] for a caveat that is not `key value`
    /// with a reserved key.
    pub fn parse(macaroon: &Macaroon) -> AuthResult<Self> {
        let mut values = BTreeMap::new();
        for caveat in macaroon.caveats() {
            let (field, value) = parse_caveat(caveat)?;
            if values.insert(field, value.to_owned()).is_some() {
                return Err(AuthError::RepeatedField(field));
            }
        }
        Ok(Self { values })
    }

    /// Value of `field`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::FieldNotFound`] if absent.
    pub fn get(&self, field: Field) -> AuthResult<&str> {
        self.values
            .get(&field)
            .map(String::as_str)
            .ok_or(AuthError::FieldNotFound(field))
    }

    /// Whether `field` is present.
    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    /// Present fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// Number of present fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A macaroon opened for adding caveats by key.
///
/// Holds the macaroon mutably for its whole lifetime, so the parsed view
/// cannot drift from the caveats actually present.
#[derive(Debug)]
pub struct CaveatDictionary<'a> {
    macaroon: &'a mut Macaroon,
    fields: Fields,
}

impl<'a> CaveatDictionary<'a> {
    /// Parse the caveats of `macaroon` and open it for writing.
    ///
    /// # Errors
    ///
    /// Same as [`Fields::parse`].
    pub fn open(macaroon: &'a mut Macaroon) -> AuthResult<Self> {
        let fields = Fields::parse(macaroon)?;
        Ok(Self { macaroon, fields })
    }

    /// Append the caveat `field value`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::FieldExists`] if `field` is already present, or
    /// [`AuthError::Crypto`] if the macaroon cannot take another caveat.
    pub fn put(&mut self, field: Field, value: &str) -> AuthResult<()> {
        if self.fields.contains(field) {
            return Err(AuthError::FieldExists(field));
        }
        self.macaroon
            .add_first_party_caveat(format!("{} {value}", field.as_str()))?;
        self.fields.values.insert(field, value.to_owned());
        Ok(())
    }

    /// Value of `field`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::FieldNotFound`] if absent.
    pub fn get(&self, field: Field) -> AuthResult<&str> {
        self.fields.get(field)
    }

    /// The parsed view.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

fn parse_caveat(caveat: &Caveat) -> AuthResult<(Field, &str)> {
    let text = caveat
        .as_str()
        .ok_or_else(|| AuthError::MalformedCaveat("caveat is not UTF-8".into()))?;
    let (key, value) = text
        .split_once(' ')
        .ok_or_else(|| AuthError::MalformedCaveat(format!("caveat {text:?} has no value")))?;
    if key.is_empty() {
        return Err(AuthError::MalformedCaveat(format!(
            "caveat {text:?} has an empty key"
        )));
    }
    let field = Field::from_key(key)
        .ok_or_else(|| AuthError::MalformedCaveat(format!("unknown field {key:?}")))?;
    Ok((field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_crypto::RootKey;

    fn macaroon() -> (RootKey, Macaroon) {
        let key = RootKey::generate();
        let m = Macaroon::new(&key, vec![0, 0, 0, 7], "test").unwrap();
        (key, m)
    }

    #[test]
    fn test_put_then_get() {
        let (key, mut m) = macaroon();
        let mut dict = CaveatDictionary::open(&mut m).unwrap();
        dict.put(Field::Nonce, "42").unwrap();
        assert_eq!(dict.get(Field::Nonce).unwrap(), "42");

        assert_eq!(m.caveats().len(), 1);
        assert_eq!(m.caveats()[0].as_str(), Some("nonce 42"));
        m.verify(&key).unwrap();
    }

    #[test]
    fn test_put_existing_field_fails() {
        let (_, mut m) = macaroon();
        let mut dict = CaveatDictionary::open(&mut m).unwrap();
        dict.put(Field::User, "7").unwrap();
        assert!(matches!(
            dict.put(Field::User, "8"),
            Err(AuthError::FieldExists(Field::User))
        ));
        assert_eq!(dict.get(Field::User).unwrap(), "7");
        assert_eq!(m.caveats().len(), 1);
    }

    #[test]
    fn test_reopen_sees_existing_fields() {
        let (_, mut m) = macaroon();
        CaveatDictionary::open(&mut m)
            .unwrap()
            .put(Field::Time, "1")
            .unwrap();

        let mut dict = CaveatDictionary::open(&mut m).unwrap();
        assert!(matches!(
            dict.put(Field::Time, "2"),
            Err(AuthError::FieldExists(Field::Time))
        ));
    }

    #[test]
    fn test_get_missing_field() {
        let (_, mut m) = macaroon();
        let dict = CaveatDictionary::open(&mut m).unwrap();
        assert!(matches!(
            dict.get(Field::Nonce),
            Err(AuthError::FieldNotFound(Field::Nonce))
        ));
    }

    #[test]
    fn test_repeated_field_rejected() {
        let (_, mut m) = macaroon();
        m.add_first_party_caveat("nonce 1").unwrap();
        m.add_first_party_caveat("nonce 2").unwrap();

        assert!(matches!(
            Fields::parse(&m),
            Err(AuthError::RepeatedField(Field::Nonce))
        ));
        assert!(matches!(
            CaveatDictionary::open(&mut m),
            Err(AuthError::RepeatedField(Field::Nonce))
        ));
    }

    #[test]
    fn test_malformed_caveats_rejected() {
        let bad: [&[u8]; 4] = [b"nonce", b" 12", b"colour blue", &[0xff, b' ', b'1']];
        for caveat in bad {
            let (_, mut m) = macaroon();
            m.add_first_party_caveat(caveat).unwrap();
            assert!(
                matches!(Fields::parse(&m), Err(AuthError::MalformedCaveat(_))),
                "accepted {caveat:?}"
            );
        }
    }

    #[test]
    fn test_value_keeps_inner_spaces() {
        let (_, mut m) = macaroon();
        m.add_first_party_caveat("disops a b").unwrap();
        let fields = Fields::parse(&m).unwrap();
        assert_eq!(fields.get(Field::DisabledOperations).unwrap(), "a b");
    }

    #[test]
    fn test_empty_value_allowed() {
        let (_, mut m) = macaroon();
        CaveatDictionary::open(&mut m)
            .unwrap()
            .put(Field::DisabledOperations, "")
            .unwrap();
        let fields = Fields::parse(&m).unwrap();
        assert_eq!(fields.get(Field::DisabledOperations).unwrap(), "");
    }

    #[test]
    fn test_iter_in_key_order() {
        let (_, mut m) = macaroon();
        let mut dict = CaveatDictionary::open(&mut m).unwrap();
        dict.put(Field::Time, "5").unwrap();
        dict.put(Field::User, "7").unwrap();

        let keys: Vec<_> = dict.fields().iter().map(|(f, _)| f).collect();
        assert_eq!(keys, vec![Field::User, Field::Time]);
    }

    #[test]
    fn test_field_keys() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.as_str()), Some(field));
        }
        assert_eq!(Field::from_key("DISOPS"), None);
    }
}
