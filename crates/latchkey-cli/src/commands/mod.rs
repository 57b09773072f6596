//! Subcommand implementations.

pub(crate) mod inspect;
pub(crate) mod issue;
pub(crate) mod keygen;
pub(crate) mod prepare;
pub(crate) mod verify;
