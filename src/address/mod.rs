//! Italian postal-address record validation.

mod provinces;
mod validator;

pub use provinces::{province_name, PROVINCES};
pub use validator::{
    AddressField, AddressIssue, AddressRecord, AddressReport, ItalianAddressValidator,
    STREET_TYPES,
};
