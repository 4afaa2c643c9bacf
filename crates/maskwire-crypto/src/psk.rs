//! Pre-shared keys and their caller-owned lookup set

use std::collections::HashMap;

use zeroize::Zeroizing;

use crate::trits::Trit;

/// Pre-shared key identifier size in trits (27 trytes).
pub const PSK_ID_TRITS: usize = 81;

/// Pre-shared key secret size in trits (81 trytes).
pub const PSK_KEY_TRITS: usize = 243;

/// A pre-shared key: public identifier plus secret value.
///
/// The secret is wiped when the key is dropped.
#[derive(Clone)]
pub struct Psk {
    id: [Trit; PSK_ID_TRITS],
    secret: Zeroizing<[Trit; PSK_KEY_TRITS]>,
}

impl Psk {
    /// Build a key from identifier and secret slices.
    ///
    /// Returns `None` if either slice has the wrong length.
    pub fn from_parts(id: &[Trit], secret: &[Trit]) -> Option<Self> {
        let id: [Trit; PSK_ID_TRITS] = id.try_into().ok()?;
        let secret: [Trit; PSK_KEY_TRITS] = secret.try_into().ok()?;
        Some(Self { id, secret: Zeroizing::new(secret) })
    }

    /// Public identifier written to the wire.
    pub fn id(&self) -> &[Trit] {
        &self.id
    }

    /// Secret value; mixed into the transcript, never written.
    pub fn secret(&self) -> &[Trit] {
        self.secret.as_slice()
    }
}

/// Caller-owned set of pre-shared keys, looked up by identifier.
///
/// Read-only during wrap/unwrap; identifiers are unique, iteration order is
/// not specified.
#[derive(Default)]
pub struct PskSet {
    entries: HashMap<[Trit; PSK_ID_TRITS], Psk>,
}

impl PskSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, replacing any previous entry with the same identifier.
    pub fn insert(&mut self, psk: Psk) {
        self.entries.insert(psk.id, psk);
    }

    /// Look up a key by identifier.
    pub fn get(&self, id: &[Trit]) -> Option<&Psk> {
        let id: [Trit; PSK_ID_TRITS] = id.try_into().ok()?;
        self.entries.get(&id)
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the keys in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Psk> {
        self.entries.values()
    }
}
