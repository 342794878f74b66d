//! Basic type definitions for the relay
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based unique connection identifier
//! - `RoomCode`: 6-character `[A-Z0-9]` room code

use rand::Rng;
use uuid::Uuid;

/// Number of symbols in a room code
pub const CODE_LEN: usize = 6;

/// Symbols a room code is drawn from
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Unique connection identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe client identification.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room code (6-character uppercase alphanumeric)
///
/// Generated randomly on room creation or normalized from user input.
/// Lookups are case-insensitive because every constructor uppercases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Draw a random code: 6 independent, uniform picks from `[A-Z0-9]`
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..CODE_LEN)
            .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
            .collect();
        Self(code)
    }

    /// Draw codes until one is not taken
    ///
    /// The codespace is 36^6, so under realistic load this almost always
    /// returns on the first draw. No retry cap.
    pub fn generate_unique(is_taken: impl Fn(&RoomCode) -> bool) -> Self {
        loop {
            let code = Self::generate();
            if !is_taken(&code) {
                return code;
            }
        }
    }

    /// Normalize user input into a RoomCode (trims and uppercases)
    ///
    /// No shape validation happens here: a malformed code simply never
    /// matches a registered room.
    pub fn from_string(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// True if this code has the shape of a generated code
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == CODE_LEN && self.0.bytes().all(|b| CODE_ALPHABET.contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
