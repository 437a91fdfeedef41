use std::fmt;

/// The numeric form a key takes when it is handed to the lock primitive.
///
/// PostgreSQL keeps the single-`bigint` and the two-`int` key spaces apart,
/// so `Single(1)` and `Pair(0, 1)` never contend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizedKey {
    Single(i64),
    Pair(i32, i32),
}

impl NormalizedKey {
    /// Number of arguments the primitive takes for this key.
    pub fn arity(&self) -> usize {
        match self {
            NormalizedKey::Single(_) => 1,
            NormalizedKey::Pair(_, _) => 2,
        }
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedKey::Single(id) => write!(f, "{}", id),
            NormalizedKey::Pair(a, b) => write!(f, "{}, {}", a, b),
        }
    }
}

/// Fold a string into the signed 32-bit range with CRC-32 (IEEE).
///
/// The low 31 bits are the magnitude and bit 31 the sign, which is exactly
/// the two's-complement reading of the checksum. Distinct strings may collide.
pub fn fold_text(text: &str) -> i32 {
    let checksum = crc32fast::hash(text.as_bytes());
    let magnitude = (checksum & 0x7FFF_FFFF) as i64;
    let folded = if checksum & 0x8000_0000 != 0 {
        magnitude - (1i64 << 31)
    } else {
        magnitude
    };
    folded as i32
}
