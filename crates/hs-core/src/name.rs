use arrayvec::ArrayString;

use crate::{HsError, HsResult, MAX_NAME_LEN};

/// Bounded application name. Equality is exact over the whole name,
/// never a prefix match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppName(ArrayString<MAX_NAME_LEN>);

impl AppName {
    pub fn new(name: &str) -> HsResult<Self> {
        ArrayString::from(name)
            .map(Self)
            .map_err(|_| HsError::InvalidTable)
    }

    /// Decode a NUL-padded fixed-width field.
    pub fn from_padded(field: &[u8]) -> HsResult<Self> {
        let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        let text = core::str::from_utf8(&field[..len]).map_err(|_| HsError::WireFormatError)?;
        ArrayString::from(text)
            .map(Self)
            .map_err(|_| HsError::WireFormatError)
    }

    /// Write into a NUL-padded fixed-width field. `out` must hold MAX_NAME_LEN bytes.
    pub fn write_padded(&self, out: &mut [u8]) {
        out.fill(0);
        let bytes = self.0.as_bytes();
        out[..bytes.len()].copy_from_slice(bytes);
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for AppName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0.as_str())
    }
}
