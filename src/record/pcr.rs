//! PCR test record
//!
//! Keyed by the numeric test code.
//!
//! ## Layout (71 bytes)
//! ```text
//! date_millis: i64 | uuid: len i32 + 10 chars | code: i32 | positive: u8 |
//! value: f64 | note: len i32 + 11 chars
//! ```

use bytes::{Buf, BufMut};

use crate::error::Result;

use super::fixed::{fixed_string_size, get_bool, get_fixed_string, put_bool, put_fixed_string};
use super::{check_len, Hashable, Record};

/// A PCR test result
#[derive(Debug, Clone, PartialEq)]
pub struct PcrTest {
    /// Test date (unix millis)
    pub date_millis: i64,
    /// UUID of the tested patient
    pub patient_uuid: String,
    /// Unique test code (identity key)
    pub code: i32,
    pub positive: bool,
    pub value: f64,
    pub note: String,
}

impl PcrTest {
    pub const MAX_UUID_CHARS: usize = 10;
    pub const MAX_NOTE_CHARS: usize = 11;

    pub fn new(
        date_millis: i64,
        patient_uuid: impl Into<String>,
        code: i32,
        positive: bool,
        value: f64,
        note: impl Into<String>,
    ) -> Self {
        Self {
            date_millis,
            patient_uuid: patient_uuid.into(),
            code,
            positive,
            value,
            note: note.into(),
        }
    }

    /// A key-only value for lookups
    pub fn with_code(code: i32) -> Self {
        Self::new(0, "", code, false, 0.0, "")
    }
}

impl Record for PcrTest {
    const SIZE: usize = 8
        + fixed_string_size(Self::MAX_UUID_CHARS)
        + 4
        + 1
        + 8
        + fixed_string_size(Self::MAX_NOTE_CHARS);

    fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_i64(self.date_millis);
        put_fixed_string(out, &self.patient_uuid, Self::MAX_UUID_CHARS);
        out.put_i32(self.code);
        put_bool(out, self.positive);
        out.put_f64(self.value);
        put_fixed_string(out, &self.note, Self::MAX_NOTE_CHARS);
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        check_len::<Self>(buf)?;
        let mut buf = buf;

        let date_millis = buf.get_i64();
        let patient_uuid = get_fixed_string(&mut buf, Self::MAX_UUID_CHARS)?;
        let code = buf.get_i32();
        let positive = get_bool(&mut buf)?;
        let value = buf.get_f64();
        let note = get_fixed_string(&mut buf, Self::MAX_NOTE_CHARS)?;

        Ok(Self {
            date_millis,
            patient_uuid,
            code,
            positive,
            value,
            note,
        })
    }

    fn is_equal(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Hashable for PcrTest {
    fn key_hash(&self) -> i64 {
        i64::from(self.code)
    }
}
