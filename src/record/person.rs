//! Person record
//!
//! Keyed by the patient UUID string. The key hash is the CRC32 of the UUID
//! bytes, which stays stable across processes and platforms.

use bytes::{Buf, BufMut};

use crate::error::{LinHashError, Result};

use super::fixed::{fixed_string_size, get_fixed_string, put_fixed_string, truncate_units};
use super::{check_len, Hashable, Record};

/// A patient with references to their PCR tests
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    /// Birth date (unix millis)
    pub birth_millis: i64,
    /// Identity key, stored as it is encoded (at most `MAX_UUID_CHARS` UTF-16 units)
    uuid: String,
    /// Codes of the patient's PCR tests, at most `MAX_TESTS`
    tests: Vec<i32>,
}

impl Person {
    pub const MAX_FIRST_NAME_CHARS: usize = 15;
    pub const MAX_LAST_NAME_CHARS: usize = 14;
    pub const MAX_UUID_CHARS: usize = 10;
    pub const MAX_TESTS: usize = 6;

    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birth_millis: i64,
        uuid: impl Into<String>,
    ) -> Self {
        let uuid: String = uuid.into();
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_millis,
            uuid: truncate_units(&uuid, Self::MAX_UUID_CHARS),
            tests: Vec::new(),
        }
    }

    /// A key-only value for lookups
    pub fn with_uuid(uuid: impl Into<String>) -> Self {
        Self::new("", "", 0, uuid)
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn tests(&self) -> &[i32] {
        &self.tests
    }

    /// Attach a test code; false once all slots are taken
    pub fn add_test(&mut self, code: i32) -> bool {
        if self.tests.len() >= Self::MAX_TESTS {
            return false;
        }
        self.tests.push(code);
        true
    }

    pub fn remove_test(&mut self, code: i32) -> bool {
        match self.tests.iter().position(|&c| c == code) {
            Some(pos) => {
                self.tests.remove(pos);
                true
            }
            None => false,
        }
    }
}

impl Record for Person {
    const SIZE: usize = fixed_string_size(Self::MAX_FIRST_NAME_CHARS)
        + fixed_string_size(Self::MAX_LAST_NAME_CHARS)
        + 8
        + fixed_string_size(Self::MAX_UUID_CHARS)
        + 4
        + 4 * Self::MAX_TESTS;

    fn encode<B: BufMut>(&self, out: &mut B) {
        put_fixed_string(out, &self.first_name, Self::MAX_FIRST_NAME_CHARS);
        put_fixed_string(out, &self.last_name, Self::MAX_LAST_NAME_CHARS);
        out.put_i64(self.birth_millis);
        put_fixed_string(out, &self.uuid, Self::MAX_UUID_CHARS);

        out.put_i32(self.tests.len() as i32);
        for slot in 0..Self::MAX_TESTS {
            out.put_i32(self.tests.get(slot).copied().unwrap_or(0));
        }
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        check_len::<Self>(buf)?;
        let mut buf = buf;

        let first_name = get_fixed_string(&mut buf, Self::MAX_FIRST_NAME_CHARS)?;
        let last_name = get_fixed_string(&mut buf, Self::MAX_LAST_NAME_CHARS)?;
        let birth_millis = buf.get_i64();
        let uuid = get_fixed_string(&mut buf, Self::MAX_UUID_CHARS)?;

        let count = buf.get_i32();
        if count < 0 || count as usize > Self::MAX_TESTS {
            return Err(LinHashError::Decode(format!(
                "person test count {} outside 0..={}",
                count,
                Self::MAX_TESTS
            )));
        }
        let slots: Vec<i32> = (0..Self::MAX_TESTS).map(|_| buf.get_i32()).collect();

        Ok(Self {
            first_name,
            last_name,
            birth_millis,
            uuid,
            tests: slots[..count as usize].to_vec(),
        })
    }

    fn is_equal(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Hashable for Person {
    fn key_hash(&self) -> i64 {
        i64::from(crc32fast::hash(self.uuid.as_bytes()))
    }
}
