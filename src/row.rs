//! Fixed-width binary layout of a table row.
use std::borrow::Cow;
use std::fmt;

use crate::error::RowError;
use crate::{
    COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ID_SIZE,
    USERNAME_OFFSET, USERNAME_SIZE,
};

/// A single record: `(id, username, email)`.
///
/// Text columns are kept as their raw on-disk bytes, NUL padded, so a row read
/// back from a page compares equal to the row that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: u32,
    username: [u8; USERNAME_SIZE],
    email: [u8; EMAIL_SIZE],
}

impl Row {
    pub fn new(id: u32, username: &str, email: &str) -> Result<Self, RowError> {
        Ok(Self {
            id,
            username: to_fixed_bytes("username", username, COLUMN_USERNAME_SIZE)?,
            email: to_fixed_bytes("email", email, COLUMN_EMAIL_SIZE)?,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn username(&self) -> Cow<'_, str> {
        until_nul(&self.username)
    }

    pub fn email(&self) -> Cow<'_, str> {
        until_nul(&self.email)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username(), self.email())
    }
}

fn to_fixed_bytes<const N: usize>(
    field: &'static str,
    input: &str,
    max: usize,
) -> Result<[u8; N], RowError> {
    let bytes = input.as_bytes();
    // NUL terminates the column on disk.
    if let Some(position) = bytes.iter().position(|&b| b == 0) {
        return Err(RowError::InteriorNul { field, position });
    }
    if bytes.len() > max {
        return Err(RowError::StringTooLong {
            field,
            max,
            actual: bytes.len(),
        });
    }
    let mut buffer = [0u8; N];
    buffer[..bytes.len()].copy_from_slice(bytes);
    Ok(buffer)
}

fn until_nul(bytes: &[u8]) -> Cow<'_, str> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end])
}

/// Writes `row` into `destination` starting at `offset`.
///
/// The caller guarantees `destination` holds at least `ROW_SIZE` bytes from
/// `offset`.
pub fn serialize_row(row: &Row, destination: &mut [u8], offset: usize) {
    let id_at = offset + ID_OFFSET;
    let username_at = offset + USERNAME_OFFSET;
    let email_at = offset + EMAIL_OFFSET;

    destination[id_at..id_at + ID_SIZE].copy_from_slice(&row.id.to_le_bytes());
    destination[username_at..username_at + USERNAME_SIZE].copy_from_slice(&row.username);
    destination[email_at..email_at + EMAIL_SIZE].copy_from_slice(&row.email);
}

/// Reads the row stored in `source` at `offset`, copying every byte verbatim.
pub fn deserialize_row(source: &[u8], offset: usize) -> Row {
    let id_at = offset + ID_OFFSET;
    let username_at = offset + USERNAME_OFFSET;
    let email_at = offset + EMAIL_OFFSET;

    let mut id = [0u8; ID_SIZE];
    id.copy_from_slice(&source[id_at..id_at + ID_SIZE]);

    let mut username = [0u8; USERNAME_SIZE];
    username.copy_from_slice(&source[username_at..username_at + USERNAME_SIZE]);

    let mut email = [0u8; EMAIL_SIZE];
    email.copy_from_slice(&source[email_at..email_at + EMAIL_SIZE]);

    Row {
        id: u32::from_le_bytes(id),
        username,
        email,
    }
}
