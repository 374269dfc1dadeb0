//! UNIX-style permission bits for log files

use crate::errors::{Error, Result};
use std::fmt::{self, Display};
use std::path::Path;
use std::str::FromStr;

const READ: u8 = 4;
const WRITE: u8 = 2;
const EXECUTE: u8 = 1;

/// Permission bits applied to every log file the writer creates.
///
/// Decoded from the three-digit octal notation used by `chmod` ("640",
/// "600", ...). The first digit is the owner, then group, then other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilePermission {
    owner: u8,
    group: u8,
    other: u8,
}

impl FilePermission {
    /// Decode a three-digit octal mode string
    pub fn decode_unix_mode(mode: &str) -> Result<Self> {
        let digits: Vec<u8> = mode
            .chars()
            .map(|c| {
                c.to_digit(8)
                    .map(|d| d as u8)
                    .ok_or_else(|| Error::invalid_permission(mode, format!("'{c}' is not an octal digit")))
            })
            .collect::<Result<_>>()?;

        match digits.as_slice() {
            [owner, group, other] => Ok(Self {
                owner: *owner,
                group: *group,
                other: *other,
            }),
            _ => Err(Error::invalid_permission(
                mode,
                "expected exactly three octal digits",
            )),
        }
    }

    pub fn is_owner_readable(&self) -> bool {
        self.owner & READ != 0
    }

    pub fn is_owner_writable(&self) -> bool {
        self.owner & WRITE != 0
    }

    pub fn is_owner_executable(&self) -> bool {
        self.owner & EXECUTE != 0
    }

    /// The numeric mode, e.g. `0o640`
    pub fn mode(&self) -> u32 {
        (u32::from(self.owner) << 6) | (u32::from(self.group) << 3) | u32::from(self.other)
    }

    /// Apply these bits to an existing file. A no-op on platforms without
    /// UNIX permissions.
    pub fn apply(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(self.mode()))
                .map_err(|e| Error::file_system(path, "set permissions on", e))?;
        }
        #[cfg(not(unix))]
        {
            let _ = path;
        }
        Ok(())
    }
}

impl Default for FilePermission {
    fn default() -> Self {
        Self {
            owner: READ | WRITE,
            group: READ,
            other: 0,
        }
    }
}

impl Display for FilePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.owner, self.group, self.other)
    }
}

impl FromStr for FilePermission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode_unix_mode(s)
    }
}
