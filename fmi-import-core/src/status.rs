//! Status codes returned by native entry points.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::os::raw::c_int;

/// Raw status as it crosses the native boundary.
pub type RawStatus = c_int;

/// Status of a native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    Warning = 1,
    Discard = 2,
    Error = 3,
    Fatal = 4,
    Pending = 5,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Ok,
        Status::Warning,
        Status::Discard,
        Status::Error,
        Status::Fatal,
        Status::Pending,
    ];

    pub fn from_raw(raw: RawStatus) -> Option<Status> {
        match raw {
            0 => Some(Status::Ok),
            1 => Some(Status::Warning),
            2 => Some(Status::Discard),
            3 => Some(Status::Error),
            4 => Some(Status::Fatal),
            5 => Some(Status::Pending),
            _ => None,
        }
    }

    pub fn as_raw(self) -> RawStatus {
        self as RawStatus
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warning => "Warning",
            Status::Discard => "Discard",
            Status::Error => "Error",
            Status::Fatal => "Fatal",
            Status::Pending => "Pending",
        }
    }

    /// Statuses after which the lifecycle may advance.
    pub fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Warning)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a raw status, `"Undefined"` for values outside the known range.
pub fn status_name(raw: RawStatus) -> &'static str {
    Status::from_raw(raw).map(Status::as_str).unwrap_or("Undefined")
}
