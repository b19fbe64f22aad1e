//! RPC status code to severity mapping
//!
//! Used by RPC interceptors to decide how loudly an outcome is logged.
//! Client-side problems (bad arguments, missing entities, auth) are warnings;
//! server-side faults are errors.

use std::fmt;

use crate::severity::Severity;

/// gRPC status codes with their wire values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Code {
    Ok = 0,
    Canceled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl Code {
    pub const ALL: [Code; 17] = [
        Code::Ok,
        Code::Canceled,
        Code::Unknown,
        Code::InvalidArgument,
        Code::DeadlineExceeded,
        Code::NotFound,
        Code::AlreadyExists,
        Code::PermissionDenied,
        Code::ResourceExhausted,
        Code::FailedPrecondition,
        Code::Aborted,
        Code::OutOfRange,
        Code::Unimplemented,
        Code::Internal,
        Code::Unavailable,
        Code::DataLoss,
        Code::Unauthenticated,
    ];

    /// Returns `None` for values outside the known set
    pub fn from_i32(value: i32) -> Option<Code> {
        Code::ALL.iter().copied().find(|code| *code as i32 == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Ok => "OK",
            Code::Canceled => "Canceled",
            Code::Unknown => "Unknown",
            Code::InvalidArgument => "InvalidArgument",
            Code::DeadlineExceeded => "DeadlineExceeded",
            Code::NotFound => "NotFound",
            Code::AlreadyExists => "AlreadyExists",
            Code::PermissionDenied => "PermissionDenied",
            Code::ResourceExhausted => "ResourceExhausted",
            Code::FailedPrecondition => "FailedPrecondition",
            Code::Aborted => "Aborted",
            Code::OutOfRange => "OutOfRange",
            Code::Unimplemented => "Unimplemented",
            Code::Internal => "Internal",
            Code::Unavailable => "Unavailable",
            Code::DataLoss => "DataLoss",
            Code::Unauthenticated => "Unauthenticated",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "grpc")]
impl From<tonic::Code> for Code {
    fn from(code: tonic::Code) -> Self {
        // tonic folds unknown wire values into Unknown, so every value maps
        Code::from_i32(code as i32).unwrap_or(Code::Unknown)
    }
}

pub fn severity_for(code: Code) -> Severity {
    match code {
        Code::Ok => Severity::Info,
        Code::Canceled => Severity::Warn,
        Code::Unknown => Severity::Error,
        Code::InvalidArgument => Severity::Warn,
        Code::DeadlineExceeded => Severity::Warn,
        Code::NotFound => Severity::Warn,
        Code::AlreadyExists => Severity::Warn,
        Code::PermissionDenied => Severity::Warn,
        Code::Unauthenticated => Severity::Warn,
        Code::ResourceExhausted => Severity::Warn,
        Code::FailedPrecondition => Severity::Warn,
        Code::Aborted => Severity::Warn,
        Code::OutOfRange => Severity::Warn,
        Code::Unimplemented => Severity::Error,
        Code::Internal => Severity::Error,
        Code::Unavailable => Severity::Warn,
        Code::DataLoss => Severity::Error,
    }
}

/// Maps a raw wire value, treating anything unrecognized as an error
pub fn severity_for_raw(value: i32) -> Severity {
    Code::from_i32(value).map_or(Severity::Error, severity_for)
}
