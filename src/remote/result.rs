//! Result envelope returned by every remote call.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a remote call.
///
/// Everything that is not [`ResultCode::Ok`] is an expected failure
/// reported by the service, never a local error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    Ok,
    FormatError,
    Unauthorized,
    Forbidden,
    DoesNotExist,
    MethodNotAllowed,
    Conflict,
    ValidationError,
    UnexpectedError,
}

impl ResultCode {
    /// Map an HTTP status to a result code. Any 2xx is `Ok`.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Ok,
            400 => Self::FormatError,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::DoesNotExist,
            405 => Self::MethodNotAllowed,
            409 => Self::Conflict,
            422 => Self::ValidationError,
            _ => Self::UnexpectedError,
        }
    }

    /// The HTTP status this code stands for.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::FormatError => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::DoesNotExist => 404,
            Self::MethodNotAllowed => 405,
            Self::Conflict => 409,
            Self::ValidationError => 422,
            Self::UnexpectedError => 500,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The `(element, code)` pair every handler returns.
///
/// `element` is `Some` exactly when `code` is `Ok`. An empty sequence is a
/// valid `Ok` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResult<T> {
    element: Option<T>,
    code: ResultCode,
}

impl<T> CacheResult<T> {
    pub fn ok(element: T) -> Self {
        Self {
            element: Some(element),
            code: ResultCode::Ok,
        }
    }

    /// A failed result. Passing `ResultCode::Ok` here is a caller bug and is
    /// recorded as `UnexpectedError` so the invariant holds.
    pub fn failed(code: ResultCode) -> Self {
        let code = if code.is_ok() {
            ResultCode::UnexpectedError
        } else {
            code
        };
        Self {
            element: None,
            code,
        }
    }

    pub fn code(&self) -> ResultCode {
        self.code
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }

    pub fn element(&self) -> Option<&T> {
        self.element.as_ref()
    }

    pub fn into_element(self) -> Option<T> {
        self.element
    }

    /// Convert into a std `Result`, with the failure code as error.
    pub fn into_result(self) -> Result<T, ResultCode> {
        match self.element {
            Some(element) => Ok(element),
            None => Err(self.code),
        }
    }

    /// Transform the element, keeping the code.
    pub fn map<U, F>(self, f: F) -> CacheResult<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheResult {
            element: self.element.map(f),
            code: self.code,
        }
    }
}

impl<T: Default> CacheResult<T> {
    /// The element, or its default value when the call failed.
    pub fn element_or_default(self) -> T {
        self.element.unwrap_or_default()
    }
}
