//! Error types and handling for `AirView`

use thiserror::Error;

/// Main error type for the `AirView` library
#[derive(Error, Debug)]
pub enum AirViewError {
    /// Local input validation failures; never sent to the network
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The user (or configuration) refused access to the current position
    #[error("Geolocation permission denied")]
    GeolocationDenied,

    /// No position could be determined
    #[error("Geolocation unavailable: {message}")]
    GeolocationUnavailable { message: String },

    /// Determining the position took too long
    #[error("Geolocation timed out after {seconds}s")]
    GeolocationTimeout { seconds: u64 },

    /// Transport-level failures (DNS, refused connection, reset)
    #[error("Network error: {message}")]
    Network { message: String },

    /// The request exceeded the client-side timeout
    #[error("Request timed out: {message}")]
    Timeout { message: String },

    /// Non-2xx responses and responses that fail schema validation
    #[error("Server error: {message}")]
    Server {
        message: String,
        status: Option<u16>,
    },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Discriminant of [`AirViewError`], cheap to copy into view state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    GeolocationDenied,
    GeolocationUnavailable,
    GeolocationTimeout,
    Network,
    Timeout,
    Server,
    Config,
    Io,
}

impl AirViewError {
    /// Create a new validation error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new position-unavailable error
    pub fn geolocation_unavailable<S: Into<String>>(message: S) -> Self {
        Self::GeolocationUnavailable {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a new server error without an HTTP status (schema mismatch)
    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::Server {
            message: message.into(),
            status: None,
        }
    }

    /// Create a new server error for a non-2xx status
    pub fn server_status<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Server {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::GeolocationDenied => ErrorKind::GeolocationDenied,
            Self::GeolocationUnavailable { .. } => ErrorKind::GeolocationUnavailable,
            Self::GeolocationTimeout { .. } => ErrorKind::GeolocationTimeout,
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Server { .. } => ErrorKind::Server,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether the error came from the location step rather than the backend
    #[must_use]
    pub fn is_geolocation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::GeolocationDenied
                | ErrorKind::GeolocationUnavailable
                | ErrorKind::GeolocationTimeout
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AirViewError::InvalidInput { message } => format!("Invalid input: {message}"),
            AirViewError::GeolocationDenied => {
                "Location access was denied. Enable location access or search for a city instead."
                    .to_string()
            }
            AirViewError::GeolocationUnavailable { .. } => {
                "Your location could not be determined. Please search for a city instead."
                    .to_string()
            }
            AirViewError::GeolocationTimeout { .. } => {
                "Locating you took too long. Please try again or search for a city.".to_string()
            }
            AirViewError::Network { .. } => {
                "Unable to reach the air quality service. Please check your internet connection."
                    .to_string()
            }
            AirViewError::Timeout { .. } => {
                "The air quality service did not respond in time. Please try again.".to_string()
            }
            AirViewError::Server { status: Some(404), .. } => {
                "No air quality data was found for this location.".to_string()
            }
            AirViewError::Server { .. } => {
                "The air quality service returned an unexpected response. Please try again later."
                    .to_string()
            }
            AirViewError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            AirViewError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
