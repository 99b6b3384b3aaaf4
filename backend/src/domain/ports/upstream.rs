//! Error type shared by ports that front third-party HTTP services.

use super::define_port_error;

define_port_error! {
    /// Failures talking to an external service.
    pub enum UpstreamServiceError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "upstream transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } =>
            "upstream timeout: {message}",
        /// The service answered with a non-success status.
        Status { status: u16, message: String } =>
            "upstream returned status {status}: {message}",
        /// The response did not match the expected shape.
        Decode { message: String } =>
            "upstream response decode failed: {message}",
        /// The adapter is missing credentials or endpoints.
        Configuration { message: String } =>
            "upstream adapter misconfigured: {message}",
    }
}
