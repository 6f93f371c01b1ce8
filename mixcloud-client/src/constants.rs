//! Endpoint roots, upload limits and environment variable names

/// Mixcloud root URL
pub const MIXCLOUD_ROOT: &str = "https://www.mixcloud.com";

/// Mixcloud API root URL
pub const API_ROOT: &str = "https://api.mixcloud.com";

/// Mixcloud oEmbed root URL
pub const OEMBED_ROOT: &str = "https://www.mixcloud.com/oembed";

/// Mixcloud OAuth root URL
pub const OAUTH_ROOT: &str = "https://www.mixcloud.com/oauth";

/// Uploaded mp3 maximum allowed size, in bytes
pub const MP3_MAX_SIZE: u64 = 4_294_967_296;

/// Uploaded picture maximum allowed size, in bytes
pub const PICTURE_MAX_SIZE: u64 = 10_485_760;

/// Uploaded description maximum allowed size, in characters
pub const DESCRIPTION_MAX_SIZE: usize = 1_000;

/// Tag maximum allowed count per upload
pub const TAG_MAX_COUNT: usize = 5;

/// Default request timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the OAuth access token
pub const ENV_ACCESS_TOKEN: &str = "MIXCLOUD_ACCESS_TOKEN";

/// Environment variable overriding the API root
pub const ENV_API_ROOT: &str = "MIXCLOUD_API_ROOT";

/// Environment variable switching API errors from values to failures
pub const ENV_RAISE_EXCEPTIONS: &str = "MIXCLOUD_RAISE_EXCEPTIONS";
