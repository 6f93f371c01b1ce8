//! Field names and defaults shared by the model layer

/// Discriminator key marking a JSON object as an API resource
pub const TYPE_FIELD: &str = "type";

/// Stable resource identifier, a slash-delimited path
pub const KEY_FIELD: &str = "key";

/// Page envelope field holding the contained resources
pub const DATA_FIELD: &str = "data";

/// Page envelope field holding navigation links
pub const PAGING_FIELD: &str = "paging";

/// Optional page envelope display name
pub const NAME_FIELD: &str = "name";

/// Resource field holding server-side metadata
pub const METADATA_FIELD: &str = "metadata";

/// Metadata field mapping connection names to absolute URLs
pub const CONNECTIONS_FIELD: &str = "connections";

/// Paging link to the previous page
pub const PREVIOUS_LINK: &str = "previous";

/// Paging link to the next page
pub const NEXT_LINK: &str = "next";

/// Page size used when paginating by page number without `per_page`
pub const DEFAULT_PER_PAGE: u64 = 20;
