/// Selector and marker constants for the listing page markup.
/// Kept in one place so the page driver and its tests agree on them.

// Product listing widgets
pub const PRODUCT_NODE_SELECTOR: &str = "div [data-asin]";
pub const LISTING_RATING_TEXT_SELECTOR: &str = "span [data-action=a-popover] > a span";
pub const LISTING_COUNT_TEXT_SELECTOR: &str = "span [aria-label] > a > span";
pub const ASIN_ATTRIBUTE: &str = "data-asin";

// Hover card widgets
pub const POPOVER_CONTAINER_SELECTOR: &str = "div[class*=popover]";
pub const POPOVER_RATING_TEXT_SELECTOR: &str = "[data-hook=acr-average-stars-rating-text]";
pub const POPOVER_COUNT_TEXT_SELECTOR: &str = "[data-hook=total-rating-count]";

/// Attribute the page script leaves on a count container once it has been annotated.
pub const PROCESSED_MARKER_ATTRIBUTE: &str = "processed-3b1b";

/// Prefix for diagnostic messages so they stand out in a busy console.
pub const LOG_PREFIX: &str = "[Amazon 3B1B Confidence Plugin]";

// Configuration
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "REVIEW_CONFIDENCE_CONFIG";

// Logging
pub const LOG_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "review_confidence.log";
