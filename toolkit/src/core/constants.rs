// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "predsql";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".predsql";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "predsql.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "PREDSQL_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for the SQL dialect
pub const ENV_DIALECT: &str = "PREDSQL_DIALECT";

/// Environment variable for LIKE wildcard escaping
pub const ENV_ESCAPE_LIKE: &str = "PREDSQL_ESCAPE_LIKE";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "PREDSQL_LOG";

// =============================================================================
// Input
// =============================================================================

/// Path argument that reads from stdin
pub const STDIN_PATH: &str = "-";
