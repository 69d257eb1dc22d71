/// Configuration constants for the Prism Central v4 API
pub mod api {
    /// Base path under which every Prism Central API lives
    pub const BASE_PATH: &str = "/api";

    /// Default Prism Central port
    pub const PRISM_PORT: u16 = 9440;

    /// Default page size for API requests
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    /// Largest `$limit` the v4 APIs accept
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Placeholder replaced by the version tag in endpoint templates
    pub const VERSION_PLACEHOLDER: &str = "{version}";

    /// IAM endpoints, newest first
    pub const IAM_VERSIONS: &[&str] = &["v4.1", "v4.1.b2", "v4.0"];

    /// VMM endpoints, newest first
    pub const VMM_VERSIONS: &[&str] = &["v4.1", "v4.0"];

    /// Networking endpoints, newest first
    pub const NETWORKING_VERSIONS: &[&str] = &["v4.2", "v4.0"];

    /// Prism (categories) endpoints, newest first
    pub const PRISM_VERSIONS: &[&str] = &["v4.2", "v4.0"];

    /// Task endpoint used to monitor asynchronous operations
    pub const TASKS_PATH: &str = "prism/v4.0/config/tasks";

    /// v3 VM endpoints used for category assignment, subnet lookups and
    /// as the listing fallback when no VMM v4 version answers
    pub const V3_VMS_PATH: &str = "nutanix/v3/vms";

    /// Version label of the v3 VM list endpoint
    pub const V3_VERSION: &str = "v3";
}

/// Retry and backoff defaults for the paginated fetcher
pub mod retry {
    /// Consecutive 429 responses tolerated on a single page
    pub const MAX_RATE_LIMIT_RETRIES: u32 = 5;

    /// Delay after a 429 without a Retry-After header
    pub const RATE_LIMIT_DELAY_SECS: u64 = 60;

    /// Retries after network errors, timeouts and 5xx responses
    pub const MAX_TRANSIENT_RETRIES: u32 = 3;

    /// First transient backoff delay
    pub const BASE_DELAY_MS: u64 = 1000;

    /// Backoff growth factor
    pub const BACKOFF_MULTIPLIER: u32 = 2;

    /// Pause between successful page requests
    pub const PAGE_PAUSE_MS: u64 = 100;
}

/// Configuration constants for credentials
pub mod credentials {
    /// Environment variables for Prism Central (host, username, password)
    pub const PRISM_ENV_VARS: [&str; 3] = ["PRISM_HOST", "PRISM_USERNAME", "PRISM_PASSWORD"];

    /// Environment variables for the Move appliance (host, username, password)
    pub const MOVE_ENV_VARS: [&str; 3] = ["MOVE_HOST", "MOVE_USERNAME", "MOVE_PASSWORD"];

    /// Recognised first-cell values of a credential mapping header row
    pub const CSV_HEADER_NAMES: &[&str] = &["servername", "server", "vm", "vmname", "hostname"];
}

/// Configuration constants for the Move appliance API
pub mod move_api {
    /// Default Move port
    pub const PORT: u16 = 443;

    /// Base path of the Move v2 API
    pub const BASE_PATH: &str = "/move/v2";

    /// Default page size for Move list calls
    pub const DEFAULT_PAGE_SIZE: u32 = 100;
}

/// Default values for CLI
pub mod defaults {
    /// Default log level
    pub const LOG_LEVEL: &str = "warn";

    /// Default per-request timeout in seconds
    pub const TIMEOUT_SECS: u64 = 30;

    /// Connect timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Default time to wait for an asynchronous task in seconds
    pub const TASK_TIMEOUT_SECS: u64 = 600;

    /// Interval between task status polls in seconds
    pub const TASK_POLL_SECS: u64 = 10;

    /// Time to wait for the NGT ISO to be mounted in seconds
    pub const ISO_TASK_TIMEOUT_SECS: u64 = 120;
}
