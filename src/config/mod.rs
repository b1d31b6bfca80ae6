//! TOML-based configuration.
//!
//! Supports a config file (reportsmith.toml) with environment variable
//! expansion in path values.
//!
//! Example configuration:
//! ```toml
//! [output]
//! path = "${REPORT_HOME}/designs"
//! extension = "rptdesign"
//!
//! [labels]
//! bundles = ["orders", "common", "reports"]
//!
//! [security]
//! forbidden_markers = ["${groovy", "${bsh", "javascript:"]
//! ```

mod settings;

pub use settings::{
    expand_env_vars, LabelSettings, OutputSettings, SecuritySettings, Settings, SettingsError,
};
