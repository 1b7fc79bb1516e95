//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    use std::path::PathBuf;

    pub fn root() -> PathBuf {
        "public".into()
    }

    pub fn origin() -> String {
        "http://localhost:5277".into()
    }
}

// ============================================================================
// [fetch] Section Defaults
// ============================================================================

pub mod fetch {
    pub fn variables() -> String {
        "/config/variables.json".into()
    }

    pub fn json_ld_dir() -> String {
        "/config/json-ld".into()
    }
}

// ============================================================================
// [facts] Section Defaults
// ============================================================================

pub mod facts {
    pub fn words_per_minute() -> usize {
        60
    }
}

// ============================================================================
// [page] Section Defaults
// ============================================================================

pub mod page {
    pub fn default_role() -> String {
        "owner".into()
    }

    pub fn editorial_meta() -> Vec<String> {
        [
            "pageauthor",
            "pagereviewdate",
            "pageembargodate",
            "pagepublisheddate",
            "pagecopyright",
            "pagecopyright-cc",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5277
    }
}
