//! Compile-time registry of minimum-needs rate profiles.
//!
//! Each entry is a `(id, toml_content)` pair embedded via `include_str!`.

use crate::{ConfigError, NeedsProfile};

/// Profile used when a function's parameters do not name one.
pub const DEFAULT_PROFILE_ID: &str = "bnpb_perka7";

/// Embedded TOML profile definitions.
const PROFILE_TOMLS: &[(&str, &str)] = &[(
    DEFAULT_PROFILE_ID,
    include_str!("../profiles/bnpb_perka7.toml"),
)];

/// Returns all registered profiles.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse or validate. These are
/// compile-time constants checked by the tests below.
#[must_use]
pub fn all_profiles() -> Vec<NeedsProfile> {
    PROFILE_TOMLS
        .iter()
        .map(|(id, toml_str)| {
            NeedsProfile::from_toml(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse needs profile '{id}': {e}"))
        })
        .collect()
}

/// Looks up a registered profile by id.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownProfile`] if no profile has that id.
pub fn profile(id: &str) -> Result<NeedsProfile, ConfigError> {
    all_profiles()
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| ConfigError::UnknownProfile(id.to_string()))
}

/// The BNPB Perka 7/2008 weekly profile.
///
/// # Panics
///
/// Panics if the embedded default profile is missing, which the tests
/// below rule out.
#[must_use]
pub fn default_profile() -> NeedsProfile {
    profile(DEFAULT_PROFILE_ID)
        .unwrap_or_else(|e| panic!("Embedded default needs profile is missing: {e}"))
}
