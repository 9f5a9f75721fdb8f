//! Deterministic, filesystem-safe names for per-test artifacts.
//!
//! Both functions are pure: the same raw name always yields the same
//! token. Distinct tests can sanitize to the same token; such collisions
//! overwrite each other's artifact and are not detected here.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{TestDescriptor, TestIdentity};

/// Placeholder class token for tests that live outside any class.
pub const NO_CLASS: &str = "NoClass";

static TEST_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^test_").unwrap());
static PARAM_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[.*\]$").unwrap());
static CLASS_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Test").unwrap());
static CLASS_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Test$").unwrap());
static UNSAFE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").unwrap());

/// `test_foo_bar[param]` → `foo_bar`
#[must_use]
pub fn sanitize_test_name(name: &str) -> String {
    let name = TEST_PREFIX_RE.replace(name, "");
    let name = PARAM_SUFFIX_RE.replace(&name, "");
    UNSAFE_RE.replace_all(&name, "_").into_owned()
}

/// `TestWidget` / `WidgetTest` → `Widget`
#[must_use]
pub fn sanitize_class_name(name: &str) -> String {
    let name = CLASS_PREFIX_RE.replace(name, "");
    let name = CLASS_SUFFIX_RE.replace(&name, "");
    UNSAFE_RE.replace_all(&name, "_").into_owned()
}

/// Derive the artifact identity for a test, substituting [`NO_CLASS`]
/// when the runner reports no enclosing class.
#[must_use]
pub fn identity(test: &TestDescriptor) -> TestIdentity {
    TestIdentity {
        test: sanitize_test_name(&test.name),
        class: sanitize_class_name(test.class.as_deref().unwrap_or(NO_CLASS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_test_name_strips_prefix_and_params() {
        assert_eq!(sanitize_test_name("test_foo_bar[param]"), "foo_bar");
        assert_eq!(sanitize_test_name("test_get_users"), "get_users");
        assert_eq!(sanitize_test_name("test_x[a-1][b]"), "x");
    }

    #[test]
    fn test_sanitize_test_name_only_anchored_matches() {
        // prefix must be at the start, brackets must end the name
        assert_eq!(sanitize_test_name("my_test_case"), "my_test_case");
        assert_eq!(sanitize_test_name("test_a[1]b"), "a_1_b");
        assert_eq!(sanitize_test_name("testing"), "testing");
    }

    #[test]
    fn test_sanitize_test_name_replaces_unsafe_chars() {
        assert_eq!(sanitize_test_name("test_users::get all/ok"), "users__get_all_ok");
        assert_eq!(sanitize_test_name("caf\u{e9}"), "caf_");
    }

    #[test]
    fn test_sanitize_class_name() {
        assert_eq!(sanitize_class_name("TestWidget"), "Widget");
        assert_eq!(sanitize_class_name("WidgetTest"), "Widget");
        assert_eq!(sanitize_class_name("TestUsersAPI"), "UsersAPI");
        assert_eq!(sanitize_class_name("Test.Inner"), "_Inner");
        assert_eq!(sanitize_class_name("Contest"), "Contest");
    }

    #[test]
    fn test_identity_defaults_class() {
        let id = identity(&TestDescriptor::new("test_health"));
        assert_eq!(id.class, NO_CLASS);
        assert_eq!(id.test, "health");

        let id = identity(&TestDescriptor::in_class("test_get_users", "TestUsersAPI"));
        assert_eq!(id.artifact_file_name(), "UsersAPI__get_users.json");
    }

    #[test]
    fn test_sanitized_output_is_deterministic_and_safe() {
        let raw = "test_weird name!@#[x=1]";
        let a = sanitize_test_name(raw);
        let b = sanitize_test_name(raw);
        assert_eq!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
