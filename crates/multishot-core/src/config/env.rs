pub(crate) const EMAIL_ENV: &str = "MULTISHOT_EMAIL";
pub(crate) const PASSWORD_ENV: &str = "MULTISHOT_PASSWORD";

#[must_use]
pub(super) fn read_non_empty_env(name: &str) -> Option<String> {
    normalize_non_empty(std::env::var(name).ok().as_deref())
}

#[must_use]
pub(super) fn normalize_non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
