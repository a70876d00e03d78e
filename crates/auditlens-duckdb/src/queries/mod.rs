pub mod conversions;
pub mod details;
pub mod devices;
pub mod express_checks;
pub mod overview;
pub mod pages;
pub mod timeline;
pub mod visitors;

/// `?1, ?2, …, ?n` for an `IN (…)` list. Only positional placeholders are
/// generated; the values themselves are always bound as parameters.
pub(crate) fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::placeholders;

    #[test]
    fn placeholders_are_positional() {
        assert_eq!(placeholders(3), "?1, ?2, ?3");
        assert_eq!(placeholders(1), "?1");
    }
}
