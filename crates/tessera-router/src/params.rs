//! Ordered path parameters.
//!
//! Parameters keep the order in which their segments appear in the route
//! pattern. Handlers receive them positionally, so order is part of the
//! contract, not an implementation detail.

use std::ops::Index;

use smallvec::SmallVec;

/// Number of parameters stored inline before spilling to the heap.
const INLINE_PARAMS: usize = 4;

/// Path parameters extracted from a matched route, in pattern order.
///
/// # Example
///
/// ```rust
/// use tessera_router::PathParams;
///
/// let mut params = PathParams::new();
/// params.push("org", "acme");
/// params.push("id", "42");
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.nth(0), Some("acme"));
/// assert_eq!(&params[1], "42");
/// assert_eq!(params.values().collect::<Vec<_>>(), vec!["acme", "42"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParams {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl PathParams {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value bound to `name`.
    ///
    /// When a pattern repeats a name, the last occurrence wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value at `index` in pattern order.
    #[must_use]
    pub fn nth(&self, index: usize) -> Option<&str> {
        self.inner.get(index).map(|(_, v)| v.as_str())
    }

    /// Iterates over the values in pattern order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|(_, v)| v.as_str())
    }

    /// Iterates over `(name, value)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the route captured nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Consumes the list, returning only the values in pattern order.
    #[must_use]
    pub fn into_values(self) -> Vec<String> {
        self.inner.into_iter().map(|(_, v)| v).collect()
    }
}

impl Index<usize> for PathParams {
    type Output = str;

    fn index(&self, index: usize) -> &Self::Output {
        &self.inner[index].1
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_keep_pattern_order() {
        let params: PathParams = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();
        assert_eq!(params.values().collect::<Vec<_>>(), vec!["2", "1", "3"]);
        assert_eq!(params.into_values(), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_params_lookup_by_name_and_position() {
        let mut params = PathParams::new();
        params.push("id", "42");

        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.nth(0), Some("42"));
        assert_eq!(params.nth(1), None);
        assert_eq!(&params[0], "42");
    }

    #[test]
    fn test_params_repeated_name_last_wins() {
        let params: PathParams = [("id", "org-1"), ("id", "user-9")].into_iter().collect();
        assert_eq!(params.get("id"), Some("user-9"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_params_spill_past_inline_capacity() {
        let mut params = PathParams::new();
        for i in 0..10 {
            params.push(format!("k{i}"), format!("v{i}"));
        }
        assert_eq!(params.len(), 10);
        assert_eq!(params.nth(7), Some("v7"));
    }
}
