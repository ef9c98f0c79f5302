//! Dotted path types for addressing locations in the state tree.
//!
//! The Path/PathBuf types follow the same borrowed/owned pattern as
//! std::path::Path/PathBuf. A path is a sequence of components joined by
//! dots, e.g. `state.countries.AU.population`.
//!
//! # Core Types
//!
//! - [`Path`] - An unsized borrowed path type (always behind a reference)
//! - [`PathBuf`] - An owned path type that can be constructed and extended
//!
//! # Matching
//!
//! Subscriptions are matched with [`Path::overlaps`]: two paths overlap when
//! one is an ancestor of (or equal to) the other at a component boundary.
//!
//! ```rust
//! # use appstate::tree::PathBuf;
//! let watched = PathBuf::normalize("state.countries");
//! assert!(watched.overlaps(&PathBuf::normalize("state.countries.AU.population")));
//! assert!(watched.overlaps(&PathBuf::normalize("state")));
//! assert!(!watched.overlaps(&PathBuf::normalize("state.countries2")));
//! ```

use std::{borrow::Borrow, fmt, ops::Deref, str::FromStr};

use thiserror::Error;

/// Error type for path component validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// Invalid component: components cannot contain dots.
    #[error("Invalid component '{component}': {reason}")]
    InvalidComponent { component: String, reason: String },
}

/// Normalizes a path string by cleaning up dots and empty components.
///
/// - Empty string "" → empty string
/// - Leading dots ".user" → "user"
/// - Trailing dots "user." → "user"
/// - Consecutive dots "user..profile" → "user.profile"
///
/// ```rust
/// # use appstate::tree::path::normalize_path;
/// assert_eq!(normalize_path(""), "");
/// assert_eq!(normalize_path(".state"), "state");
/// assert_eq!(normalize_path("state..countries."), "state.countries");
/// ```
pub fn normalize_path(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    input
        .split('.')
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// A validated component of a path.
///
/// Components are the keys stored in a node. They cannot contain dots and
/// cannot be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Component {
    inner: String,
}

impl Component {
    /// Creates a new component from a string.
    ///
    /// # Errors
    /// Returns an error if the component is empty or contains a dot.
    pub fn new(s: impl Into<String>) -> Result<Self, PathError> {
        let s = s.into();

        if s.is_empty() {
            return Err(PathError::InvalidComponent {
                component: s,
                reason: "components cannot be empty".to_string(),
            });
        }

        if s.contains('.') {
            return Err(PathError::InvalidComponent {
                component: s.clone(),
                reason: "components cannot contain dots".to_string(),
            });
        }

        Ok(Component { inner: s })
    }

    /// Returns the component as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl AsRef<str> for Component {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl FromStr for Component {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Component::new(s)
    }
}

/// An owned, normalized dotted path.
///
/// ```rust
/// # use appstate::tree::PathBuf;
/// let path = PathBuf::new().push("state").push("countries").push("AU");
/// assert_eq!(path.as_str(), "state.countries.AU");
///
/// let components: Vec<&str> = path.components().collect();
/// assert_eq!(components, vec!["state", "countries", "AU"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathBuf {
    inner: String,
}

/// A borrowed, normalized dotted path.
///
/// `Path` is the borrowed counterpart to `PathBuf`, similar to how `&str`
/// relates to `String`. This type is unsized and must always be used behind
/// a reference.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Path {
    inner: str,
}

impl PathBuf {
    /// Creates a new empty path.
    pub fn new() -> Self {
        Self {
            inner: String::new(),
        }
    }

    /// Adds a (possibly dotted) path string to the end of this path.
    ///
    /// The input is normalized, so pushing `"a..b"` appends `a` and `b`.
    pub fn push(mut self, path: impl AsRef<str>) -> Self {
        let normalized = normalize_path(path.as_ref());
        if normalized.is_empty() {
            return self;
        }

        if self.inner.is_empty() {
            self.inner = normalized;
        } else {
            self.inner.push('.');
            self.inner.push_str(&normalized);
        }
        self
    }

    /// Creates a PathBuf by normalizing the input string.
    pub fn normalize(path: &str) -> Self {
        Self {
            inner: normalize_path(path),
        }
    }
}

impl Path {
    /// Creates a Path from a string without normalization.
    ///
    /// # Safety
    /// The caller must ensure that the string is already normalized: no
    /// leading, trailing or consecutive dots.
    pub unsafe fn from_str_unchecked(s: &str) -> &Path {
        // SAFETY: Path is repr(transparent) over str
        unsafe { &*(s as *const str as *const Path) }
    }

    /// Returns an iterator over the path components as string slices.
    pub fn components(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.inner.split('.').filter(|s| !s.is_empty())
    }

    /// Returns the number of components in the path.
    pub fn len(&self) -> usize {
        if self.inner.is_empty() {
            0
        } else {
            self.inner.split('.').count()
        }
    }

    /// Returns `true` if the path has no components.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns the last component of the path, or `None` if empty.
    pub fn last(&self) -> Option<&str> {
        if self.inner.is_empty() {
            None
        } else {
            self.inner.rsplit('.').next()
        }
    }

    /// Returns the first component of the path, or `None` if empty.
    pub fn first(&self) -> Option<&str> {
        self.components().next()
    }

    /// Returns the parent path, or `None` for a single-component or empty path.
    pub fn parent(&self) -> Option<&Path> {
        self.inner.rfind('.').map(|last_dot| {
            // SAFETY: a prefix of a normalized path ending before a dot is normalized
            unsafe { Path::from_str_unchecked(&self.inner[..last_dot]) }
        })
    }

    /// Returns the path without its first component.
    pub fn strip_first(&self) -> &Path {
        let rest = match self.inner.find('.') {
            Some(dot) => &self.inner[dot + 1..],
            None => "",
        };
        // SAFETY: a suffix of a normalized path starting after a dot is normalized
        unsafe { Path::from_str_unchecked(rest) }
    }

    /// Returns `true` if `self` equals `other` or is an ancestor of it,
    /// comparing whole components only.
    ///
    /// `state.countries` is an ancestor of `state.countries.AU` but not of
    /// `state.countries2`.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        if self.inner.is_empty() {
            return true;
        }
        match other.inner.strip_prefix(&self.inner) {
            Some("") => true,
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }

    /// Returns `true` if either path is an ancestor of (or equal to) the other.
    ///
    /// This is the subscription matching rule: watching a parent triggers on
    /// any descendant mutation, and watching a deep leaf triggers when an
    /// ancestor is replaced wholesale.
    pub fn overlaps(&self, other: &Path) -> bool {
        self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }

    /// Returns a new owned path with `key` appended.
    pub fn child(&self, key: impl AsRef<str>) -> PathBuf {
        self.to_path_buf().push(key)
    }

    /// Converts this `Path` to an owned `PathBuf`.
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf {
            inner: self.inner.to_string(),
        }
    }
}

impl Default for PathBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for PathBuf {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        // SAFETY: PathBuf only ever holds normalized strings
        unsafe { Path::from_str_unchecked(self.inner.as_str()) }
    }
}

impl AsRef<Path> for PathBuf {
    fn as_ref(&self) -> &Path {
        self.deref()
    }
}

impl AsRef<Path> for Path {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl AsRef<str> for PathBuf {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl Borrow<Path> for PathBuf {
    fn borrow(&self) -> &Path {
        self.deref()
    }
}

impl ToOwned for Path {
    type Owned = PathBuf;

    fn to_owned(&self) -> PathBuf {
        self.to_path_buf()
    }
}

impl FromStr for PathBuf {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl From<&str> for PathBuf {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

impl From<String> for PathBuf {
    fn from(s: String) -> Self {
        Self::normalize(&s)
    }
}

impl From<&Path> for PathBuf {
    fn from(path: &Path) -> Self {
        path.to_path_buf()
    }
}

impl fmt::Display for PathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.deref(), f)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            write!(f, "(empty path)")
        } else {
            write!(f, "{}", &self.inner)
        }
    }
}
