//! The environment list model
//!
//! An [`EnvList`] is an ordered list of raw `KEY=VALUE` entries in which a key may occur more than
//! once. Nothing in here deduplicates, sorts or case-folds entries except for
//! [`EnvList::normalized`] which exists to mimic launch primitives that do.

use std::ffi::{CStr, OsStr, OsString};
use std::fmt::Display;
use std::os::unix::ffi::OsStrExt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::Error;

/// A single raw environment entry, usually of the form `KEY=VALUE`
///
/// The entry is split at the first `=` only, so the value may contain `=` itself. An entry without
/// any `=` consists of a key without a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvEntry(OsString);

/// An ordered environment list which may contain duplicate keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvList(Vec<EnvEntry>);

/// A value of a key and the position of its entry in the [`EnvList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence<'a> {
    /// The index of the entry in the list
    pub index: usize,
    /// The value of the entry
    pub value: &'a OsStr,
}

/// The rule a consumer applies to pick a single value for a key occurring more than once
///
/// `getenv(3)` and most shells see the first entry. Deduplicating launch primitives like
/// `std::process::Command` or Go's `os/exec` keep the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Resolution {
    /// The first entry wins
    First,
    /// The last entry wins
    Last,
}

impl EnvEntry {
    /// Create a new `KEY=VALUE` entry
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let (key, value) = (key.as_ref(), value.as_ref());
        let mut raw = OsString::with_capacity(key.len() + value.len() + 1);
        raw.push(key);
        raw.push("=");
        raw.push(value);
        Self(raw)
    }

    /// Split this entry at the first `=` into key and value
    pub fn split(&self) -> (&OsStr, Option<&OsStr>) {
        let bytes = self.0.as_bytes();
        match bytes.iter().position(|byte| *byte == b'=') {
            Some(index) => (
                OsStr::from_bytes(&bytes[..index]),
                Some(OsStr::from_bytes(&bytes[index + 1..])),
            ),
            None => (self.0.as_os_str(), None),
        }
    }

    /// Return the key of this entry
    pub fn key(&self) -> &OsStr {
        self.split().0
    }

    /// Return the value of this entry if it has one
    pub fn value(&self) -> Option<&OsStr> {
        self.split().1
    }

    /// Return the entry as it is handed to the operating system
    pub fn as_os_str(&self) -> &OsStr {
        &self.0
    }
}

impl Display for EnvEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_string_lossy())
    }
}

impl From<OsString> for EnvEntry {
    fn from(value: OsString) -> Self {
        Self(value)
    }
}

impl From<&str> for EnvEntry {
    fn from(value: &str) -> Self {
        Self(OsString::from(value))
    }
}

impl From<(OsString, OsString)> for EnvEntry {
    fn from((key, value): (OsString, OsString)) -> Self {
        Self::new(key, value)
    }
}

/// Parse a `KEY=VALUE` entry given by the user
///
/// In contrast to the `From` implementations, the entry must contain a `=` and the key must not be
/// empty.
impl FromStr for EnvEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some(("", _)) => Err(Error::InvalidEntry(format!("'{s}': The key is empty"))),
            Some(_) => Ok(Self::from(s)),
            None => Err(Error::InvalidEntry(format!(
                "'{s}': Expected the format KEY=VALUE"
            ))),
        }
    }
}

#[cfg(target_vendor = "apple")]
unsafe fn environ() -> *const *const libc::c_char {
    *libc::_NSGetEnviron() as *const *const libc::c_char
}

#[cfg(not(target_vendor = "apple"))]
unsafe fn environ() -> *const *const libc::c_char {
    extern "C" {
        static environ: *const *const libc::c_char;
    }

    environ
}

impl EnvList {
    /// Create a new empty `EnvList`
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a snapshot of the environment of the current process in its original order
    ///
    /// The `environ` array is read directly. `std::env::vars_os` skips entries without a `=`, but
    /// these are part of the list and are handed on to the probes unchanged.
    pub fn ambient() -> Self {
        let mut list = Self::new();

        // SAFETY: Reading the pointer itself. dupenv never calls `setenv` which could replace it.
        let mut cursor = unsafe { environ() };
        if cursor.is_null() {
            return list;
        }

        loop {
            // SAFETY: `environ` is terminated by a null pointer and `cursor` never moves past it
            let entry = unsafe { *cursor };
            if entry.is_null() {
                break;
            }

            // SAFETY: Every non-null element of `environ` is a null terminated string
            let bytes = unsafe { CStr::from_ptr(entry) }.to_bytes();
            list.push(EnvEntry::from(OsStr::from_bytes(bytes).to_os_string()));

            // SAFETY: `entry` was not the terminating null pointer, so the next element exists
            cursor = unsafe { cursor.add(1) };
        }

        list
    }

    /// Append a single entry
    pub fn push(&mut self, entry: EnvEntry) {
        self.0.push(entry);
    }

    /// Return this list with `entries` appended
    ///
    /// Entries with keys already present are appended as well. This is the whole point.
    #[must_use]
    pub fn concat<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = EnvEntry>,
    {
        self.0.extend(entries);
        self
    }

    /// Return the number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if there are no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all entries in order
    pub fn iter(&self) -> std::slice::Iter<'_, EnvEntry> {
        self.0.iter()
    }

    /// Return every value bound to `key` together with its position, in list order
    ///
    /// Keys are compared byte by byte. Entries without a value never match.
    pub fn occurrences<K>(&self, key: K) -> Vec<Occurrence<'_>>
    where
        K: AsRef<OsStr>,
    {
        let key = key.as_ref();
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match entry.split() {
                (k, Some(value)) if k == key => Some(Occurrence { index, value }),
                _ => None,
            })
            .collect()
    }

    /// Return the number of entries with a value bound to `key`
    pub fn count<K>(&self, key: K) -> usize
    where
        K: AsRef<OsStr>,
    {
        self.occurrences(key).len()
    }

    /// Return the keys which occur more than once in order of their first appearance
    pub fn duplicate_keys(&self) -> Vec<&OsStr> {
        let mut counts: IndexMap<&OsStr, usize> = IndexMap::new();
        for entry in &self.0 {
            *counts.entry(entry.key()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter_map(|(key, count)| (count > 1).then_some(key))
            .collect()
    }

    /// Return the single value a consumer using the [`Resolution`] rule sees for `key`
    pub fn resolve<K>(&self, key: K, resolution: Resolution) -> Option<&OsStr>
    where
        K: AsRef<OsStr>,
    {
        let occurrences = self.occurrences(key);
        let occurrence = match resolution {
            Resolution::First => occurrences.first(),
            Resolution::Last => occurrences.last(),
        };
        occurrence.map(|o| o.value)
    }

    /// Return a deduplicated copy of this list where the last entry of a key wins
    ///
    /// A key stays at the position of its first appearance.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut entries: IndexMap<&OsStr, &EnvEntry> = IndexMap::new();
        for entry in &self.0 {
            entries.insert(entry.key(), entry);
        }
        entries.into_values().cloned().collect()
    }
}

impl FromIterator<EnvEntry> for EnvList {
    fn from_iter<T: IntoIterator<Item = EnvEntry>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a EnvList {
    type Item = &'a EnvEntry;
    type IntoIter = std::slice::Iter<'a, EnvEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for EnvList {
    type Item = EnvEntry;
    type IntoIter = std::vec::IntoIter<EnvEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
