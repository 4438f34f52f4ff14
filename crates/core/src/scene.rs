//! Scene artifact filename parsing and indexing.
//!
//! The worker names every artifact `scene_<N>_<suffix>.mp4`, where `<N>` is
//! the 1-based scene ordinal and the suffix is a timestamp plus random tag.
//! [`SceneIndex`] turns an arbitrary set of such names into an ordered map
//! with exactly one representative per ordinal.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Regex pattern matching the scene ordinal prefix of an artifact filename.
pub const SCENE_FILENAME_PATTERN: &str = r"^scene_(\d+)_";

/// Highest scene ordinal accepted, both from filenames and as an expected
/// scene count. Reconciliation allocates one slot per ordinal up to the
/// maximum, so a stray `scene_200000000_x.mp4` must not be taken at face value.
pub const MAX_SCENE_ORDINAL: u64 = 100_000;

static SCENE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SCENE_FILENAME_PATTERN).expect("valid regex"));

/// Extract the scene ordinal from a bare filename.
///
/// Returns `None` for names that do not follow the convention, including
/// ordinals above [`MAX_SCENE_ORDINAL`].
///
/// ```
/// use flowgen_core::scene::parse_scene_number;
///
/// assert_eq!(parse_scene_number("scene_12_1717000000_ab12cd34.mp4"), Some(12));
/// assert_eq!(parse_scene_number("all_scenes.zip"), None);
/// assert_eq!(parse_scene_number("scene_200000000_x.mp4"), None);
/// ```
pub fn parse_scene_number(filename: &str) -> Option<u64> {
    SCENE_RE
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .filter(|n| *n <= MAX_SCENE_ORDINAL)
}

/// Final `/`-separated component of a relative path.
fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Ordered mapping from scene ordinal to the artifact chosen for it.
///
/// Entries are stored as given (a bare filename or a `/`-separated path
/// relative to some root); the pattern is matched against the final path
/// component only. The map has no density requirement: gaps are expected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneIndex {
    scenes: BTreeMap<u64, String>,
}

impl SceneIndex {
    /// Build an index from filenames or relative paths.
    ///
    /// Non-matching entries are ignored. When several entries share an
    /// ordinal, the lexicographically greatest string wins: retried
    /// artifacts carry a later timestamp in their suffix and so sort after
    /// the originals. That is a naming heuristic, not a guarantee.
    pub fn build<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scenes: BTreeMap<u64, String> = BTreeMap::new();
        for entry in entries {
            let entry = entry.into();
            let Some(number) = parse_scene_number(file_name(&entry)) else {
                continue;
            };
            let keep_current = scenes
                .get(&number)
                .is_some_and(|current| *current >= entry);
            if !keep_current {
                scenes.insert(number, entry);
            }
        }
        Self { scenes }
    }

    /// Artifact chosen for scene `number`, if any.
    pub fn get(&self, number: u64) -> Option<&str> {
        self.scenes.get(&number).map(String::as_str)
    }

    /// Highest ordinal present (scene 0 included).
    pub fn max_scene(&self) -> Option<u64> {
        self.scenes.keys().next_back().copied()
    }

    /// Ordinals present, ascending.
    pub fn scene_numbers(&self) -> impl Iterator<Item = u64> + '_ {
        self.scenes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
