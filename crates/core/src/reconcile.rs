//! Output reconciliation: from a [`SceneIndex`] to the client-facing list.
//!
//! Both modes emit one entry per scene slot `1..=N`, in ascending order,
//! where each entry is either an artifact reference or [`FAILED_MARKER`].
//!
//! - **Strict**: `N` is the expected scene count recorded at submission.
//! - **Discovered**: `N` is the highest ordinal found on disk, used when no
//!   job record is available.

use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::media;
use crate::scene::{SceneIndex, MAX_SCENE_ORDINAL};

/// Marker emitted for a scene slot with no artifact.
pub const FAILED_MARKER: &str = "failed";

/// Upper bound on slots preallocated up front; longer lists grow normally.
const PREALLOCATE_LIMIT: u64 = 4_096;

/// Outcome for one scene slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneSlot {
    /// Reference (URL or path) to the chosen artifact.
    Present(String),
    /// No artifact exists for this slot.
    Failed,
}

/// One entry of the reconciled list, serialized as `{"scene<N>": <ref|"failed">}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneOutput {
    pub scene: u64,
    pub slot: SceneSlot,
}

impl SceneOutput {
    /// Key used on the wire, e.g. `scene3`.
    pub fn key(&self) -> String {
        format!("scene{}", self.scene)
    }

    pub fn is_failed(&self) -> bool {
        self.slot == SceneSlot::Failed
    }
}

impl Serialize for SceneOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match &self.slot {
            SceneSlot::Present(reference) => map.serialize_entry(&self.key(), reference)?,
            SceneSlot::Failed => map.serialize_entry(&self.key(), FAILED_MARKER)?,
        }
        map.end()
    }
}

/// Ordered, gap-annotated scene list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub outputs: Vec<SceneOutput>,
    /// `true` only when no slot is [`SceneSlot::Failed`].
    pub all_present: bool,
}

impl Reconciliation {
    pub fn failed_count(&self) -> usize {
        self.outputs.iter().filter(|o| o.is_failed()).count()
    }
}

/// Fill slots `1..=last` from `index`, mapping each artifact through `reference`.
///
/// Scene 0 never occupies a slot even when it is present in the index.
fn fill<F>(index: &SceneIndex, last: u64, reference: F) -> Reconciliation
where
    F: Fn(&str) -> String,
{
    let mut outputs = Vec::with_capacity(usize::try_from(last.min(PREALLOCATE_LIMIT)).unwrap_or(0));
    let mut all_present = true;

    for scene in 1..=last {
        let slot = match index.get(scene) {
            Some(artifact) => SceneSlot::Present(reference(artifact)),
            None => {
                all_present = false;
                SceneSlot::Failed
            }
        };
        outputs.push(SceneOutput { scene, slot });
    }

    Reconciliation {
        outputs,
        all_present,
    }
}

/// Strict mode: one slot per expected scene.
///
/// The count comes from a record the worker may rewrite, so it is capped at
/// [`MAX_SCENE_ORDINAL`].
pub fn reconcile_strict<F>(index: &SceneIndex, expected_scenes: u64, reference: F) -> Reconciliation
where
    F: Fn(&str) -> String,
{
    let last = if expected_scenes > MAX_SCENE_ORDINAL {
        tracing::warn!(
            expected_scenes,
            limit = MAX_SCENE_ORDINAL,
            "Expected scene count above limit, clamping",
        );
        MAX_SCENE_ORDINAL
    } else {
        expected_scenes
    };
    fill(index, last, reference)
}

/// Discovered mode: slots run up to the highest ordinal in `index`.
///
/// An index without any positive ordinal yields an empty list.
pub fn reconcile_discovered<F>(index: &SceneIndex, reference: F) -> Reconciliation
where
    F: Fn(&str) -> String,
{
    let last = index.max_scene().unwrap_or(0);
    fill(index, last, reference)
}

/// Strict reconciliation of the media files directly inside `dir`.
///
/// `reference` receives the bare filename.
pub fn reconcile_dir_strict<F>(
    dir: &Path,
    expected_scenes: u64,
    reference: F,
) -> Result<Reconciliation, CoreError>
where
    F: Fn(&str) -> String,
{
    let index = SceneIndex::build(media::list_media_files(dir)?);
    Ok(reconcile_strict(&index, expected_scenes, reference))
}

/// Discovered reconciliation of the media files directly inside `dir`.
///
/// `reference` receives the bare filename.
pub fn reconcile_dir_discovered<F>(dir: &Path, reference: F) -> Result<Reconciliation, CoreError>
where
    F: Fn(&str) -> String,
{
    let index = SceneIndex::build(media::list_media_files(dir)?);
    Ok(reconcile_discovered(&index, reference))
}

/// Global discovery across every subdirectory of `root`.
///
/// Scenes are keyed by ordinal regardless of which job folder holds them;
/// `reference` receives the `/`-separated path relative to `root`.
pub fn discover_all<F>(root: &Path, reference: F) -> Reconciliation
where
    F: Fn(&str) -> String,
{
    let index = SceneIndex::build(media::list_media_files_recursive(root));
    reconcile_discovered(&index, reference)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn url(name: &str) -> String {
        format!("http://node/output/job/{name}")
    }

    fn present(scene: u64, name: &str) -> SceneOutput {
        SceneOutput {
            scene,
            slot: SceneSlot::Present(url(name)),
        }
    }

    fn failed(scene: u64) -> SceneOutput {
        SceneOutput {
            scene,
            slot: SceneSlot::Failed,
        }
    }

    // -- strict -----------------------------------------------------------

    #[test]
    fn strict_marks_gaps_failed() {
        let index = SceneIndex::build(["scene_1_a.mp4", "scene_3_b.mp4", "scene_5_c.mp4"]);
        let result = reconcile_strict(&index, 5, url);

        assert_eq!(
            result.outputs,
            vec![
                present(1, "scene_1_a.mp4"),
                failed(2),
                present(3, "scene_3_b.mp4"),
                failed(4),
                present(5, "scene_5_c.mp4"),
            ]
        );
        assert!(!result.all_present);
        assert_eq!(result.failed_count(), 2);
    }

    #[test]
    fn strict_all_present() {
        let index = SceneIndex::build(["scene_1_a.mp4", "scene_2_b.mp4", "scene_3_c.mp4"]);
        let result = reconcile_strict(&index, 3, url);

        assert!(result.all_present);
        assert_eq!(result.failed_count(), 0);
        assert_eq!(result.outputs.len(), 3);
    }

    #[test]
    fn strict_ignores_scenes_beyond_expected() {
        let index = SceneIndex::build(["scene_1_a.mp4", "scene_7_b.mp4"]);
        let result = reconcile_strict(&index, 2, url);
        assert_eq!(result.outputs, vec![present(1, "scene_1_a.mp4"), failed(2)]);
    }

    #[test]
    fn strict_with_zero_expected_is_empty_and_complete() {
        let index = SceneIndex::build(["scene_1_a.mp4"]);
        let result = reconcile_strict(&index, 0, url);
        assert!(result.outputs.is_empty());
        assert!(result.all_present);
    }

    // -- discovered ---------------------------------------------------------

    #[test]
    fn discovered_fills_up_to_max() {
        let index = SceneIndex::build(["scene_2_a.mp4", "scene_4_b.mp4"]);
        let result = reconcile_discovered(&index, url);
        assert_eq!(
            result.outputs,
            vec![
                failed(1),
                present(2, "scene_2_a.mp4"),
                failed(3),
                present(4, "scene_4_b.mp4"),
            ]
        );
    }

    #[test]
    fn discovered_without_scenes_is_empty() {
        let result = reconcile_discovered(&SceneIndex::default(), url);
        assert!(result.outputs.is_empty());
    }

    #[test]
    fn scene_zero_excluded_from_fill() {
        let index = SceneIndex::build(["scene_0_a.mp4", "scene_1_b.mp4"]);
        let result = reconcile_discovered(&index, url);
        assert_eq!(result.outputs, vec![present(1, "scene_1_b.mp4")]);

        let only_zero = SceneIndex::build(["scene_0_a.mp4"]);
        assert!(reconcile_discovered(&only_zero, url).outputs.is_empty());
    }

    // -- filesystem -------------------------------------------------------

    #[test]
    fn discover_all_on_empty_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let result = discover_all(dir.path(), |rel| rel.to_string());
        assert!(result.outputs.is_empty());
    }

    #[test]
    fn discover_all_merges_job_folders() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/scene_1_x.mp4"), b"1").unwrap();
        fs::write(dir.path().join("b/scene_3_y.mp4"), b"3").unwrap();

        let result = discover_all(dir.path(), |rel| format!("/output/{rel}"));
        assert_eq!(
            result.outputs,
            vec![
                SceneOutput {
                    scene: 1,
                    slot: SceneSlot::Present("/output/a/scene_1_x.mp4".into()),
                },
                failed(2),
                SceneOutput {
                    scene: 3,
                    slot: SceneSlot::Present("/output/b/scene_3_y.mp4".into()),
                },
            ]
        );
    }

    #[test]
    fn discover_all_ignores_out_of_range_ordinal() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("legacy")).unwrap();
        fs::write(dir.path().join("legacy/scene_200000000_x.mp4"), b"x").unwrap();
        fs::write(dir.path().join("legacy/scene_2_y.mp4"), b"2").unwrap();

        let result = discover_all(dir.path(), |rel| rel.to_string());
        assert_eq!(result.outputs.len(), 2);
        assert_eq!(result.outputs[0], failed(1));
    }

    #[test]
    fn strict_clamps_oversized_expected_count() {
        let index = SceneIndex::build(["scene_1_a.mp4"]);
        let result = reconcile_strict(&index, u64::MAX, url);
        assert_eq!(result.outputs.len() as u64, MAX_SCENE_ORDINAL);
        assert_eq!(result.outputs[0], present(1, "scene_1_a.mp4"));
        assert!(!result.all_present);
    }

    #[test]
    fn dir_strict_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scene_2_x.mp4"), b"2").unwrap();
        let result = reconcile_dir_strict(dir.path(), 2, |name| name.to_string()).unwrap();
        assert_eq!(
            result.outputs,
            vec![
                failed(1),
                SceneOutput {
                    scene: 2,
                    slot: SceneSlot::Present("scene_2_x.mp4".into()),
                },
            ]
        );
    }

    // -- serialization ------------------------------------------------------

    #[test]
    fn outputs_serialize_as_single_key_objects() {
        let index = SceneIndex::build(["scene_1_a.mp4"]);
        let result = reconcile_strict(&index, 2, |name| format!("/o/{name}"));
        let json = serde_json::to_value(&result.outputs).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"scene1": "/o/scene_1_a.mp4"}, {"scene2": "failed"}])
        );
    }
}
