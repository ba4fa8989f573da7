//! Planning image windows for a generated script.

use super::TimedImage;
use crate::error::{Gener8Error, Result};
use crate::script::ScriptSegment;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp"];

/// Give each segment one image, in order, for its share of the narration.
///
/// A segment's window is proportional to the length of its narration text.
/// Images are reused from the start when there are fewer images than
/// segments.
pub fn plan_timeline(
    segments: &[ScriptSegment],
    images: &[PathBuf],
    total_duration: f64,
) -> Vec<TimedImage> {
    if segments.is_empty() || images.is_empty() || total_duration <= 0.0 {
        return Vec::new();
    }

    let weights: Vec<f64> = segments
        .iter()
        .map(|s| s.narration().chars().count().max(1) as f64)
        .collect();
    let total_weight: f64 = weights.iter().sum();

    let mut start = 0.0;
    weights
        .into_iter()
        .enumerate()
        .map(|(idx, weight)| {
            let duration = total_duration * weight / total_weight;
            let image = TimedImage::new(images[idx % images.len()].clone(), start, duration);
            start += duration;
            image
        })
        .collect()
}

/// Expand the given files and directories into a sorted list of image files.
pub fn collect_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)?
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && is_image(path))
                .collect();
            found.sort();
            images.extend(found);
        } else if input.is_file() {
            images.push(input.clone());
        } else {
            return Err(Gener8Error::InvalidInput(format!(
                "Image path not found: {}",
                input.display()
            )));
        }
    }

    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<ScriptSegment> {
        vec![
            ScriptSegment::new("A", "x".repeat(28)),
            ScriptSegment::new("B", "y".repeat(88)),
        ]
    }

    #[test]
    fn test_plan_is_contiguous_and_covers_audio() {
        let images = vec![PathBuf::from("one.png"), PathBuf::from("two.png")];
        let plan = plan_timeline(&segments(), &images, 60.0);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].start_time, 0.0);
        assert!((plan[0].end_time() - plan[1].start_time).abs() < 1e-9);
        assert!((plan[1].end_time() - 60.0).abs() < 1e-9);
        // "A. " + 28 chars vs "B. " + 88 chars
        assert!((plan[0].duration - 60.0 * 31.0 / 122.0).abs() < 1e-9);
    }

    #[test]
    fn test_images_cycle() {
        let images = vec![PathBuf::from("only.png")];
        let plan = plan_timeline(&segments(), &images, 10.0);
        assert!(plan.iter().all(|t| t.image_path == PathBuf::from("only.png")));
    }

    #[test]
    fn test_no_images_no_plan() {
        assert!(plan_timeline(&segments(), &[], 10.0).is_empty());
        assert!(plan_timeline(&[], &[PathBuf::from("a.png")], 10.0).is_empty());
    }

    #[test]
    fn test_collect_images_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.PNG"), b"x").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
    }

    #[test]
    fn test_collect_missing_path() {
        let result = collect_images(&[PathBuf::from("/definitely/not/here.png")]);
        assert!(matches!(result, Err(Gener8Error::InvalidInput(_))));
    }
}
