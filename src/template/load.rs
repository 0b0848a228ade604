//! Loading a template store from a directory of reference images.

use super::TemplateStore;
use crate::features::OrbDetector;
use crate::image::io::load_gray_image;
use crate::trace::trace_warn;
use crate::util::{IdentError, IdentResult};
use std::path::Path;

/// Builds a store from every decodable image in `dir`.
///
/// Each template is named by its file stem (`plum.png` becomes `plum`).
/// Files that fail to decode are skipped with a warning. An unreadable
/// directory is an error; a template count other than four is only logged.
pub fn load_template_dir<P: AsRef<Path>>(
    dir: P,
    detector: &OrbDetector,
    thumbnail_scale: f32,
) -> IdentResult<TemplateStore> {
    let dir = dir.as_ref();
    let io_err = |err: std::io::Error| IdentError::Io {
        path: dir.display().to_string(),
        reason: err.to_string(),
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        match load_gray_image(&path) {
            Ok(image) => images.push((name.to_string(), image)),
            Err(err) => {
                trace_warn!(
                    "template_skipped",
                    path = path.display().to_string().as_str(),
                    error = err.to_string().as_str()
                );
            }
        }
    }
    Ok(TemplateStore::build(images, detector, thumbnail_scale))
}
