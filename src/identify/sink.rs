//! Destinations for successful detections.

use crate::image::Frame;
use crate::util::IdentResult;
use parking_lot::Mutex;

/// Receives the winning frame and character name after a successful match.
pub trait DetectionSink {
    fn record(&self, frame: &Frame, character: &str) -> IdentResult<()>;
}

impl<T: DetectionSink + ?Sized> DetectionSink for &T {
    fn record(&self, frame: &Frame, character: &str) -> IdentResult<()> {
        (**self).record(frame, character)
    }
}

/// Sink that keeps detections in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Frame, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded character names, oldest first.
    pub fn characters(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|(_, character)| character.clone())
            .collect()
    }

    /// The most recent detection.
    pub fn last(&self) -> Option<(Frame, String)> {
        self.records.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl DetectionSink for MemorySink {
    fn record(&self, frame: &Frame, character: &str) -> IdentResult<()> {
        self.records
            .lock()
            .push((frame.clone(), character.to_string()));
        Ok(())
    }
}

#[cfg(feature = "image-io")]
pub use file::FileSink;

#[cfg(feature = "image-io")]
mod file {
    use super::DetectionSink;
    use crate::image::io::save_frame;
    use crate::image::Frame;
    use crate::trace::trace_event;
    use crate::util::{IdentError, IdentResult};
    use std::path::{Path, PathBuf};

    /// Writes the detection image and a one-line name file into a directory.
    ///
    /// Both files are overwritten on every detection.
    #[derive(Clone, Debug)]
    pub struct FileSink {
        dir: PathBuf,
        image_name: String,
        text_name: String,
    }

    impl FileSink {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self {
                dir: dir.into(),
                image_name: "cluedo_character.png".to_string(),
                text_name: "cluedo_character.txt".to_string(),
            }
        }

        /// Overrides the output file names.
        pub fn with_file_names(
            mut self,
            image_name: impl Into<String>,
            text_name: impl Into<String>,
        ) -> Self {
            self.image_name = image_name.into();
            self.text_name = text_name.into();
            self
        }

        pub fn image_path(&self) -> PathBuf {
            self.dir.join(&self.image_name)
        }

        pub fn text_path(&self) -> PathBuf {
            self.dir.join(&self.text_name)
        }

        pub fn dir(&self) -> &Path {
            &self.dir
        }
    }

    impl DetectionSink for FileSink {
        fn record(&self, frame: &Frame, character: &str) -> IdentResult<()> {
            let io_err = |path: &Path, err: std::io::Error| IdentError::Io {
                path: path.display().to_string(),
                reason: err.to_string(),
            };
            std::fs::create_dir_all(&self.dir).map_err(|err| io_err(&self.dir, err))?;

            let image_path = self.image_path();
            save_frame(frame, &image_path)?;
            let text_path = self.text_path();
            std::fs::write(&text_path, format!("{character}\n"))
                .map_err(|err| io_err(&text_path, err))?;

            trace_event!(
                "detection_saved",
                character = character,
                image = image_path.display().to_string().as_str()
            );
            Ok(())
        }
    }
}
