//! Persistence of accepted eye samples.

use image::{GrayImage, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while storing a sample.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("refusing to store an empty image as {0}")]
    EmptyImage(String),
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Naming state for one accepted sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleName {
    /// Subject label.
    pub label: String,
    /// Session number.
    pub session_index: u32,
    /// 1-based index of this capture within the session.
    pub capture_index: u64,
}

impl SampleName {
    /// `<label>_<session>_<capture>.jpg`
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.jpg",
            self.label, self.session_index, self.capture_index
        )
    }
}

/// Destination for accepted grayscale eye samples.
pub trait OutputSink {
    /// Stores `image` under `name` and returns where it went.
    fn persist(&mut self, name: &SampleName, image: &GrayImage) -> Result<PathBuf, SinkError>;
}

impl<K: OutputSink + ?Sized> OutputSink for Box<K> {
    fn persist(&mut self, name: &SampleName, image: &GrayImage) -> Result<PathBuf, SinkError> {
        (**self).persist(name, image)
    }
}

/// Writes samples as JPEG files into one directory.
///
/// The directory is created on the first write, not on construction, so a
/// session that never accepts anything leaves no trace on disk.
#[derive(Debug)]
pub struct DiskSink {
    dir: PathBuf,
    dir_ready: bool,
}

impl DiskSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            dir_ready: false,
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&mut self) -> Result<(), SinkError> {
        if self.dir_ready {
            return Ok(());
        }
        fs::create_dir_all(&self.dir).map_err(|source| SinkError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        tracing::debug!(dir = %self.dir.display(), "Output directory ready");
        self.dir_ready = true;
        Ok(())
    }
}

impl OutputSink for DiskSink {
    fn persist(&mut self, name: &SampleName, image: &GrayImage) -> Result<PathBuf, SinkError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SinkError::EmptyImage(name.file_name()));
        }
        self.ensure_dir()?;

        let path = self.dir.join(name.file_name());
        image
            .save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|source| SinkError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Keeps samples in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    samples: Vec<(String, GrayImage)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored samples as `(file name, image)` in acceptance order.
    pub fn samples(&self) -> &[(String, GrayImage)] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl OutputSink for MemorySink {
    fn persist(&mut self, name: &SampleName, image: &GrayImage) -> Result<PathBuf, SinkError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SinkError::EmptyImage(name.file_name()));
        }
        let file_name = name.file_name();
        self.samples.push((file_name.clone(), image.clone()));
        Ok(PathBuf::from(file_name))
    }
}
