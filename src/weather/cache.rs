//! On-disk memoization of the weather sources.

use std::{
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use crate::{
    prelude::*,
    weather::{WeatherRequest, WeatherSample, WeatherSource},
};

/// Wraps a source and keeps its raw responses as JSON files, one per request.
pub struct CachedSource {
    inner: Box<dyn WeatherSource>,
    directory: PathBuf,
}

impl CachedSource {
    pub fn new(inner: Box<dyn WeatherSource>, directory: impl Into<PathBuf>) -> Self {
        Self { inner, directory: directory.into() }
    }

    /// Cache file for the request to the inner source.
    pub fn path_of(&self, request: &WeatherRequest) -> PathBuf {
        let key = format!("{}|{request:?}", self.inner.id());
        self.directory.join(format!("{:x}.json", md5::compute(key)))
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn read_from(path: &Path) -> Option<Vec<WeatherSample>> {
        if !path.is_file() {
            return None;
        }
        match Self::read_fallibly_from(path) {
            Ok(samples) => {
                debug!(n_samples = samples.len(), "hit");
                Some(samples)
            }
            Err(error) => {
                warn!("failed to read the cache: {error:#}");
                None
            }
        }
    }

    fn read_fallibly_from(path: &Path) -> Result<Vec<WeatherSample>> {
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }

    #[instrument(skip_all, fields(path = %path.display(), n_samples = samples.len()))]
    fn write_to(path: &Path, samples: &[WeatherSample]) {
        if let Err(error) = Self::write_fallibly_to(path, samples) {
            warn!("failed to write the cache: {error:#}");
        }
    }

    fn write_fallibly_to(path: &Path, samples: &[WeatherSample]) -> Result {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create the cache directory")?;
        }
        fs::write(path, serde_json::to_vec(samples)?).context("failed to write the file")?;
        Ok(())
    }
}

#[async_trait]
impl WeatherSource for CachedSource {
    fn id(&self) -> String {
        self.inner.id()
    }

    async fn fetch_raw(&self, request: &WeatherRequest) -> Result<Vec<WeatherSample>> {
        let path = self.path_of(request);
        if let Some(samples) = Self::read_from(&path) {
            return Ok(samples);
        }
        let samples = self.inner.fetch_raw(request).await?;
        Self::write_to(&path, &samples);
        Ok(samples)
    }
}
