//! File Converter - documents on a store in, documents on a store out
//!
//! The high-level API the CLI talks to. Each conversion is independent, so a
//! batch runs them concurrently, bounded by `max_concurrency`.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use xmljson::{ConversionService, ConvertOptions, SerializerConfig};

use crate::error::{FileError, Result};
use crate::events::{ConversionEvent, EventBus};
use crate::store::{FsStore, TextStore};

/// Converter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub convert: ConvertOptions,
    pub serializer: SerializerConfig,
    pub pretty_json: bool,
    pub max_concurrency: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            convert: ConvertOptions::default(),
            serializer: SerializerConfig::default(),
            pretty_json: false,
            max_concurrency: 8,
        }
    }
}

impl ConverterConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FileError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    XmlToJson,
    JsonToXml,
}

/// One unit of work for [`FileConverter::convert_batch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub direction: Direction,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConversionJob {
    pub fn xml_to_json(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            direction: Direction::XmlToJson,
            input: input.into(),
            output: output.into(),
        }
    }

    pub fn json_to_xml(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            direction: Direction::JsonToXml,
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Result of one batch job; `Ok` carries the ignored token count
#[derive(Debug)]
pub struct JobOutcome {
    pub job: ConversionJob,
    pub result: Result<usize>,
}

impl JobOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// File converter - reads, converts and writes through a [`TextStore`]
pub struct FileConverter {
    pub config: ConverterConfig,
    pub event_bus: EventBus,
    service: ConversionService,
    store: Arc<dyn TextStore>,
}

impl FileConverter {
    /// Converter on the local file system
    pub fn new(config: ConverterConfig) -> Self {
        Self::with_store(config, Arc::new(FsStore::new()))
    }

    pub fn with_store(config: ConverterConfig, store: Arc<dyn TextStore>) -> Self {
        tracing::debug!("File converter on {} store", store.name());
        let service =
            ConversionService::with_config(config.convert.clone(), config.serializer.clone());
        Self {
            config,
            event_bus: EventBus::new(),
            service,
            store,
        }
    }

    pub fn service(&self) -> &ConversionService {
        &self.service
    }

    /// Parse an XML file into its JSON value
    pub async fn read_xml_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        self.read_xml(path.as_ref()).await.map(|(value, _)| value)
    }

    /// Render `value` as XML and write it to `path`
    pub async fn write_xml_file(&self, path: impl AsRef<Path>, value: &Value) -> Result<()> {
        let xml = self.service.render(value)?;
        self.store.store_text(path.as_ref(), &xml).await
    }

    /// Read a JSON document; nesting is bounded by `xmljson::json::MAX_JSON_DEPTH`
    pub async fn read_json_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let text = self.store.load_text(path.as_ref()).await?;
        Ok(xmljson::json::from_str(&text)?)
    }

    pub async fn write_json_file(&self, path: impl AsRef<Path>, value: &Value) -> Result<()> {
        let mut text = if self.config.pretty_json {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        text.push('\n');
        self.store.store_text(path.as_ref(), &text).await
    }

    /// XML file → JSON file, returns the number of ignored tokens
    pub async fn xml_to_json(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<usize> {
        let (input, output) = (input.as_ref(), output.as_ref());
        let (value, ignored) = self.read_xml(input).await?;
        self.write_json_file(output, &value).await?;
        tracing::info!("Converted {} → {}", input.display(), output.display());
        Ok(ignored)
    }

    /// JSON file → XML file
    pub async fn json_to_xml(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<()> {
        let (input, output) = (input.as_ref(), output.as_ref());
        let value = self.read_json_file(input).await?;
        self.write_xml_file(output, &value).await?;
        tracing::info!("Converted {} → {}", input.display(), output.display());
        Ok(())
    }

    /// Run one job, publishing its events
    pub async fn convert(&self, job_index: usize, job: &ConversionJob) -> Result<usize> {
        self.event_bus.publish(ConversionEvent::Started {
            job: job_index,
            direction: job.direction,
            input: job.input.clone(),
        });

        let result = match job.direction {
            Direction::XmlToJson => self.xml_to_json(&job.input, &job.output).await,
            Direction::JsonToXml => self.json_to_xml(&job.input, &job.output).await.map(|_| 0),
        };

        match &result {
            Ok(ignored_tokens) => self.event_bus.publish(ConversionEvent::Completed {
                job: job_index,
                output: job.output.clone(),
                ignored_tokens: *ignored_tokens,
            }),
            Err(e) => {
                tracing::warn!("Job {} ({}) failed: {}", job_index, job.input.display(), e);
                self.event_bus.publish(ConversionEvent::Failed {
                    job: job_index,
                    input: job.input.clone(),
                    error: e.to_string(),
                });
            }
        }

        result
    }

    /// Run jobs concurrently; outcomes come back in job order
    ///
    /// A failed job does not stop the others.
    pub async fn convert_batch(&self, jobs: Vec<ConversionJob>) -> Vec<JobOutcome> {
        let semaphore = Semaphore::new(self.config.max_concurrency.max(1));

        let tasks: Vec<_> = jobs
            .into_iter()
            .enumerate()
            .map(|(index, job)| {
                let semaphore = &semaphore;
                async move {
                    // Only fails once closed, which never happens here
                    let _permit = semaphore.acquire().await.ok();
                    let result = self.convert(index, &job).await;
                    JobOutcome { job, result }
                }
            })
            .collect();

        let outcomes = join_all(tasks).await;
        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        tracing::info!(
            "Batch finished: {} converted, {} failed",
            outcomes.len() - failed,
            failed
        );
        outcomes
    }

    async fn read_xml(&self, path: &Path) -> Result<(Value, usize)> {
        let text = self.store.load_text(path).await?;
        let parsed = self.service.parse(&text)?;
        if !parsed.ignored_tokens.is_empty() {
            tracing::debug!(
                "{}: {} tokens ignored",
                path.display(),
                parsed.ignored_tokens.len()
            );
        }
        Ok((parsed.value, parsed.ignored_tokens.len()))
    }
}

impl Default for FileConverter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}
