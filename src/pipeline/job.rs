use crate::dates::DateRange;
use crate::fetch::FetchSettings;
use crate::storage::OutputFormat;

/// Everything a pipeline needs to know about one source run
#[derive(Debug, Clone)]
pub struct PipelineJob {
    /// Source name, also the output file prefix
    pub name: String,
    /// URL with `{date}` and `{api_key}` placeholders
    pub url_template: String,
    pub date_range: DateRange,
    pub format: OutputFormat,
    pub fetch: FetchSettings,
}

impl PipelineJob {
    pub fn new(name: impl Into<String>, url_template: impl Into<String>, date_range: DateRange) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            date_range,
            format: OutputFormat::default(),
            fetch: FetchSettings::default(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_fetch_settings(mut self, fetch: FetchSettings) -> Self {
        self.fetch = fetch;
        self
    }
}
