//! Shared types for the graduate job aggregator.
//!
//! Everything here crosses a crate boundary: scrapers build [`JobRecord`]s,
//! the aggregator streams [`ProgressEvent`]s and the server decodes
//! [`SearchRequest`]s.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A job board the aggregator knows how to scrape.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    GradConnection,
    Seek,
    Prosple,
}

impl Source {
    pub fn name(self) -> &'static str {
        match self {
            Source::GradConnection => "GradConnection",
            Source::Seek => "Seek",
            Source::Prosple => "Prosple",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One scraped job listing.
///
/// `title`, `company`, `link` and `source` are always filled; scrapers fall
/// back to placeholder text rather than leaving them empty.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub link: String,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub disciplines: Option<String>,
    pub international: Option<String>,
    pub position_start_date: Option<String>,
    pub closing_date: Option<String>,
    /// Listing age as printed by the board ("3d ago"). Only Seek shows it.
    #[serde(default)]
    pub date_posted: Option<String>,
    pub source: Source,
}

impl JobRecord {
    /// Starts a record with the mandatory fields; everything else is absent.
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        link: impl Into<String>,
        source: Source,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            link: link.into(),
            location: None,
            job_type: None,
            disciplines: None,
            international: None,
            position_start_date: None,
            closing_date: None,
            date_posted: None,
            source,
        }
    }
}

/// A single line of the progress stream.
///
/// Untagged so each variant serializes to the bare JSON shape the front end
/// reads (`{"progress": .., "status": ..}`, `{"warning": ..}` and so on).
/// Variant order matters for deserialization: the shapes with more required
/// keys come first.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ProgressEvent {
    Complete {
        complete: bool,
        results: Vec<JobRecord>,
    },
    Results {
        progress: f64,
        status: String,
        results: Vec<JobRecord>,
    },
    Progress {
        progress: f64,
        status: String,
    },
    Warning {
        warning: String,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<Source>,
    },
}

impl ProgressEvent {
    pub fn progress(progress: f64, status: impl Into<String>) -> Self {
        ProgressEvent::Progress {
            progress,
            status: status.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        ProgressEvent::Warning {
            warning: message.into(),
        }
    }

    pub fn error(message: impl Into<String>, source: Option<Source>) -> Self {
        ProgressEvent::Error {
            error: message.into(),
            source,
        }
    }

    pub fn results(progress: f64, status: impl Into<String>, results: Vec<JobRecord>) -> Self {
        ProgressEvent::Results {
            progress,
            status: status.into(),
            results,
        }
    }

    pub fn complete(results: Vec<JobRecord>) -> Self {
        ProgressEvent::Complete {
            complete: true,
            results,
        }
    }

    /// The progress value carried by this event, if any.
    pub fn progress_value(&self) -> Option<f64> {
        match self {
            ProgressEvent::Progress { progress, .. } | ProgressEvent::Results { progress, .. } => {
                Some(*progress)
            }
            _ => None,
        }
    }

    pub fn progress_mut(&mut self) -> Option<&mut f64> {
        match self {
            ProgressEvent::Progress { progress, .. } | ProgressEvent::Results { progress, .. } => {
                Some(progress)
            }
            _ => None,
        }
    }

    /// Records carried by a `Results` or `Complete` event.
    pub fn records(&self) -> Option<&[JobRecord]> {
        match self {
            ProgressEvent::Results { results, .. } | ProgressEvent::Complete { results, .. } => {
                Some(results)
            }
            _ => None,
        }
    }

    pub fn records_mut(&mut self) -> Option<&mut Vec<JobRecord>> {
        match self {
            ProgressEvent::Results { results, .. } | ProgressEvent::Complete { results, .. } => {
                Some(results)
            }
            _ => None,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ProgressEvent::Warning { .. })
    }
}

/// Seniority of the positions being searched for.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobLevel {
    #[default]
    #[serde(rename = "graduate-jobs")]
    GraduateJobs,
    #[serde(rename = "internships")]
    Internships,
}

impl JobLevel {
    /// Path segment used by GradConnection and in export file names.
    pub fn slug(self) -> &'static str {
        match self {
            JobLevel::GraduateJobs => "graduate-jobs",
            JobLevel::Internships => "internships",
        }
    }

    /// Search keyword understood by Seek and Prosple.
    pub fn keyword(self) -> &'static str {
        match self {
            JobLevel::GraduateJobs => "graduate",
            JobLevel::Internships => "internship",
        }
    }

    /// Job type reported for GradConnection listings.
    pub fn display_name(self) -> &'static str {
        match self {
            JobLevel::GraduateJobs => "Graduate Job",
            JobLevel::Internships => "Internship",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "graduate-jobs" => Some(JobLevel::GraduateJobs),
            "internships" => Some(JobLevel::Internships),
            _ => None,
        }
    }
}

/// Which sources a live search runs.
///
/// Prosple is never part of a live search: `prosple` and `all` are coerced to
/// [`SourceSelection::Both`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelection {
    GradConnection,
    Seek,
    Both,
}

impl SourceSelection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "gradconnection" => Some(SourceSelection::GradConnection),
            "seek" => Some(SourceSelection::Seek),
            "both" | "all" | "prosple" => Some(SourceSelection::Both),
            _ => None,
        }
    }

    /// Sources in the order they run.
    pub fn sources(self) -> &'static [Source] {
        match self {
            SourceSelection::GradConnection => &[Source::GradConnection],
            SourceSelection::Seek => &[Source::Seek],
            SourceSelection::Both => &[Source::GradConnection, Source::Seek],
        }
    }
}

/// Body of a search request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchRequest {
    #[serde(default)]
    pub job_level: JobLevel,
    #[serde(default = "default_discipline")]
    pub discipline: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_source")]
    pub source: String,
}

impl SearchRequest {
    pub fn selection(&self) -> Option<SourceSelection> {
        SourceSelection::parse(&self.source)
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            job_level: JobLevel::default(),
            discipline: default_discipline(),
            location: default_location(),
            source: default_source(),
        }
    }
}

fn default_discipline() -> String {
    "computer-science".to_string()
}

fn default_location() -> String {
    "australia".to_string()
}

fn default_source() -> String {
    "both".to_string()
}
