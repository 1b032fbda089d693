use std::str::FromStr;
use thiserror::Error;

/// Deployment coordinates of the running instance, parsed from the
/// `projects/<projectNumber>/regions/<region>` path the metadata endpoint
/// answers on the region query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstancePlacement {
    pub project_number: String,
    pub region: String,
}

#[derive(Error, Debug, PartialEq)]
pub enum PlacementParseError {
    #[error("expected at least 4 slash-delimited segments in `{0}`")]
    NotEnoughSegments(String),
    #[error("empty {field} segment in `{path}`")]
    EmptySegment { field: &'static str, path: String },
}

impl FromStr for InstancePlacement {
    type Err = PlacementParseError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = path.split('/').collect();
        // Segments 1 and 3 are the load-bearing ones, anything after is ignored.
        if segments.len() < 4 {
            return Err(PlacementParseError::NotEnoughSegments(path.to_string()));
        }
        let project_number = segments[1];
        let region = segments[3];
        if project_number.is_empty() {
            return Err(PlacementParseError::EmptySegment {
                field: "project number",
                path: path.to_string(),
            });
        }
        if region.is_empty() {
            return Err(PlacementParseError::EmptySegment {
                field: "region",
                path: path.to_string(),
            });
        }
        Ok(Self {
            project_number: project_number.to_string(),
            region: region.to_string(),
        })
    }
}
