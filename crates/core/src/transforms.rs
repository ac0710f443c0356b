use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::CitationsConfig;

/// One content-transform step, resolved from its pipeline identifier.
///
/// The pipeline in site.toml names transforms by string; every name must map
/// to a variant here or configuration assembly fails. Variants that need
/// configuration carry their payload so nothing is looked up again later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    /// Tables, strikethrough, task lists, footnotes, and alert blockquotes
    Gfm,
    /// `term\n: definition` lists
    DefinitionLists,
    /// Curly quotes, en/em dashes, ellipses
    SmartPunctuation,
    /// `$...$` and `$$...$$` wrapped as KaTeX-ready spans
    Math,
    /// Slug ids on headings that carry none
    HeadingIds,
    /// Anchor links appended inside headings; requires heading ids
    AutolinkHeadings,
    /// `[@key]` markers resolved against a bibliography
    Citations(CitationsConfig),
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match self {
            Transform::Gfm => "gfm",
            Transform::DefinitionLists => "definition-lists",
            Transform::SmartPunctuation => "smart-punctuation",
            Transform::Math => "math",
            Transform::HeadingIds => "heading-ids",
            Transform::AutolinkHeadings => "autolink-headings",
            Transform::Citations(_) => "citations",
        }
    }
}

/// Resolve an ordered list of transform identifiers into transforms.
///
/// Fails on an empty pipeline, an unknown identifier, a duplicate entry,
/// `citations` without a `[citations]` table to draw its payload from, or
/// `autolink-headings` appearing before `heading-ids` (anchors need ids to
/// point at, and the chain is applied strictly left to right).
pub fn resolve_pipeline(
    names: &[String],
    citations: Option<&CitationsConfig>,
) -> Result<Vec<Transform>> {
    if names.is_empty() {
        return Err(Error::ConfigParse(
            "Transform pipeline must not be empty".to_string(),
        ));
    }

    let mut resolved: Vec<Transform> = Vec::with_capacity(names.len());

    for name in names {
        let transform = match name.as_str() {
            "gfm" => Transform::Gfm,
            "definition-lists" => Transform::DefinitionLists,
            "smart-punctuation" => Transform::SmartPunctuation,
            "math" => Transform::Math,
            "heading-ids" => Transform::HeadingIds,
            "autolink-headings" => Transform::AutolinkHeadings,
            "citations" => match citations {
                Some(config) => Transform::Citations(config.clone()),
                None => {
                    return Err(Error::ConfigParse(
                        "Pipeline names 'citations' but no [citations] table is configured"
                            .to_string(),
                    ));
                }
            },
            unknown => return Err(Error::UnknownTransform(unknown.to_string())),
        };

        if resolved.iter().any(|t| t.name() == transform.name()) {
            return Err(Error::ConfigParse(format!(
                "Duplicate transform '{}' in pipeline",
                transform.name()
            )));
        }

        if matches!(transform, Transform::AutolinkHeadings)
            && !resolved.iter().any(|t| matches!(t, Transform::HeadingIds))
        {
            return Err(Error::ConfigParse(
                "'autolink-headings' requires 'heading-ids' earlier in the pipeline".to_string(),
            ));
        }

        resolved.push(transform);
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn citations_config() -> CitationsConfig {
        CitationsConfig {
            bibliography: PathBuf::from("references.bib"),
            style: PathBuf::from("operations-research.csl"),
        }
    }

    #[test]
    fn test_resolve_full_pipeline() {
        let config = citations_config();
        let resolved = resolve_pipeline(
            &names(&[
                "gfm",
                "definition-lists",
                "heading-ids",
                "smart-punctuation",
                "math",
                "autolink-headings",
                "citations",
            ]),
            Some(&config),
        )
        .unwrap();

        assert_eq!(resolved.len(), 7);
        assert_eq!(resolved[0], Transform::Gfm);
        assert_eq!(resolved[6], Transform::Citations(config));
    }

    #[test]
    fn test_resolve_preserves_order() {
        let resolved =
            resolve_pipeline(&names(&["smart-punctuation", "gfm"]), None).unwrap();
        assert_eq!(resolved[0], Transform::SmartPunctuation);
        assert_eq!(resolved[1], Transform::Gfm);
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let result = resolve_pipeline(&[], None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("must not be empty"));
    }

    #[test]
    fn test_unknown_transform_rejected() {
        let result = resolve_pipeline(&names(&["gfm", "mermaid"]), None);
        assert!(matches!(result, Err(Error::UnknownTransform(ref n)) if n == "mermaid"));
    }

    #[test]
    fn test_duplicate_transform_rejected() {
        let result = resolve_pipeline(&names(&["gfm", "math", "gfm"]), None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate transform"));
    }

    #[test]
    fn test_autolink_requires_heading_ids_first() {
        let result = resolve_pipeline(&names(&["autolink-headings", "heading-ids"]), None);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("requires 'heading-ids'")
        );

        assert!(resolve_pipeline(&names(&["heading-ids", "autolink-headings"]), None).is_ok());
    }

    #[test]
    fn test_citations_requires_payload() {
        let result = resolve_pipeline(&names(&["citations"]), None);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("no [citations] table")
        );

        let config = citations_config();
        let resolved = resolve_pipeline(&names(&["citations"]), Some(&config)).unwrap();
        assert_eq!(resolved, vec![Transform::Citations(config)]);
    }
}
