use serde::Serialize;

use crate::document::{AssayView, DataFileRef, IsaDocument, MetadataNode, StudyView};
use crate::error::IsaError;
use crate::filter::Filter;

/// A data file of a matching assay, paired with that assay's metadata.
///
/// Results from the same assay borrow the same record from the document.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult<'a> {
    pub study_identifier: Option<&'a str>,
    pub data_file: DataFileRef,
    pub assay: &'a MetadataNode,
}

/// An assay that passed the filter, together with its study.
#[derive(Debug, Clone, Copy)]
pub struct AssayMatch<'a> {
    /// Position of the assay within its study's `assays` list.
    pub assay_index: usize,
    pub study: StudyView<'a>,
    pub assay: AssayView<'a>,
}

/// Assays in document order whose subtree satisfies every filter entry.
///
/// Each assay is searched on its own subtree only; fields of sibling assays
/// or of the enclosing study never count toward a match.
pub fn matching_assays<'a>(
    document: &'a IsaDocument,
    filter: &Filter,
) -> Result<Vec<AssayMatch<'a>>, IsaError> {
    let mut matches = Vec::new();
    for study in document.studies()? {
        for (index, assay) in study.assays()?.into_iter().enumerate() {
            let accepted = filter.accepts(assay.node());
            tracing::debug!(
                study = study.identifier().unwrap_or("<unnamed>"),
                assay = index,
                accepted,
                "evaluated assay"
            );
            if accepted {
                matches.push(AssayMatch {
                    assay_index: index,
                    study,
                    assay,
                });
            }
        }
    }
    Ok(matches)
}

/// One result per data file of every assay accepted by `filter`.
pub fn find_matches<'a>(
    document: &'a IsaDocument,
    filter: &Filter,
) -> Result<Vec<MatchResult<'a>>, IsaError> {
    let mut results = Vec::new();
    for AssayMatch { study, assay, .. } in matching_assays(document, filter)? {
        for data_file in assay.data_files()? {
            results.push(MatchResult {
                study_identifier: study.identifier(),
                data_file,
                assay: assay.node(),
            });
        }
    }
    tracing::info!(filter = %filter, results = results.len(), "matched data files");
    Ok(results)
}
