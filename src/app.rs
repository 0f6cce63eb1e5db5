use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use serde::Serialize;

use crate::collector;
use crate::config::ResolvedConfig;
use crate::document::{IsaDocument, MetadataNode};
use crate::error::IsaError;
use crate::filter::Filter;
use crate::matcher::{self, MatchResult};
use crate::table::{ConverterRegistry, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AttachMode {
    #[default]
    Attribute,
    Column,
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: IsaDocument,
    pub path: Utf8PathBuf,
    pub data_dir: Utf8PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectedValues<'a> {
    pub study_identifier: Option<&'a str>,
    pub assay_index: usize,
    pub values: Vec<&'a MetadataNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterializedTable {
    pub study_identifier: Option<String>,
    pub file_type: String,
    pub path: PathBuf,
    pub table: Table,
}

pub struct App {
    registry: ConverterRegistry,
    data_root: Option<Utf8PathBuf>,
}

impl App {
    pub fn new(registry: ConverterRegistry, data_root: Option<Utf8PathBuf>) -> Self {
        Self {
            registry,
            data_root,
        }
    }

    pub fn from_config(config: &ResolvedConfig, registry: ConverterRegistry) -> Self {
        Self::new(registry, config.data_root.clone())
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Load a document. Relative data file names resolve against the
    /// configured data root, or else the document's own directory.
    pub fn load(&self, path: &Utf8Path) -> Result<LoadedDocument, IsaError> {
        let document = IsaDocument::load(path.as_std_path())?;
        let data_dir = match &self.data_root {
            Some(root) => root.clone(),
            None => path
                .parent()
                .map(Utf8Path::to_path_buf)
                .unwrap_or_default(),
        };
        Ok(LoadedDocument {
            document,
            path: path.to_path_buf(),
            data_dir,
        })
    }

    pub fn find<'a>(
        &self,
        loaded: &'a LoadedDocument,
        filter: &Filter,
    ) -> Result<Vec<MatchResult<'a>>, IsaError> {
        matcher::find_matches(&loaded.document, filter)
    }

    pub fn collect<'a>(
        &self,
        loaded: &'a LoadedDocument,
        filter: &Filter,
        field: &str,
    ) -> Result<Vec<CollectedValues<'a>>, IsaError> {
        let collected = matcher::matching_assays(&loaded.document, filter)?
            .into_iter()
            .map(|found| CollectedValues {
                study_identifier: found.study.identifier(),
                assay_index: found.assay_index,
                values: collector::collect(found.assay.node(), field),
            })
            .collect();
        Ok(collected)
    }

    pub fn resolve_path(&self, loaded: &LoadedDocument, name: &str) -> PathBuf {
        let name = Utf8Path::new(name);
        if name.is_absolute() {
            name.as_std_path().to_path_buf()
        } else {
            loaded.data_dir.join(name).into_std_path_buf()
        }
    }

    pub fn materialize(
        &self,
        loaded: &LoadedDocument,
        result: &MatchResult<'_>,
    ) -> Result<MaterializedTable, IsaError> {
        let path = self.resolve_path(loaded, &result.data_file.name);
        let table = self.registry.materialize_at(&result.data_file, &path)?;
        tracing::info!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.columns().len(),
            "materialized table"
        );
        Ok(MaterializedTable {
            study_identifier: result.study_identifier.map(str::to_string),
            file_type: result.data_file.file_type.clone(),
            path,
            table,
        })
    }

    pub fn materialize_annotated(
        &self,
        loaded: &LoadedDocument,
        result: &MatchResult<'_>,
        fields: &[String],
        mode: AttachMode,
    ) -> Result<MaterializedTable, IsaError> {
        let mut materialized = self.materialize(loaded, result)?;
        for field in fields {
            attach_metadata(&mut materialized.table, result.assay, field, mode)?;
        }
        Ok(materialized)
    }
}

/// Attach the first scalar value of `field` found in `assay` to `table`.
pub fn attach_metadata(
    table: &mut Table,
    assay: &MetadataNode,
    field: &str,
    mode: AttachMode,
) -> Result<(), IsaError> {
    let value = collector::collect_scalars(assay, field)
        .into_iter()
        .next()
        .cloned()
        .ok_or_else(|| IsaError::FieldNotFound(field.to_string()))?;
    match mode {
        AttachMode::Attribute => table.attach_attribute(field, value),
        AttachMode::Column => table.attach_column(field, &value)?,
    }
    Ok(())
}
