use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use isa_dataset_finder::app::{App, AttachMode, attach_metadata};
use isa_dataset_finder::document::{MetadataNode, Scalar};
use isa_dataset_finder::error::IsaError;
use isa_dataset_finder::filter::Filter;
use isa_dataset_finder::output::render_rows;
use isa_dataset_finder::table::{ColumnValues, ConverterRegistry, Table};

fn fixture_app() -> App {
    App::new(ConverterRegistry::with_defaults(), None)
}

fn fixture_path() -> Utf8PathBuf {
    Utf8PathBuf::from("tests/fixtures/rdf_metadata.json")
}

#[test]
fn finds_and_materializes_fixture_rdf_files() {
    let app = fixture_app();
    let loaded = app.load(&fixture_path()).unwrap();
    assert_eq!(loaded.data_dir, Utf8PathBuf::from("tests/fixtures"));

    let filter = Filter::new().with("annotationValue", "Simulated RDF");
    let results = app.find(&loaded, &filter).unwrap();
    assert_eq!(results.len(), 2);

    let tables = results
        .iter()
        .map(|result| app.materialize(&loaded, result))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(tables[0].table.row_count(), 3);
    // rdf_o_h.txt has a glued `#r` header and a leading index token per row.
    assert_eq!(tables[1].table.column_names(), vec!["r", "g(r)", "n(r)"]);
    assert_eq!(
        tables[1].table.column("r").unwrap().values,
        ColumnValues::Float(vec![0.2, 0.4])
    );
    assert_eq!(
        tables[1].table.column("g(r)").unwrap().values,
        ColumnValues::Float(vec![1.4, 1.1])
    );
    assert_eq!(tables[0].study_identifier.as_deref(), Some("study-rdf"));
}

#[test]
fn data_root_overrides_document_directory() {
    let app = App::new(
        ConverterRegistry::with_defaults(),
        Some(Utf8PathBuf::from("elsewhere")),
    );
    let loaded = app.load(&fixture_path()).unwrap();
    let path = app.resolve_path(&loaded, "rdf_na_o.txt");
    assert_eq!(path, std::path::PathBuf::from("elsewhere/rdf_na_o.txt"));

    let results = app
        .find(&loaded, &Filter::new().with("annotationValue", "Simulated RDF"))
        .unwrap();
    let err = app.materialize(&loaded, &results[0]).unwrap_err();
    assert_matches!(err, IsaError::DataFileRead { .. });
}

#[test]
fn collect_reports_values_per_matching_assay() {
    let app = fixture_app();
    let loaded = app.load(&fixture_path()).unwrap();
    let collected = app
        .collect(&loaded, &Filter::new(), "annotationValue")
        .unwrap();

    assert_eq!(collected.len(), 2);
    assert_eq!(collected[0].study_identifier, Some("study-rdf"));
    assert_eq!(collected[0].assay_index, 0);
    assert_eq!(
        collected[1].values,
        vec![&MetadataNode::Scalar(Scalar::from("Other"))]
    );
}

#[test]
fn annotated_table_carries_assay_fields() {
    let app = fixture_app();
    let loaded = app.load(&fixture_path()).unwrap();
    let results = app
        .find(&loaded, &Filter::new().with("annotationValue", "Simulated RDF"))
        .unwrap();

    let fields = vec!["annotationValue".to_string(), "filename".to_string()];
    let as_attributes = app
        .materialize_annotated(&loaded, &results[0], &fields, AttachMode::Attribute)
        .unwrap();
    assert_eq!(
        as_attributes.table.attributes().get("filename"),
        Some(&Scalar::from("a_rdf.txt"))
    );

    let as_columns = app
        .materialize_annotated(&loaded, &results[0], &fields, AttachMode::Column)
        .unwrap();
    assert_eq!(
        as_columns.table.column_names(),
        vec!["r", "g(r)", "n(r)", "annotationValue", "filename"]
    );
}

#[test]
fn attaching_missing_field_fails() {
    let mut table = Table::default();
    let assay = MetadataNode::Record(vec![]);
    let err = attach_metadata(&mut table, &assay, "absent", AttachMode::Column).unwrap_err();
    assert_matches!(err, IsaError::FieldNotFound(_));
}

#[test]
fn attaching_column_over_data_column_fails() {
    let app = fixture_app();
    let loaded = app.load(&fixture_path()).unwrap();
    let results = app.find(&loaded, &Filter::new()).unwrap();
    let mut materialized = app.materialize(&loaded, &results[0]).unwrap();
    let assay = MetadataNode::Record(vec![("r".to_string(), Scalar::Integer(7).into())]);

    let err = attach_metadata(&mut materialized.table, &assay, "r", AttachMode::Column).unwrap_err();
    assert_matches!(err, IsaError::ColumnExists(name) if name == "r");
    assert_eq!(
        materialized.table.column("r").unwrap().values,
        ColumnValues::Float(vec![0.5, 1.0, 1.5])
    );
}

#[test]
fn render_rows_truncates() {
    let app = fixture_app();
    let loaded = app.load(&fixture_path()).unwrap();
    let results = app.find(&loaded, &Filter::new()).unwrap();
    let materialized = app.materialize(&loaded, &results[0]).unwrap();

    let rendered = render_rows(&materialized.table, 1);
    let lines: Vec<_> = rendered.lines().collect();
    assert_eq!(lines[0], "r\tg(r)\tn(r)");
    assert_eq!(lines[1], "0.5\t0\t0");
    assert_eq!(lines[2], "... 2 more rows");
}
