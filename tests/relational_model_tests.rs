//! End-to-end tests over the public API: ApiSchema document in, model,
//! manifest and SQL out.

use relational_model::model::{
    ColumnKind, CoreSchemaNames, DbColumnName, ModelError, RelationalModelBuildResult, RelationalModelBuilderContext,
    RelationalModelBuilderPipeline, RelationalModelManifestEmitter,
};
use relational_model::query::{
    PageDocumentIdQuerySpec, PageDocumentIdSqlCompiler, QueryComparisonOperator, QueryValuePredicate,
    ToyInsertSqlEmitter,
};
use relational_model::sql::{
    CoreDdlEmitter, DerivedRelationalModelSet, RelationalModelDdlEmitter, SeedData, SeedDmlEmitter,
    SqlDialectFactory, SqlDialectKind,
};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

fn student_schema(first_name: Value) -> Value {
    json!({
        "apiSchemaVersion": "1.0.0",
        "projectSchema": {
            "projectName": "Ed-Fi",
            "projectEndpointName": "ed-fi",
            "projectVersion": "5.0.0",
            "isExtensionProject": false,
            "resourceSchemas": {
                "students": {
                    "resourceName": "Student",
                    "isDescriptor": false,
                    "identityJsonPaths": ["$.studentUniqueId"],
                    "documentPathsMapping": {},
                    "jsonSchemaForInsert": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["studentUniqueId", "firstName", "birthDate"],
                        "properties": {
                            "studentUniqueId": { "type": "string", "maxLength": 32 },
                            "firstName": first_name,
                            "birthDate": { "type": "string", "format": "date" },
                            "electronicMails": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "required": ["electronicMailAddress"],
                                    "properties": {
                                        "electronicMailAddress": { "type": "string", "maxLength": 128 }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

#[fixture]
fn api_schema() -> Value {
    student_schema(json!({ "type": "string", "maxLength": 75 }))
}

#[fixture]
fn student(api_schema: Value) -> RelationalModelBuildResult {
    RelationalModelBuilderPipeline::standard()
        .run(RelationalModelBuilderContext::new(api_schema, "students"))
        .unwrap()
}

#[rstest]
fn test_pipeline_builds_root_and_collection_tables(student: RelationalModelBuildResult) {
    let model = &student.resource_model;
    assert_eq!(model.physical_schema.as_str(), "edfi");

    let mut names: Vec<_> = model.tables.iter().map(|t| t.table.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Student", "StudentElectronicMail"]);

    let mail = model
        .tables
        .iter()
        .find(|t| t.table.name == "StudentElectronicMail")
        .unwrap();
    let key: Vec<_> = mail.key.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(key, vec!["Student_DocumentId", "Ordinal"]);
    assert_eq!(mail.key.columns[1].kind, ColumnKind::Ordinal);

    let root = model.root_table().unwrap();
    assert!(!root.column(&DbColumnName::new("FirstName")).unwrap().is_nullable);
}

#[rstest]
fn test_write_order_starts_at_root(student: RelationalModelBuildResult) {
    let first = student.resource_model.tables_in_write_order().next().unwrap();
    assert_eq!(first.table.name, "Student");
}

#[rstest]
fn test_unbounded_string_rejected() {
    let api_schema = student_schema(json!({ "type": "string" }));
    let result = RelationalModelBuilderPipeline::standard()
        .run(RelationalModelBuilderContext::new(api_schema, "students"));
    assert!(matches!(result, Err(ModelError::MissingStringMaxLength { .. })));
}

#[rstest]
fn test_manifest_is_stable_json(api_schema: Value, student: RelationalModelBuildResult) {
    let manifest = RelationalModelManifestEmitter::emit(&student);
    assert!(manifest.ends_with('\n'));
    assert!(!manifest.contains('\r'));

    let parsed: Value = serde_json::from_str(&manifest).unwrap();
    assert_eq!(parsed["physical_schema"], "edfi");
    assert_eq!(parsed["resource"]["resource_name"], "Student");

    let rebuilt = RelationalModelBuilderPipeline::standard()
        .run(RelationalModelBuilderContext::new(api_schema, "students"))
        .unwrap();
    assert_eq!(RelationalModelManifestEmitter::emit(&rebuilt), manifest);
}

#[rstest]
#[case(SqlDialectKind::Pgsql, "CREATE TABLE IF NOT EXISTS \"edfi\".\"StudentElectronicMail\"")]
#[case(SqlDialectKind::Mssql, "CREATE TABLE [edfi].[StudentElectronicMail]")]
fn test_resource_ddl_per_dialect(
    student: RelationalModelBuildResult,
    #[case] kind: SqlDialectKind,
    #[case] expected: &str,
) {
    let set = DerivedRelationalModelSet::new(
        SqlDialectFactory::create(kind),
        vec![student.resource_model],
    );
    let sql = RelationalModelDdlEmitter::emit(&set);
    assert!(sql.contains(expected));
    assert_eq!(sql, RelationalModelDdlEmitter::emit(&set));
}

#[rstest]
fn test_core_ddl_and_seed_share_core_schema(api_schema: Value) {
    let names = CoreSchemaNames::default();
    let dialect = SqlDialectFactory::create(SqlDialectKind::Pgsql);

    let core = CoreDdlEmitter::new(dialect).emit(&names);
    assert!(core.contains("CREATE SCHEMA IF NOT EXISTS \"dms\";"));

    let seed = SeedData::from_api_schemas(&[api_schema], "ab12").unwrap();
    assert_eq!(seed.resource_keys.len(), 1);
    assert_eq!(seed.resource_keys[0].id, 1);
    assert_eq!(seed.resource_keys[0].resource_name, "Student");

    let dml = SeedDmlEmitter::new(dialect).emit(&seed, &names);
    assert!(dml.contains("ResourceKey row count mismatch"));
    assert!(dml.contains("EffectiveSchema content mismatch"));
}

#[rstest]
fn test_queries_against_built_root_table(student: RelationalModelBuildResult) {
    let root = student.resource_model.root_table().unwrap().table.clone();
    let dialect = SqlDialectFactory::create(SqlDialectKind::Mssql);

    let mut spec = PageDocumentIdQuerySpec::new(root.clone());
    spec.predicates.push(QueryValuePredicate {
        column: DbColumnName::new("StudentUniqueId"),
        operator: QueryComparisonOperator::Equal,
        parameter_name: "studentUniqueId".to_string(),
    });
    let page = PageDocumentIdSqlCompiler::new(dialect).compile(&spec).unwrap();
    assert!(page.page_sql.contains("FROM [edfi].[Student] r"));
    assert!(page.page_sql.contains("WHERE r.[StudentUniqueId] = @studentUniqueId"));
    assert!(page.total_count_sql.is_none());

    let insert = ToyInsertSqlEmitter::new(dialect)
        .emit(
            &root,
            &[DbColumnName::new("DocumentId"), DbColumnName::new("StudentUniqueId")],
            &["documentId", "studentUniqueId"],
        )
        .unwrap();
    assert!(insert.starts_with("INSERT INTO [edfi].[Student]\n(\n"));
    assert!(insert.contains("    @studentUniqueId\n);"));
}
