//! Names of the shared `dms` infrastructure objects.
//!
//! Passed explicitly to the pipeline and every emitter so tests (and
//! deployments) can relocate the core schema.

use super::definition::{DbColumnName, DbSchemaName, DbTableName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreSchemaNames {
    pub schema: DbSchemaName,
    pub document: String,
    pub descriptor: String,
    pub resource_key: String,
    pub effective_schema: String,
    pub schema_component: String,
    pub referential_identity: String,
    pub change_version_sequence: String,
    pub uuidv5_function: String,
}

impl Default for CoreSchemaNames {
    fn default() -> Self {
        Self::with_schema("dms")
    }
}

impl CoreSchemaNames {
    /// Default object names inside a custom schema.
    pub fn with_schema(schema: &str) -> Self {
        Self {
            schema: DbSchemaName::new(schema),
            document: "Document".to_string(),
            descriptor: "Descriptor".to_string(),
            resource_key: "ResourceKey".to_string(),
            effective_schema: "EffectiveSchema".to_string(),
            schema_component: "SchemaComponent".to_string(),
            referential_identity: "ReferentialIdentity".to_string(),
            change_version_sequence: "ChangeVersionSequence".to_string(),
            uuidv5_function: "uuidv5".to_string(),
        }
    }

    fn table(&self, name: &str) -> DbTableName {
        DbTableName::new(self.schema.clone(), name)
    }

    pub fn document_table(&self) -> DbTableName {
        self.table(&self.document)
    }

    pub fn descriptor_table(&self) -> DbTableName {
        self.table(&self.descriptor)
    }

    pub fn resource_key_table(&self) -> DbTableName {
        self.table(&self.resource_key)
    }

    pub fn effective_schema_table(&self) -> DbTableName {
        self.table(&self.effective_schema)
    }

    pub fn schema_component_table(&self) -> DbTableName {
        self.table(&self.schema_component)
    }

    pub fn referential_identity_table(&self) -> DbTableName {
        self.table(&self.referential_identity)
    }

    /// Key column of `Document`, and of every table keyed by a document.
    pub fn document_id_column(&self) -> DbColumnName {
        DbColumnName::new("DocumentId")
    }

    /// `Document` column bumped from the change-version sequence on every write.
    pub fn content_version_column(&self) -> DbColumnName {
        DbColumnName::new("ContentVersion")
    }

    pub fn content_last_modified_column(&self) -> DbColumnName {
        DbColumnName::new("ContentLastModifiedAt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_default_schema_is_dms() {
        let names = CoreSchemaNames::default();
        assert_eq!(names.descriptor_table().to_string(), "dms.Descriptor");
        assert_eq!(names.document_table().to_string(), "dms.Document");
    }

    #[rstest]
    fn test_custom_schema_is_normalized() {
        let names = CoreSchemaNames::with_schema("Core-Infra");
        assert_eq!(names.resource_key_table().to_string(), "coreinfra.ResourceKey");
    }
}
