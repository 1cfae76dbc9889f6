use std::error::Error;

use serde::Serialize;
use serde_json::Value;

use super::ManifestCmd;
use crate::commands::{Execute, build_resource, read_api_schema};
use crate::config::ConfigFile;
use crate::model::RelationalModelManifestEmitter;

/// Result of the manifest command execution
#[derive(Debug, Clone, Serialize)]
pub struct ManifestResult {
    pub resource: String,
    pub manifest: Value,
    /// Canonical text as emitted, used for text output
    #[serde(skip)]
    pub text: String,
}

impl Execute for ManifestCmd {
    type Output = ManifestResult;

    fn execute(self, config: &ConfigFile) -> Result<Self::Output, Box<dyn Error>> {
        let api_schema = read_api_schema(&self.api_schema)?;
        let result = build_resource(config, api_schema, &self.resource)?;
        let text = RelationalModelManifestEmitter::emit(&result);
        let manifest = serde_json::from_str(&text)?;
        Ok(ManifestResult {
            resource: self.resource,
            manifest,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::api_schema_file;
    use rstest::rstest;

    #[rstest]
    fn test_manifest_for_resource() {
        let file = api_schema_file();
        let cmd = ManifestCmd {
            api_schema: file.path().to_path_buf(),
            resource: "schools".to_string(),
        };
        let result = cmd.execute(&ConfigFile::default()).unwrap();
        assert_eq!(result.manifest["resource"]["resource_name"], "School");
        assert!(result.text.ends_with("}\n"));
    }

    #[rstest]
    fn test_descriptor_resource_rejected() {
        let file = api_schema_file();
        let cmd = ManifestCmd {
            api_schema: file.path().to_path_buf(),
            resource: "gradeLevelDescriptors".to_string(),
        };
        let err = cmd.execute(&ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("is a descriptor"));
    }

    #[rstest]
    fn test_missing_file_reported() {
        let cmd = ManifestCmd {
            api_schema: "/nonexistent/ApiSchema.json".into(),
            resource: "schools".to_string(),
        };
        let err = cmd.execute(&ConfigFile::default()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read /nonexistent/ApiSchema.json"));
    }
}
