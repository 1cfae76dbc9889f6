//! Output formatting for the manifest command.

use super::execute::ManifestResult;
use crate::output::Outputable;

impl Outputable for ManifestResult {
    fn to_text(&self) -> String {
        self.text.trim_end().to_string()
    }
}
