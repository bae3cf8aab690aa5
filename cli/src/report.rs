//! # Report
//!
//! What a command prints: either the normalized result (optionally enriched
//! and with request templates) or a synthesized OpenAPI document.

use apinorm_core::{enrich, request_templates, ExtractionResult, PlaceholderEnricher};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

use crate::error::CliResult;
use crate::settings::GlobalArgs;

/// Command output, printed as JSON on stdout.
#[derive(Debug)]
pub enum Report {
    /// A normalized extraction result.
    Result(ExtractionResult),
    /// A synthesized OpenAPI document.
    Document(Value),
}

#[derive(Serialize)]
struct ResultOutput<'a> {
    #[serde(flatten)]
    result: &'a ExtractionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    templates: Option<Vec<apinorm_core::RequestTemplate>>,
}

impl Report {
    /// Renders the report according to the global flags.
    pub fn render(self, global: &GlobalArgs) -> CliResult<Value> {
        match self {
            Report::Document(doc) => Ok(doc),
            Report::Result(result) => {
                let result = if global.describe {
                    enrich(&result, &PlaceholderEnricher)
                } else {
                    result
                };
                let templates = global.templates.as_deref().map(|base| {
                    let base = Some(base).filter(|b| !b.is_empty());
                    request_templates(&result, base)
                });
                Ok(serde_json::to_value(ResultOutput {
                    result: &result,
                    templates,
                })?)
            }
        }
    }

    /// Writes the rendered report to stdout.
    pub fn print(self, global: &GlobalArgs) -> CliResult<()> {
        let compact = global.compact;
        let value = self.render(global)?;
        let text = if compact {
            serde_json::to_string(&value)?
        } else {
            serde_json::to_string_pretty(&value)?
        };
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apinorm_core::extract_curl;

    #[test]
    fn test_templates_and_descriptions() {
        let result = extract_curl("curl -X POST https://api.x.com/users -d '{\"name\":\"a\"}'").unwrap();
        let global = GlobalArgs {
            templates: Some(String::new()),
            describe: true,
            ..GlobalArgs::default()
        };

        let value = Report::Result(result).render(&global).unwrap();

        assert_eq!(value["endpoints"][0]["description"], "POST /users. Accepts a application/json body.");
        assert_eq!(value["templates"][0]["url"], "https://api.x.com/users");
        assert_eq!(value["templates"][0]["body"]["name"], "a");
    }

    #[test]
    fn test_plain_result_has_no_templates() {
        let result = extract_curl("curl https://api.x.com/items").unwrap();
        let value = Report::Result(result).render(&GlobalArgs::default()).unwrap();
        assert!(value.get("templates").is_none());
        assert_eq!(value["endpoints"][0]["method"], "GET");
    }
}
