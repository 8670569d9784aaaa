//! ExtractionPlan - compiled form of a task's parse string

use std::collections::BTreeMap;

use contracts::{ContractError, ExtractedSample, MessageRecord, Number, SampleError};
use tracing::debug;

use crate::cast::to_number;
use crate::directive::{rewrite, DirectiveMode, FieldDirective};
use crate::error::CompileError;
use crate::expr::Expression;
use crate::path::FieldPath;

/// One declared field and the placeholder it feeds, if any
#[derive(Debug, Clone)]
struct PlannedField {
    directive: FieldDirective,
    placeholder: Option<usize>,
}

/// Compiled extraction plan
///
/// Built once per task. Fields are kept in declared order; fields the parse
/// string never mentions are still resolved natively and recorded.
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    task_id: String,
    fields: Vec<PlannedField>,
    expression: Expression,
    placeholder_count: usize,
}

impl ExtractionPlan {
    /// Compile `parse_string` against the declared field names
    ///
    /// # Errors
    /// `ContractError::Config` for any directive, path or expression error.
    pub fn compile(
        task_id: &str,
        field_names: &[String],
        parse_string: &str,
    ) -> Result<Self, ContractError> {
        Self::compile_inner(field_names, parse_string)
            .map(|(fields, expression, placeholder_count)| Self {
                task_id: task_id.to_string(),
                fields,
                expression,
                placeholder_count,
            })
            .map_err(|e| ContractError::config(task_id, e.to_string()))
            .inspect(|plan| {
                debug!(
                    task_id,
                    fields = plan.fields.len(),
                    residual = %plan.expression,
                    "Extraction plan compiled"
                );
            })
    }

    fn compile_inner(
        field_names: &[String],
        parse_string: &str,
    ) -> crate::Result<(Vec<PlannedField>, Expression, usize)> {
        let (bindings, residual) = rewrite(parse_string, field_names)?;
        let expression = Expression::parse(&residual)?;

        let mut fields = Vec::with_capacity(field_names.len());
        for name in field_names {
            if fields
                .iter()
                .any(|f: &PlannedField| f.directive.path.as_str() == name)
            {
                return Err(CompileError::InvalidFieldPath {
                    path: name.clone(),
                    reason: "declared more than once".to_string(),
                });
            }
            let path = FieldPath::parse(name)?;
            let placeholder = bindings.iter().position(|b| &b.field == name);
            let mode = placeholder
                .map(|k| bindings[k].mode)
                .unwrap_or(DirectiveMode::Native);
            fields.push(PlannedField {
                directive: FieldDirective::new(path, mode),
                placeholder,
            });
        }

        Ok((fields, expression, bindings.len()))
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Residual expression with `$k` placeholders
    pub fn residual(&self) -> &Expression {
        &self.expression
    }

    /// Directive compiled for a declared field
    pub fn directive(&self, path: &str) -> Option<&FieldDirective> {
        self.fields
            .iter()
            .map(|f| &f.directive)
            .find(|d| d.path.as_str() == path)
    }

    /// Declared field paths in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.directive.path.as_str())
    }

    /// Declared fields the parse string never references
    pub fn unreferenced_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.placeholder.is_none())
            .map(|f| f.directive.path.as_str())
    }

    /// Extract one sample from a message
    ///
    /// # Errors
    /// Any `SampleError`; the caller drops the sample and keeps going.
    pub fn extract(&self, message: &MessageRecord) -> Result<ExtractedSample, SampleError> {
        let mut values = BTreeMap::new();
        let mut vars = vec![Number::Int(0); self.placeholder_count];

        for field in &self.fields {
            let value = field.directive.apply(&message.payload)?;
            if let Some(k) = field.placeholder {
                vars[k] = to_number(field.directive.path.as_str(), &value)?;
            }
            values.insert(field.directive.path.as_str().to_string(), value);
        }

        let computed_value = self.expression.evaluate(&vars)?;
        Ok(ExtractedSample {
            timestamp: message.timestamp,
            values,
            computed_value,
        })
    }
}
