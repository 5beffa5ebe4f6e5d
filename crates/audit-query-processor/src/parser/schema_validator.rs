//! Enforces enumerations, patterns, and numeric bounds after
//! normalization and field mapping. Failures here become
//! `normalization_failed` at the orchestrator.

use crate::domain::query::StructuredQuery;

#[derive(Debug, Clone)]
pub struct SchemaError(pub String);

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SchemaError {}

pub struct SchemaValidator {
    pub verb_allow_list: Vec<String>,
    pub min_limit: u32,
    pub max_limit: u32,
}

impl SchemaValidator {
    pub fn check(&self, query: &StructuredQuery) -> Result<(), SchemaError> {
        if let Some(limit) = query.limit {
            if limit < self.min_limit || limit > self.max_limit {
                return Err(SchemaError(format!(
                    "limit {limit} out of bounds [{}, {}]",
                    self.min_limit, self.max_limit
                )));
            }
        }

        if let Some(verb) = &query.verb {
            for v in verb.as_list() {
                if !self.verb_allow_list.iter().any(|allowed| allowed == v) {
                    return Err(SchemaError(format!("verb '{v}' not in allowed verb set")));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::OneOrMany;

    fn validator() -> SchemaValidator {
        SchemaValidator { verb_allow_list: vec!["get".into(), "delete".into()], min_limit: 1, max_limit: 1000 }
    }

    #[test]
    fn rejects_out_of_bounds_limit() {
        let mut q = StructuredQuery::default();
        q.limit = Some(5000);
        assert!(validator().check(&q).is_err());
    }

    #[test]
    fn rejects_disallowed_verb() {
        let mut q = StructuredQuery::default();
        q.verb = Some(OneOrMany::Scalar("exec".into()));
        assert!(validator().check(&q).is_err());
    }

    #[test]
    fn accepts_valid_query() {
        let mut q = StructuredQuery::default();
        q.limit = Some(20);
        q.verb = Some(OneOrMany::Scalar("delete".into()));
        assert!(validator().check(&q).is_ok());
    }
}
