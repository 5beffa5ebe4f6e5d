//! Applies defaults, trims strings, and coerces single-element lists
//! to scalars on a freshly-extracted `StructuredQuery`.

use crate::domain::query::{OneOrMany, StructuredQuery};

pub fn normalize(mut query: StructuredQuery, default_limit: u32) -> StructuredQuery {
    query.limit = match query.limit {
        Some(n) if n > 0 => Some(n),
        _ => Some(default_limit),
    };

    query.log_source = query.log_source.map(|s| s.trim().to_string());
    query.timeframe = query.timeframe.map(|s| s.trim().to_string());
    query.response_status = query.response_status.map(|s| s.trim().to_string());
    query.resource_name_pattern = query.resource_name_pattern.map(|s| s.trim().to_string());
    query.source_ip = query.source_ip.map(|s| s.trim().to_string());

    query.verb = query.verb.map(trim_and_coerce);
    query.resource = query.resource.map(trim_and_coerce);
    query.namespace = query.namespace.map(trim_and_coerce);
    query.user = query.user.map(trim_and_coerce);

    query.exclude_users = query.exclude_users.into_iter().map(|s| s.trim().to_string()).collect();
    query.group_by = query.group_by.into_iter().map(|s| s.trim().to_string()).collect();

    query
}

fn trim_and_coerce(field: OneOrMany) -> OneOrMany {
    field.map_strings(|s| s.trim().to_string()).coerce_single_element_list()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_default_limit_when_missing() {
        let q = StructuredQuery::default();
        let normalized = normalize(q, 20);
        assert_eq!(normalized.limit, Some(20));
    }

    #[test]
    fn applies_default_limit_when_non_positive() {
        let mut q = StructuredQuery::default();
        q.limit = Some(0);
        let normalized = normalize(q, 20);
        assert_eq!(normalized.limit, Some(20));
    }

    #[test]
    fn trims_and_coerces_single_element_verb_list() {
        let mut q = StructuredQuery::default();
        q.verb = Some(OneOrMany::List(vec![" delete ".to_string()]));
        let normalized = normalize(q, 20);
        assert_eq!(normalized.verb.unwrap(), OneOrMany::Scalar("delete".to_string()));
    }
}
