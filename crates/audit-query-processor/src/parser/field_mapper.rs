//! Canonicalizes known verb and resource aliases so the safety
//! validator's whitelists only ever need to carry canonical forms.

use crate::domain::query::{OneOrMany, StructuredQuery};

fn canonical_verb(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "deleted" | "remove" | "removed" | "destroy" => "delete".to_string(),
        "created" | "add" | "added" => "create".to_string(),
        "updated" | "modify" | "modified" | "change" | "changed" => "update".to_string(),
        "fetched" | "read" | "got" => "get".to_string(),
        "listed" => "list".to_string(),
        "watched" => "watch".to_string(),
        other => other.to_string(),
    }
}

fn canonical_resource(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "pod" => "pods".to_string(),
        "service" | "svc" => "services".to_string(),
        "deployment" | "deploy" => "deployments".to_string(),
        "configmap" | "cm" => "configmaps".to_string(),
        "secret" => "secrets".to_string(),
        "namespace" | "ns" => "namespaces".to_string(),
        "crd" | "customresourcedefinition" => "customresourcedefinitions".to_string(),
        "role" => "roles".to_string(),
        "rolebinding" => "rolebindings".to_string(),
        other => other.to_string(),
    }
}

pub fn map_fields(mut query: StructuredQuery) -> StructuredQuery {
    query.verb = query.verb.map(|v| map_one_or_many(v, canonical_verb));
    query.resource = query.resource.map(|r| map_one_or_many(r, canonical_resource));
    query
}

fn map_one_or_many(field: OneOrMany, f: impl Fn(&str) -> String) -> OneOrMany {
    field.map_strings(|s| f(&s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_verb_synonym() {
        let mut q = StructuredQuery::default();
        q.verb = Some(OneOrMany::Scalar("deleted".into()));
        let mapped = map_fields(q);
        assert_eq!(mapped.verb.unwrap().first().unwrap(), "delete");
    }

    #[test]
    fn canonicalizes_resource_alias() {
        let mut q = StructuredQuery::default();
        q.resource = Some(OneOrMany::Scalar("pod".into()));
        let mapped = map_fields(q);
        assert_eq!(mapped.resource.unwrap().first().unwrap(), "pods");
    }

    #[test]
    fn leaves_unknown_verb_unchanged() {
        let mut q = StructuredQuery::default();
        q.verb = Some(OneOrMany::Scalar("patch".into()));
        let mapped = map_fields(q);
        assert_eq!(mapped.verb.unwrap().first().unwrap(), "patch");
    }
}
