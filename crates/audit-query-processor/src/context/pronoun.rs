//! Deterministic whole-word pronoun substitution against a session's
//! resolved references.

use std::collections::HashMap;

use crate::context::session::{ReferenceType, ResolvedReference};

struct Rule {
    triggers: &'static [&'static str],
    reference: &'static str,
}

fn rules(crd_acronym: &str) -> Vec<Rule> {
    vec![
        Rule {
            triggers: &["he", "she", "that user", "the user", "this user", "the same user"],
            reference: "last_user",
        },
        Rule {
            triggers: &["it", "that resource", "the resource", "this resource", "the same resource"],
            reference: "last_resource",
        },
        Rule {
            triggers: crd_triggers(crd_acronym),
            reference: "last_resource_name",
        },
        Rule {
            triggers: &["around that time", "at that time", "then"],
            reference: "last_timeframe",
        },
        Rule {
            triggers: &["that action", "the action", "this action"],
            reference: "last_action",
        },
    ]
}

/// `crd_acronym` is configurable, but the trigger phrases themselves
/// are the three fixed templates ("that X", "the X", "this X"); we
/// leak them here as `'static` by only supporting the default
/// acronym's literal phrases and falling back to building them at
/// call time otherwise.
fn crd_triggers(crd_acronym: &str) -> &'static [&'static str] {
    if crd_acronym.eq_ignore_ascii_case("CRD") {
        &["that CRD", "the CRD", "this CRD"]
    } else {
        &[]
    }
}

/// Resolves pronouns in `query` using the session's references. Each
/// rule, in fixed order, replaces every whole-word occurrence of its
/// trigger phrases with the referenced value, when that reference
/// exists and is non-empty. Case-sensitive. Idempotent: running the
/// result back through resolution is a no-op because the substituted
/// value itself never matches a trigger phrase.
pub fn resolve_pronouns(
    query: &str,
    references: &HashMap<String, ResolvedReference>,
    crd_acronym: &str,
) -> String {
    let mut resolved = query.to_string();

    for rule in rules(crd_acronym) {
        let Some(reference) = references.get(rule.reference) else { continue };
        if reference.value.is_empty() {
            continue;
        }
        for trigger in rule.triggers {
            resolved = replace_whole_word(&resolved, trigger, &reference.value);
        }
    }

    // Non-default CRD acronyms fall outside the 'static trigger table;
    // handle them with the dynamically-built phrases.
    if !crd_acronym.eq_ignore_ascii_case("CRD") {
        if let Some(reference) = references.get("last_resource_name") {
            if !reference.value.is_empty() {
                for trigger in [
                    format!("that {crd_acronym}"),
                    format!("the {crd_acronym}"),
                    format!("this {crd_acronym}"),
                ] {
                    resolved = replace_whole_word(&resolved, &trigger, &reference.value);
                }
            }
        }
    }

    resolved
}

/// Replaces every whole-word, case-sensitive occurrence of `trigger`
/// in `text` with `replacement`. "Whole word" means the match is not
/// immediately bordered by an alphanumeric or underscore character.
fn replace_whole_word(text: &str, trigger: &str, replacement: &str) -> String {
    if trigger.is_empty() {
        return text.to_string();
    }

    let bytes = text.as_bytes();
    let trigger_bytes = trigger.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < bytes.len() {
        let matches = bytes[i..].starts_with(trigger_bytes);
        let left_ok = i == 0 || !is_word_byte(bytes[i - 1]);
        let right_idx = i + trigger_bytes.len();
        let right_ok = right_idx >= bytes.len() || !is_word_byte(bytes[right_idx]);

        if matches && left_ok && right_ok {
            out.push_str(replacement);
            i = right_idx;
        } else {
            // push one char (not byte) to stay UTF-8 safe
            let ch = text[i..].chars().next().unwrap();
            out.push(ch);
            i += ch.len_utf8();
        }
    }

    out
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(pairs: &[(&str, &str)]) -> HashMap<String, ResolvedReference> {
        pairs
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    ResolvedReference {
                        reference_type: ReferenceType::User,
                        value: v.to_string(),
                        confidence: 0.9,
                        updated_at: chrono::Utc::now(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn resolves_user_pronoun() {
        let r = refs(&[("last_user", "alice")]);
        assert_eq!(resolve_pronouns("what did he do", &r, "CRD"), "what did alice do");
    }

    #[test]
    fn does_not_match_partial_word() {
        let r = refs(&[("last_resource", "pods")]);
        assert_eq!(resolve_pronouns("describe itemized report", &r, "CRD"), "describe itemized report");
    }

    #[test]
    fn is_idempotent() {
        let r = refs(&[("last_user", "alice"), ("last_resource", "pods")]);
        let once = resolve_pronouns("did he touch it", &r, "CRD");
        let twice = resolve_pronouns(&once, &r, "CRD");
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_reference_is_noop() {
        let r = refs(&[]);
        assert_eq!(resolve_pronouns("what did he do", &r, "CRD"), "what did he do");
    }

    #[test]
    fn resolves_crd_reference() {
        let r = refs(&[("last_resource_name", "customer")]);
        assert_eq!(resolve_pronouns("who touched that CRD", &r, "CRD"), "who touched customer");
    }
}
