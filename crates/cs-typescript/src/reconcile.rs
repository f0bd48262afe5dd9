//! Removes schema aliases that an emitted enum replaces.
//!
//! A record claims an alias by the alias's raw schema key, never by the
//! alias name, so `UserStatus = components["schemas"]["user-status"]` is
//! matched through `user-status`.

use cs_core::EnumRecord;
use cs_core::naming::is_valid_identifier;
use log::debug;

use crate::declarations::Declaration;

/// Drop every alias line of a rendered types file whose raw schema key has an
/// enum record. All other text is kept byte for byte.
pub fn reconcile(text: &str, records: &[EnumRecord]) -> String {
    text.split_inclusive('\n')
        .filter(|line| {
            let claimed = aliased_schema_key(line).is_some_and(|key| is_claimed(&key, records));
            if claimed {
                debug!("removing alias line {}", line.trim_end());
            }
            !claimed
        })
        .collect()
}

/// The structured form of [`reconcile`], applied to a declaration list.
pub fn reconcile_declarations(declarations: &mut Vec<Declaration>, records: &[EnumRecord]) {
    declarations.retain(|declaration| match declaration.aliased_schema() {
        Some(key) if is_claimed(key, records) => {
            debug!("removing alias {} for enum schema {key}", declaration.name());
            false
        }
        _ => true,
    });
}

fn is_claimed(key: &str, records: &[EnumRecord]) -> bool {
    records.iter().any(|r| r.schema_key == key)
}

/// Parse `export type <Name> = components["schemas"][<json string>];`.
fn aliased_schema_key(line: &str) -> Option<String> {
    let line = line.trim_end_matches(['\n', '\r']);
    let rest = line.strip_prefix("export type ")?;
    let (name, target) = rest.split_once(" = ")?;
    if !is_valid_identifier(name) {
        return None;
    }
    let key = target
        .strip_prefix("components[\"schemas\"][")?
        .strip_suffix("];")?;
    serde_json::from_str::<String>(key).ok()
}
