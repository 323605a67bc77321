//! Filter conversion to Qdrant `Filter`.
//!
//! Only exact string equality is supported; every constraint goes into the
//! `must` clause so the result is a conjunction. Tenant isolation depends on
//! this: a filter with a tenant constraint can never match another tenant's
//! records.

use crate::record::MetadataFilter;
use qdrant_client::qdrant::{Condition, FieldCondition, Filter, Match, condition::ConditionOneOf};
use tracing::debug;

/// Converts [`MetadataFilter`] to a Qdrant [`Filter`].
pub fn to_qdrant_filter(f: &MetadataFilter) -> Filter {
    debug!("filters::to_qdrant_filter equals={}", f.equals.len());

    let must: Vec<Condition> = f
        .equals
        .iter()
        .map(|(field, value)| Condition {
            condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                key: field.clone(),
                r#match: Some(Match {
                    match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Keyword(
                        value.clone(),
                    )),
                }),
                ..Default::default()
            })),
        })
        .collect();

    Filter {
        must,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MetadataFilter;

    #[test]
    fn all_constraints_land_in_must() {
        let f = MetadataFilter::tenant_visitor("t1", "v1");
        let qf = to_qdrant_filter(&f);
        assert_eq!(qf.must.len(), 2);
        assert!(qf.should.is_empty());
    }
}
