//! Schema migrations for stored Account payloads.

use ledgerline_core::upcast::UpcasterChain;

use super::events::{
    ACCOUNT_OPENED_EVENT_TYPE, ACCOUNT_OPENED_SCHEMA_VERSION, FUNDS_DEPOSITED_EVENT_TYPE,
    FUNDS_DEPOSITED_SCHEMA_VERSION, FUNDS_WITHDRAWN_EVENT_TYPE, FUNDS_WITHDRAWN_SCHEMA_VERSION,
};

/// `account.opened` v1 → v2: `owner_name` was renamed to `owner`.
fn account_opened_v1_to_v2(mut payload: serde_json::Value) -> Result<serde_json::Value, String> {
    let fields = payload
        .as_object_mut()
        .ok_or("payload is not a JSON object")?;
    let owner = fields
        .remove("owner_name")
        .ok_or("missing field 'owner_name'")?;
    fields.insert("owner".to_owned(), owner);
    Ok(payload)
}

/// Returns the upcaster chain for every Account event type.
#[must_use]
pub fn account_upcasters() -> UpcasterChain {
    UpcasterChain::new()
        .with_current_version(ACCOUNT_OPENED_EVENT_TYPE, ACCOUNT_OPENED_SCHEMA_VERSION)
        .with_current_version(FUNDS_DEPOSITED_EVENT_TYPE, FUNDS_DEPOSITED_SCHEMA_VERSION)
        .with_current_version(FUNDS_WITHDRAWN_EVENT_TYPE, FUNDS_WITHDRAWN_SCHEMA_VERSION)
        .with_step(ACCOUNT_OPENED_EVENT_TYPE, 1, account_opened_v1_to_v2)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_account_opened_v1_renames_owner_name() {
        let upgraded =
            account_opened_v1_to_v2(json!({"account_id": "acc1", "owner_name": "Ada"})).unwrap();

        assert_eq!(upgraded, json!({"account_id": "acc1", "owner": "Ada"}));
    }

    #[test]
    fn test_account_opened_v1_without_owner_name_fails() {
        let err = account_opened_v1_to_v2(json!({"account_id": "acc1"})).unwrap_err();
        assert!(err.contains("owner_name"));
    }

    #[test]
    fn test_chain_declares_current_versions() {
        let chain = account_upcasters();
        assert_eq!(chain.current_version(ACCOUNT_OPENED_EVENT_TYPE), 2);
        assert_eq!(chain.current_version(FUNDS_DEPOSITED_EVENT_TYPE), 1);
        assert_eq!(chain.current_version(FUNDS_WITHDRAWN_EVENT_TYPE), 1);
    }
}
