//! JSON report of a scenario run.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use opgate::{OperationOutcome, OperationReceipt, Settlement};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::scenario::World;

pub fn render(network: &str, world: &World, receipts: &[OperationReceipt]) -> Result<Value> {
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());
    let config = world.orchestrator.config();

    let receipts = receipts
        .iter()
        .map(receipt_json)
        .collect::<Result<Vec<_>>>()?;

    let mut accounts = json!({});
    for store in world.ledger.accounts() {
        accounts[store.account().to_string()] = json!({
            "owner": store.owner(),
            "sequence": store.sequence_counter(),
            "signers": store.signers().collect::<Vec<_>>(),
        });
    }

    let mut sponsors = json!({});
    for sponsor in world.ledger.sponsors() {
        sponsors[sponsor.address().to_string()] = json!({
            "owner": sponsor.owner(),
            "policy": sponsor.policy().name(),
            "totalSponsored": sponsor.ledger().total_sponsored(),
            "settlements": sponsor.ledger().settlements(),
            "remainingFunds": sponsor.policy().remaining_funds(),
        });
    }

    Ok(json!({
        "network": network,
        "generatedAt": now,
        "orchestrator": config.address,
        "chainId": config.chain_id,
        "sequencePolicy": config.sequence_policy,
        "receipts": receipts,
        "accounts": accounts,
        "sponsors": sponsors,
        "eventCount": world.ledger.events().len(),
    }))
}

fn receipt_json(receipt: &OperationReceipt) -> Result<Value> {
    let (error, actual_cost) = match &receipt.outcome {
        OperationOutcome::Executed { actual_cost, .. } => (None, Some(*actual_cost)),
        OperationOutcome::ExecutionFailed {
            error, actual_cost, ..
        } => (Some(error.to_string()), Some(*actual_cost)),
        OperationOutcome::Rejected(error) => (Some(error.to_string()), None),
        OperationOutcome::SponsorRejected(error) => (Some(error.to_string()), None),
    };
    let settlement = match receipt.outcome.settlement() {
        None | Some(Settlement::NotSponsored) => Value::Null,
        Some(Settlement::Settled { sponsor, amount }) => json!({
            "status": "settled",
            "sponsor": sponsor,
            "amount": amount,
        }),
        Some(Settlement::Failed { sponsor, error }) => json!({
            "status": "failed",
            "sponsor": sponsor,
            "error": error.to_string(),
        }),
    };
    Ok(json!({
        "operationHash": receipt.operation_hash,
        "account": receipt.account,
        "sequence": receipt.sequence,
        "outcome": receipt.outcome.kind(),
        "error": error,
        "actualCost": actual_cost,
        "settlement": settlement,
        "states": receipt.states,
        "events": serde_json::to_value(&receipt.events).context("failed serialising events")?,
    }))
}

pub fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised = serde_json::to_string_pretty(value).context("failed serialising report")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
