mod helpers;

use helpers::*;
use ledger_core::{
    codec,
    constants::POW_TARGET_DIFFICULTY,
    hash::{check_hash, proof_hash},
    CodecError, Ledger, LedgerConfig, RejectionReason,
};

#[test]
fn test_scenario_default_difficulty() {
    let mut ledger = Ledger::new();

    let genesis = mined_block(1, "0", "genesis", POW_TARGET_DIFFICULTY);
    assert!(check_hash(POW_TARGET_DIFFICULTY, &genesis.proof_hash()));
    ledger.insert(genesis.clone()).unwrap();
    assert_eq!(ledger.get(1).len(), 1);

    let second = mined_block(2, &genesis.hash, "second", POW_TARGET_DIFFICULTY);
    ledger.insert(second).unwrap();
    assert_eq!(ledger.length(), 2);
    assert_eq!(ledger.get(2).len(), 1);

    let stray = mined_block(3, &genesis.hash, "stray", POW_TARGET_DIFFICULTY);
    assert_eq!(ledger.insert(stray), Err(RejectionReason::OrphanBlock));
    assert_eq!(ledger.length(), 2);
    assert!(ledger.get(3).is_empty());
}

#[test]
fn test_fork_at_same_height() {
    let mut ledger = fast_ledger();
    let genesis = mined_block(1, "0", "genesis", FAST_DIFFICULTY);
    ledger.insert(genesis.clone()).unwrap();

    let left = mined_block(2, &genesis.hash, "left", FAST_DIFFICULTY);
    let right = mined_block(2, &genesis.hash, "right", FAST_DIFFICULTY);
    assert_ne!(left.hash, right.hash);
    ledger.insert(left.clone()).unwrap();
    ledger.insert(right.clone()).unwrap();

    assert_eq!(ledger.get(2), &[left.clone(), right.clone()]);
    assert_eq!(ledger.length(), 2);

    // both branches can be extended
    let on_left = mined_block(3, &left.hash, "on-left", FAST_DIFFICULTY);
    let on_right = mined_block(3, &right.hash, "on-right", FAST_DIFFICULTY);
    ledger.insert(on_left).unwrap();
    ledger.insert(on_right).unwrap();
    assert_eq!(ledger.tips().len(), 2);
}

#[test]
fn test_duplicate_leaves_slot_unchanged() {
    let mut ledger = fast_ledger();
    let chain = linear_chain(3, FAST_DIFFICULTY);
    for block in &chain {
        ledger.insert(block.clone()).unwrap();
    }
    let before = ledger.get(2).to_vec();
    assert_eq!(
        ledger.insert(chain[1].clone()),
        Err(RejectionReason::DuplicateBlock)
    );
    assert_eq!(ledger.get(2), before.as_slice());
}

#[test]
fn test_snapshot_round_trip() -> anyhow::Result<()> {
    let mut ledger = fast_ledger();
    let chain = linear_chain(5, FAST_DIFFICULTY);
    for block in &chain {
        ledger.insert(block.clone()).unwrap();
    }
    let fork = mined_block(3, &chain[1].hash, "fork", FAST_DIFFICULTY);
    ledger.insert(fork).unwrap();

    let snapshot = ledger.to_json()?;
    let (restored, report) = Ledger::from_snapshot(&snapshot, fast_config())?;

    assert!(report.is_complete());
    assert_eq!(report.admitted, 6);
    assert_eq!(restored.length(), ledger.length());
    assert_eq!(height_hash_pairs(&restored), height_hash_pairs(&ledger));
    assert_eq!(restored.to_json()?, snapshot);
    Ok(())
}

#[test]
fn test_child_before_parent_is_dropped() -> anyhow::Result<()> {
    let chain = linear_chain(2, FAST_DIFFICULTY);
    let reversed = codec::encode_blocks(chain.iter().rev())?;

    let (restored, report) = Ledger::from_snapshot(&reversed, fast_config())?;
    assert_eq!(report.admitted, 1);
    assert_eq!(report.rejected.len(), 1);
    let dropped = &report.rejected[0];
    assert_eq!(dropped.index, 0);
    assert_eq!(dropped.height, 2);
    assert_eq!(dropped.hash, chain[1].hash);
    assert_eq!(dropped.reason, RejectionReason::OrphanBlock);
    assert_eq!(restored.length(), 1);
    Ok(())
}

#[test]
fn test_tampered_snapshot_self_filters() -> anyhow::Result<()> {
    let chain = linear_chain(3, FAST_DIFFICULTY);
    let mut blocks = chain.clone();
    // break the proof of work of the middle block
    let failing = (0..)
        .find(|n| {
            !check_hash(
                FAST_DIFFICULTY,
                &proof_hash(&blocks[1].parent_hash, *n, &blocks[1].value),
            )
        })
        .unwrap();
    blocks[1].nonce = failing;
    let snapshot = codec::encode_blocks(&blocks)?;

    let (restored, report) = Ledger::from_snapshot(&snapshot, fast_config())?;
    let reasons: Vec<RejectionReason> = report.rejected.iter().map(|r| r.reason).collect();
    assert_eq!(
        reasons,
        vec![
            RejectionReason::InsufficientProofOfWork,
            RejectionReason::OrphanBlock
        ]
    );
    assert_eq!(restored.length(), 1);
    assert_eq!(restored.get(1), &chain[..1]);
    Ok(())
}

#[test]
fn test_rewritten_hash_caught_in_strict_mode() -> anyhow::Result<()> {
    let chain = linear_chain(2, FAST_DIFFICULTY);
    let mut blocks = chain.clone();
    blocks[1].value = "rewritten".to_string();
    let snapshot = codec::encode_blocks(&blocks)?;

    let strict = LedgerConfig {
        verify_identity: true,
        ..fast_config()
    };
    let (restored, report) = Ledger::from_snapshot(&snapshot, strict)?;
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].reason, RejectionReason::HashMismatch);
    assert_eq!(restored.length(), 1);
    Ok(())
}

#[test]
fn test_malformed_snapshot_is_an_error() {
    let mut ledger = fast_ledger();
    for doc in ["", "null", "{\"height\":1}", "[1,2,3]", "[{}]"] {
        assert!(
            matches!(ledger.restore(doc), Err(CodecError::Decode(_))),
            "{doc:?} should not decode"
        );
    }
    assert!(ledger.is_empty());
}

#[test]
fn test_empty_snapshot_restores_nothing() -> anyhow::Result<()> {
    let (restored, report) = Ledger::from_snapshot("[]", fast_config())?;
    assert!(restored.is_empty());
    assert_eq!(report.admitted, 0);
    assert!(report.is_complete());
    Ok(())
}
