//! Driving a chain state through [`tinyjam::State`].

mod common;

use common::*;
use parity_scale_codec::{Decode, Encode};
use tinyjam::safrole::Safrole;
use tinyjam::types::SafroleState;
use tinyjam::{ErrorCode, State};

#[test]
fn import_keeps_the_state_of_rejected_blocks() {
    let safrole = safrole();
    let mut chain: State<Safrole<MockRingVrf>> = State::new(genesis(&safrole));

    let marks = chain.import(&safrole, &input(3, vec![])).unwrap();
    assert!(marks.epoch_mark.is_none());
    assert_eq!(chain.consensus.tau, 3);

    let before = chain.consensus.encode();
    let eta2 = chain.consensus.eta[2];
    let bad = input(4, vec![envelope(9, 7, &validator(1), &eta2)]);
    let err = chain.import(&safrole, &bad).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::BadTicketAttempt));
    assert_eq!(chain.consensus.encode(), before);

    let stale = chain.import(&safrole, &input(3, vec![])).unwrap_err();
    assert_eq!(stale.code(), Some(ErrorCode::BadSlot));
    assert_eq!(chain.consensus.tau, 3);
}

#[test]
fn chain_crosses_epochs() {
    let safrole = safrole();
    let mut chain: State<Safrole<MockRingVrf>> = State::new(genesis(&safrole));

    let mut epoch_marks = 0;
    for slot in [4, 11, 12, 20, 47, 48] {
        let marks = chain.import(&safrole, &input(slot, vec![])).unwrap();
        if marks.epoch_mark.is_some() {
            epoch_marks += 1;
        }
    }

    // Boundaries at 12, 47 (skipping epoch 2) and 48.
    assert_eq!(epoch_marks, 3);
    assert_eq!(chain.consensus.tau, 48);
    assert!(!chain.consensus.gamma_s.is_tickets());
}

#[test]
fn persisted_state_decodes_back() {
    let safrole = safrole();
    let mut chain: State<Safrole<MockRingVrf>> = State::new(genesis(&safrole));
    let eta2 = chain.consensus.eta[2];
    chain
        .import(
            &safrole,
            &input(1, vec![envelope(2, 0, &validator(6), &eta2)]),
        )
        .unwrap();

    let encoded = chain.consensus.encode();
    let decoded = SafroleState::decode(&mut &encoded[..]).unwrap();
    decoded.check(safrole.params()).unwrap();
    assert_eq!(decoded, chain.consensus);
}
