use std::collections::{HashMap, HashSet};

use solana_program::pubkey::Pubkey;

use upkeep_raffle::{
    constants::{NUM_WORDS, REQUEST_CONFIRMATIONS},
    error::RaffleError,
    events::RaffleEvent,
    settlement::FundTransfer,
    state::{RaffleConfig, RaffleState, RequestId, Round},
    utils::random_word_from_u64,
    vrf::{RandomnessOracle, RandomnessRequest},
};

const ENTRANCE_FEE: u64 = 100;
const INTERVAL: i64 = 60;
const GENESIS: i64 = 1_700_000_000;

fn config() -> RaffleConfig {
    RaffleConfig {
        is_initialized: true,
        entrance_fee: ENTRANCE_FEE,
        interval: INTERVAL,
        coordinator: Pubkey::new_unique(),
        key_hash: [0xd8; 32],
        subscription_id: 21659,
        callback_compute_limit: 500_000,
        config_bump: 255,
        raffle_bump: 254,
    }
}

/// Oracle double handing out sequential ids
#[derive(Default)]
struct MockOracle {
    next_id: u64,
    reject: bool,
    requests: Vec<RandomnessRequest>,
}

impl RandomnessOracle for MockOracle {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<RequestId, RaffleError> {
        if self.reject {
            return Err(RaffleError::RequestFailed);
        }
        self.requests.push(*request);
        self.next_id += 1;
        Ok(RequestId(self.next_id))
    }
}

/// Transfer double keeping balances; listed recipients refuse funds
#[derive(Default)]
struct MockBank {
    balances: HashMap<Pubkey, u64>,
    refusing: HashSet<Pubkey>,
}

impl MockBank {
    fn balance(&self, account: &Pubkey) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

impl FundTransfer for MockBank {
    fn transfer(&mut self, recipient: &Pubkey, amount: u64) -> Result<(), RaffleError> {
        if self.refusing.contains(recipient) {
            return Err(RaffleError::TransferFailed);
        }
        *self.balances.entry(*recipient).or_insert(0) += amount;
        Ok(())
    }
}

fn calculating_round(config: &RaffleConfig, players: &[Pubkey]) -> (Round, RequestId) {
    let mut round = Round::new(GENESIS);
    for player in players {
        round.enter(config, *player, ENTRANCE_FEE).unwrap();
    }
    let mut oracle = MockOracle::default();
    let event = round
        .perform_upkeep(config, GENESIS + INTERVAL + 1, &mut oracle)
        .unwrap();
    match event {
        RaffleEvent::RequestIssued { request_id } => (round, request_id),
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn new_round_is_open_and_empty() {
    let round = Round::new(GENESIS);
    assert_eq!(round.state(), RaffleState::Open);
    assert_eq!(round.player_count(), 0);
    assert_eq!(round.escrowed_balance(), 0);
    assert_eq!(round.last_close_timestamp(), GENESIS);
    assert_eq!(round.outstanding_request(), None);
    assert_eq!(round.recent_winner(), None);
}

#[test]
fn entries_accumulate_players_and_balance() {
    let config = config();
    let mut round = Round::new(GENESIS);
    let alice = Pubkey::new_unique();
    let bob = Pubkey::new_unique();
    let paid = [100, 250, 100, 1_000, 100];
    let players = [alice, bob, alice, alice, bob];

    for (i, (player, amount)) in players.iter().zip(paid).enumerate() {
        let event = round.enter(&config, *player, amount).unwrap();
        assert_eq!(
            event,
            RaffleEvent::Entered {
                player: *player,
                player_index: i as u64
            }
        );
    }

    assert_eq!(round.player_count(), 5);
    assert_eq!(round.escrowed_balance(), paid.iter().sum::<u64>());
    assert_eq!(round.player_at(0).unwrap(), &alice);
    assert_eq!(round.player_at(3).unwrap(), &alice);
    assert_eq!(round.player_at(4).unwrap(), &bob);
    assert_eq!(round.player_at(5), Err(RaffleError::IndexOutOfRange));
}

#[test]
fn underpaying_entry_changes_nothing() {
    let config = config();
    let mut round = Round::new(GENESIS);
    round.enter(&config, Pubkey::new_unique(), ENTRANCE_FEE).unwrap();
    let before = round.clone();

    for paid in [0, 1, ENTRANCE_FEE - 1] {
        assert_eq!(
            round.enter(&config, Pubkey::new_unique(), paid),
            Err(RaffleError::InsufficientPayment)
        );
    }
    assert_eq!(round, before);
}

#[test]
fn entry_while_calculating_is_refused() {
    let config = config();
    let (mut round, _) = calculating_round(&config, &[Pubkey::new_unique()]);
    let before = round.clone();

    assert_eq!(
        round.enter(&config, Pubkey::new_unique(), ENTRANCE_FEE),
        Err(RaffleError::RoundNotOpen)
    );
    assert_eq!(round, before);
}

#[test]
fn check_upkeep_reports_each_condition() {
    let config = config();
    let mut round = Round::new(GENESIS);

    let check = round.check_upkeep(&config, GENESIS + INTERVAL);
    assert!(check.is_open && check.time_passed);
    assert!(!check.has_players && !check.has_balance);
    assert!(!check.upkeep_needed);

    round.enter(&config, Pubkey::new_unique(), ENTRANCE_FEE).unwrap();
    let early = round.check_upkeep(&config, GENESIS + INTERVAL - 1);
    assert!(!early.time_passed);
    assert!(!early.upkeep_needed);

    let ready = round.check_upkeep(&config, GENESIS + INTERVAL);
    assert!(ready.upkeep_needed);

    let (calculating, _) = calculating_round(&config, &[Pubkey::new_unique()]);
    let closed = calculating.check_upkeep(&config, GENESIS + 10 * INTERVAL);
    assert!(!closed.is_open);
    assert!(!closed.upkeep_needed);
}

#[test]
fn check_upkeep_does_not_mutate() {
    let config = config();
    let mut round = Round::new(GENESIS);
    round.enter(&config, Pubkey::new_unique(), ENTRANCE_FEE).unwrap();
    let before = round.clone();
    round.check_upkeep(&config, GENESIS + INTERVAL);
    assert_eq!(round, before);
}

#[test]
fn perform_upkeep_refuses_ineligible_round() {
    let config = config();
    let mut oracle = MockOracle::default();

    let mut empty = Round::new(GENESIS);
    assert_eq!(
        empty.perform_upkeep(&config, GENESIS + INTERVAL, &mut oracle),
        Err(RaffleError::UpkeepNotNeeded)
    );
    assert_eq!(empty, Round::new(GENESIS));

    let mut early = Round::new(GENESIS);
    early.enter(&config, Pubkey::new_unique(), ENTRANCE_FEE).unwrap();
    let before = early.clone();
    assert_eq!(
        early.perform_upkeep(&config, GENESIS + INTERVAL - 1, &mut oracle),
        Err(RaffleError::UpkeepNotNeeded)
    );
    assert_eq!(early, before);
    assert!(oracle.requests.is_empty());
}

#[test]
fn perform_upkeep_requests_randomness_once() {
    let config = config();
    let mut round = Round::new(GENESIS);
    round.enter(&config, Pubkey::new_unique(), ENTRANCE_FEE).unwrap();
    let mut oracle = MockOracle::default();

    let event = round
        .perform_upkeep(&config, GENESIS + INTERVAL + 1, &mut oracle)
        .unwrap();
    assert_eq!(event, RaffleEvent::RequestIssued { request_id: RequestId(1) });
    assert_eq!(round.state(), RaffleState::Calculating);
    assert_eq!(round.outstanding_request(), Some(RequestId(1)));
    assert_eq!(round.request_nonce(), 1);

    let request = oracle.requests[0];
    assert_eq!(request.key_hash, config.key_hash);
    assert_eq!(request.subscription_id, config.subscription_id);
    assert_eq!(request.callback_compute_limit, config.callback_compute_limit);
    assert_eq!(request.minimum_confirmations, REQUEST_CONFIRMATIONS);
    assert_eq!(request.num_words, NUM_WORDS);
    assert_eq!(request.nonce, 0);

    assert_eq!(
        round.perform_upkeep(&config, GENESIS + INTERVAL + 2, &mut oracle),
        Err(RaffleError::UpkeepNotNeeded)
    );
    assert_eq!(oracle.requests.len(), 1);
}

#[test]
fn rejected_request_leaves_round_open() {
    let config = config();
    let mut round = Round::new(GENESIS);
    round.enter(&config, Pubkey::new_unique(), ENTRANCE_FEE).unwrap();
    let before = round.clone();
    let mut oracle = MockOracle {
        reject: true,
        ..MockOracle::default()
    };

    assert_eq!(
        round.perform_upkeep(&config, GENESIS + INTERVAL, &mut oracle),
        Err(RaffleError::RequestFailed)
    );
    assert_eq!(round, before);
    assert_eq!(round.state(), RaffleState::Open);
}

#[test]
fn fulfillment_with_unknown_id_is_refused() {
    let config = config();
    let mut bank = MockBank::default();

    let mut open = Round::new(GENESIS);
    open.enter(&config, Pubkey::new_unique(), ENTRANCE_FEE).unwrap();
    let before = open.clone();
    for id in [0, 1] {
        assert_eq!(
            open.fulfill_random_words(RequestId(id), &[random_word_from_u64(7)], GENESIS, &mut bank),
            Err(RaffleError::UnrecognizedRequest)
        );
    }
    assert_eq!(open, before);

    let (mut round, request_id) = calculating_round(&config, &[Pubkey::new_unique()]);
    let before = round.clone();
    assert_eq!(
        round.fulfill_random_words(
            RequestId(request_id.0 + 1),
            &[random_word_from_u64(7)],
            GENESIS,
            &mut bank
        ),
        Err(RaffleError::UnrecognizedRequest)
    );
    assert_eq!(round, before);
    assert!(bank.balances.is_empty());
}

#[test]
fn fulfillment_without_words_is_refused() {
    let config = config();
    let (mut round, request_id) = calculating_round(&config, &[Pubkey::new_unique()]);
    let before = round.clone();
    assert_eq!(
        round.fulfill_random_words(request_id, &[], GENESIS, &mut MockBank::default()),
        Err(RaffleError::EmptyRandomWords)
    );
    assert_eq!(round, before);
}

#[test]
fn single_player_wins_the_whole_pot() {
    let config = config();
    let player = Pubkey::new_unique();
    let mut round = Round::new(GENESIS);
    round.enter(&config, player, ENTRANCE_FEE).unwrap();

    let now = GENESIS + INTERVAL + 1;
    assert!(round.check_upkeep(&config, now).upkeep_needed);

    let mut oracle = MockOracle::default();
    let request_id = match round.perform_upkeep(&config, now, &mut oracle).unwrap() {
        RaffleEvent::RequestIssued { request_id } => request_id,
        other => panic!("unexpected event {:?}", other),
    };
    assert_eq!(round.state(), RaffleState::Calculating);

    let mut bank = MockBank::default();
    let event = round
        .fulfill_random_words(request_id, &[random_word_from_u64(777)], now + 5, &mut bank)
        .unwrap();

    assert_eq!(event, RaffleEvent::WinnerPicked { winner: player });
    assert_eq!(bank.balance(&player), 100);
    assert_eq!(round.player_count(), 0);
    assert_eq!(round.escrowed_balance(), 0);
    assert_eq!(round.state(), RaffleState::Open);
    assert_eq!(round.last_close_timestamp(), now + 5);
    assert_eq!(round.outstanding_request(), None);
    assert_eq!(round.recent_winner(), Some(player));
    assert_eq!(round.rounds_settled(), 1);
    assert_eq!(round.player_at(0), Err(RaffleError::IndexOutOfRange));
}

#[test]
fn winner_is_word_modulo_player_count() {
    let config = config();
    let players: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
    let (mut round, request_id) = calculating_round(&config, &players);
    assert_eq!(round.escrowed_balance(), 400);

    let mut bank = MockBank::default();
    let event = round
        .fulfill_random_words(request_id, &[random_word_from_u64(37)], GENESIS + 100, &mut bank)
        .unwrap();

    assert_eq!(event, RaffleEvent::WinnerPicked { winner: players[1] });
    assert_eq!(bank.balance(&players[1]), 400);
    for other in [players[0], players[2], players[3]] {
        assert_eq!(bank.balance(&other), 0);
    }
    assert_eq!(round.player_count(), 0);
    assert_eq!(round.escrowed_balance(), 0);
}

#[test]
fn second_delivery_of_same_request_is_refused() {
    let config = config();
    let player = Pubkey::new_unique();
    let (mut round, request_id) = calculating_round(&config, &[player]);
    let mut bank = MockBank::default();

    round
        .fulfill_random_words(request_id, &[random_word_from_u64(1)], GENESIS + 100, &mut bank)
        .unwrap();
    let settled = round.clone();

    assert_eq!(
        round.fulfill_random_words(request_id, &[random_word_from_u64(1)], GENESIS + 200, &mut bank),
        Err(RaffleError::UnrecognizedRequest)
    );
    assert_eq!(round, settled);
    assert_eq!(bank.balance(&player), ENTRANCE_FEE);
}

#[test]
fn failed_payout_restores_the_round() {
    let config = config();
    let players: Vec<Pubkey> = (0..3).map(|_| Pubkey::new_unique()).collect();
    let (mut round, request_id) = calculating_round(&config, &players);
    let before = round.clone();

    // 4 mod 3 == 1
    let mut bank = MockBank::default();
    bank.refusing.insert(players[1]);
    assert_eq!(
        round.fulfill_random_words(request_id, &[random_word_from_u64(4)], GENESIS + 100, &mut bank),
        Err(RaffleError::TransferFailed)
    );
    assert_eq!(round, before);
    assert_eq!(round.state(), RaffleState::Calculating);
    assert_eq!(round.player_count(), 3);
    assert_eq!(round.escrowed_balance(), 300);
    assert_eq!(round.outstanding_request(), Some(request_id));

    // Redelivery succeeds once the winner can take funds
    bank.refusing.clear();
    round
        .fulfill_random_words(request_id, &[random_word_from_u64(4)], GENESIS + 200, &mut bank)
        .unwrap();
    assert_eq!(bank.balance(&players[1]), 300);
    assert_eq!(round.state(), RaffleState::Open);
}

#[test]
fn settled_round_runs_again() {
    let config = config();
    let first = Pubkey::new_unique();
    let (mut round, request_id) = calculating_round(&config, &[first]);
    let mut bank = MockBank::default();
    let settled_at = GENESIS + 100;
    round
        .fulfill_random_words(request_id, &[random_word_from_u64(0)], settled_at, &mut bank)
        .unwrap();

    let second = Pubkey::new_unique();
    round.enter(&config, second, 150).unwrap();
    assert!(!round.check_upkeep(&config, settled_at + INTERVAL - 1).upkeep_needed);

    let mut oracle = MockOracle { next_id: 41, ..MockOracle::default() };
    round
        .perform_upkeep(&config, settled_at + INTERVAL, &mut oracle)
        .unwrap();
    assert_eq!(round.outstanding_request(), Some(RequestId(42)));
    assert_eq!(oracle.requests[0].nonce, 1);

    round
        .fulfill_random_words(RequestId(42), &[random_word_from_u64(9)], settled_at + 200, &mut bank)
        .unwrap();
    assert_eq!(bank.balance(&second), 150);
    assert_eq!(round.recent_winner(), Some(second));
    assert_eq!(round.rounds_settled(), 2);
    assert_eq!(round.request_nonce(), 2);
}
