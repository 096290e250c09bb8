use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction, system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    constants::{CONFIG_SEED, MAX_CALLBACK_COMPUTE_UNITS, RAFFLE_SEED},
    error::RaffleError,
    instruction::RaffleInstruction,
    settlement::FundTransfer,
    state::{RaffleConfig, RequestId, Round},
    utils::{find_config_address, find_raffle_address, RandomWord},
    vrf::LogCoordinator,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                callback_compute_limit,
                coordinator,
            } => {
                msg!("Instruction: Initialize Raffle");
                let config = RaffleConfig {
                    is_initialized: true,
                    entrance_fee,
                    interval,
                    coordinator,
                    key_hash,
                    subscription_id,
                    callback_compute_limit,
                    config_bump: 0,
                    raffle_bump: 0,
                };
                Self::process_initialize_raffle(program_id, accounts, config)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(program_id, accounts, amount)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(program_id, accounts)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(program_id, accounts)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(program_id, accounts, request_id, &random_words)
            }
        }
    }

    fn process_initialize_raffle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        mut config: RaffleConfig,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        if config.entrance_fee == 0
            || config.interval < 0
            || config.callback_compute_limit > MAX_CALLBACK_COMPUTE_UNITS
        {
            msg!(
                "Invalid config: fee={}, interval={}, callback limit={}",
                config.entrance_fee,
                config.interval,
                config.callback_compute_limit
            );
            return Err(RaffleError::InvalidConfig.into());
        }

        let (config_address, config_bump) = find_config_address(program_id);
        let (raffle_address, raffle_bump) = find_raffle_address(program_id);
        if *config_info.key != config_address || *raffle_info.key != raffle_address {
            msg!("Config or raffle account is not the program address");
            return Err(RaffleError::InvalidRaffleAccount.into());
        }
        if config_info.owner == program_id || raffle_info.owner == program_id {
            msg!("Raffle is already initialized");
            return Err(RaffleError::AlreadyInitialized.into());
        }

        let rent = Rent::get()?;
        let now = Clock::get()?.unix_timestamp;

        invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                config_info.key,
                rent.minimum_balance(RaffleConfig::LEN),
                RaffleConfig::LEN as u64,
                program_id,
            ),
            &[
                payer_info.clone(),
                config_info.clone(),
                system_program_info.clone(),
            ],
            &[&[CONFIG_SEED, &[config_bump]]],
        )?;

        let space = Round::space_for(0);
        invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                raffle_info.key,
                rent.minimum_balance(space),
                space as u64,
                program_id,
            ),
            &[
                payer_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
            &[&[RAFFLE_SEED, &[raffle_bump]]],
        )?;

        config.config_bump = config_bump;
        config.raffle_bump = raffle_bump;
        RaffleConfig::pack(config, &mut config_info.data.borrow_mut())?;
        Round::new(now).pack_into_account(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: EntranceFee={}, Interval={}s, Coordinator={}",
            config.entrance_fee,
            config.interval,
            config.coordinator
        );
        Ok(())
    }

    fn process_enter_raffle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        let config = load_config(program_id, config_info)?;
        let mut round = load_round(program_id, &config, raffle_info)?;

        let event = round.enter(&config, *player_info.key, amount)?;

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        // The account grows by one slot per entry; the player covers the rent
        let space = Round::space_for(round.players().len()).max(raffle_info.data_len());
        let required = Rent::get()?
            .minimum_balance(space)
            .checked_add(round.escrowed_balance())
            .ok_or(RaffleError::Overflow)?;
        let shortfall = required.saturating_sub(raffle_info.lamports());
        if shortfall > 0 {
            msg!("Topping up raffle rent by {} lamports", shortfall);
            invoke(
                &system_instruction::transfer(player_info.key, raffle_info.key, shortfall),
                &[
                    player_info.clone(),
                    raffle_info.clone(),
                    system_program_info.clone(),
                ],
            )?;
        }
        if raffle_info.data_len() < space {
            raffle_info.realloc(space, false)?;
        }

        store_round(&round, raffle_info)?;
        event.emit()?;

        msg!(
            "Player {} entered with {} lamports, {} players in round",
            player_info.key,
            amount,
            round.player_count()
        );
        Ok(())
    }

    fn process_check_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        let config = load_config(program_id, config_info)?;
        let round = load_round(program_id, &config, raffle_info)?;

        let check = round.check_upkeep(&config, current_timestamp()?);
        let data = check
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        set_return_data(&data);

        msg!(
            "Upkeep needed={} (open={}, time passed={}, players={}, balance={})",
            check.upkeep_needed,
            check.is_open,
            check.time_passed,
            check.has_players,
            check.has_balance
        );
        Ok(())
    }

    fn process_perform_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        let config = load_config(program_id, config_info)?;
        let mut round = load_round(program_id, &config, raffle_info)?;

        let mut coordinator = LogCoordinator::default();
        let event = round.perform_upkeep(&config, current_timestamp()?, &mut coordinator)?;

        store_round(&round, raffle_info)?;
        if let Some(request) = coordinator.published {
            request.emit()?;
        }
        event.emit()?;
        Ok(())
    }

    fn process_fulfill_random_words(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: RequestId,
        random_words: &[RandomWord],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let coordinator_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let config = load_config(program_id, config_info)?;
        if !coordinator_info.is_signer || *coordinator_info.key != config.coordinator {
            msg!("Only coordinator {} can fulfill", config.coordinator);
            return Err(RaffleError::OnlyCoordinatorCanFulfill.into());
        }
        let mut round = load_round(program_id, &config, raffle_info)?;

        let mut payout = LamportPayout {
            escrow: raffle_info,
            recipient: winner_info,
        };
        let event = round.fulfill_random_words(
            request_id,
            random_words,
            current_timestamp()?,
            &mut payout,
        )?;

        store_round(&round, raffle_info)?;
        event.emit()?;
        Ok(())
    }
}

/// Pays the prize out of the raffle account's lamports
struct LamportPayout<'a, 'b> {
    escrow: &'b AccountInfo<'a>,
    recipient: &'b AccountInfo<'a>,
}

impl FundTransfer for LamportPayout<'_, '_> {
    fn transfer(&mut self, recipient: &Pubkey, amount: u64) -> Result<(), RaffleError> {
        if recipient != self.recipient.key {
            msg!("Expected winner account {}, got {}", recipient, self.recipient.key);
            return Err(RaffleError::WinnerAccountMismatch);
        }
        if !self.recipient.is_writable || self.recipient.key == self.escrow.key {
            return Err(RaffleError::TransferFailed);
        }

        let escrow_lamports = self
            .escrow
            .lamports()
            .checked_sub(amount)
            .ok_or(RaffleError::TransferFailed)?;
        let recipient_lamports = self
            .recipient
            .lamports()
            .checked_add(amount)
            .ok_or(RaffleError::TransferFailed)?;

        let mut from = self
            .escrow
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::TransferFailed)?;
        let mut to = self
            .recipient
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::TransferFailed)?;
        **from = escrow_lamports;
        **to = recipient_lamports;
        Ok(())
    }
}

fn current_timestamp() -> Result<UnixTimestamp, ProgramError> {
    Ok(Clock::get()?.unix_timestamp)
}

fn load_config(program_id: &Pubkey, config_info: &AccountInfo) -> Result<RaffleConfig, ProgramError> {
    if config_info.owner != program_id {
        msg!("Config account must be owned by the program");
        return Err(ProgramError::IncorrectProgramId);
    }
    if *config_info.key != find_config_address(program_id).0 {
        return Err(RaffleError::InvalidRaffleAccount.into());
    }
    RaffleConfig::unpack(&config_info.data.borrow())
        .map_err(|_| RaffleError::NotInitialized.into())
}

fn load_round(
    program_id: &Pubkey,
    config: &RaffleConfig,
    raffle_info: &AccountInfo,
) -> Result<Round, ProgramError> {
    if raffle_info.owner != program_id {
        msg!("Raffle account must be owned by the program");
        return Err(ProgramError::IncorrectProgramId);
    }
    let raffle_address =
        Pubkey::create_program_address(&[RAFFLE_SEED, &[config.raffle_bump]], program_id)
            .map_err(|_| RaffleError::InvalidRaffleAccount)?;
    if *raffle_info.key != raffle_address {
        return Err(RaffleError::InvalidRaffleAccount.into());
    }
    Round::unpack_from_account(&raffle_info.data.borrow())
}

fn store_round(round: &Round, raffle_info: &AccountInfo) -> ProgramResult {
    if round.packed_len()? > raffle_info.data_len() {
        msg!("Raffle account too small for round");
        return Err(ProgramError::AccountDataTooSmall);
    }
    round.pack_into_account(&mut raffle_info.data.borrow_mut())
}
