//! Replay of scripted pool operations against null collaborators.
//!
//! A script is a JSON document:
//!
//! ```json
//! {
//!   "holders": [{ "account": "alice", "positions": [1] }],
//!   "steps": [
//!     { "at": 0, "action": "deposit", "account": "alice", "positions": [1] },
//!     { "action": "advance", "secs": 10 },
//!     { "action": "claim", "account": "alice" }
//!   ]
//! }
//! ```
//!
//! `at` pins the clock to an absolute second before the step runs; without
//! it the step runs at the current clock. Rejected steps are recorded and the
//! replay continues unless `fail_fast` is set.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use accrue_custody::RewardTransfer;
use accrue_nullables::{CustodyRecord, NullClock, NullCustody, NullRewardVault, NullStore, NullValidator};
use accrue_pool::{PoolEvent, PoolInfo, StakingPool};
use accrue_types::{AccountId, PositionId, Timestamp};

use crate::config::{HolderConfig, SimConfig};
use crate::SimError;

type SimPool = StakingPool<NullCustody, NullValidator, NullRewardVault>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Script {
    /// Extra holders minted on top of the configured ones.
    #[serde(default)]
    pub holders: Vec<HolderConfig>,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<u64>,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Deposit {
        account: String,
        positions: Vec<PositionId>,
    },
    Withdraw {
        account: String,
        positions: Vec<PositionId>,
    },
    Claim {
        account: String,
    },
    /// Move the clock forward without touching the pool.
    Advance {
        secs: u64,
    },
    /// Record the account's pending reward at the current time.
    Earned {
        account: String,
    },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Deposit { .. } => "deposit",
            Action::Withdraw { .. } => "withdraw",
            Action::Claim { .. } => "claim",
            Action::Advance { .. } => "advance",
            Action::Earned { .. } => "earned",
        }
    }

    fn account(&self) -> Option<&str> {
        match self {
            Action::Deposit { account, .. }
            | Action::Withdraw { account, .. }
            | Action::Claim { account }
            | Action::Earned { account } => Some(account.as_str()),
            Action::Advance { .. } => None,
        }
    }
}

impl Script {
    pub fn from_json_str(s: &str) -> Result<Self, SimError> {
        serde_json::from_str(s).map_err(|e| SimError::Script(e.to_string()))
    }

    pub fn from_json_file(path: &str) -> Result<Self, SimError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SimError::Script(format!("{path}: {e}")))?;
        Self::from_json_str(&content)
    }
}

/// What happened when one step ran.
#[derive(Clone, Debug, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub at: u64,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Amount claimed, or pending reward for `earned`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<PoolEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub account: String,
    pub weight: u64,
    pub earned: u128,
    pub paid: u128,
}

/// Final balances after the last step.
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub at: u64,
    pub reward_rate: u128,
    pub category_id: u64,
    pub total_weight: u64,
    pub reward_per_weight: u128,
    pub total_paid: u128,
    pub vault_balance: u128,
    pub accounts: Vec<AccountSummary>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub outcomes: Vec<StepOutcome>,
    pub summary: Summary,
    /// Every transfer and consumer change the custody saw, in order.
    pub custody: Vec<CustodyRecord>,
}

impl Report {
    pub fn rejected(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }
}

/// A pool wired to null collaborators plus the clock that drives it.
pub struct Simulation {
    pool: SimPool,
    clock: NullClock,
    accounts: Vec<AccountId>,
    captured: Arc<Mutex<Vec<PoolEvent>>>,
}

impl Simulation {
    pub fn new(config: &SimConfig, extra_holders: &[HolderConfig]) -> Result<Self, SimError> {
        let mut custody = NullCustody::new();
        let mut validator = NullValidator::accept_all();
        let mut accounts = Vec::new();
        for holder in config.holders.iter().chain(extra_holders) {
            let account: AccountId = holder.account.parse()?;
            let positions = holder.positions.iter().map(|&p| PositionId::new(p));
            custody.mint_many(&account, positions.clone());
            if let Some(category) = holder.category {
                validator.assign_many(positions, category);
            }
            if holder.approved {
                custody.approve_all(&account);
            }
            if !accounts.contains(&account) {
                accounts.push(account);
            }
        }

        for &position in &config.unsupported {
            validator.deny(PositionId::new(position));
        }

        let vault = NullRewardVault::funded(u128::from(config.funding));
        let mut pool = StakingPool::new(config.pool_params(), custody, validator, vault);

        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        pool.subscribe(Box::new(move |event: &PoolEvent| {
            if let Ok(mut events) = sink.lock() {
                events.push(event.clone());
            }
        }));

        Ok(Self {
            pool,
            clock: NullClock::new(config.genesis),
            accounts,
            captured,
        })
    }

    pub fn pool(&self) -> &SimPool {
        &self.pool
    }

    /// Run every step in order and summarise the result.
    pub fn replay(&mut self, script: &Script, fail_fast: bool) -> Result<Report, SimError> {
        let mut outcomes = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let outcome = self.run_step(index, step)?;
            if fail_fast {
                if let Some(error) = &outcome.error {
                    return Err(SimError::Script(format!("step {index} rejected: {error}")));
                }
            }
            outcomes.push(outcome);
        }

        self.pool.check_invariants()?;
        self.verify_restore()?;
        let summary = self.summary()?;
        info!(
            steps = outcomes.len(),
            total_weight = summary.total_weight,
            total_paid = summary.total_paid,
            "replay finished"
        );
        Ok(Report {
            outcomes,
            summary,
            custody: self.pool.custody().records().to_vec(),
        })
    }

    fn run_step(&mut self, index: usize, step: &Step) -> Result<StepOutcome, SimError> {
        if let Some(at) = step.at {
            self.clock.set(at);
        }
        let now = self.clock.now();
        let mut outcome = StepOutcome {
            step: index,
            at: now.as_secs(),
            action: step.action.name(),
            account: step.action.account().map(str::to_string),
            amount: None,
            error: None,
            events: Vec::new(),
        };

        let result = match &step.action {
            Action::Deposit { account, positions } => {
                let account = self.account(account)?;
                self.pool.deposit(&account, positions, now).map(|_| None)
            }
            Action::Withdraw { account, positions } => {
                let account = self.account(account)?;
                self.pool.withdraw(&account, positions, now).map(|_| None)
            }
            Action::Claim { account } => {
                let account = self.account(account)?;
                self.pool.claim(&account, now).map(Some)
            }
            Action::Earned { account } => {
                let account = self.account(account)?;
                self.pool.earned(&account, now).map(Some)
            }
            Action::Advance { secs } => {
                outcome.at = self.clock.advance(*secs).as_secs();
                Ok(None)
            }
        };

        match result {
            Ok(amount) => outcome.amount = amount,
            Err(e) => outcome.error = Some(e.to_string()),
        }
        outcome.events = self.drain_events();
        debug!(step = index, action = outcome.action, ok = outcome.error.is_none(), "step ran");
        Ok(outcome)
    }

    fn account(&mut self, raw: &str) -> Result<AccountId, SimError> {
        let account: AccountId = raw.parse()?;
        if !self.accounts.contains(&account) {
            self.accounts.push(account.clone());
        }
        Ok(account)
    }

    fn drain_events(&self) -> Vec<PoolEvent> {
        match self.captured.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => Vec::new(),
        }
    }

    /// Persist the pool, load it back and compare the two.
    fn verify_restore(&self) -> Result<(), SimError> {
        let store = NullStore::new();
        self.pool.save_to_store(&store)?;
        let restored = StakingPool::load_from_store(
            &store,
            self.pool.custody().clone(),
            self.pool.validator().clone(),
            self.pool.payout().clone(),
        )?;

        let now = self.query_time();
        let before: PoolInfo = self.pool.info(now)?;
        let after: PoolInfo = restored.info(now)?;
        if before != after {
            return Err(SimError::Divergence(format!("{before:?} != {after:?}")));
        }
        for account in &self.accounts {
            let (a, b) = (self.pool.earned(account, now)?, restored.earned(account, now)?);
            if a != b {
                return Err(SimError::Divergence(format!("{account} earned {a} vs {b}")));
            }
        }
        Ok(())
    }

    /// The clock, or the pool's last update if a script left the clock
    /// behind it.
    fn query_time(&self) -> Timestamp {
        self.clock.now().max(self.pool.accumulator().last_update)
    }

    fn summary(&self) -> Result<Summary, SimError> {
        let at = self.query_time();
        let info = self.pool.info(at)?;

        let mut accounts = Vec::with_capacity(self.accounts.len());
        for account in &self.accounts {
            accounts.push(AccountSummary {
                account: account.to_string(),
                weight: self.pool.weight_of(account),
                earned: self.pool.earned(account, at)?,
                paid: self.pool.payout().paid_to(account),
            });
        }
        accounts.sort_by(|a, b| a.account.cmp(&b.account));

        Ok(Summary {
            at: at.as_secs(),
            reward_rate: info.reward_rate,
            category_id: info.category_id,
            total_weight: info.total_weight,
            reward_per_weight: info.reward_per_weight,
            total_paid: info.total_paid,
            vault_balance: self.pool.payout().available(),
            accounts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(holders: &[(&str, &[u64])]) -> SimConfig {
        SimConfig {
            holders: holders
                .iter()
                .map(|(account, positions)| HolderConfig {
                    account: account.to_string(),
                    positions: positions.to_vec(),
                    approved: true,
                    category: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn summary_for<'a>(report: &'a Report, account: &str) -> &'a AccountSummary {
        report
            .summary
            .accounts
            .iter()
            .find(|a| a.account == account)
            .expect("account in summary")
    }

    #[test]
    fn parses_tagged_steps() {
        let script = Script::from_json_str(
            r#"{
                "steps": [
                    { "at": 3, "action": "deposit", "account": "alice", "positions": [1, 2] },
                    { "action": "advance", "secs": 5 },
                    { "action": "claim", "account": "alice" }
                ]
            }"#,
        )
        .expect("valid script");
        assert!(script.holders.is_empty());
        assert_eq!(script.steps[0].at, Some(3));
        assert_eq!(
            script.steps[0].action,
            Action::Deposit {
                account: "alice".into(),
                positions: vec![PositionId::new(1), PositionId::new(2)],
            }
        );
        assert_eq!(script.steps[1].action, Action::Advance { secs: 5 });
        assert_eq!(script.steps[2].at, None);
    }

    #[test]
    fn unknown_action_is_a_script_error() {
        let err = Script::from_json_str(r#"{ "steps": [{ "action": "burn" }] }"#).unwrap_err();
        assert!(matches!(err, SimError::Script(_)));
    }

    #[test]
    fn replays_proportional_split() {
        let config = config_with(&[("alice", &[1]), ("bob", &[2, 3, 4, 5])]);
        let script = Script::from_json_str(
            r#"{
                "steps": [
                    { "at": 0, "action": "deposit", "account": "alice", "positions": [1] },
                    { "at": 1, "action": "deposit", "account": "bob", "positions": [2, 3, 4, 5] },
                    { "at": 2, "action": "earned", "account": "bob" },
                    { "action": "claim", "account": "alice" }
                ]
            }"#,
        )
        .expect("valid script");

        let mut sim = Simulation::new(&config, &[]).expect("sim");
        let report = sim.replay(&script, true).expect("replay");

        assert_eq!(report.rejected(), 0);
        assert_eq!(report.outcomes[2].amount, Some(80));
        assert_eq!(report.outcomes[3].amount, Some(120));
        assert_eq!(report.outcomes[3].events.len(), 1);

        let alice = summary_for(&report, "alice");
        assert_eq!(alice.paid, 120);
        assert_eq!(alice.earned, 0);
        assert_eq!(summary_for(&report, "bob").earned, 80);
        assert_eq!(report.summary.total_weight, 5);
        assert_eq!(report.summary.vault_balance, 1_000_000_000 - 120);
    }

    #[test]
    fn rejected_step_is_recorded_and_replay_continues() {
        let config = config_with(&[("alice", &[1]), ("bob", &[2])]);
        let script = Script {
            holders: Vec::new(),
            steps: vec![
                Step {
                    at: Some(0),
                    action: Action::Deposit {
                        account: "alice".into(),
                        positions: vec![PositionId::new(2)],
                    },
                },
                Step {
                    at: None,
                    action: Action::Deposit {
                        account: "alice".into(),
                        positions: vec![PositionId::new(1)],
                    },
                },
            ],
        };

        let mut sim = Simulation::new(&config, &[]).expect("sim");
        let report = sim.replay(&script, false).expect("replay");
        assert_eq!(report.rejected(), 1);
        assert!(report.outcomes[0].events.is_empty());
        assert_eq!(report.outcomes[1].events.len(), 1);
        assert_eq!(sim.pool().total_weight(), 1);
    }

    #[test]
    fn fail_fast_stops_on_rejection() {
        let config = config_with(&[("alice", &[1])]);
        let script = Script::from_json_str(
            r#"{ "steps": [{ "action": "withdraw", "account": "alice", "positions": [1] }] }"#,
        )
        .expect("valid script");
        let mut sim = Simulation::new(&config, &[]).expect("sim");
        assert!(matches!(sim.replay(&script, true), Err(SimError::Script(_))));
    }

    #[test]
    fn backwards_step_is_rejected_not_fatal() {
        let config = config_with(&[("alice", &[1])]);
        let script = Script::from_json_str(
            r#"{
                "steps": [
                    { "at": 10, "action": "deposit", "account": "alice", "positions": [1] },
                    { "at": 4, "action": "claim", "account": "alice" }
                ]
            }"#,
        )
        .expect("valid script");
        let mut sim = Simulation::new(&config, &[]).expect("sim");
        let report = sim.replay(&script, false).expect("replay");
        assert_eq!(report.rejected(), 1);
        assert_eq!(report.summary.at, 10);
    }

    #[test]
    fn script_holders_and_unsupported_positions() {
        let mut config = SimConfig::default();
        config.unsupported.push(8);
        let extra = vec![HolderConfig {
            account: "carol".into(),
            positions: vec![7, 8],
            approved: true,
            category: None,
        }];
        let script = Script::from_json_str(
            r#"{
                "steps": [
                    { "at": 0, "action": "deposit", "account": "carol", "positions": [7, 8] },
                    { "action": "deposit", "account": "carol", "positions": [7] },
                    { "action": "advance", "secs": 3 }
                ]
            }"#,
        )
        .expect("valid script");
        let mut sim = Simulation::new(&config, &extra).expect("sim");
        let report = sim.replay(&script, false).expect("replay");
        assert_eq!(report.rejected(), 1);
        assert_eq!(report.outcomes[2].at, 3);
        assert_eq!(summary_for(&report, "carol").earned, 300);
    }

    #[test]
    fn holder_category_must_match_the_pool() {
        let mut config = SimConfig {
            category_id: 4,
            ..Default::default()
        };
        config.holders.push(HolderConfig {
            account: "erin".into(),
            positions: vec![30],
            approved: true,
            category: Some(2),
        });
        config.holders.push(HolderConfig {
            account: "frank".into(),
            positions: vec![40],
            approved: true,
            category: Some(4),
        });
        let script = Script::from_json_str(
            r#"{
                "steps": [
                    { "at": 0, "action": "deposit", "account": "erin", "positions": [30] },
                    { "action": "deposit", "account": "frank", "positions": [40] }
                ]
            }"#,
        )
        .expect("valid script");
        let mut sim = Simulation::new(&config, &[]).expect("sim");
        let report = sim.replay(&script, false).expect("replay");
        assert_eq!(report.rejected(), 1);
        assert!(report.outcomes[0].error.is_some());
        assert_eq!(report.summary.total_weight, 1);
    }

    #[test]
    fn blank_account_is_invalid() {
        let config = SimConfig::default();
        let script = Script::from_json_str(r#"{ "steps": [{ "action": "claim", "account": " " }] }"#)
            .expect("valid script");
        let mut sim = Simulation::new(&config, &[]).expect("sim");
        assert!(matches!(
            sim.replay(&script, false),
            Err(SimError::InvalidAccount(_))
        ));
    }

    #[test]
    fn report_serializes_to_json() {
        let config = config_with(&[("alice", &[1])]);
        let script = Script::from_json_str(
            r#"{ "steps": [{ "at": 0, "action": "deposit", "account": "alice", "positions": [1] }] }"#,
        )
        .expect("valid script");
        let mut sim = Simulation::new(&config, &[]).expect("sim");
        let report = sim.replay(&script, false).expect("replay");
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["outcomes"][0]["action"], "deposit");
        assert!(json["outcomes"][0]["events"][0]["Staked"].is_object());
        assert_eq!(json["summary"]["total_weight"], 1);
        assert_eq!(json["custody"].as_array().map(Vec::len), Some(2));
    }
}
