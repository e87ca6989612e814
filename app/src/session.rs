//! Wallet session panel state machine.
//!
//! The session performs no I/O. Each input returns the follow-up the runtime
//! should perform ([`SessionAction`]), and completions are fed back through
//! [`WalletSession::balance_fetched`] and [`WalletSession::transfer_finished`].
//! Time is passed in explicitly so deadlines are testable.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use solwatch_types::{Lamports, Pubkey, Signature};

use crate::balance::{BalanceError, BalanceState};

pub const SEND_SUCCESS_MESSAGE: &str = "✅ Transaction successful!";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Idle,
    FetchingBalance,
    Sending,
    Cooldown,
}

/// Errors shown in the session panel.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{0}")]
    Balance(BalanceError),

    #[error("Failed to send transaction. Please try again.")]
    SendFailed,

    #[error("Connect a wallet first.")]
    NotConnected,

    #[error("A transfer is already in progress.")]
    SendInProgress,

    #[error("Enter a valid recipient address.")]
    InvalidRecipient,

    #[error("Enter a valid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must be greater than zero.")]
    NonPositiveAmount,

    #[error("Amount exceeds your balance of {balance}.")]
    InsufficientBalance { balance: Lamports },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: Pubkey,
    pub to: Pubkey,
    pub lamports: Lamports,
}

/// Work the runtime must start on the session's behalf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    FetchBalance { owner: Pubkey },
    Transfer(TransferRequest),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Started(SessionAction),
    CoolingDown { remaining: Duration },
    AlreadyLoading,
    NotConnected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub expires_at: Instant,
}

pub struct WalletSession {
    cooldown: Duration,
    notice_duration: Duration,
    owner: Option<Pubkey>,
    balance: BalanceState,
    loading: bool,
    error: Option<SessionError>,
    cooldown_until: Option<Instant>,
    recipient: String,
    amount: String,
    sending: bool,
    notice: Option<Notice>,
    last_signature: Option<Signature>,
}

impl WalletSession {
    pub fn new(cooldown: Duration, notice_duration: Duration) -> Self {
        Self {
            cooldown,
            notice_duration,
            owner: None,
            balance: BalanceState::NotFetched,
            loading: false,
            error: None,
            cooldown_until: None,
            recipient: String::new(),
            amount: String::new(),
            sending: false,
            notice: None,
            last_signature: None,
        }
    }

    // ── Wallet lifecycle ─────────────────────────────────────────────────

    pub fn wallet_connected(&mut self, owner: Pubkey) -> SessionAction {
        self.reset();
        self.owner = Some(owner);
        self.start_fetch(owner)
    }

    pub fn wallet_disconnected(&mut self) {
        self.reset();
    }

    /// The active endpoint changed; a connected session re-reads its balance
    /// from the new cluster.
    pub fn endpoint_changed(&mut self) -> Option<SessionAction> {
        let owner = self.owner?;
        self.balance = BalanceState::NotFetched;
        Some(self.start_fetch(owner))
    }

    fn reset(&mut self) {
        *self = Self::new(self.cooldown, self.notice_duration);
    }

    fn start_fetch(&mut self, owner: Pubkey) -> SessionAction {
        self.loading = true;
        self.error = None;
        SessionAction::FetchBalance { owner }
    }

    // ── Balance ──────────────────────────────────────────────────────────

    /// Manual refresh. Rejected while cooling down or while a fetch is
    /// already in flight; an accepted refresh starts the cooldown.
    pub fn refresh(&mut self, now: Instant) -> RefreshOutcome {
        let Some(owner) = self.owner else {
            return RefreshOutcome::NotConnected;
        };
        if let Some(until) = self.cooldown_until.filter(|until| *until > now) {
            return RefreshOutcome::CoolingDown {
                remaining: until - now,
            };
        }
        if self.loading {
            return RefreshOutcome::AlreadyLoading;
        }
        self.cooldown_until = Some(now + self.cooldown);
        RefreshOutcome::Started(self.start_fetch(owner))
    }

    /// Apply a balance result. Results for a wallet that is no longer
    /// connected are ignored. On failure the last known balance stays.
    pub fn balance_fetched(&mut self, owner: Pubkey, result: BalanceState) {
        if self.owner != Some(owner) {
            tracing::debug!(%owner, "ignoring balance for a disconnected wallet");
            return;
        }
        self.loading = false;
        match result {
            BalanceState::Failed(e) => {
                if !matches!(self.balance, BalanceState::Loaded(_)) {
                    self.balance = BalanceState::Failed(e.clone());
                }
                self.error = Some(SessionError::Balance(e));
            }
            state => self.balance = state,
        }
    }

    // ── Transfer ─────────────────────────────────────────────────────────

    pub fn set_recipient(&mut self, recipient: impl Into<String>) {
        self.recipient = recipient.into();
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
    }

    /// Validate the inputs and start a transfer.
    pub fn submit(&mut self) -> Result<SessionAction, SessionError> {
        let Some(from) = self.owner else {
            return Err(SessionError::NotConnected);
        };
        if self.sending {
            return Err(SessionError::SendInProgress);
        }
        let (to, lamports) = match validate_transfer(&self.recipient, &self.amount, &self.balance) {
            Ok(valid) => valid,
            Err(e) => {
                self.error = Some(e.clone());
                return Err(e);
            }
        };
        self.sending = true;
        self.error = None;
        self.notice = None;
        Ok(SessionAction::Transfer(TransferRequest { from, to, lamports }))
    }

    /// Apply the outcome of a transfer. A success clears the inputs, shows
    /// the notice and requests one balance fetch.
    pub fn transfer_finished(
        &mut self,
        result: Result<Signature, String>,
        now: Instant,
    ) -> Option<SessionAction> {
        if !self.sending {
            return None;
        }
        self.sending = false;
        match result {
            Ok(signature) => {
                self.recipient.clear();
                self.amount.clear();
                self.last_signature = Some(signature);
                self.notice = Some(Notice {
                    text: SEND_SUCCESS_MESSAGE.to_string(),
                    expires_at: now + self.notice_duration,
                });
                let owner = self.owner?;
                Some(self.start_fetch(owner))
            }
            Err(reason) => {
                tracing::warn!(%reason, "transfer failed");
                self.error = Some(SessionError::SendFailed);
                None
            }
        }
    }

    // ── Timers ───────────────────────────────────────────────────────────

    /// Drop deadlines that have passed.
    pub fn tick(&mut self, now: Instant) {
        if self.cooldown_until.is_some_and(|until| until <= now) {
            self.cooldown_until = None;
        }
        if self.notice.as_ref().is_some_and(|n| n.expires_at <= now) {
            self.notice = None;
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let notice = self.notice.as_ref().map(|n| n.expires_at);
        match (self.cooldown_until, notice) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ── Views ────────────────────────────────────────────────────────────

    pub fn status(&self, now: Instant) -> SessionStatus {
        if self.owner.is_none() {
            SessionStatus::Disconnected
        } else if self.sending {
            SessionStatus::Sending
        } else if self.loading {
            SessionStatus::FetchingBalance
        } else if self.in_cooldown(now) {
            SessionStatus::Cooldown
        } else {
            SessionStatus::Idle
        }
    }

    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| until > now)
    }

    pub fn refresh_label(&self, now: Instant) -> &'static str {
        if self.loading {
            "Refreshing..."
        } else if self.in_cooldown(now) {
            "Wait..."
        } else {
            "Refresh"
        }
    }

    pub fn send_label(&self) -> &'static str {
        if self.sending {
            "Sending..."
        } else {
            "Send"
        }
    }

    pub fn owner(&self) -> Option<Pubkey> {
        self.owner
    }

    pub fn balance(&self) -> &BalanceState {
        &self.balance
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn sending(&self) -> bool {
        self.sending
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn last_signature(&self) -> Option<Signature> {
        self.last_signature
    }
}

/// Check transfer inputs before anything is built or signed.
///
/// The balance check is skipped while the balance is unknown; network fees
/// are left to the cluster to reject.
pub fn validate_transfer(
    recipient: &str,
    amount: &str,
    balance: &BalanceState,
) -> Result<(Pubkey, Lamports), SessionError> {
    let to: Pubkey = recipient
        .trim()
        .parse()
        .map_err(|_| SessionError::InvalidRecipient)?;

    let amount = amount.trim();
    if amount.starts_with('-') {
        return Err(SessionError::NonPositiveAmount);
    }
    let lamports =
        Lamports::from_sol_str(amount).map_err(|e| SessionError::InvalidAmount(e.to_string()))?;
    if lamports.is_zero() {
        return Err(SessionError::NonPositiveAmount);
    }
    if let Some(balance) = balance.lamports() {
        if lamports > balance {
            return Err(SessionError::InsufficientBalance { balance });
        }
    }
    Ok((to, lamports))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(5);
    const NOTICE: Duration = Duration::from_secs(5);

    fn owner() -> Pubkey {
        Pubkey::new([1; 32])
    }

    fn recipient() -> Pubkey {
        Pubkey::new([2; 32])
    }

    fn loaded(sol: u64) -> BalanceState {
        BalanceState::Loaded(Lamports::new(sol * solwatch_types::LAMPORTS_PER_SOL))
    }

    fn connected_session() -> WalletSession {
        let mut session = WalletSession::new(COOLDOWN, NOTICE);
        session.wallet_connected(owner());
        session.balance_fetched(owner(), loaded(2));
        session
    }

    #[test]
    fn connecting_requests_a_balance() {
        let mut session = WalletSession::new(COOLDOWN, NOTICE);
        let now = Instant::now();
        assert_eq!(session.status(now), SessionStatus::Disconnected);

        let action = session.wallet_connected(owner());
        assert_eq!(action, SessionAction::FetchBalance { owner: owner() });
        assert_eq!(session.status(now), SessionStatus::FetchingBalance);
        assert_eq!(session.refresh_label(now), "Refreshing...");

        session.balance_fetched(owner(), loaded(1));
        assert_eq!(session.status(now), SessionStatus::Idle);
        assert_eq!(session.balance(), &loaded(1));
    }

    #[test]
    fn refresh_is_rejected_during_cooldown() {
        let mut session = connected_session();
        let now = Instant::now();

        assert!(matches!(session.refresh(now), RefreshOutcome::Started(_)));
        session.balance_fetched(owner(), loaded(2));
        assert_eq!(session.status(now), SessionStatus::Cooldown);
        assert_eq!(session.refresh_label(now), "Wait...");

        let later = now + Duration::from_secs(2);
        assert_eq!(
            session.refresh(later),
            RefreshOutcome::CoolingDown {
                remaining: Duration::from_secs(3)
            }
        );

        let after = now + COOLDOWN;
        session.tick(after);
        assert_eq!(session.status(after), SessionStatus::Idle);
        assert!(matches!(session.refresh(after), RefreshOutcome::Started(_)));
    }

    #[test]
    fn refresh_while_loading_is_ignored() {
        let mut session = WalletSession::new(COOLDOWN, NOTICE);
        session.wallet_connected(owner());
        assert_eq!(session.refresh(Instant::now()), RefreshOutcome::AlreadyLoading);
    }

    #[test]
    fn refresh_without_wallet() {
        let mut session = WalletSession::new(COOLDOWN, NOTICE);
        assert_eq!(session.refresh(Instant::now()), RefreshOutcome::NotConnected);
    }

    #[test]
    fn balance_failure_keeps_last_known_value() {
        let mut session = connected_session();
        session.refresh(Instant::now());
        session.balance_fetched(owner(), BalanceState::Failed(BalanceError::RateLimited));
        assert_eq!(session.balance(), &loaded(2));
        assert_eq!(
            session.error().map(ToString::to_string).as_deref(),
            Some("Too many requests. Please wait a few seconds and try again.")
        );
    }

    #[test]
    fn balance_for_previous_wallet_is_ignored() {
        let mut session = WalletSession::new(COOLDOWN, NOTICE);
        session.wallet_connected(owner());
        session.wallet_disconnected();
        session.balance_fetched(owner(), loaded(9));
        assert_eq!(session.balance(), &BalanceState::NotFetched);
        assert_eq!(session.status(Instant::now()), SessionStatus::Disconnected);
    }

    #[test]
    fn submit_validates_inputs() {
        let mut session = connected_session();

        session.set_recipient("not an address");
        session.set_amount("1");
        assert_eq!(session.submit(), Err(SessionError::InvalidRecipient));

        session.set_recipient(recipient().to_string());
        for (amount, expected) in [
            ("0", SessionError::NonPositiveAmount),
            ("-1", SessionError::NonPositiveAmount),
            (
                "3",
                SessionError::InsufficientBalance {
                    balance: Lamports::new(2 * solwatch_types::LAMPORTS_PER_SOL),
                },
            ),
        ] {
            session.set_amount(amount);
            assert_eq!(session.submit(), Err(expected));
        }

        session.set_amount("abc");
        assert!(matches!(session.submit(), Err(SessionError::InvalidAmount(_))));
        assert!(!session.sending());
        assert!(session.error().is_some());
    }

    #[test]
    fn submit_builds_request_and_blocks_resubmission() {
        let mut session = connected_session();
        session.set_recipient(format!("  {}  ", recipient()));
        session.set_amount("0.5");
        assert_eq!(session.send_label(), "Send");

        let action = session.submit().unwrap();
        assert_eq!(
            action,
            SessionAction::Transfer(TransferRequest {
                from: owner(),
                to: recipient(),
                lamports: Lamports::new(500_000_000),
            })
        );
        assert_eq!(session.send_label(), "Sending...");
        assert_eq!(session.submit(), Err(SessionError::SendInProgress));
    }

    #[test]
    fn successful_transfer_clears_inputs_and_shows_notice() {
        let mut session = connected_session();
        session.set_recipient(recipient().to_string());
        session.set_amount("1");
        session.submit().unwrap();

        let now = Instant::now();
        let follow_up = session.transfer_finished(Ok(Signature::new([7; 64])), now);
        assert_eq!(follow_up, Some(SessionAction::FetchBalance { owner: owner() }));
        assert_eq!(session.recipient(), "");
        assert_eq!(session.amount(), "");
        assert_eq!(session.notice().map(|n| n.text.as_str()), Some(SEND_SUCCESS_MESSAGE));
        assert_eq!(SEND_SUCCESS_MESSAGE, "✅ Transaction successful!");
        assert_eq!(session.next_deadline(), Some(now + NOTICE));

        session.tick(now + NOTICE - Duration::from_millis(1));
        assert!(session.notice().is_some());
        session.tick(now + NOTICE);
        assert!(session.notice().is_none());
        assert_eq!(session.next_deadline(), None);
    }

    #[test]
    fn failed_transfer_keeps_inputs() {
        let mut session = connected_session();
        session.set_recipient(recipient().to_string());
        session.set_amount("1");
        session.submit().unwrap();

        let follow_up = session.transfer_finished(Err("rejected".into()), Instant::now());
        assert_eq!(follow_up, None);
        assert_eq!(session.recipient(), recipient().to_string());
        assert_eq!(session.amount(), "1");
        assert_eq!(
            session.error().map(ToString::to_string).as_deref(),
            Some("Failed to send transaction. Please try again.")
        );
        assert!(session.notice().is_none());
    }

    #[test]
    fn unknown_balance_skips_the_balance_check() {
        assert!(validate_transfer(
            &recipient().to_string(),
            "1000",
            &BalanceState::Failed(BalanceError::FetchFailed)
        )
        .is_ok());
    }
}
