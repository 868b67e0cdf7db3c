//! # Application Services
//!
//! Stateful services behind a trade view and the negotiation form.
//!
//! - [`TradeSessionStore`]: locally known trade state
//! - [`NegotiationForm`]: offer → initiate-trade request
//! - [`PaymentCoordinator`]: confirm / mark sent / complete / cancel
//! - [`CountdownMonitor`]: settlement window
//! - [`StatusPoller`]: background refetch and terminal redirect

pub mod action_guard;
pub mod countdown;
pub mod crypto_wallets;
pub mod event_bus;
pub mod negotiation;
pub mod notice;
pub mod notification;
pub mod payment_coordinator;
pub mod redirect;
pub mod side_effects;
pub mod status_poller;
pub mod timings;
pub mod trade_session;

pub use action_guard::{ActionGuard, ActionPermit};
pub use countdown::{
    CountdownHandle, CountdownMonitor, CountdownPhase, CountdownReading, EXPIRED_MESSAGE,
    remaining,
};
pub use crypto_wallets::{CRYPTO_WALLETS, CryptoWallet, wallet_for};
pub use event_bus::{AppEvent, DEFAULT_BUS_CAPACITY, EventBus};
pub use negotiation::{EditedField, NegotiationForm, WalletDisclosure};
pub use notice::{Notice, NoticeLevel};
pub use notification::{
    CallToAction, NotificationDetails, SwapDetails, TradeNotification, dispatch_best_effort,
};
pub use payment_coordinator::{CancelOutcome, PaymentCoordinator};
pub use redirect::{Redirect, RedirectReason, RedirectScheduler, Route};
pub use side_effects::SideEffects;
pub use status_poller::{LOAD_FAILED_MESSAGE, PollOutcome, StatusPoller};
pub use timings::TradeTimings;
pub use trade_session::{Applied, PendingIntent, SessionState, TradeSessionStore};
