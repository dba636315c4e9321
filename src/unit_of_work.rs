//! Transaction wrapper shared by the core services.
//!
//! A [`UnitOfWork`] owns one database transaction plus the side effects that
//! must only happen once it commits. Dropping it without calling
//! [`UnitOfWork::commit`] rolls the transaction back and discards the hooks.
//!
//! Committing hands the queued hooks back as [`Committed`]. Callers run them
//! after leaving their transaction timeout, so a slow mail relay can never
//! turn a durable write into a reported failure.

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::time::timeout;

use crate::{
    activity::{NewActivity, log_activity},
    error::AppResult,
    mailer::{OrderDeliveredEmail, TicketRepliedEmail},
    state::AppState,
};

#[derive(Debug, Clone, PartialEq)]
pub enum PostCommit {
    Activity(NewActivity),
    OrderDelivered(OrderDeliveredEmail),
    TicketReplied(TicketRepliedEmail),
}

pub struct UnitOfWork {
    txn: DatabaseTransaction,
    hooks: Vec<PostCommit>,
}

impl UnitOfWork {
    pub async fn begin(db: &DatabaseConnection) -> AppResult<Self> {
        Ok(Self {
            txn: db.begin().await?,
            hooks: Vec::new(),
        })
    }

    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub fn after_commit(&mut self, hook: PostCommit) {
        self.hooks.push(hook);
    }

    pub async fn commit(self) -> AppResult<Committed> {
        self.txn.commit().await?;
        Ok(Committed { hooks: self.hooks })
    }
}

/// Side effects of a transaction that has already committed.
#[must_use = "post-commit hooks only run when `run_hooks` is awaited"]
#[derive(Debug, Default)]
pub struct Committed {
    hooks: Vec<PostCommit>,
}

impl Committed {
    pub fn hooks(&self) -> &[PostCommit] {
        &self.hooks
    }

    /// Runs every hook in order. Failures and timeouts are logged, never returned.
    pub async fn run_hooks(self, state: &AppState) {
        run_post_commit(state, self.hooks).await;
    }
}

pub async fn run_post_commit(state: &AppState, hooks: Vec<PostCommit>) {
    for hook in hooks {
        let name = hook_name(&hook);
        match timeout(state.tx_timeout, run_hook(state, &hook)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, hook = name, "post-commit hook failed"),
            Err(_) => tracing::warn!(hook = name, "post-commit hook timed out"),
        }
    }
}

async fn run_hook(state: &AppState, hook: &PostCommit) -> anyhow::Result<()> {
    match hook {
        PostCommit::Activity(activity) => log_activity(&state.orm, activity)
            .await
            .map_err(anyhow::Error::from),
        PostCommit::OrderDelivered(email) => state.mailer.send_order_delivered(email).await,
        PostCommit::TicketReplied(email) => state.mailer.send_ticket_replied(email).await,
    }
}

fn hook_name(hook: &PostCommit) -> &'static str {
    match hook {
        PostCommit::Activity(_) => "activity_log",
        PostCommit::OrderDelivered(_) => "order_delivered_email",
        PostCommit::TicketReplied(_) => "ticket_replied_email",
    }
}
