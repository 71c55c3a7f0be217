//! Target account resolution through an ordered list of lookup strategies.

use crate::client::{Account, ChatClient, Lookup, Resolved};
use crate::host::Invocation;
use std::sync::Arc;
use tracing::debug;

/// One way of finding the target account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// The argument is all digits: look it up as an account id
    NumericId(i64),
    /// Look the text up as a username or mention
    Username(String),
    /// Author of the replied-to message
    ReplySender,
    /// Author of the command message
    Invoker,
}

/// Strategies to try for `invocation`, in order.
///
/// With an argument, only argument-based strategies apply: numeric id (when all digits),
/// the text as typed, then the text with `@` prepended (when missing). Without an argument
/// the reply's author is used when there is a reply, the command's author otherwise.
#[must_use]
pub fn plan(invocation: &Invocation) -> Vec<Strategy> {
    let Some(target) = invocation.args.as_deref().map(str::trim) else {
        return if invocation.reply.is_some() {
            vec![Strategy::ReplySender]
        } else {
            vec![Strategy::Invoker]
        };
    };

    let mut strategies = Vec::with_capacity(3);
    if !target.is_empty() && target.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(id) = target.parse::<i64>() {
            strategies.push(Strategy::NumericId(id));
        }
    }
    strategies.push(Strategy::Username(target.to_string()));
    if !target.starts_with('@') {
        strategies.push(Strategy::Username(format!("@{target}")));
    }
    strategies
}

/// Finds the account an invocation is about.
pub struct Resolver {
    client: Arc<dyn ChatClient>,
}

impl Resolver {
    #[must_use]
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    /// Runs the planned strategies in order and returns the first account found.
    ///
    /// `None` means no strategy produced an account; lookup failures are not errors here.
    pub async fn resolve(&self, invocation: &Invocation) -> Option<Account> {
        for strategy in plan(invocation) {
            if let Some(account) = self.attempt(&strategy, invocation).await {
                debug!(?strategy, account_id = account.id, "Target resolved");
                return Some(account);
            }
        }
        debug!("No strategy resolved a target");
        None
    }

    async fn attempt(&self, strategy: &Strategy, invocation: &Invocation) -> Option<Account> {
        let resolved = match strategy {
            Strategy::NumericId(id) => self.lookup(&Lookup::Id(*id)).await,
            Strategy::Username(name) => self.lookup(&Lookup::Username(name.clone())).await,
            Strategy::ReplySender => invocation
                .reply
                .as_ref()
                .and_then(|reply| reply.sender.clone())
                .unwrap_or(Resolved::NotFound),
            Strategy::Invoker => invocation.sender.clone().unwrap_or(Resolved::NotFound),
        };
        self.normalize(resolved).await
    }

    async fn lookup(&self, lookup: &Lookup) -> Resolved {
        match self.client.resolve(lookup).await {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(?lookup, error = %e, "Lookup failed");
                Resolved::NotFound
            }
        }
    }

    /// Turns a lookup result into a full account, expanding a reference with one more lookup.
    async fn normalize(&self, resolved: Resolved) -> Option<Account> {
        match resolved {
            Resolved::Full(account) => Some(account),
            Resolved::NotFound => None,
            Resolved::Ref(reference) => match self.lookup(&Lookup::Reference(reference)).await {
                Resolved::Full(account) => Some(account),
                other => {
                    debug!(?reference, result = ?other, "Reference did not expand");
                    None
                }
            },
        }
    }
}
