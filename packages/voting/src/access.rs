// ABOUTME: Authorization and rate-limit gates consumed by the voting service
// ABOUTME: Both are plain predicates; identity and throttling policy live outside this crate

use std::collections::HashSet;

/// Answers "may this user take part" questions. Implementations must be cheap and side-effect free.
pub trait MemberDirectory: Send + Sync {
    fn is_approved(&self, user_id: &str) -> bool;
    fn is_admin(&self, user_id: &str) -> bool;
}

/// Per-voter throttle consulted before each vote toggle. Returns false once the voter is over quota.
pub trait VoteRateLimiter: Send + Sync {
    fn check(&self, voter_id: &str) -> bool;
}

/// Rate limiter that never throttles
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRateLimit;

impl VoteRateLimiter for NoRateLimit {
    fn check(&self, _voter_id: &str) -> bool {
        true
    }
}

/// Fixed member lists, typically loaded from configuration. Admins count as approved.
#[derive(Debug, Default, Clone)]
pub struct StaticMemberDirectory {
    approved: HashSet<String>,
    admins: HashSet<String>,
}

impl StaticMemberDirectory {
    pub fn new<A, B>(approved: A, admins: B) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            approved: approved.into_iter().map(Into::into).collect(),
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }
}

impl MemberDirectory for StaticMemberDirectory {
    fn is_approved(&self, user_id: &str) -> bool {
        self.approved.contains(user_id) || self.admins.contains(user_id)
    }

    fn is_admin(&self, user_id: &str) -> bool {
        self.admins.contains(user_id)
    }
}
