//! In-memory session table
//!
//! One active conversation per user, keyed by user id. Expiry is enforced
//! on every lookup, so an idle session can never accept further input even
//! if the background sweep has not run yet.

use crate::state_machine::Session;
use chrono::{Duration, NaiveDateTime};
use dashmap::DashMap;

pub struct SessionStore {
    sessions: DashMap<i64, Session>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    /// Look up a user's session. Expired entries are dropped on the spot
    /// and reported as absent.
    pub fn get(&self, user_id: i64, now: NaiveDateTime) -> Option<Session> {
        let expired = match self.sessions.get(&user_id) {
            Some(entry) => entry.is_expired(now, self.idle_timeout),
            None => return None,
        };
        if expired {
            self.sessions.remove(&user_id);
            return None;
        }
        self.sessions.get(&user_id).map(|entry| entry.clone())
    }

    pub fn put(&self, session: Session) {
        self.sessions.insert(session.user_id, session);
    }

    pub fn remove(&self, user_id: i64) {
        self.sessions.remove(&user_id);
    }

    /// Drop every session idle past the timeout. Returns how many were
    /// removed; safe to run concurrently with dispatch.
    pub fn sweep_expired(&self, now: NaiveDateTime) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_expired(now, self.idle_timeout));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
