//! Scoped release of connections and sessions.
//!
//! Each guard owns its resource until dropped and releases it exactly once.
//! A [`SessionGuard`] borrows nothing from its connection, so the ordering
//! "session closed before connection" is enforced by scope nesting in the
//! orchestrator and the session runner.

use std::ops::{Deref, DerefMut};

use logging::{trace_connect, trace_session};

use crate::transport::{Connection, Session};

/// Owns a live connection and closes it on drop.
pub struct ConnectionGuard<C: Connection> {
    inner: Option<C>,
    address: String,
}

impl<C: Connection> ConnectionGuard<C> {
    pub(crate) fn new(connection: C, address: String) -> Self {
        Self {
            inner: Some(connection),
            address,
        }
    }
}

impl<C: Connection> Deref for ConnectionGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        // `inner` is only taken in `drop`.
        match &self.inner {
            Some(connection) => connection,
            None => unreachable!("connection used after release"),
        }
    }
}

impl<C: Connection> DerefMut for ConnectionGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        match &mut self.inner {
            Some(connection) => connection,
            None => unreachable!("connection used after release"),
        }
    }
}

impl<C: Connection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        if let Some(connection) = self.inner.take() {
            connection.close();
            trace_connect!(address = %self.address, "connection closed");
        }
    }
}

/// Owns an open session and closes it on drop.
pub struct SessionGuard<S: Session> {
    inner: Option<S>,
}

impl<S: Session> SessionGuard<S> {
    pub(crate) fn new(session: S) -> Self {
        trace_session!("session opened");
        Self {
            inner: Some(session),
        }
    }
}

impl<S: Session> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        match &self.inner {
            Some(session) => session,
            None => unreachable!("session used after release"),
        }
    }
}

impl<S: Session> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        match &mut self.inner {
            Some(session) => session,
            None => unreachable!("session used after release"),
        }
    }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if let Some(session) = self.inner.take() {
            session.close();
            trace_session!("session closed");
        }
    }
}
