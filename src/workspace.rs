//! Multi-document model: any number of independent sessions, one of them
//! active. Menu-level actions ("save", "reset") target the active session and
//! do nothing when no image is open.

use std::path::Path;

use uuid::Uuid;

use crate::error::{DecodeError, EncodeError};
use crate::log_info;
use crate::ops::ProcessingStrategy;
use crate::session::Session;

#[derive(Default)]
pub struct Workspace {
    sessions: Vec<Session>,
    active: Option<Uuid>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an image as a new active session. A failed decode leaves the
    /// workspace untouched.
    pub fn open(&mut self, path: &Path, strategy: ProcessingStrategy) -> Result<Uuid, DecodeError> {
        let session = Session::open(path, strategy)?;
        Ok(self.insert(session))
    }

    /// Add an existing session and make it active.
    pub fn insert(&mut self, session: Session) -> Uuid {
        let id = session.id;
        self.sessions.push(session);
        self.active = Some(id);
        id
    }

    /// Close and drop a session. The most recently opened remaining session
    /// becomes active if the closed one was.
    pub fn close(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.sessions.iter().position(|s| s.id == id) else { return false };
        let mut session = self.sessions.remove(idx);
        session.close();
        if self.active == Some(id) {
            self.active = self.sessions.last().map(|s| s.id);
        }
        true
    }

    pub fn activate(&mut self, id: Uuid) -> bool {
        if self.sessions.iter().any(|s| s.id == id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn active_id(&self) -> Option<Uuid> { self.active }

    pub fn active(&self) -> Option<&Session> {
        let id = self.active?;
        self.get(id)
    }

    pub fn active_mut(&mut self) -> Option<&mut Session> {
        let id = self.active?;
        self.get_mut(id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Session ids in opening order.
    pub fn ids(&self) -> Vec<Uuid> {
        self.sessions.iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize { self.sessions.len() }

    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }

    /// Save the active session, format from extension. `Ok(false)` when no
    /// session is active.
    pub fn save_active(&self, path: &Path) -> Result<bool, EncodeError> {
        match self.active() {
            Some(session) => session.save_as(path),
            None => Ok(false),
        }
    }

    /// Close every session.
    pub fn close_all(&mut self) {
        let count = self.sessions.len();
        for session in &mut self.sessions {
            session.close();
        }
        self.sessions.clear();
        self.active = None;
        if count > 0 {
            log_info!("closed {} session(s)", count);
        }
    }
}
