// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page controller: named views, gate-enforced navigation, and per-view
//! init hooks.
//!
//! Rendering is outside this crate; a host registers a hook per view and
//! draws whatever it likes when the hook fires. The controller's job is
//! routing discipline: no protected view is ever entered without a fresh
//! gate decision, and a denied user lands on the activation prompt.

use crate::models::user::SessionStore;
use crate::services::gate::{AccessGate, Decision};
use crate::services::sync::SyncAgent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Named views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Landing,
    Login,
    Register,
    Activation,
    Dashboard,
    ExamSetup,
    Exam,
    Results,
    Admin,
}

impl Page {
    /// Everything except landing, login, register, and the activation flow
    /// requires access.
    pub fn is_protected(&self) -> bool {
        !matches!(
            self,
            Page::Landing | Page::Login | Page::Register | Page::Activation
        )
    }
}

/// Where a navigation attempt actually landed.
#[derive(Debug, Clone, Copy)]
pub struct NavOutcome {
    pub page: Page,
    /// True when the controller sent the user somewhere other than the
    /// requested view.
    pub redirected: bool,
    pub decision: Option<Decision>,
}

type ViewHook = Box<dyn Fn(Page) + Send + Sync>;

/// Routes between views, consulting the access gate.
#[derive(Clone)]
pub struct PageController {
    gate: AccessGate,
    session: SessionStore,
    sync: SyncAgent,
    current: Arc<Mutex<Page>>,
    hooks: Arc<Mutex<HashMap<Page, ViewHook>>>,
}

impl PageController {
    pub fn new(gate: AccessGate, session: SessionStore, sync: SyncAgent) -> Self {
        Self {
            gate,
            session,
            sync,
            current: Arc::new(Mutex::new(Page::Landing)),
            hooks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register the init hook for a view, replacing any previous one.
    pub fn on_enter<F: Fn(Page) + Send + Sync + 'static>(&self, page: Page, hook: F) {
        self.hooks
            .lock()
            .expect("hooks poisoned")
            .insert(page, Box::new(hook));
    }

    pub fn current(&self) -> Page {
        *self.current.lock().expect("current page poisoned")
    }

    /// Navigate to a view, enforcing the gate for protected ones.
    ///
    /// Denied access redirects to the activation prompt; a missing session
    /// redirects to login; non-admins asking for the admin view land on the
    /// dashboard instead.
    pub fn navigate(&self, target: Page) -> NavOutcome {
        // Best-effort flush of staged changes before leaving the view.
        self.sync.schedule_flush();

        if !target.is_protected() {
            return self.enter(target, target);
        }

        let Some(user) = self.session.snapshot() else {
            return self.enter(Page::Login, target);
        };

        let decision = self.gate.check(&user);
        if !decision.allowed {
            let mut outcome = self.enter(Page::Activation, target);
            outcome.decision = Some(decision);
            return outcome;
        }

        if target == Page::Admin && !user.is_admin {
            let mut outcome = self.enter(Page::Dashboard, target);
            outcome.decision = Some(decision);
            return outcome;
        }

        let mut outcome = self.enter(target, target);
        outcome.decision = Some(decision);
        outcome
    }

    fn enter(&self, page: Page, requested: Page) -> NavOutcome {
        *self.current.lock().expect("current page poisoned") = page;

        if let Some(hook) = self.hooks.lock().expect("hooks poisoned").get(&page) {
            hook(page);
        }

        let redirected = page != requested;
        if redirected {
            tracing::debug!(?requested, landed = ?page, "Navigation redirected");
        }

        NavOutcome {
            page,
            redirected,
            decision: None,
        }
    }
}
