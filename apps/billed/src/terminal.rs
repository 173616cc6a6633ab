use std::sync::Mutex;

use client_core::{views::render_proof, Navigator, ProofOverlay, ProofViewer, Route};

/// Keeps the last requested route so the command loop can render it.
#[derive(Default)]
pub struct TerminalNavigator {
    current: Mutex<Option<Route>>,
}

impl TerminalNavigator {
    pub fn current(&self) -> Option<Route> {
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(path = route.path(), "navigate");
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(route);
    }
}

pub struct TerminalProofViewer;

impl ProofViewer for TerminalProofViewer {
    fn show_proof(&self, proof: ProofOverlay) {
        print!("{}", render_proof(&proof));
    }
}
