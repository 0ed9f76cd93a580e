/// Report store
///
/// Holds the latest normalized report snapshot and pushes it to the attached
/// views. Refresh is lazy: while the reports surface is hidden, updates only
/// replace the snapshot; `show()` catches the views up.
use crate::normalize::normalize_report;
use crate::types::ReportSnapshot;
use log::debug;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// A presentation surface that renders report snapshots
pub trait ReportView {
    fn refresh(&mut self, snapshot: &ReportSnapshot);
}

/// Shared views: the store refreshes it, the front end reads it back
impl<V: ReportView> ReportView for Rc<RefCell<V>> {
    fn refresh(&mut self, snapshot: &ReportSnapshot) {
        self.borrow_mut().refresh(snapshot);
    }
}

#[derive(Default)]
pub struct ReportStore {
    snapshot: ReportSnapshot,
    visible: bool,
    views: Vec<Box<dyn ReportView>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, view: Box<dyn ReportView>) {
        self.views.push(view);
    }

    /// Normalize a raw execution result and replace the held snapshot.
    pub fn update(&mut self, raw: &Value) {
        self.replace(normalize_report(raw));
    }

    /// Replace the snapshot wholesale; the previous one is dropped.
    pub fn replace(&mut self, snapshot: ReportSnapshot) {
        self.snapshot = snapshot;
        debug!(
            "report snapshot replaced: {} errors, {} symbols, ast={}",
            self.snapshot.errors.len(),
            self.snapshot.symbols.len(),
            self.snapshot.ast.is_some()
        );
        if self.visible {
            self.notify();
        }
    }

    pub fn current(&self) -> &ReportSnapshot {
        &self.snapshot
    }

    pub fn clear(&mut self) {
        self.replace(ReportSnapshot::default());
    }

    /// Make the reports surface visible and refresh every view.
    pub fn show(&mut self) {
        self.visible = true;
        self.notify();
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn has_errors(&self) -> bool {
        !self.snapshot.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.snapshot.errors.len()
    }

    fn notify(&mut self) {
        for view in &mut self.views {
            view.refresh(&self.snapshot);
        }
    }
}
