//! Transition and Deferral Strategies
//!
//! Both are chosen once from the detected capabilities instead of being
//! re-checked on every navigation.

use crate::config::NavigationConfig;
use crate::document::{Capabilities, DocumentAdapter};
use std::time::Duration;

/// How the content swap is animated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStrategy {
    /// Wrap the DOM mutation in the native view-transition primitive
    ViewTransition,
    /// Exit class, bounded wait, mutate, entering class
    ClassFallback,
}

impl TransitionStrategy {
    pub fn select(capabilities: Capabilities) -> Self {
        if capabilities.view_transitions {
            TransitionStrategy::ViewTransition
        } else {
            TransitionStrategy::ClassFallback
        }
    }
}

/// Parameters of the class-based fallback transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTransition {
    pub exiting_class: String,
    pub entering_class: String,
    /// Progress is guaranteed after this even without a transition-end event
    pub exit_timeout: Duration,
    pub enter_duration: Duration,
}

impl ClassTransition {
    pub fn from_config(config: &NavigationConfig) -> Self {
        Self {
            exiting_class: config.exiting_class.clone(),
            entering_class: config.entering_class.clone(),
            exit_timeout: config.exit_fallback(),
            enter_duration: config.enter_duration(),
        }
    }
}

/// How non-critical work is pushed past the visible swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferral {
    IdleCallback { timeout: Duration },
    Timeout { delay: Duration },
}

impl Deferral {
    pub fn select(capabilities: Capabilities, config: &NavigationConfig) -> Self {
        if capabilities.idle_callback {
            Deferral::IdleCallback { timeout: config.idle_timeout() }
        } else {
            Deferral::Timeout { delay: config.deferred_delay() }
        }
    }

    pub fn defer<D: DocumentAdapter>(&self, doc: &D, task: Box<dyn FnOnce()>) {
        match *self {
            Deferral::IdleCallback { timeout } => doc.request_idle_callback(task, timeout),
            Deferral::Timeout { delay } => doc.set_timeout(task, delay),
        }
    }
}
