//! Frame-scheduled playback of page actions.
//!
//! The host calls [`StreamActionPlayer::on_animation_frame`] from its frame
//! callback. While the host is hidden its frame callbacks may not run, so
//! actions are applied as soon as they are enqueued instead.

use crate::action::{Action, KeyEvent};
use crate::config::PlayerConfig;
use crate::processor::ExecutorResult;
use std::collections::VecDeque;

/// Applies single actions, usually to the selected page.
pub trait ActionExecutor {
    fn execute_action(&mut self, action: &Action) -> ExecutorResult<()>;
}

pub struct StreamActionPlayer<E> {
    executor: E,
    config: PlayerConfig,
    queue: VecDeque<Action>,
    running: bool,
    visible: bool,
}

impl<E: ActionExecutor> StreamActionPlayer<E> {
    pub fn new(executor: E, config: PlayerConfig) -> Self {
        Self {
            executor,
            config,
            queue: VecDeque::new(),
            running: false,
            visible: true,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Number of queued actions.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Start draining on animation frames.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop draining and drop queued actions.
    pub fn stop(&mut self) {
        self.running = false;
        if !self.queue.is_empty() {
            log::debug!("Player stopped with {} queued actions", self.queue.len());
            self.queue.clear();
        }
    }

    /// Queue an action, or apply it right away while hidden.
    pub fn enqueue(&mut self, action: Action) {
        if self.visible {
            self.queue.push_back(action);
        } else {
            self.apply(&action);
        }
    }

    /// Queue an action stamped with the local modifier state.
    pub fn enqueue_with_key_event(&mut self, mut action: Action, key_event: KeyEvent) {
        action.set_key_event(Some(key_event));
        self.enqueue(action);
    }

    /// Track host visibility. Going hidden applies everything queued.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if !visible {
            log::debug!("Host hidden; flushing {} queued actions", self.queue.len());
            while let Some(action) = self.queue.pop_front() {
                self.apply(&action);
            }
        }
    }

    /// Drain the queue in FIFO order. Returns whether the host should
    /// schedule another frame.
    pub fn on_animation_frame(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let budget = self.config.max_actions_per_frame.unwrap_or(usize::MAX);
        let mut applied = 0;
        while applied < budget {
            let Some(action) = self.queue.pop_front() else {
                break;
            };
            self.apply(&action);
            applied += 1;
        }
        true
    }

    fn apply(&mut self, action: &Action) {
        if let Err(err) = self.executor.execute_action(action) {
            log::error!("Failed to execute {:?} (t={}): {err}", action.action_type(), action.timestamp);
        }
    }
}
