//! Discrete input events and the left/right movement intent they drive.
//!
//! The front end translates its native events into [`InputEvent`]s and
//! pushes them into an [`InputQueue`]; the game loop drains the queue once
//! per iteration through the [`InputSource`] trait.

use std::collections::VecDeque;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    A,
    D,
    /// Reload the level from disk.
    R,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Key {
    /// Movement direction bound to this key, if any.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Key::Left | Key::A => Some(Direction::Left),
            Key::Right | Key::D => Some(Direction::Right),
            Key::R => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The window was closed.
    Quit,
    KeyDown(Key),
    KeyUp(Key),
}

/// Pollable event source.
pub trait InputSource {
    fn poll_event(&mut self) -> Option<InputEvent>;
}

/// FIFO of pending events.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(16),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl InputSource for InputQueue {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }
}

impl Extend<InputEvent> for InputQueue {
    fn extend<I: IntoIterator<Item = InputEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}

/// Which way the player wants to move. Left and right are mutually
/// exclusive: pressing one direction cancels the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementIntent {
    pub left: bool,
    pub right: bool,
}

impl MovementIntent {
    pub fn press(&mut self, direction: Direction) {
        match direction {
            Direction::Left => {
                self.left = true;
                self.right = false;
            }
            Direction::Right => {
                self.left = false;
                self.right = true;
            }
        }
    }

    pub fn release(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.left = false,
            Direction::Right => self.right = false,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.left || self.right
    }
}
