//! Lexical frame chain for the interpreter.

use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Index of a frame in the environment's arena.
pub type FrameId = usize;

/// The distinguished global (module) frame.
pub const GLOBAL_FRAME: FrameId = 0;

/// A single frame: bindings plus `global`/`nonlocal` redirection marks.
#[derive(Debug, Clone, Default)]
struct Frame {
    locals: BTreeMap<String, Value>,
    global_names: BTreeSet<String>,
    nonlocal_names: BTreeSet<String>,
    /// Lexically enclosing frame.
    parent: Option<FrameId>,
    /// Frame that was current when this one was pushed.
    resume: FrameId,
}

/// Frames live in an arena and are released in LIFO order, so a frame id
/// stays valid for as long as the call that pushed it is active.
///
/// Lookup walks the lexical `parent` links; popping returns to whichever
/// frame was current at push time, which need not be the parent.
#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<Frame>,
    current: FrameId,
}

impl Environment {
    /// Create a new environment holding only the global frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            current: GLOBAL_FRAME,
        }
    }

    /// Push a frame parented at the current one.
    pub fn push_frame(&mut self) -> FrameId {
        self.push_frame_in(self.current)
    }

    /// Push a frame lexically parented at `parent` and make it current.
    pub fn push_frame_in(&mut self, parent: FrameId) -> FrameId {
        let id = self.frames.len();
        self.frames.push(Frame {
            parent: Some(parent),
            resume: self.current,
            ..Frame::default()
        });
        self.current = id;
        id
    }

    /// Pop the current frame. Never pops the global frame.
    pub fn pop_frame(&mut self) {
        if self.current == GLOBAL_FRAME {
            return;
        }
        let resume = self.frames[self.current].resume;
        self.frames.truncate(self.current);
        self.current = resume;
    }

    pub fn current(&self) -> FrameId {
        self.current
    }

    pub fn is_global(&self) -> bool {
        self.current == GLOBAL_FRAME
    }

    /// Number of live frames, the global frame included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Frame ids from the current frame out to the global frame.
    pub fn chain(&self) -> impl Iterator<Item = FrameId> + '_ {
        std::iter::successors(Some(self.current), move |&id| self.frames[id].parent)
    }

    pub fn declare_global(&mut self, name: &str) {
        self.frames[self.current]
            .global_names
            .insert(name.to_string());
    }

    pub fn declare_nonlocal(&mut self, name: &str) {
        self.frames[self.current]
            .nonlocal_names
            .insert(name.to_string());
    }

    /// Read a variable. Missing names read as `None`; lookup never faults.
    pub fn get(&self, name: &str) -> Value {
        let frame = &self.frames[self.current];
        if frame.global_names.contains(name) {
            return self.frames[GLOBAL_FRAME]
                .locals
                .get(name)
                .cloned()
                .unwrap_or(Value::None);
        }
        if frame.nonlocal_names.contains(name) {
            return self
                .find_enclosing(name)
                .and_then(|id| self.frames[id].locals.get(name).cloned())
                .unwrap_or(Value::None);
        }
        self.chain()
            .find_map(|id| self.frames[id].locals.get(name).cloned())
            .unwrap_or(Value::None)
    }

    /// Write a variable, following the current frame's redirection marks.
    ///
    /// A `nonlocal` write with no matching binding in an enclosing
    /// function frame is dropped.
    pub fn set(&mut self, name: &str, value: Value) {
        let frame = &self.frames[self.current];
        let target = if frame.global_names.contains(name) {
            Some(GLOBAL_FRAME)
        } else if frame.nonlocal_names.contains(name) {
            self.find_enclosing(name)
        } else {
            Some(self.current)
        };
        if let Some(id) = target {
            self.frames[id].locals.insert(name.to_string(), value);
        }
    }

    /// Bind a variable in the current frame, ignoring redirection marks.
    pub fn define(&mut self, name: &str, value: Value) {
        self.frames[self.current]
            .locals
            .insert(name.to_string(), value);
    }

    /// Frames strictly above the current one, excluding the global frame.
    fn find_enclosing(&self, name: &str) -> Option<FrameId> {
        self.chain()
            .skip(1)
            .take_while(|&id| id != GLOBAL_FRAME)
            .find(|&id| self.frames[id].locals.contains_key(name))
    }

    /// All visible variables, captured with `capture`.
    ///
    /// Frames are visited from the global frame inward, so an inner binding
    /// replaces an outer one of the same name.
    pub fn snapshot_variables<T>(&self, mut capture: impl FnMut(&Value) -> T) -> BTreeMap<String, T> {
        let chain: Vec<FrameId> = self.chain().collect();
        let mut result = BTreeMap::new();
        for id in chain.into_iter().rev() {
            for (name, value) in &self.frames[id].locals {
                result.insert(name.clone(), capture(value));
            }
        }
        result
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
