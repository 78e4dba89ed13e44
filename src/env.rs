// ABOUTME: Lexically scoped environments: a stack of shared, mutable frames

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::node::Node;

/// One lexical scope's name-to-node mapping.
pub type Frame = HashMap<String, Node>;

/// A stack of frames, innermost first. Pushing yields a new view without
/// disturbing the receiver; the frames themselves are shared, so a
/// top-level `define` made through one view is visible through every
/// closure that captured an environment containing that frame.
#[derive(Clone)]
pub struct Environment {
    frames: Vec<Rc<RefCell<Frame>>>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    /// An environment with a single, empty top-level frame.
    pub fn new() -> Self {
        Environment {
            frames: vec![Rc::new(RefCell::new(Frame::new()))],
        }
    }

    /// A new view with `frame` pushed as innermost.
    pub fn with_frame(&self, frame: Frame) -> Environment {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.push(Rc::new(RefCell::new(frame)));
        frames.extend(self.frames.iter().cloned());
        Environment { frames }
    }

    /// Innermost-outward search; first match wins.
    pub fn lookup(&self, name: &str) -> Option<Node> {
        for frame in &self.frames {
            if let Some(node) = frame.borrow().get(name) {
                return Some(node.clone());
            }
        }
        None
    }

    /// Bind into the innermost frame.
    pub fn define(&self, name: String, value: Node) {
        self.frames[0].borrow_mut().insert(name, value);
    }

    /// Bind into the outermost frame, i.e. the program top level.
    pub fn add_define(&self, name: String, value: Node) {
        self.frames
            .last()
            .expect("environment always has a top-level frame")
            .borrow_mut()
            .insert(name, value);
    }

    /// Update the nearest frame where `name` is already bound. Returns
    /// false when no frame binds it.
    pub fn set(&self, name: &str, value: Node) -> bool {
        for frame in &self.frames {
            let mut frame = frame.borrow_mut();
            if frame.contains_key(name) {
                frame.insert(name.to_string(), value);
                return true;
            }
        }
        false
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment({} frames)", self.frames.len())
    }
}
