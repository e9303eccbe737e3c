//! Held action codes and per-slot control schemes

use std::collections::BTreeSet;

use super::entity::PlayerId;

/// Set of currently held action codes (e.g. `KeyA`, `ArrowLeft`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSet {
    held: BTreeSet<String>,
}

impl InputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, code: impl Into<String>) {
        self.held.insert(code.into());
    }

    pub fn release(&mut self, code: &str) {
        self.held.remove(code);
    }

    pub fn is_held(&self, code: &str) -> bool {
        self.held.contains(code)
    }

    /// Replace the whole held set
    pub fn replace<I, S>(&mut self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.held = codes.into_iter().map(Into::into).collect();
    }

    pub fn to_codes(&self) -> Vec<String> {
        self.held.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for InputSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            held: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Action codes one player slot listens to
#[derive(Debug, Clone, Copy)]
pub struct Controls {
    pub left: &'static str,
    pub right: &'static str,
    pub jump: &'static str,
    pub duck: &'static str,
    pub attack: &'static str,
    pub special: &'static str,
}

const P1_CONTROLS: Controls = Controls {
    left: "KeyA",
    right: "KeyD",
    jump: "KeyW",
    duck: "KeyS",
    attack: "Space",
    special: "KeyF",
};

const P2_CONTROLS: Controls = Controls {
    left: "ArrowLeft",
    right: "ArrowRight",
    jump: "ArrowUp",
    duck: "ArrowDown",
    attack: "Enter",
    special: "ShiftRight",
};

impl Controls {
    pub fn for_player(id: PlayerId) -> &'static Controls {
        if id == 1 {
            &P1_CONTROLS
        } else {
            &P2_CONTROLS
        }
    }
}

/// What one player wants to do this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intent {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub duck: bool,
    pub attack: bool,
    pub special: bool,
}

impl Intent {
    pub fn read(input: &InputSet, controls: &Controls) -> Self {
        Self {
            left: input.is_held(controls.left),
            right: input.is_held(controls.right),
            jump: input.is_held(controls.jump),
            duck: input.is_held(controls.duck),
            attack: input.is_held(controls.attack),
            special: input.is_held(controls.special),
        }
    }
}

/// The input source for each slot this tick
#[derive(Debug, Clone, Copy)]
pub struct TickInputs<'a> {
    pub p1: &'a InputSet,
    pub p2: &'a InputSet,
}

impl<'a> TickInputs<'a> {
    /// Both players read the same local set
    pub fn shared(local: &'a InputSet) -> Self {
        Self { p1: local, p2: local }
    }

    /// P1 from the local set, P2 from the remote peer
    pub fn split(local: &'a InputSet, remote: &'a InputSet) -> Self {
        Self { p1: local, p2: remote }
    }

    pub fn intent(&self, index: usize) -> Intent {
        let (input, id) = if index == 0 { (self.p1, 1) } else { (self.p2, 2) };
        Intent::read(input, Controls::for_player(id))
    }
}
