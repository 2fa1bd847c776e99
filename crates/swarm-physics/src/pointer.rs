//! Pointer-driven attractor / repeller
//!
//! Input sources (window callbacks) never touch simulation state. They send
//! [`PointerEvent`]s through a [`PointerSender`]; the thread that steps the
//! simulation owns the [`PointerAdapter`] and folds everything that arrived
//! since the last frame into one [`PointerInput`] snapshot per step.

use std::sync::mpsc::{self, Receiver, SendError, Sender, TryRecvError};

use glam::Vec2;

/// The single external force input consumed by the kernel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerInput {
    /// Pointer position in simulation space, `[-1, 1]`
    pub x: f32,
    pub y: f32,
    /// `1` attract, `-1` repel, `0` not engaged
    pub strength: f32,
}

impl PointerInput {
    pub fn new(x: f32, y: f32, strength: f32) -> Self {
        Self { x, y, strength }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn is_engaged(&self) -> bool {
        self.strength != 0.0
    }
}

/// How the pointer is held down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    /// Primary engagement, e.g. left button
    Attract,
    /// Alternate engagement, e.g. right button
    Repel,
}

impl Engagement {
    pub fn strength(self) -> f32 {
        match self {
            Engagement::Attract => 1.0,
            Engagement::Repel => -1.0,
        }
    }
}

/// Raw device event, already normalized to simulation space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved { x: f32, y: f32 },
    Engaged(Engagement),
    Released,
}

impl PointerEvent {
    /// Movement event for a cursor at pixel `(px, py)` on a `width x height`
    /// surface. `None` for an empty surface.
    pub fn moved_from_pixels(px: f64, py: f64, width: u32, height: u32) -> Option<Self> {
        normalize_cursor(px, py, width, height).map(|p| PointerEvent::Moved { x: p.x, y: p.y })
    }
}

/// Maps device pixels to `[-1, 1] x [-1, 1]`, with y pointing up
pub fn normalize_cursor(px: f64, py: f64, width: u32, height: u32) -> Option<Vec2> {
    if width == 0 || height == 0 {
        return None;
    }

    let x = (px / f64::from(width)) * 2.0 - 1.0;
    let y = 1.0 - (py / f64::from(height)) * 2.0;
    Some(Vec2::new(x as f32, y as f32).clamp(Vec2::NEG_ONE, Vec2::ONE))
}

/// Cloneable handle for input sources
#[derive(Debug, Clone)]
pub struct PointerSender {
    sender: Sender<PointerEvent>,
}

impl PointerSender {
    /// Fails once the adapter has been dropped
    pub fn send(&self, event: PointerEvent) -> Result<(), SendError<PointerEvent>> {
        self.sender.send(event)
    }
}

/// Owns the receiving end and the folded pointer state
#[derive(Debug)]
pub struct PointerAdapter {
    receiver: Receiver<PointerEvent>,
    position: Vec2,
    engagement: Option<Engagement>,
}

impl PointerAdapter {
    pub fn new() -> (Self, PointerSender) {
        let (sender, receiver) = mpsc::channel();
        let adapter = Self {
            receiver,
            position: Vec2::ZERO,
            engagement: None,
        };
        (adapter, PointerSender { sender })
    }

    /// Drains every pending event and returns the resulting snapshot
    pub fn poll(&mut self) -> PointerInput {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.snapshot()
    }

    /// Current snapshot without draining the queue
    pub fn snapshot(&self) -> PointerInput {
        let strength = self.engagement.map_or(0.0, Engagement::strength);
        PointerInput::new(self.position.x, self.position.y, strength)
    }

    fn apply(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Moved { x, y } => {
                self.position = Vec2::new(x, y).clamp(Vec2::NEG_ONE, Vec2::ONE);
            }
            PointerEvent::Engaged(engagement) => {
                log::trace!("Pointer engaged: {:?}", engagement);
                self.engagement = Some(engagement);
            }
            PointerEvent::Released => {
                log::trace!("Pointer released");
                self.engagement = None;
            }
        }
    }
}
