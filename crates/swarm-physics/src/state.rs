//! Double-buffered particle state
//!
//! [`DoubleBuffer`] owns both halves of a ping-pong pair and a single parity
//! bit. Callers only ever see the current half (read) and the next half
//! (write); the raw slots are never handed out, so one step cannot alias the
//! buffers of another.

use thiserror::Error;

use crate::grid::GridLayout;
use crate::particle::{Color, ParticleRecord, Properties, Transform};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("a simulation needs at least one particle")]
    EmptyPopulation,
    #[error("failed to allocate {records} particle records")]
    Allocation { records: usize },
}

/// Which slot of a [`DoubleBuffer`] is current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn flipped(self) -> Self {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }

    /// Slot index of the current half
    pub fn index(self) -> usize {
        match self {
            Parity::Even => 0,
            Parity::Odd => 1,
        }
    }
}

/// Two same-shaped values, one readable ("current") and one writable ("next")
#[derive(Debug, Clone)]
pub struct DoubleBuffer<T> {
    slots: [T; 2],
    parity: Parity,
}

impl<T> DoubleBuffer<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            slots: [first, second],
            parity: Parity::Even,
        }
    }

    pub fn current(&self) -> &T {
        &self.slots[self.parity.index()]
    }

    pub fn next(&self) -> &T {
        &self.slots[self.parity.flipped().index()]
    }

    pub fn next_mut(&mut self) -> &mut T {
        &mut self.slots[self.parity.flipped().index()]
    }

    /// Current half for reading and next half for writing, at the same time
    pub fn split(&mut self) -> (&T, &mut T) {
        let [even, odd] = &mut self.slots;
        match self.parity {
            Parity::Even => (&*even, odd),
            Parity::Odd => (&*odd, even),
        }
    }

    /// Publish the next half. Only call once every write of the step is done.
    pub fn swap(&mut self) {
        self.parity = self.parity.flipped();
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    /// Apply `f` to both halves
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut T)) {
        for slot in &mut self.slots {
            f(slot);
        }
    }
}

impl<T: Clone> DoubleBuffer<T> {
    /// Both halves start as copies of `value`
    pub fn mirrored(value: T) -> Self {
        Self::new(value.clone(), value)
    }
}

/// Host copy of the three particle buffers, `S * S` records each
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleBuffers {
    pub transforms: Vec<Transform>,
    pub colors: Vec<Color>,
    pub properties: Vec<Properties>,
}

impl ParticleBuffers {
    /// Zero-filled buffers sized for `layout`
    pub fn zeroed(layout: &GridLayout) -> Result<Self, StateError> {
        let capacity = layout.capacity();
        Ok(Self {
            transforms: zeroed_vec(capacity)?,
            colors: zeroed_vec(capacity)?,
            properties: zeroed_vec(capacity)?,
        })
    }

    /// Buffers sized for `layout`, filled from `seed`.
    /// Cells where `seed` returns `None` keep a zero record.
    pub fn seeded(
        layout: &GridLayout,
        seed: impl Fn(u32) -> Option<ParticleRecord>,
    ) -> Result<Self, StateError> {
        if layout.count() == 0 {
            return Err(StateError::EmptyPopulation);
        }

        let mut buffers = Self::zeroed(layout)?;
        for index in 0..layout.capacity() {
            if let Some(record) = seed(index as u32) {
                buffers.set(index, record);
            }
        }
        Ok(buffers)
    }

    pub fn record(&self, index: usize) -> ParticleRecord {
        ParticleRecord {
            transform: self.transforms[index],
            color: self.colors[index],
            properties: self.properties[index],
        }
    }

    pub fn set(&mut self, index: usize, record: ParticleRecord) {
        self.transforms[index] = record.transform;
        self.colors[index] = record.color;
        self.properties[index] = record.properties;
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

fn zeroed_vec<T: Default + Clone>(len: usize) -> Result<Vec<T>, StateError> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|_| StateError::Allocation { records: len })?;
    values.resize(len, T::default());
    Ok(values)
}

/// The particle state as seen by the CPU backend
pub type ParticleState = DoubleBuffer<ParticleBuffers>;

/// Allocate both halves and fill them identically from `seed`
pub fn create_state(
    layout: &GridLayout,
    seed: impl Fn(u32) -> Option<ParticleRecord>,
) -> Result<ParticleState, StateError> {
    let buffers = ParticleBuffers::seeded(layout, seed)?;
    log::debug!(
        "Allocated particle state: {} particles on a {}x{} grid",
        layout.count(),
        layout.side(),
        layout.side()
    );
    Ok(DoubleBuffer::mirrored(buffers))
}
