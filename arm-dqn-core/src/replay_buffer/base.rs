//! Replay buffer storing whole transitions in a ring.
use super::{ReplayBufferConfig, Transition, TransitionBatch};
use crate::{ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A bounded replay buffer with FIFO eviction.
///
/// Transitions are stored in a ring of fixed capacity. Once the ring is full,
/// a new transition overwrites the oldest one. Batches are drawn uniformly
/// without replacement.
///
/// # Examples
///
/// ```
/// use arm_dqn_core::{
///     replay_buffer::{ReplayBuffer, ReplayBufferConfig, Transition},
///     DiscreteAct, ExperienceBufferBase, ReplayBufferBase, VecObs,
/// };
///
/// let config = ReplayBufferConfig::default().capacity(2);
/// let mut buffer = ReplayBuffer::<VecObs, DiscreteAct>::build(&config);
/// for i in 0..3 {
///     let s = VecObs(vec![i as f32]);
///     let tr = Transition::new(s.clone(), DiscreteAct(0), 0.0, s);
///     buffer.push(tr).unwrap();
/// }
/// assert_eq!(buffer.len(), 2);
/// ```
pub struct ReplayBuffer<O, A> {
    /// Maximum number of transitions.
    capacity: usize,

    /// Index of the slot written by the next push.
    i: usize,

    /// Stored transitions. Grows up to `capacity`, then used as a ring.
    buf: Vec<Transition<O, A>>,

    rng: StdRng,
}

impl<O, A> ReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    /// Returns the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns an iterator over the stored transitions, from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<O, A>> {
        let (newer, older) = if self.buf.len() < self.capacity {
            (&self.buf[..], &self.buf[..0])
        } else {
            self.buf.split_at(self.i)
        };
        older.iter().chain(newer.iter())
    }

    /// Samples transitions uniformly without replacement.
    ///
    /// If the buffer holds fewer than `batch_size` transitions, all of them
    /// are returned. Otherwise exactly `batch_size` distinct transitions are
    /// returned in no particular order.
    pub fn sample(&mut self, batch_size: usize) -> Vec<Transition<O, A>> {
        let size = self.buf.len();
        if size < batch_size {
            return self.buf.clone();
        }

        index::sample(&mut self.rng, size, batch_size)
            .into_iter()
            .map(|ix| self.buf[ix].clone())
            .collect()
    }
}

impl<O, A> ExperienceBufferBase for ReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    type Item = Transition<O, A>;

    fn len(&self) -> usize {
        self.buf.len()
    }

    /// Adds a transition, dropping the oldest one if the buffer is full.
    ///
    /// A buffer with zero capacity stores nothing.
    fn push(&mut self, tr: Self::Item) -> Result<()> {
        if self.capacity == 0 {
            return Ok(());
        }

        if self.buf.len() < self.capacity {
            self.buf.push(tr);
        } else {
            self.buf[self.i] = tr;
        }
        self.i = (self.i + 1) % self.capacity;

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for ReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    type Config = ReplayBufferConfig;
    type Batch = TransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        Self {
            capacity: config.capacity,
            i: 0,
            buf: Vec::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        Ok(self.sample(size).into())
    }
}
