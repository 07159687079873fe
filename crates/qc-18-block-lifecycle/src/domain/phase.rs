//! # Phase State
//!
//! Every consensus phase executes against its own `PhaseState`: a write
//! buffer over the store's working layer plus the context the middleware
//! reads (height, time, transition flags).
//!
//! The orchestrator owns three slots:
//!
//! | Slot | Reset | Lifetime |
//! |------|-------|----------|
//! | Prepare | every PrepareProposal | the call |
//! | Process | every ProcessProposal | the call |
//! | Finalize | InitChain, ProcessProposal above the initial height, FinalizeBlock replay | until Commit |
//!
//! Only the Finalize slot's writes ever reach the working layer.

use qc_04_state_management::{CacheBranch, Key, Value};
use shared_types::{BlockTime, Height};
use std::fmt;

/// Consensus phase a state was created for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Genesis,
    Prepare,
    Process,
    Finalize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Genesis => "InitChain",
            Self::Prepare => "PrepareProposal",
            Self::Process => "ProcessProposal",
            Self::Finalize => "FinalizeBlock",
        };
        f.write_str(name)
    }
}

/// Live state slots owned by the orchestrator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Prepare,
    Process,
    Finalize,
}

/// Switches the middleware reads to tailor the state transition per phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransitionFlags {
    /// Run the execution engine optimistically (do not wait for it to
    /// confirm the payload before continuing)
    pub optimistic_engine: bool,
    /// Skip RANDAO reveal verification
    pub skip_validate_randao: bool,
    /// Skip comparing the computed state root with the block's
    pub skip_validate_result: bool,
    /// Do not resubmit a payload the engine already holds
    pub skip_payload_if_exists: bool,
}

impl TransitionFlags {
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Genesis => Self::default(),
            // The proposer builds the block itself; the result is not known yet.
            Phase::Prepare => Self {
                skip_validate_randao: true,
                skip_validate_result: true,
                ..Self::default()
            },
            Phase::Process => Self {
                optimistic_engine: true,
                ..Self::default()
            },
            Phase::Finalize => Self {
                optimistic_engine: true,
                skip_payload_if_exists: true,
                ..Self::default()
            },
        }
    }
}

/// Per-phase execution context handed to the middleware
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseContext {
    pub phase: Phase,
    pub height: Height,
    pub time: BlockTime,
    pub chain_id: String,
    pub flags: TransitionFlags,
}

impl PhaseContext {
    pub fn new(
        phase: Phase,
        height: Height,
        time: BlockTime,
        chain_id: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            height,
            time,
            chain_id: chain_id.into(),
            flags: TransitionFlags::for_phase(phase),
        }
    }
}

/// Write buffer plus context for one phase
#[derive(Debug)]
pub struct PhaseState {
    ctx: PhaseContext,
    branch: CacheBranch,
    block_applied: bool,
}

impl PhaseState {
    pub fn new(ctx: PhaseContext, branch: CacheBranch) -> Self {
        Self {
            ctx,
            branch,
            block_applied: false,
        }
    }

    pub fn context(&self) -> &PhaseContext {
        &self.ctx
    }

    pub fn height(&self) -> Height {
        self.ctx.height
    }

    pub fn phase(&self) -> Phase {
        self.ctx.phase
    }

    pub fn get(&self, key: &[u8]) -> Option<Value> {
        self.branch.get(key)
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.branch.has(key)
    }

    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        self.branch.set(key, value);
    }

    pub fn delete(&mut self, key: impl Into<Key>) {
        self.branch.delete(key);
    }

    /// Number of buffered writes not yet flushed
    pub fn pending_writes(&self) -> usize {
        self.branch.pending().len()
    }

    /// Isolated copy carrying this state's buffered writes under a new
    /// context. Writes to either side are invisible to the other.
    pub fn fork(&self, ctx: PhaseContext) -> Self {
        Self {
            ctx,
            branch: self.branch.fork(),
            block_applied: false,
        }
    }

    /// Flush buffered writes into the store's working layer.
    pub fn write(&mut self) {
        self.branch.write();
    }

    /// Record that FinalizeBlock executed a block against this state.
    pub(crate) fn mark_block_applied(&mut self) {
        self.block_applied = true;
    }

    /// True once FinalizeBlock executed a block against this state.
    pub fn block_applied(&self) -> bool {
        self.block_applied
    }
}

/// The orchestrator's three live phase states
#[derive(Debug, Default)]
pub struct PhaseSlots {
    prepare: Option<PhaseState>,
    process: Option<PhaseState>,
    finalize: Option<PhaseState>,
}

impl PhaseSlots {
    fn slot_mut(&mut self, slot: Slot) -> &mut Option<PhaseState> {
        match slot {
            Slot::Prepare => &mut self.prepare,
            Slot::Process => &mut self.process,
            Slot::Finalize => &mut self.finalize,
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&PhaseState> {
        match slot {
            Slot::Prepare => self.prepare.as_ref(),
            Slot::Process => self.process.as_ref(),
            Slot::Finalize => self.finalize.as_ref(),
        }
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut PhaseState> {
        self.slot_mut(slot).as_mut()
    }

    /// Replace the slot's state, discarding the previous one.
    pub fn reset(&mut self, slot: Slot, state: PhaseState) -> &mut PhaseState {
        self.slot_mut(slot).insert(state)
    }

    pub fn clear(&mut self, slot: Slot) {
        *self.slot_mut(slot) = None;
    }

    pub fn is_live(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use qc_04_state_management::{InMemoryVersionedStore, VersionedStore};

    fn ctx(phase: Phase, height: Height) -> PhaseContext {
        let time = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        PhaseContext::new(phase, height, time, "qc-test")
    }

    #[test]
    fn test_flags_per_phase() {
        assert!(TransitionFlags::for_phase(Phase::Finalize).skip_payload_if_exists);
        assert!(TransitionFlags::for_phase(Phase::Process).optimistic_engine);
        assert!(!TransitionFlags::for_phase(Phase::Process).skip_validate_randao);
        assert!(TransitionFlags::for_phase(Phase::Prepare).skip_validate_randao);
        assert_eq!(
            TransitionFlags::for_phase(Phase::Genesis),
            TransitionFlags::default()
        );
    }

    #[test]
    fn test_fork_is_isolated() {
        let store = InMemoryVersionedStore::new();
        let mut base = PhaseState::new(ctx(Phase::Genesis, 1), store.branch());
        base.set(b"genesis".to_vec(), b"1".to_vec());

        let mut forked = base.fork(ctx(Phase::Prepare, 1));
        assert_eq!(forked.get(b"genesis"), Some(b"1".to_vec()));
        assert_eq!(forked.phase(), Phase::Prepare);

        forked.set(b"proposal".to_vec(), b"x".to_vec());
        assert!(!base.has(b"proposal"));
    }

    #[test]
    fn test_slot_reset_discards_previous() {
        let store = InMemoryVersionedStore::new();
        let mut slots = PhaseSlots::default();

        let first = slots.reset(
            Slot::Process,
            PhaseState::new(ctx(Phase::Process, 2), store.branch()),
        );
        first.set(b"k".to_vec(), b"v".to_vec());

        let second = slots.reset(
            Slot::Process,
            PhaseState::new(ctx(Phase::Process, 2), store.branch()),
        );
        assert!(!second.has(b"k"));

        slots.clear(Slot::Process);
        assert!(!slots.is_live(Slot::Process));
    }

    #[test]
    fn test_only_written_state_reaches_working_layer() {
        let store = InMemoryVersionedStore::new();
        let empty = store.working_hash();

        let mut prepare = PhaseState::new(ctx(Phase::Prepare, 1), store.branch());
        prepare.set(b"k".to_vec(), b"v".to_vec());
        drop(prepare);
        assert_eq!(store.working_hash(), empty);

        let mut finalize = PhaseState::new(ctx(Phase::Finalize, 1), store.branch());
        finalize.set(b"k".to_vec(), b"v".to_vec());
        assert_eq!(finalize.pending_writes(), 1);
        finalize.write();
        assert_ne!(store.working_hash(), empty);
    }
}
