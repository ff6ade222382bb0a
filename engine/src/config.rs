//! # Engine Constants
//!
//! Every magic number the vesting engine relies on lives here. Scheme math,
//! batch limits, and version tags are consensus-relevant for anyone replaying
//! the same operation log, so changing them after subscriptions exist is a
//! breaking change — treat this file accordingly.

// ---------------------------------------------------------------------------
// Percent Arithmetic
// ---------------------------------------------------------------------------

/// Denominator for scaled-integer percentages. All `*_bps` fields are parts
/// per ten thousand (basis points): 1_000 = 10.00%, 10_000 = 100%.
///
/// The engine never touches floating point — the final-tranche snap rule in
/// the claim math exists precisely to absorb truncating-division remainders,
/// and floats would smuggle non-determinism into a replicated state machine.
pub const PERCENT_SCALE: u64 = 10_000;

// ---------------------------------------------------------------------------
// Operational Limits
// ---------------------------------------------------------------------------

/// Maximum number of subscriptions accepted in a single `add_batch` call.
/// Keeps the all-or-nothing validation pass bounded; large migrations are
/// expected to be chunked by the operator tooling.
pub const MAX_BATCH_ADD: usize = 128;

/// Maximum subscription ids accepted in a single `claim` call. A wallet with
/// more subscriptions than this uses `claim_all`, which walks its own index.
pub const MAX_CLAIM_IDS: usize = 64;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Engine version string, stamped into replay output so logs can be matched
/// against the code that produced them.
pub const ENGINE_VERSION: &str = "0.1.0";

/// Scenario file format version understood by the replay tooling. Bump on
/// any breaking change to the scenario schema.
pub const SCENARIO_FORMAT_VERSION: u32 = 1;
