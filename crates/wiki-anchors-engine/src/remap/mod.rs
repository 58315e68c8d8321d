/*!
 * # Offset Remapping
 *
 * Comments are anchored to half-open ranges of a page's text. When the page is
 * edited, every stored range has to be translated into the new text's
 * coordinates, or dropped when the text it pointed at no longer exists.
 *
 * ## Pipeline
 *
 * 1. An **`EditScript`** describes how the old text became the new one, as an
 *    ordered list of difflib-style opcodes (`Equal`, `Insert`, `Delete`,
 *    `Replace`) tiling the old text from offset 0.
 * 2. The script is validated once (`EditScript::validate`). A malformed script
 *    aborts the whole remap.
 * 3. For each **`Interval`** a **`Delta`** accumulator is swept over the ops.
 *    Every op is classified against the interval's *original* coordinates,
 *    never the partially shifted ones.
 * 4. The summed delta is applied once, giving `RemapResult::Moved`, unless an
 *    op swallowed the whole interval, which gives `RemapResult::Removed`.
 *
 * ## Module Structure
 *
 * - **`interval`**: `Interval` and the `Offset` coordinate type
 * - **`edit_op`**: `EditOp`, `EditScript` and the tiling validator
 * - **`classify`**: per-op case analysis and the `Delta` accumulator
 * - **`remapper`**: reference sweep, op-major sweep and the prepared `Remapper`
 * - **`diff`**: builds edit scripts from two texts
 * - **`error`**: `RemapError`
 *
 * ## Usage Pattern
 *
 * ```rust
 * use wiki_anchors_engine::remap::{EditOp, EditScript, Interval, RemapResult, remap};
 *
 * let script = EditScript::new(vec![
 *     EditOp::equal(0, 5, 0, 5),
 *     EditOp::insert(5, 5, 8),
 *     EditOp::equal(5, 30, 8, 33),
 * ]);
 *
 * let results = remap(&[Interval::new(10, 20)], &script).unwrap();
 * assert_eq!(results, vec![RemapResult::Moved { start: 13, end: 23 }]);
 * ```
 */

pub mod classify;
pub mod diff;
pub mod edit_op;
pub mod error;
pub mod interval;
pub mod remapper;

pub use classify::{Delta, Effect, classify};
pub use diff::DiffSource;
pub use edit_op::{EditOp, EditScript, EditTag, MalformedReason};
pub use error::RemapError;
pub use interval::{Interval, MAX_OFFSET, Offset, validate_intervals};
pub use remapper::{RemapResult, Remapper, remap, remap_op_major};
